// ironquery-core/src/error.rs
//! Error types for IronQuery
//!
//! Every error carries a numeric `errorNum` and a human readable
//! `errorMessage`, matching the structured error objects the engine layer
//! exchanges with its clients.

use thiserror::Error;

/// Numeric error codes shared with the engine layer
pub mod codes {
    pub const ERROR_INTERNAL: i32 = 4;
    pub const ERROR_ILLEGAL_NUMBER: i32 = 5;
    pub const ERROR_NOT_IMPLEMENTED: i32 = 9;
    pub const ERROR_BAD_PARAMETER: i32 = 10;
    pub const ERROR_ARANGO_DATA_SOURCE_NOT_FOUND: i32 = 1203;
    pub const ERROR_ARANGO_INDEX_NOT_FOUND: i32 = 1212;
    pub const ERROR_QUERY_GEO_INDEX_MISSING: i32 = 1570;
}

#[derive(Error, Debug)]
pub enum IronQueryError {
    /// Malformed call arguments (odd example pair count, bad coordinates, ...)
    #[error("{0}")]
    BadParameter(String),

    /// A value that had to be numeric was not
    #[error("expecting a number, got {got}")]
    IllegalNumber { got: String },

    /// No geo index in the catalog matches the requested configuration
    #[error("no suitable geo index found for geo restriction on '{collection}'")]
    GeoIndexMissing { collection: String },

    /// Abstract operation invoked on the base collection facade
    #[error("cannot call abstract {operation} function")]
    Unimplemented { operation: &'static str },

    #[error("collection or view not found: {0}")]
    CollectionNotFound(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Raised by the engine boundary, passed through unchanged
    #[error("{message}")]
    Engine { code: i32, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IronQueryError {
    /// Numeric code (`errorNum`)
    pub fn error_num(&self) -> i32 {
        match self {
            IronQueryError::BadParameter(_) => codes::ERROR_BAD_PARAMETER,
            IronQueryError::IllegalNumber { .. } => codes::ERROR_ILLEGAL_NUMBER,
            IronQueryError::GeoIndexMissing { .. } => codes::ERROR_QUERY_GEO_INDEX_MISSING,
            IronQueryError::Unimplemented { .. } => codes::ERROR_NOT_IMPLEMENTED,
            IronQueryError::CollectionNotFound(_) => codes::ERROR_ARANGO_DATA_SOURCE_NOT_FOUND,
            IronQueryError::IndexNotFound(_) => codes::ERROR_ARANGO_INDEX_NOT_FOUND,
            IronQueryError::Engine { code, .. } => *code,
            IronQueryError::Serialization(_) => codes::ERROR_INTERNAL,
        }
    }

    /// Human readable message (`errorMessage`)
    pub fn error_message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn illegal_number(value: &serde_json::Value) -> Self {
        let got = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        IronQueryError::IllegalNumber { got }
    }
}

pub type Result<T> = std::result::Result<T, IronQueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geo_index_missing_names_collection() {
        let err = IronQueryError::GeoIndexMissing {
            collection: "places".to_string(),
        };
        assert_eq!(err.error_num(), 1570);
        assert_eq!(
            err.error_message(),
            "no suitable geo index found for geo restriction on 'places'"
        );
    }

    #[test]
    fn test_illegal_number_message() {
        let err = IronQueryError::illegal_number(&json!("x"));
        assert_eq!(err.error_num(), codes::ERROR_ILLEGAL_NUMBER);
        assert_eq!(err.error_message(), "expecting a number, got x");

        let err = IronQueryError::illegal_number(&json!([1]));
        assert_eq!(err.error_message(), "expecting a number, got [1]");
    }

    #[test]
    fn test_engine_code_passthrough() {
        let err = IronQueryError::Engine {
            code: 1203,
            message: "gone".to_string(),
        };
        assert_eq!(err.error_num(), 1203);
        assert_eq!(err.error_message(), "gone");
    }
}
