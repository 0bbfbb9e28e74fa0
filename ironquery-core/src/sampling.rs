// ironquery-core/src/sampling.rs
// Bulk traversal with optional random sampling and result cap.
//
// Four traversal modes, one cursor each:
//
//   probability >= 1, no limit  -> all()
//   probability >= 1, limit n   -> all().limit(n)
//   probability <  1, no limit  -> FOR d IN @@collection FILTER RAND() >= 1 - @probability RETURN d
//   probability <  1, limit n   -> ... FILTER ... LIMIT @limit RETURN d
//
// The cursor is consumed front to back; positions start at 0.

use serde_json::Value;

use crate::collection::Collection;
use crate::engine::{BoxCursor, Engine, Statement};
use crate::error::{IronQueryError, Result};
use crate::{log_debug, log_warn};

/// Options for [`Collection::iterate`]
#[derive(Debug, Clone, PartialEq)]
pub struct IterateOptions {
    /// Fraction of documents to keep, `>= 1.0` keeps everything
    pub probability: f64,
    /// Maximum number of documents to deliver
    pub limit: Option<u64>,
}

impl Default for IterateOptions {
    fn default() -> Self {
        IterateOptions {
            probability: 1.0,
            limit: None,
        }
    }
}

impl IterateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse loosely typed options (`{"probability": 0.5, "limit": 10}`).
    ///
    /// `null` or a missing key keeps the default. A non-numeric (or negative)
    /// `limit` or `probability` fails with `ERROR_ILLEGAL_NUMBER`.
    pub fn from_value(options: &Value) -> Result<Self> {
        let map = match options {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(IronQueryError::BadParameter(format!(
                    "iterate options must be an object, got {}",
                    other
                )))
            }
        };

        for key in map.keys() {
            if key != "probability" && key != "limit" {
                log_warn!("ignoring unknown iterate option '{}'", key);
            }
        }

        let mut parsed = Self::default();

        if let Some(probability) = map.get("probability").filter(|v| !v.is_null()) {
            parsed.probability = probability
                .as_f64()
                .ok_or_else(|| IronQueryError::illegal_number(probability))?;
        }

        if let Some(limit) = map.get("limit").filter(|v| !v.is_null()) {
            parsed.limit = Some(parse_limit(limit)?);
        }

        Ok(parsed)
    }

    fn is_sampled(&self) -> bool {
        self.probability < 1.0
    }

    pub fn mode(&self) -> TraversalMode {
        match (self.is_sampled(), self.limit) {
            (false, None) => TraversalMode::All,
            (false, Some(limit)) => TraversalMode::AllLimited(limit),
            (true, None) => TraversalMode::Sampled,
            (true, Some(limit)) => TraversalMode::SampledLimited(limit),
        }
    }
}

fn parse_limit(limit: &Value) -> Result<u64> {
    if let Some(limit) = limit.as_u64() {
        return Ok(limit);
    }
    match limit.as_f64() {
        // fractional limits truncate
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
        _ => Err(IronQueryError::illegal_number(limit)),
    }
}

/// How a traversal reaches the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    All,
    AllLimited(u64),
    Sampled,
    SampledLimited(u64),
}

/// Statement keeping each document with the given probability
pub fn sample_statement(collection: &str, probability: f64, limit: Option<u64>) -> Statement {
    match limit {
        None => Statement::new("FOR d IN @@collection FILTER RAND() >= 1 - @probability RETURN d")
            .bind("@collection", collection)
            .bind("probability", probability),
        Some(limit) => Statement::new(
            "FOR d IN @@collection FILTER RAND() >= 1 - @probability LIMIT @limit RETURN d",
        )
        .bind("@collection", collection)
        .bind("probability", probability)
        .bind("limit", limit),
    }
}

/// Lazy, single-pass `(position, document)` sequence over one cursor
///
/// Stops after the first error.
pub struct SampleIter {
    cursor: BoxCursor,
    position: usize,
    failed: bool,
}

impl SampleIter {
    pub fn new(cursor: BoxCursor) -> Self {
        SampleIter {
            cursor,
            position: 0,
            failed: false,
        }
    }

    /// Documents delivered so far
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for SampleIter {
    type Item = Result<(usize, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.cursor.has_next() {
            return None;
        }
        match self.cursor.next_document() {
            Ok(document) => {
                let position = self.position;
                self.position += 1;
                Some(Ok((position, document)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for SampleIter {}

impl<E: Engine> Collection<E> {
    /// Open the cursor for `options` and wrap it in a [`SampleIter`]
    pub fn sample(&self, options: &IterateOptions) -> Result<SampleIter> {
        if !options.probability.is_finite() {
            return Err(IronQueryError::IllegalNumber {
                got: options.probability.to_string(),
            });
        }
        let mode = options.mode();
        log_debug!("iterate '{}' in mode {:?}", self.name(), mode);

        let cursor = match mode {
            TraversalMode::All => self.all().execute()?,
            TraversalMode::AllLimited(limit) => self.all().limit(limit).execute()?,
            TraversalMode::Sampled => {
                let statement = sample_statement(&self.name(), options.probability, None);
                self.engine().execute_statement(&statement)?
            }
            TraversalMode::SampledLimited(limit) => {
                let statement = sample_statement(&self.name(), options.probability, Some(limit));
                self.engine().execute_statement(&statement)?
            }
        };

        Ok(SampleIter::new(cursor))
    }

    /// Call `callback(document, position)` for every document the traversal
    /// yields, in cursor order. An error from the cursor or the callback
    /// aborts immediately. Returns the number of documents delivered.
    pub fn iterate<F, X>(&self, options: &IterateOptions, mut callback: F) -> std::result::Result<usize, X>
    where
        F: FnMut(Value, usize) -> std::result::Result<(), X>,
        X: From<IronQueryError>,
    {
        let mut documents = self.sample(options)?;
        for item in documents.by_ref() {
            let (position, document) = item?;
            callback(document, position)?;
        }
        Ok(documents.position())
    }

    /// [`iterate`](Self::iterate) with loosely typed options, validated before
    /// any cursor is opened
    pub fn iterate_with<F, X>(&self, options: &Value, callback: F) -> std::result::Result<usize, X>
    where
        F: FnMut(Value, usize) -> std::result::Result<(), X>,
        X: From<IronQueryError>,
    {
        let options = IterateOptions::from_value(options)?;
        self.iterate(&options, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use serde_json::json;

    #[test]
    fn test_default_options() {
        let options = IterateOptions::from_value(&json!({})).unwrap();
        assert_eq!(options, IterateOptions::default());
        assert_eq!(options.mode(), TraversalMode::All);
        assert_eq!(IterateOptions::from_value(&Value::Null).unwrap().probability, 1.0);
    }

    #[test]
    fn test_mode_matrix() {
        assert_eq!(IterateOptions::new().with_limit(3).mode(), TraversalMode::AllLimited(3));
        assert_eq!(
            IterateOptions::new().with_probability(0.5).mode(),
            TraversalMode::Sampled
        );
        assert_eq!(
            IterateOptions::new().with_probability(0.5).with_limit(3).mode(),
            TraversalMode::SampledLimited(3)
        );
        assert_eq!(
            IterateOptions::new().with_probability(2.0).mode(),
            TraversalMode::All
        );
    }

    #[test]
    fn test_non_numeric_limit_is_illegal_number() {
        let err = IterateOptions::from_value(&json!({"limit": "x"})).unwrap_err();
        assert_eq!(err.error_num(), codes::ERROR_ILLEGAL_NUMBER);
        assert_eq!(err.error_message(), "expecting a number, got x");

        let err = IterateOptions::from_value(&json!({"limit": -2})).unwrap_err();
        assert_eq!(err.error_num(), codes::ERROR_ILLEGAL_NUMBER);
    }

    #[test]
    fn test_non_numeric_probability_is_illegal_number() {
        let err = IterateOptions::from_value(&json!({"probability": true})).unwrap_err();
        assert_eq!(err.error_num(), codes::ERROR_ILLEGAL_NUMBER);
    }

    #[test]
    fn test_fractional_limit_truncates() {
        let options = IterateOptions::from_value(&json!({"limit": 2.9, "probability": null})).unwrap();
        assert_eq!(options.limit, Some(2));
        assert_eq!(options.probability, 1.0);
    }

    #[test]
    fn test_options_must_be_object() {
        let err = IterateOptions::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.error_num(), codes::ERROR_BAD_PARAMETER);
    }

    #[test]
    fn test_sample_statement_binds_everything() {
        let stmt = sample_statement("users", 0.25, Some(7));
        assert!(!stmt.query.contains("users"));
        assert!(stmt.query.contains("LIMIT @limit"));
        assert_eq!(stmt.bind_var("@collection"), Some(&json!("users")));
        assert_eq!(stmt.bind_var("probability"), Some(&json!(0.25)));
        assert_eq!(stmt.bind_var("limit"), Some(&json!(7)));

        let stmt = sample_statement("users", 0.25, None);
        assert!(!stmt.query.contains("LIMIT"));
        assert_eq!(stmt.bind_var("limit"), None);
    }
}
