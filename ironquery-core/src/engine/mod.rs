// ironquery-core/src/engine/mod.rs
//! Engine boundary
//!
//! This crate never executes queries. It hands either a [`QueryDescriptor`]
//! (native simple-query dispatch) or a parameterized [`Statement`] to a
//! [`QueryEngine`] and consumes the returned [`Cursor`].
//!
//! ```text
//! Collection ──builds──▶ QueryDescriptor ──▶ QueryEngine::execute ──▶ Cursor
//!            ──builds──▶ Statement       ──▶ QueryEngine::execute_statement
//! ```
//!
//! [`MemoryEngine`] is an in-memory implementation used by tests and the CLI.

mod memory;

pub use memory::MemoryEngine;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog::IndexCatalog;
use crate::error::{codes, IronQueryError, Result};
use crate::simple_query::QueryDescriptor;

/// Sequential, single-pass handle over query results
pub trait Cursor: Send {
    fn has_next(&mut self) -> bool;

    /// Pull the next document. Errors raised by the engine propagate as-is.
    fn next_document(&mut self) -> Result<Value>;

    /// Total result count, when the engine knows it up front
    fn count(&self) -> Option<usize> {
        None
    }
}

pub type BoxCursor = Box<dyn Cursor>;

/// Cursor over an already materialized result set
#[derive(Debug, Default)]
pub struct VecCursor {
    documents: Vec<Value>,
    position: usize,
}

impl VecCursor {
    pub fn new(documents: Vec<Value>) -> Self {
        VecCursor {
            documents,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.documents.len().saturating_sub(self.position)
    }
}

impl Cursor for VecCursor {
    fn has_next(&mut self) -> bool {
        self.position < self.documents.len()
    }

    fn next_document(&mut self) -> Result<Value> {
        let document = self
            .documents
            .get_mut(self.position)
            .map(Value::take)
            .ok_or_else(|| IronQueryError::Engine {
                code: codes::ERROR_INTERNAL,
                message: "cursor is exhausted".to_string(),
            })?;
        self.position += 1;
        Ok(document)
    }

    fn count(&self) -> Option<usize> {
        Some(self.documents.len())
    }
}

/// Query-language statement with bound parameters
///
/// Values never get interpolated into `query`; every variable part is a
/// bind parameter (`@name`, or `@@name` for collection names).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub query: String,
    pub bind_vars: Map<String, Value>,
}

impl Statement {
    pub fn new(query: impl Into<String>) -> Self {
        Statement {
            query: query.into(),
            bind_vars: Map::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind_vars.insert(name.into(), value.into());
        self
    }

    pub fn bind_var(&self, name: &str) -> Option<&Value> {
        self.bind_vars.get(name)
    }
}

/// Query execution boundary
pub trait QueryEngine: Send + Sync {
    /// Native dispatch of a simple-query descriptor
    fn execute(&self, query: &QueryDescriptor) -> Result<BoxCursor>;

    fn execute_statement(&self, statement: &Statement) -> Result<BoxCursor>;
}

/// Everything a [`Collection`](crate::Collection) needs from its engine
pub trait Engine: QueryEngine + IndexCatalog {}

impl<T: QueryEngine + IndexCatalog> Engine for T {}
