// ironquery-core/src/mutation.rs
//! Example-based mutation contracts
//!
//! Removing, replacing and updating by example belong to concrete collection
//! kinds. The base [`Collection`] facade takes the provided defaults, which
//! fail with `ERROR_NOT_IMPLEMENTED` on every call.

use serde_json::{Map, Value};

use crate::collection::Collection;
use crate::error::{IronQueryError, Result};
use crate::simple_query::Example;

/// Options shared by the by-example mutations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOptions {
    pub wait_for_sync: bool,
    /// Maximum number of documents to touch
    pub limit: Option<u64>,
    /// Update only: keep attributes explicitly set to `null`
    pub keep_null: bool,
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_for_sync(mut self, wait_for_sync: bool) -> Self {
        self.wait_for_sync = wait_for_sync;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }
}

/// Mutations addressed by example. Each returns the number of documents
/// affected.
pub trait ExampleMutations {
    fn remove_by_example(&self, _example: &Example, _options: &MutationOptions) -> Result<u64> {
        Err(IronQueryError::Unimplemented {
            operation: "removeByExample",
        })
    }

    fn replace_by_example(
        &self,
        _example: &Example,
        _new_value: &Map<String, Value>,
        _options: &MutationOptions,
    ) -> Result<u64> {
        Err(IronQueryError::Unimplemented {
            operation: "replaceByExample",
        })
    }

    fn update_by_example(
        &self,
        _example: &Example,
        _new_value: &Map<String, Value>,
        _options: &MutationOptions,
    ) -> Result<u64> {
        Err(IronQueryError::Unimplemented {
            operation: "updateByExample",
        })
    }
}

impl<E> ExampleMutations for Collection<E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionId, CollectionInfo, CollectionStatus, CollectionType};
    use crate::error::codes;
    use serde_json::json;
    use std::sync::Arc;

    fn base_collection() -> Collection<()> {
        Collection::new(
            Arc::new(()),
            CollectionInfo::new(
                CollectionId::new("7"),
                "users",
                CollectionType::Document,
                CollectionStatus::Loaded,
            ),
        )
    }

    #[test]
    fn test_base_facade_always_fails() {
        let coll = base_collection();
        let example = Example::new().with("name", "Alice");
        let mut update = Map::new();
        update.insert("age".to_string(), json!(31));

        let option_sets = [
            MutationOptions::new(),
            MutationOptions::new()
                .with_wait_for_sync(true)
                .with_limit(1)
                .with_keep_null(true),
        ];

        for options in &option_sets {
            let err = coll.remove_by_example(&example, options).unwrap_err();
            assert_eq!(err.error_num(), codes::ERROR_NOT_IMPLEMENTED);
            assert_eq!(err.error_message(), "cannot call abstract removeByExample function");

            let err = coll.replace_by_example(&example, &update, options).unwrap_err();
            assert_eq!(err.error_message(), "cannot call abstract replaceByExample function");

            let err = coll.update_by_example(&Example::new(), &Map::new(), options).unwrap_err();
            assert_eq!(err.error_message(), "cannot call abstract updateByExample function");
        }
    }

    struct CountingCollection;

    impl ExampleMutations for CountingCollection {
        fn remove_by_example(&self, example: &Example, options: &MutationOptions) -> Result<u64> {
            let matched = example.as_map().len() as u64;
            Ok(options.limit.map_or(matched, |limit| limit.min(matched)))
        }
    }

    #[test]
    fn test_specialization_overrides_default() {
        let coll = CountingCollection;
        let example = Example::new().with("a", 1).with("b", 2);

        assert_eq!(coll.remove_by_example(&example, &MutationOptions::new()).unwrap(), 2);
        assert_eq!(
            coll.remove_by_example(&example, &MutationOptions::new().with_limit(1))
                .unwrap(),
            1
        );
        assert!(coll
            .update_by_example(&example, &Map::new(), &MutationOptions::new())
            .is_err());
    }
}
