// ironquery-core/src/lib.rs
// Collection facade and simple-query construction layer.
// Queries are built and dispatched here; execution belongs to the engine.

pub mod catalog;
pub mod collection;
pub mod engine;
pub mod error;
pub mod geo;
pub mod logging;
pub mod mutation;
pub mod sampling;
pub mod simple_query;
pub mod value_utils;

// Public exports
pub use catalog::{IndexCatalog, IndexDescriptor, IndexHandle};
pub use collection::{
    status_label, type_label, Collection, CollectionId, CollectionInfo, CollectionStatus,
    CollectionType,
};
pub use engine::{BoxCursor, Cursor, Engine, MemoryEngine, QueryEngine, Statement, VecCursor};
pub use error::{IronQueryError, Result};
pub use geo::{GeoLocator, GeoQuery};
pub use logging::{get_log_level, init_from_env, set_log_level, LogLevel};
pub use mutation::{ExampleMutations, MutationOptions};
pub use sampling::{IterateOptions, SampleIter, TraversalMode};
pub use simple_query::{Example, IndexHint, IndexKind, QueryDescriptor, QueryKind, SimpleQuery};
