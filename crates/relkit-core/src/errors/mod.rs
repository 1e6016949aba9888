//! Error taxonomy. `RelkitError` is the crate-wide error; subsystem enums
//! convert into it with `?`.

mod consolidation_error;
mod relkit_error;
mod schema_error;
mod storage_error;

pub use consolidation_error::ConsolidationError;
pub use relkit_error::{RelkitError, RelkitResult};
pub use schema_error::SchemaError;
pub use storage_error::StorageError;
