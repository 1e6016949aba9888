mod reflector;
mod storage;

pub use reflector::ISchemaReflector;
pub use storage::IEntityStorage;
