use crate::errors::RelkitResult;
use crate::schema::{EntityType, Field, SchemaRegistry};

/// Read-only schema metadata consumed by the merge engine.
pub trait ISchemaReflector {
    fn entity_type(&self, name: &str) -> RelkitResult<&EntityType>;

    fn fields_of(&self, name: &str) -> RelkitResult<&[Field]> {
        Ok(&self.entity_type(name)?.fields)
    }

    fn field(&self, entity_type: &str, field: &str) -> RelkitResult<&Field>;

    /// The field on the far side of a relation, if it is not generic.
    fn remote_field(&self, field: &Field) -> Option<&Field>;

    fn composite_unique_field_groups(&self, name: &str) -> RelkitResult<&[Vec<String>]> {
        Ok(&self.entity_type(name)?.unique_together)
    }
}

impl ISchemaReflector for SchemaRegistry {
    fn entity_type(&self, name: &str) -> RelkitResult<&EntityType> {
        SchemaRegistry::entity_type(self, name)
    }

    fn field(&self, entity_type: &str, field: &str) -> RelkitResult<&Field> {
        SchemaRegistry::field(self, entity_type, field)
    }

    fn remote_field(&self, field: &Field) -> Option<&Field> {
        SchemaRegistry::remote_field(self, field)
    }
}
