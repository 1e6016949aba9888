/// Errors raised while building or querying the schema registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown entity type: {name}")]
    UnknownType { name: String },

    #[error("unknown field '{field}' on {entity_type}")]
    UnknownField { entity_type: String, field: String },

    #[error("invalid relation '{relation}' on {entity_type}: {reason}")]
    InvalidRelation {
        entity_type: String,
        relation: String,
        reason: String,
    },

    #[error("duplicate field '{field}' on {entity_type}")]
    DuplicateField { entity_type: String, field: String },

    #[error("invalid uniqueness constraint on {entity_type}: {reason}")]
    InvalidConstraint { entity_type: String, reason: String },
}
