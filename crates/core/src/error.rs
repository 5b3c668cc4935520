#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A signature is missing fields that must be present before export.
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingRequiredField { fields: Vec<&'static str> },

    #[error("Unknown template '{0}'")]
    InvalidTemplate(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
