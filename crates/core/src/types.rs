/// User primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Signatures are addressed by an opaque UUID.
pub type SignatureId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
