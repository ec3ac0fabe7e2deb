/// All serial primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Label primary keys are UUIDs, optionally chosen by the client.
pub type LabelId = uuid::Uuid;
