/// All primary keys are UUIDs, generated in process.
pub type DbId = uuid::Uuid;

/// Opaque identifier of the user triggering a mutation. Never validated here.
pub type IdentityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a new time-ordered primary key.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
