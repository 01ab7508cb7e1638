use serde::Serialize;
use uuid::Uuid;

/// Who is making a request. Built from a live session and handed explicitly
/// to every operation that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub session_id: Uuid,
}

impl Identity {
    pub fn owns(&self, owner_id: i64) -> bool {
        self.user_id == owner_id
    }
}
