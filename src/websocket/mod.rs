use std::fmt;

use uuid::Uuid;

pub mod broadcaster;
pub mod events;
pub mod registry;
pub mod session;

/// Unique identifier for one WebSocket connection
///
/// Assigned when a relay session joins. The registry and broadcaster key
/// their entries on it, which allows precise cleanup when connections close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
