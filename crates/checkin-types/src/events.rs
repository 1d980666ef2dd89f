use serde::{Deserialize, Serialize};

use crate::models::Bucket;

/// What happened to the directory. Carried by `GuestsChanged` so views can
/// show context, but every change means the same thing: re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    CheckedIn,
}

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DirectoryEvent {
    /// Sent once after the socket opens
    Ready,

    /// The directory changed; both listings and the full directory are stale
    GuestsChanged {
        kind: ChangeKind,
        guest_id: String,
        /// Bucket the guest is in after the change, if it still exists
        bucket: Option<Bucket>,
    },
}
