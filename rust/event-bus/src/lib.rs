//! Per-document pub/sub for workflow status, node, content, and metrics
//! events (§4.5). Each subscriber owns an independent buffered channel;
//! `publish` fans an event out to every current subscriber of a document
//! and prunes any whose receiver has gone away.

mod bus;
mod types;

pub use bus::{EventBus, Subscription};
pub use types::{Event, EventKind, NodeSnapshot};
