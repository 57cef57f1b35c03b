//! Fan-out to a set of recipients (spec.md §4.4).
//!
//! The packet is serialized once (implicitly, via `ServerFrame::clone` --
//! cheap, since payloads are small JSON values) and handed to each
//! recipient's own writer task. A dead recipient's channel being closed
//! doesn't stop the rest of the broadcast; there's no delivery
//! acknowledgment and no ordering guarantee across distinct recipients.

use std::sync::Arc;

use crate::protocol::ServerFrame;
use crate::registry::ClientHandle;

pub fn broadcast(recipients: &[Arc<ClientHandle>], frame: ServerFrame) {
    for recipient in recipients {
        recipient.send(frame.clone());
    }
}
