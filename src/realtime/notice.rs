use std::fmt;

use crate::{MessageId, UserId};

/// Everything the server pushes down a realtime session, rendered as
/// plain text on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Fanned out to every chat member except the sender.
    NewMessage { sender_id: UserId, text: String },
    /// Sent back to the sender once their message is persisted.
    Delivered { text: String },
    /// Sent back to the sender when their message was a duplicate.
    DuplicateRejected,
    /// Sent to the sender when the last required reader acknowledged.
    FullyRead { message_id: MessageId },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NewMessage { sender_id, text } => {
                write!(f, "new message from {sender_id}: {text}")
            }
            Notice::Delivered { text } => write!(f, "delivery confirmed: '{text}'"),
            Notice::DuplicateRejected => write!(f, "duplicate rejected: message already sent"),
            Notice::FullyRead { message_id } => write!(f, "message {message_id} fully read"),
        }
    }
}
