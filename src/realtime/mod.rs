//! The realtime core: who is connected, how a message reaches them, and
//! when a sender learns that everyone has read it.

use axum::{Router, routing::get};

use crate::AppState;

pub mod fanout;
mod notice;
pub mod receipts;
mod registry;
mod ws;

pub use notice::Notice;
pub use registry::{ConnectionRegistry, SessionId, SessionSender};

pub fn router() -> Router<AppState> {
    Router::new().route("/ws/{user_id}/{chat_id}", get(ws::chat_ws))
}
