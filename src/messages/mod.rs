use axum::{
    Router,
    routing::{get, put},
};

use crate::AppState;

mod history;
mod read;
pub mod store;

pub use store::Message;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history/{chat_id}", get(history::chat_history))
        .route("/message/read/{message_id}", put(read::mark_message_read))
}
