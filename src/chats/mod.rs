use axum::{Router, routing::post};

use crate::AppState;

pub mod members;
mod new;

pub use new::create_chat;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chats", post(new::create_chat_handler))
        .route(
            "/chats/{chat_id}/members",
            post(members::add_member_handler).get(members::list_members_handler),
        )
}
