use axum::{
    debug_handler,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{CloseFrame, Message as WsMessage, WebSocket, close_code},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{AppError, AppResult, ChatId, UserId, chats, realtime::fanout};

use super::ConnectionRegistry;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    Path((user_id, chat_id)): Path<(UserId, ChatId)>,
    State(db_pool): State<SqlitePool>,
    State(registry): State<ConnectionRegistry>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, db_pool, registry, user_id, chat_id))
}

/// Admission gate: only chat members may open a session.
async fn admit(db_pool: &SqlitePool, user_id: UserId, chat_id: ChatId) -> AppResult<()> {
    if chats::members::is_member(db_pool, chat_id, user_id).await? {
        Ok(())
    } else {
        Err(AppError::AdmissionDenied)
    }
}

/// One task per session: admit, register, pump inbound text through the
/// delivery router until the peer goes away, then unregister. The
/// registry entry is released on every exit path.
async fn handle_session(
    mut socket: WebSocket,
    db_pool: SqlitePool,
    registry: ConnectionRegistry,
    user_id: UserId,
    chat_id: ChatId,
) {
    match admit(&db_pool, user_id, chat_id).await {
        Ok(()) => {}
        Err(err) => {
            let code = match err {
                AppError::AdmissionDenied => close_code::POLICY,
                _ => close_code::ERROR,
            };
            warn!(user_id, chat_id, %err, "session refused");
            let _ = socket
                .send(WsMessage::Close(Some(CloseFrame {
                    code,
                    reason: err.to_string().into(),
                })))
                .await;
            return;
        }
    }

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let session_id = registry.register(user_id, tx).await;
    info!(user_id, chat_id, session_id, "session active");

    // forwards registry pushes into the socket; dropping it lets the
    // registry notice this session is gone on the next push
    let mut forward = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut forward => break,
            inbound = stream.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    // duplicates are answered inside the router; a store
                    // failure ends nothing but this one message
                    if let Err(err) =
                        fanout::route(&db_pool, &registry, chat_id, user_id, text.as_str()).await
                    {
                        warn!(user_id, chat_id, %err, "inbound message not routed");
                    }
                }
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    forward.abort();
    registry.unregister(user_id, session_id).await;
    info!(user_id, session_id, "session closed");
}
