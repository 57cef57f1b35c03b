use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::handlers::Context;
use crate::protocol::{ClientFrame, ServerFrame, SignalError};
use crate::registry::{ClientHandle, ClientState, Outbound};
use crate::state_machine::update_state;

use super::routes::AppState;

pub(super) async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    ugi: Option<String>,
    token: Option<String>,
) {
    let (mut sender, mut receiver) = socket.split();

    let Some(game) = ugi.filter(|g| !g.is_empty()) else {
        let _ = sender
            .send(Message::Text(
                serde_json::to_string(&ServerFrame::new("VIOLATION", "No Game ID provided"))
                    .unwrap()
                    .into(),
            ))
            .await;
        let _ = close_with_reason(&mut sender, "No Game ID provided").await;
        return;
    };

    let token_was_present = token.as_deref().is_some_and(|t| !t.is_empty());

    // Upgrade-time claims (spec.md §3's `authedWithCookie`): a present
    // `token` validated before `INIT` establishes identity up front, the
    // way the original's cookie-session middleware does, and derives the
    // instance id from that identity rather than a fresh random one so
    // the duplicate-session check in `register_client` has something
    // real to reject (spec.md §9).
    let preauth = token
        .as_deref()
        .filter(|t| !t.is_empty())
        .and_then(|t| state.auth.validate(t).ok());

    let instance_id = match &preauth {
        Some(claims) => format!("{}_{}", claims.user_id, game),
        None => format!("{}_{}", Uuid::now_v7(), game),
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let client = Arc::new(ClientHandle::new(
        instance_id.clone(),
        game.clone(),
        token_was_present,
        preauth.is_some(),
        tx,
    ));
    if let Some(claims) = preauth {
        client.set_identity(claims.user_id, claims.username);
    }

    if let Err(err) = state.registry.register_client(client.clone()) {
        let _ = sender
            .send(Message::Text(
                serde_json::to_string(&ServerFrame::new("VIOLATION", err.to_string()))
                    .unwrap()
                    .into(),
            ))
            .await;
        let _ = close_with_reason(&mut sender, &err.to_string()).await;
        return;
    }

    tracing::info!(instance_id = %client.instance_id, game = %game, "client connected");

    let writer = tokio::spawn(writer_task(sender, rx));

    let ctx = Context {
        registry: state.registry.clone(),
        relay_spawner: state.relay_spawner.clone(),
        auth: state.auth.clone(),
        client: client.clone(),
        keepalive_payload_len: state.config.keepalive_payload_len,
    };
    let max_message_bytes = state.config.max_message_bytes;

    read_loop(&ctx, &mut receiver, max_message_bytes).await;

    cleanup(&state, &client);
    drop(ctx);
    let _ = writer.await;
}

async fn read_loop(
    ctx: &Context,
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    max_message_bytes: usize,
) {
    loop {
        let message = match receiver.next().await {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                tracing::warn!(instance_id = %ctx.client.instance_id, error = %err, "websocket read error");
                break;
            }
            None => break,
        };

        match message {
            Message::Text(text) => {
                if text.len() > max_message_bytes {
                    close_connection(
                        ctx,
                        SignalError::violation(format!(
                            "message exceeds {max_message_bytes} byte limit"
                        )),
                    );
                    break;
                }
                if !dispatch_text(ctx, &text).await {
                    break;
                }
            }
            Message::Binary(_) => {
                close_connection(ctx, SignalError::violation("binary frames are not supported"));
                break;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Parses and dispatches one text frame. Returns `false` if the
/// connection should close (a protocol violation or internal error).
async fn dispatch_text(ctx: &Context, text: &str) -> bool {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            close_connection(ctx, SignalError::violation(format!("malformed frame: {err}")));
            return false;
        }
    };

    match ctx.dispatch(frame).await {
        Ok(()) => true,
        Err(err) => {
            close_connection(ctx, err);
            false
        }
    }
}

fn close_connection(ctx: &Context, err: SignalError) {
    let reason = err.close_reason();
    if let SignalError::Internal(ref e) = err {
        tracing::error!(instance_id = %ctx.client.instance_id, error = %e, "internal error handling frame");
    }
    ctx.client.send(ServerFrame::new("VIOLATION", reason.clone()));
    ctx.client.close("VIOLATION", reason);
}

fn cleanup(state: &Arc<AppState>, client: &Arc<ClientHandle>) {
    if client.state() == ClientState::Destroyed {
        return;
    }
    let lobby = client
        .lobby_name()
        .and_then(|name| state.registry.find_lobby(&client.game, &name));
    update_state(&state.registry, lobby.as_ref(), client, ClientState::Destroyed);
    tracing::info!(instance_id = %client.instance_id, "client disconnected");
}

async fn writer_task(
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Frame(frame) => {
                let Ok(text) = serde_json::to_string(&frame) else {
                    continue;
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            Outbound::Close { reason, .. } => {
                let _ = close_with_reason(&mut sender, &reason).await;
                break;
            }
        }
    }
}

async fn close_with_reason(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    reason: &str,
) -> Result<(), axum::Error> {
    sender
        .send(Message::Close(Some(CloseFrame {
            code: axum::extract::ws::close_code::AWAY,
            reason: reason.to_string().into(),
        })))
        .await
}
