/// WebSocket endpoint serving one dashboard connection
use super::{encode, handle_client_text, initial_message};
use crate::handlers::AppState;
use crate::simulation::now_ms;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, state))
}

async fn serve_connection(socket: WebSocket, state: AppState) {
    let initial = match encode(&initial_message(&state.simulation, now_ms())) {
        Ok(frame) => frame,
        Err(e) => {
            error!(error = %e, "failed to encode initial snapshot");
            return;
        }
    };

    let mut subscription = state.hub.connect(initial);
    let Some(mut inbox) = subscription.take_inbox() else {
        return;
    };
    let outbox = subscription.outbox();
    let id = subscription.id();

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = inbox.recv().await {
            if sink.send(Message::Text(frame.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!(connection = id, "ignoring non-utf8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    // pings are answered by axum
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(connection = id, error = %e, "socket error");
                        break;
                    }
                };

                let Some(reply) = handle_client_text(&state.simulation, &text) else {
                    continue;
                };
                match encode(&reply) {
                    Ok(frame) => {
                        if outbox.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!(connection = id, error = %e, "failed to encode response"),
                }
            }
            _ = &mut writer => break,
        }
    }

    writer.abort();
    drop(subscription);
}
