//! WebSocket endpoint for the call-control runtime

use super::AppState;
use crate::infrastructure::jambonz::{Connection, Outbound, SessionHandler, JAMBONZ_SUBPROTOCOL};
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// WebSocket handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query_args): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Response {
    ws.protocols([JAMBONZ_SUBPROTOCOL])
        .on_upgrade(move |socket| handle_socket(socket, state.handler, query_args))
}

/// Serve one runtime connection
async fn handle_socket(
    socket: WebSocket,
    handler: Arc<dyn SessionHandler>,
    query_args: HashMap<String, String>,
) {
    let connection_id = Uuid::new_v4();
    let span = info_span!("jambonz_ws", %connection_id);
    serve_connection(socket, handler, query_args)
        .instrument(span)
        .await
}

async fn serve_connection(
    socket: WebSocket,
    handler: Arc<dyn SessionHandler>,
    query_args: HashMap<String, String>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    info!("Runtime connected");

    // Writer: drains instructions queued by the session
    let send_task = tokio::spawn(
        async move {
            while let Some(outbound) = rx.recv().await {
                match outbound {
                    Outbound::Frame(text) => {
                        if sender.send(Message::Text(text)).await.is_err() {
                            debug!("Failed to send frame to runtime");
                            break;
                        }
                    }
                    Outbound::Close => {
                        let frame = CloseFrame {
                            code: close_code::NORMAL,
                            reason: "".into(),
                        };
                        let _ = sender.send(Message::Close(Some(frame))).await;
                        break;
                    }
                }
            }
        }
        .in_current_span(),
    );

    let mut connection = Connection::new(handler, query_args, tx);

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => connection.handle_text(&text).await,
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|f| (Some(f.code), f.reason.into_owned()))
                    .unwrap_or((None, String::new()));
                connection.handle_close(code, &reason);
                break;
            }
            Ok(Message::Binary(_)) => debug!("Ignoring binary frame"),
            // Axum answers pings itself
            Ok(_) => {}
            Err(e) => {
                connection.handle_transport_error(e.to_string());
                break;
            }
        }
    }

    connection.finish();
    // Dropping the connection releases the last sender, ending the writer
    drop(connection);
    let _ = send_task.await;

    info!("Runtime disconnected");
}
