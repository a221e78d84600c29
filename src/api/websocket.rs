use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade, Message}},
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use futures::{SinkExt, StreamExt};
use crate::api::rest::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Rescans on every tick and pushes the ranking. Clients may send
/// `{"type":"amount","amount":12000}` to change the scanned amount.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut amount = state.default_amount;
    let mut update_ticker = interval(Duration::from_secs(state.update_interval.max(1)));
    let mut heartbeat_ticker = interval(Duration::from_secs(10));

    loop {
        tokio::select! {
            _ = update_ticker.tick() => {
                let result = state.scanner.lock().await.scan_opportunities(amount).await;
                let msg = match result {
                    Ok(scan) => serde_json::json!({
                        "type": "opportunity_update",
                        "count": scan.opportunities.len(),
                        "data": scan,
                    }),
                    Err(e) => serde_json::json!({
                        "type": "error",
                        "error": e.kind(),
                        "message": e.to_string(),
                    }),
                };

                match tokio::time::timeout(
                    Duration::from_secs(5),
                    sender.send(Message::Text(msg.to_string()))
                ).await {
                    Ok(Ok(_)) => {},
                    _ => return,
                }
            }

            _ = heartbeat_ticker.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    return;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match parse_command(&text) {
                        Some(Command::Amount(a)) => {
                            amount = a;
                            update_ticker.reset_immediately();
                        }
                        Some(Command::Ping) => {
                            let _ = sender.send(Message::Text(r#"{"type":"pong"}"#.to_string())).await;
                        }
                        None => tracing::debug!("ws: ignoring message {}", text),
                    },
                    Some(Ok(Message::Close(_))) | None => return,
                    _ => {}
                }
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Amount(f64),
    Ping,
}

/// Unknown messages and invalid amounts yield `None`.
fn parse_command(text: &str) -> Option<Command> {
    let cmd: serde_json::Value = serde_json::from_str(text).ok()?;
    match cmd["type"].as_str()? {
        "amount" => {
            let amount = match &cmd["amount"] {
                serde_json::Value::String(s) => crate::error::parse_amount(s).ok()?,
                v => crate::error::validate_amount(v.as_f64()?).ok()?,
            };
            Some(Command::Amount(amount))
        }
        "ping" => Some(Command::Ping),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_command_accepts_numbers_and_strings() {
        assert_eq!(parse_command(r#"{"type":"amount","amount":12000}"#), Some(Command::Amount(12000.0)));
        assert_eq!(parse_command(r#"{"type":"amount","amount":"12,000"}"#), Some(Command::Amount(12000.0)));
        assert_eq!(parse_command(r#"{"type":"amount","amount":0}"#), Some(Command::Amount(0.0)));
    }

    #[test]
    fn bad_amounts_are_ignored() {
        assert_eq!(parse_command(r#"{"type":"amount","amount":-1}"#), None);
        assert_eq!(parse_command(r#"{"type":"amount","amount":"abc"}"#), None);
        assert_eq!(parse_command(r#"{"type":"amount"}"#), None);
    }

    #[test]
    fn ping_and_noise() {
        assert_eq!(parse_command(r#"{"type":"ping"}"#), Some(Command::Ping));
        assert_eq!(parse_command(r#"{"type":"subscribe"}"#), None);
        assert_eq!(parse_command("not json"), None);
    }
}
