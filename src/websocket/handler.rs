use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::{AppState, ClientMessage, ServerMessage};
use crate::session::Session;

/// One browser tab playing one game against the engine.
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    /// Changes on every `new_game`; engine answers for an older id are dropped.
    pub game_id: String,
    pub session: Option<Session>,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            app_state,
            game_id: String::new(),
            session: None,
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let Some(session) = &self.session {
            info!(
                "Dropping game {} at {} ({})",
                self.game_id,
                session.current_position(),
                session.status_text()
            );
        }
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send_error(format!("Invalid message format: {e}"), ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_error("Binary messages are not supported", ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "new_game" => self.handle_new_game(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "retry" => self.handle_retry(ctx),
            "get_moves" => self.handle_get_moves(msg, ctx),
            "load_fen" => self.handle_load_fen(msg, ctx),
            _ => {
                warn!("Unknown message type: {}", msg.message_type);
                self.send_error("Unknown message type", ctx);
            }
        }
    }

    pub fn send(&self, message: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                warn!("Failed to serialize {} message: {}", message.message_type, e);
                ctx.text("{\"message_type\": \"error\", \"error\": \"Internal server error\"}");
            }
        }
    }

    pub fn send_error(&self, error: impl Into<String>, ctx: &mut ws::WebsocketContext<Self>) {
        let game_id = (!self.game_id.is_empty()).then_some(self.game_id.as_str());
        self.send(&ServerMessage::error(game_id, error), ctx);
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    info!("New WebSocket connection request");
    ws::start(ChessWebSocket::new(app_state), &req, stream)
}
