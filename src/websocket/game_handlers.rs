use actix::prelude::*;
use actix_web_actors::ws;
use chess::Color;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::engine::coordinator::{dispatch, AnalysisRequest, AnalysisResponse};
use crate::game::position::Position;
use crate::game::{parse_color, parse_promotion, parse_square};
use crate::models::messages::{ClientMessage, ServerMessage};
use crate::session::Session;
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    pub fn handle_new_game(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let color = match msg.color_preference.as_deref() {
            None | Some("") | Some("random") => {
                if rand::random::<bool>() {
                    Color::White
                } else {
                    Color::Black
                }
            }
            Some(preference) => match parse_color(preference) {
                Some(color) => color,
                None => {
                    warn!("Invalid color preference: {}", preference);
                    self.send_error("Invalid color preference", ctx);
                    return;
                }
            },
        };

        self.game_id = Uuid::new_v4().to_string();
        info!("Starting game {} with human as {:?}", self.game_id, color);

        let mut session = Session::new(color);
        let request = session.begin();
        let response = ServerMessage::snapshot("game_started", &self.game_id, &session);
        self.session = Some(session);
        self.send(&response, ctx);

        if let Some(request) = request {
            self.dispatch_analysis(request, ctx);
        }
    }

    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (from, to) = match (
            msg.move_from.as_deref().and_then(parse_square),
            msg.move_to.as_deref().and_then(parse_square),
        ) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                warn!("Move missing or malformed: {:?} -> {:?}", msg.move_from, msg.move_to);
                self.send_error("Invalid move format", ctx);
                return;
            }
        };

        let promotion = match msg.promote_to.as_deref() {
            None => None,
            Some(code) => match parse_promotion(code) {
                Some(piece) => Some(piece),
                None => {
                    warn!("Invalid promotion piece: {}", code);
                    self.send_error("Invalid promotion piece", ctx);
                    return;
                }
            },
        };

        let Some(session) = self.session.as_mut() else {
            warn!("Move received before a game was started");
            self.send_error("No game in progress", ctx);
            return;
        };

        let outcome = session.on_user_gesture(from, to, promotion);
        let mut response = ServerMessage::snapshot("move_result", &self.game_id, session);
        response.accepted = Some(outcome.accepted);
        self.send(&response, ctx);

        if let Some(request) = outcome.request {
            self.dispatch_analysis(request, ctx);
        }
    }

    pub fn handle_retry(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            self.send_error("No game in progress", ctx);
            return;
        };

        let request = session.retry_analysis();
        let response = ServerMessage::snapshot("state", &self.game_id, session);
        self.send(&response, ctx);

        if let Some(request) = request {
            self.dispatch_analysis(request, ctx);
        }
    }

    pub fn handle_get_moves(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(from) = msg.move_from.as_deref().and_then(parse_square) else {
            warn!("Invalid square for get_moves: {:?}", msg.move_from);
            self.send_error("Invalid square format", ctx);
            return;
        };
        let Some(session) = self.session.as_ref() else {
            self.send_error("No game in progress", ctx);
            return;
        };

        let mut response = ServerMessage::snapshot("available_moves", &self.game_id, session);
        response.available_moves = Some(session.legal_targets(from).iter().map(|sq| sq.to_string()).collect());
        self.send(&response, ctx);
    }

    pub fn handle_load_fen(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let position: Position = match msg.fen.as_deref().unwrap_or_default().parse() {
            Ok(position) => position,
            Err(e) => {
                warn!("Rejected position: {}", e);
                self.send_error(format!("{e}"), ctx);
                return;
            }
        };
        let Some(session) = self.session.as_mut() else {
            self.send_error("No game in progress", ctx);
            return;
        };

        let request = session.load_position(position);
        let response = ServerMessage::snapshot("state", &self.game_id, session);
        self.send(&response, ctx);

        if let Some(request) = request {
            self.dispatch_analysis(request, ctx);
        }
    }

    /// Ask the engine in the background; the answer comes back into this actor.
    fn dispatch_analysis(&mut self, request: AnalysisRequest, ctx: &mut ws::WebsocketContext<Self>) {
        let game_id = self.game_id.clone();
        let fut = dispatch(self.app_state.engine.clone(), request, self.app_state.policy);

        ctx.spawn(fut.into_actor(self).map(move |response, act, ctx| {
            if act.game_id != game_id {
                debug!("Dropping engine answer #{} for finished game {}", response.request.seq(), game_id);
                return;
            }
            act.handle_engine_response(response, ctx);
        }));
    }

    fn handle_engine_response(&mut self, response: AnalysisResponse, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let stale = response.request.fingerprint() != session.current_position();
        let next = session.on_engine_response(response);
        if stale {
            return;
        }

        let response = ServerMessage::snapshot("engine_move", &self.game_id, session);
        self.send(&response, ctx);

        if let Some(request) = next {
            self.dispatch_analysis(request, ctx);
        }
    }
}
