//! Browser front end. Every visitor gets their own game, keyed by a cookie,
//! and the page is re-rendered from a template after each action.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use cozy_chess::{File, Rank, Square};
use dashmap::DashMap;
use log::{error, info};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;
use tower_cookies::{cookie::SameSite, Cookie, CookieManagerLayer, Cookies};
use uuid::Uuid;

use crate::board::notation::{color_name, display_move, file_char, rank_char};
use crate::board::render::square_symbol;
use crate::eval::ScoreFn;
use crate::game::{Game, GameConfig, GameError, TurnState};
use crate::network::ValueNet;

pub const SESSION_COOKIE: &str = "valuebot_session";

const PAGE_TEMPLATE: &str = "game.html.tera";
const UNAVAILABLE_TEMPLATE: &str = "unavailable.html.tera";

/// Templates are compiled into the binary so it runs from any directory.
pub fn templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html.tera"]);
    tera.add_raw_templates(vec![
        ("base.html.tera", include_str!("../templates/base.html.tera")),
        (PAGE_TEMPLATE, include_str!("../templates/game.html.tera")),
        (UNAVAILABLE_TEMPLATE, include_str!("../templates/unavailable.html.tera")),
    ])?;
    Ok(tera)
}

/// The model every session plays with, or why there is none.
pub enum ModelSlot {
    Ready(Arc<ValueNet>),
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no model loaded")]
    Unavailable,
    #[error(transparent)]
    Game(#[from] GameError),
}

pub struct Session {
    pub game: Game<Arc<ValueNet>>,
    pub notice: Option<String>,
}

/// Bounds on how many games the server keeps in memory.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self { max_sessions: 1024, idle: Duration::from_secs(2 * 60 * 60) }
    }
}

struct SessionSlot {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    model: ModelSlot,
    config: GameConfig,
    limits: SessionLimits,
    tera: Tera,
    sessions: DashMap<Uuid, SessionSlot>,
}

impl AppState {
    pub fn new(model: ModelSlot, config: GameConfig) -> tera::Result<Self> {
        Self::with_limits(model, config, SessionLimits::default())
    }

    pub fn with_limits(model: ModelSlot, config: GameConfig, limits: SessionLimits) -> tera::Result<Self> {
        let inner = Inner { model, config, limits, tera: templates()?, sessions: DashMap::new() };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn session_count(&self) -> usize { self.inner.sessions.len() }

    // The map shard is only locked while the handle is looked up, never while
    // the game runs.
    fn session_handle(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, SessionError> {
        let ModelSlot::Ready(model) = &self.inner.model else {
            return Err(SessionError::Unavailable);
        };
        if let Some(mut slot) = self.inner.sessions.get_mut(&id) {
            slot.last_seen = Instant::now();
            return Ok(Arc::clone(&slot.session));
        }
        let game = Game::new(self.inner.config.clone(), Arc::clone(model))?;
        self.prune();
        let slot = self.inner.sessions.entry(id).or_insert_with(|| {
            info!("new session {}", id);
            SessionSlot { session: Arc::new(Mutex::new(Session { game, notice: None })), last_seen: Instant::now() }
        });
        Ok(Arc::clone(&slot.session))
    }

    // Drops idle sessions, then the least recently seen ones until a new one fits.
    fn prune(&self) {
        let idle = self.inner.limits.idle;
        self.inner.sessions.retain(|id, slot| {
            let keep = slot.last_seen.elapsed() < idle;
            if !keep { info!("session {} expired", id); }
            keep
        });
        let cap = self.inner.limits.max_sessions.max(1);
        while self.inner.sessions.len() >= cap {
            let oldest = self.inner.sessions.iter().min_by_key(|e| e.value().last_seen).map(|e| *e.key());
            let Some(id) = oldest else { break };
            self.inner.sessions.remove(&id);
            info!("session {} evicted", id);
        }
    }

    /// Runs `f` on the caller's session, creating it on first use.
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Result<T, SessionError> {
        let handle = self.session_handle(id)?;
        let mut session = handle.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&mut session))
    }
}

#[derive(Debug, Serialize)]
pub struct StateView {
    pub fen: String,
    pub side_to_move: &'static str,
    pub human: &'static str,
    pub status: TurnState,
    pub transcript: String,
    pub result: &'static str,
    pub last_move: Option<String>,
    pub legal_moves: Vec<String>,
    pub notice: Option<String>,
}

pub fn state_view<S: ScoreFn>(game: &Game<S>, notice: Option<&str>) -> StateView {
    let board = game.position().board();
    StateView {
        fen: game.position().fen(),
        side_to_move: color_name(board.side_to_move()),
        human: color_name(game.human()),
        status: game.state(),
        transcript: game.transcript(),
        result: game.result(),
        last_move: game.last_applied().map(|a| a.uci.clone()),
        legal_moves: if game.is_over() {
            Vec::new()
        } else {
            game.position().legal_moves().into_iter().map(|m| display_move(board, m)).collect()
        },
        notice: notice.map(str::to_string),
    }
}

#[derive(Serialize)]
struct CellView {
    glyph: &'static str,
    shade: &'static str,
    last: bool,
}

#[derive(Serialize)]
struct RowView {
    rank: char,
    cells: Vec<CellView>,
}

fn glyph(symbol: char) -> &'static str {
    match symbol {
        'K' => "♔", 'Q' => "♕", 'R' => "♖", 'B' => "♗", 'N' => "♘", 'P' => "♙",
        'k' => "♚", 'q' => "♛", 'r' => "♜", 'b' => "♝", 'n' => "♞", 'p' => "♟",
        _ => "",
    }
}

fn board_rows<S: ScoreFn>(game: &Game<S>) -> Vec<RowView> {
    let board = game.position().board();
    let last = game.last_applied().map(|a| a.mv);
    Rank::ALL
        .iter()
        .rev()
        .map(|&rank| RowView {
            rank: rank_char(rank),
            cells: File::ALL
                .iter()
                .map(|&file| {
                    let sq = Square::new(file, rank);
                    CellView {
                        glyph: glyph(square_symbol(board, sq)),
                        shade: if (file as u8 + rank as u8) % 2 == 0 { "dark" } else { "light" },
                        last: last.map_or(false, |m| m.from == sq || m.to == sq),
                    }
                })
                .collect(),
        })
        .collect()
}

fn status_text<S: ScoreFn>(game: &Game<S>) -> String {
    match game.state() {
        TurnState::AwaitingHuman => format!("Your move ({})", color_name(game.human())),
        TurnState::AwaitingAi => "AI is thinking".to_string(),
        TurnState::GameOver => match game.outcome() {
            Some(o) => format!("Game over: {}", o.describe()),
            None => format!("Game over: {}", game.result()),
        },
    }
}

/// The full game page for one session.
pub fn render_page<S: ScoreFn>(tera: &Tera, game: &Game<S>, notice: Option<&str>) -> tera::Result<String> {
    let mut context = Context::from_serialize(state_view(game, notice))?;
    context.insert("rows", &board_rows(game));
    context.insert("files", &File::ALL.map(file_char));
    context.insert("status_text", &status_text(game));
    tera.render(PAGE_TEMPLATE, &context)
}

/// Shown instead of any game when the model could not be loaded.
pub fn render_unavailable(tera: &Tera, reason: &str) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("reason", reason);
    tera.render(UNAVAILABLE_TEMPLATE, &context)
}

fn html(rendered: tera::Result<String>) -> Response {
    match rendered {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!("template failed: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn session_id(cookies: &Cookies) -> Uuid {
    if let Some(id) = cookies.get(SESSION_COOKIE).and_then(|c| Uuid::parse_str(c.value()).ok()) {
        return id;
    }
    let id = Uuid::new_v4();
    cookies.add(
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    );
    id
}

// Game work is synchronous and may be slow, so it runs off the async workers.
async fn blocking<F>(state: AppState, id: Uuid, f: F) -> Response
where
    F: FnOnce(&mut Session, &Tera) -> Response + Send + 'static,
{
    if let ModelSlot::Unavailable(reason) = &state.inner.model {
        return (StatusCode::SERVICE_UNAVAILABLE, html(render_unavailable(&state.inner.tera, reason))).into_response();
    }
    let worker = tokio::task::spawn_blocking(move || {
        let tera = &state.inner.tera;
        state.with_session(id, |session| f(session, tera))
    });
    match worker.await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            error!("session {}: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!("session {}: worker failed: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// An AI reply is triggered whenever the session is waiting on it.
fn advance_ai(session: &mut Session) {
    if let Err(e) = session.game.play_ai() {
        error!("ai turn failed: {}", e);
        session.notice = Some(format!("AI move failed: {e}"));
    }
}

async fn index(State(state): State<AppState>, cookies: Cookies) -> Response {
    let id = session_id(&cookies);
    blocking(state, id, |session, tera| {
        advance_ai(session);
        let notice = session.notice.take();
        html(render_page(tera, &session.game, notice.as_deref()))
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct MoveForm {
    pub mv: String,
}

async fn submit_move(State(state): State<AppState>, cookies: Cookies, Form(form): Form<MoveForm>) -> Response {
    let id = session_id(&cookies);
    blocking(state, id, move |session, _| {
        match session.game.submit_human(&form.mv) {
            Ok(_) => advance_ai(session),
            Err(e) => session.notice = Some(e.to_string()),
        }
        Redirect::to("/").into_response()
    })
    .await
}

async fn reset(State(state): State<AppState>, cookies: Cookies) -> Response {
    let id = session_id(&cookies);
    blocking(state, id, |session, _| {
        session.game.reset();
        session.notice = None;
        Redirect::to("/").into_response()
    })
    .await
}

async fn api_state(State(state): State<AppState>, cookies: Cookies) -> Response {
    let id = session_id(&cookies);
    blocking(state, id, |session, _| Json(state_view(&session.game, session.notice.as_deref())).into_response()).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/move", post(submit_move))
        .route("/reset", post(reset))
        .route("/api/state", get(api_state))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
