use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use cozy_chess::Color;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use valuebot::game::GameConfig;
use valuebot::network::ValueNet;
use valuebot::web::{router, AppState, ModelSlot, SESSION_COOKIE};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    location: Option<String>,
    body: String,
}

fn ready(human: Color) -> AppState {
    let config = GameConfig { human, fen: None };
    AppState::new(ModelSlot::Ready(Arc::new(ValueNet::seeded(9))), config).expect("templates compile")
}

async fn send(state: &AppState, req: Request<Body>) -> Reply {
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let header_str = |name| resp.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let cookie = header_str(header::SET_COOKIE).and_then(|c| c.split(';').next().map(str::to_string));
    let location = header_str(header::LOCATION);
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    Reply { status, cookie, location, body: String::from_utf8(bytes.to_vec()).unwrap() }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie { b = b.header(header::COOKIE, c); }
    b.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(c) = cookie { b = b.header(header::COOKIE, c); }
    b.body(Body::from(form.to_string())).unwrap()
}

async fn new_session(state: &AppState) -> String {
    let reply = send(state, get("/", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let cookie = reply.cookie.expect("session cookie");
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")), "{cookie}");
    cookie
}

async fn api_state(state: &AppState, cookie: &str) -> Value {
    let reply = send(state, get("/api/state", Some(cookie))).await;
    assert_eq!(reply.status, StatusCode::OK);
    serde_json::from_str(&reply.body).expect("json state")
}

#[tokio::test]
async fn first_visit_gets_a_board_and_a_cookie() {
    let state = ready(Color::White);
    let reply = send(&state, get("/", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.cookie.is_some());
    assert!(reply.body.contains("<h1>ValueBot</h1>"));
    assert!(reply.body.contains("♔"));
    assert!(reply.body.contains("action=\"/move\""));
}

#[tokio::test]
async fn move_is_answered_by_the_ai() {
    let state = ready(Color::White);
    let cookie = new_session(&state).await;

    let reply = send(&state, post("/move", Some(&cookie), "mv=e2e4")).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/"));

    let view = api_state(&state, &cookie).await;
    assert_eq!(view["status"], "AwaitingHuman");
    assert_eq!(view["side_to_move"], "White");
    assert_eq!(view["human"], "White");
    assert_eq!(view["result"], "*");
    let transcript = view["transcript"].as_str().unwrap();
    assert!(transcript.starts_with("1. e4 "), "{transcript}");
    assert_eq!(transcript.split_whitespace().count(), 3);
    assert!(view["last_move"].is_string());
    assert_eq!(view["legal_moves"].as_array().map(|m| m.is_empty()), Some(false));
    assert!(view["notice"].is_null());
}

#[tokio::test]
async fn reset_clears_the_history() {
    let state = ready(Color::White);
    let cookie = new_session(&state).await;
    send(&state, post("/move", Some(&cookie), "mv=d2d4")).await;

    let reply = send(&state, post("/reset", Some(&cookie), "")).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let view = api_state(&state, &cookie).await;
    assert_eq!(view["transcript"], "");
    assert_eq!(view["fen"], START_FEN);
    assert!(view["last_move"].is_null());
}

#[tokio::test]
async fn rejected_input_is_shown_once_and_escaped() {
    let state = ready(Color::White);
    let cookie = new_session(&state).await;
    send(&state, post("/move", Some(&cookie), "mv=%3Cb%3E")).await;

    let view = api_state(&state, &cookie).await;
    assert!(view["notice"].as_str().unwrap().contains("<b>"));
    assert_eq!(view["transcript"], "");

    let page = send(&state, get("/", Some(&cookie))).await;
    assert!(page.body.contains("&lt;b&gt;"), "{}", page.body);
    let view = api_state(&state, &cookie).await;
    assert!(view["notice"].is_null());
}

#[tokio::test]
async fn cookies_keep_games_apart() {
    let state = ready(Color::White);
    let a = new_session(&state).await;
    let b = new_session(&state).await;
    assert_ne!(a, b);
    send(&state, post("/move", Some(&a), "mv=e2e4")).await;
    assert_eq!(api_state(&state, &b).await["transcript"], "");
    assert_ne!(api_state(&state, &a).await["transcript"], "");
    assert_eq!(state.session_count(), 2);
}

#[tokio::test]
async fn ai_opens_for_a_black_human() {
    let state = ready(Color::Black);
    let cookie = new_session(&state).await;
    let view = api_state(&state, &cookie).await;
    assert_eq!(view["side_to_move"], "Black");
    assert_eq!(view["status"], "AwaitingHuman");
    assert!(view["transcript"].as_str().unwrap().starts_with("1. "));
}

#[tokio::test]
async fn missing_model_blocks_every_route() {
    let state = AppState::new(ModelSlot::Unavailable("weights file not found: w.bin".into()), GameConfig::default())
        .expect("templates compile");
    let requests = [
        get("/", None),
        get("/api/state", None),
        post("/move", None, "mv=e2e4"),
        post("/reset", None, ""),
    ];
    for req in requests {
        let reply = send(&state, req).await;
        assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(reply.body.contains("Model not available: weights file not found: w.bin"), "{}", reply.body);
    }
    assert_eq!(state.session_count(), 0);
}
