//! Router tests: each request goes through the full axum stack against an
//! in-memory `SqliteStore`.

use std::{net::SocketAddr, time::Duration};

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use futures_util::StreamExt as _;
use meettrip_core::{
  message::{Message, NewMessage},
  store::TravelStore as _,
};
use meettrip_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiConfig, AppState, api_router};

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(store, ApiConfig::default())
}

async fn call(
  state:  &AppState<SqliteStore>,
  method: Method,
  uri:    &str,
  token:  Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

struct User {
  id:    Uuid,
  token: String,
}

async fn sign_up(state: &AppState<SqliteStore>, name: &str) -> User {
  let email = format!("{}@example.com", name.to_lowercase());
  let (status, _) = call(
    state,
    Method::POST,
    "/auth/signup",
    None,
    Some(json!({ "email": email, "password": "segredo", "name": name, "age": 28 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = call(
    state,
    Method::POST,
    "/auth/login",
    None,
    Some(json!({ "email": email, "password": "segredo" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  User {
    id:    uuid(&body["user_id"]),
    token: body["token"].as_str().unwrap().to_owned(),
  }
}

async fn create_trip(
  state: &AppState<SqliteStore>,
  user: &User,
  destination: &str,
  start: &str,
  end: &str,
) -> Uuid {
  let (status, body) = call(
    state,
    Method::POST,
    "/trips",
    Some(&user.token),
    Some(json!({
      "destination": destination,
      "destination_country": "França",
      "start_date": start,
      "end_date": end,
      "travel_style": ["Cultural"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  uuid(&body["trip_id"])
}

async fn swipe(
  state: &AppState<SqliteStore>,
  actor: &User,
  target: &User,
  trip_id: Uuid,
  action: &str,
) -> (StatusCode, Value) {
  call(
    state,
    Method::POST,
    "/swipes",
    Some(&actor.token),
    Some(json!({ "target_user_id": target.id, "trip_id": trip_id, "action": action })),
  )
  .await
}

fn uuid(v: &Value) -> Uuid { Uuid::parse_str(v.as_str().unwrap()).unwrap() }

/// Sign up two users with Paris trips who like each other. Returns the match id.
async fn matched_pair(state: &AppState<SqliteStore>) -> (User, User, Uuid) {
  let ana = sign_up(state, "Ana").await;
  let bia = sign_up(state, "Bia").await;
  let ana_trip = create_trip(state, &ana, "Paris, France", "2025-06-15", "2025-06-25").await;
  let bia_trip = create_trip(state, &bia, "Paris, France", "2025-06-16", "2025-06-24").await;
  swipe(state, &ana, &bia, bia_trip, "like").await;
  let (_, body) = swipe(state, &bia, &ana, ana_trip, "like").await;
  let match_id = uuid(&body["match"]["match_id"]);
  (ana, bia, match_id)
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_validates_input() {
  let state = make_state().await;
  let cases = [
    json!({ "email": "kid@example.com", "password": "segredo", "name": "Kid", "age": 17 }),
    json!({ "email": "ana@example.com", "password": "123", "name": "Ana", "age": 30 }),
    json!({ "email": "not-an-email", "password": "segredo", "name": "Ana", "age": 30 }),
    json!({ "email": "ana@example.com", "password": "segredo", "name": "  ", "age": 30 }),
  ];
  for body in cases {
    let (status, resp) = call(&state, Method::POST, "/auth/signup", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].is_string());
  }
}

#[tokio::test]
async fn signup_applies_default_photo_and_rejects_duplicates() {
  let state = make_state().await;
  let body = json!({ "email": "Ana@Example.com", "password": "segredo", "name": "Ana", "age": 30 });

  let (status, profile) = call(&state, Method::POST, "/auth/signup", None, Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(profile["photo_url"].as_str().unwrap().starts_with("https://"));

  let (status, _) = call(&state, Method::POST, "/auth/signup", None, Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
  let state = make_state().await;
  sign_up(&state, "Ana").await;

  let (status, _) = call(
    &state,
    Method::POST,
    "/auth/login",
    None,
    Some(json!({ "email": "ana@example.com", "password": "errado" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = call(
    &state,
    Method::POST,
    "/auth/login",
    None,
    Some(json!({ "email": "ghost@example.com", "password": "segredo" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_lives_until_logout() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;

  let (status, body) = call(&state, Method::GET, "/auth/session", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(uuid(&body["user_id"]), ana.id);

  let (status, _) = call(&state, Method::POST, "/auth/logout", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(&state, Method::GET, "/auth/session", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gated_routes_require_a_session() {
  let state = make_state().await;
  let id = Uuid::new_v4();
  for uri in [
    "/profile".to_owned(),
    "/trips".to_owned(),
    "/discover".to_owned(),
    "/matches".to_owned(),
    format!("/matches/{id}/live"),
  ] {
    let (status, body) = call(&state, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    assert_eq!(body["error"], "unauthorized");
  }

  let (status, _) = call(&state, Method::GET, "/profile", Some("made-up"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_update_round_trip() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;

  let (status, body) = call(
    &state,
    Method::PUT,
    "/profile",
    Some(&ana.token),
    Some(json!({
      "name": "Ana Souza",
      "age": 29,
      "bio": "Sempre com a mochila pronta",
      "languages": ["Português", "Klingon", "Português"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Ana Souza");
  // Unknown vocabulary is accepted; duplicates collapse.
  assert_eq!(body["languages"], json!(["Português", "Klingon"]));

  let (status, _) = call(
    &state,
    Method::PUT,
    "/profile",
    Some(&ana.token),
    Some(json!({ "name": "Ana", "age": 16 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let bia = sign_up(&state, "Bia").await;
  let (status, body) = call(
    &state,
    Method::GET,
    &format!("/profiles/{}", ana.id),
    Some(&bia.token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["bio"], "Sempre com a mochila pronta");
}

#[tokio::test]
async fn vocabulary_lists_pick_lists() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let (status, body) = call(&state, Method::GET, "/vocabulary", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::OK);
  for key in ["languages", "profile_interests", "trip_interests", "travel_styles"] {
    assert!(!body[key].as_array().unwrap().is_empty(), "{key}");
  }
}

// ─── Trips ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn trip_validation_and_ownership() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let bia = sign_up(&state, "Bia").await;

  let (status, _) = call(
    &state,
    Method::POST,
    "/trips",
    Some(&ana.token),
    Some(json!({
      "destination": "Paris, France",
      "destination_country": "França",
      "start_date": "2025-06-25",
      "end_date": "2025-06-15",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let trip = create_trip(&state, &ana, "Paris, France", "2025-06-15", "2025-06-25").await;
  let (status, _) = call(&state, Method::DELETE, &format!("/trips/{trip}"), Some(&bia.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(
    &state,
    Method::POST,
    &format!("/trips/{trip}/status"),
    Some(&ana.token),
    Some(json!({ "status": "completed" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "completed");

  let (status, _) = call(&state, Method::DELETE, &format!("/trips/{trip}"), Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&state, Method::GET, &format!("/trips/{trip}"), Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trip_list_carries_match_counts() {
  let state = make_state().await;
  let (ana, _bia, match_id) = matched_pair(&state).await;

  let (_, m) = call(&state, Method::GET, &format!("/matches/{match_id}"), Some(&ana.token), None).await;
  let context = uuid(&m["match"]["trip_id"]);

  let (status, body) = call(&state, Method::GET, "/trips", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::OK);
  let trips = body.as_array().unwrap();
  assert_eq!(trips.len(), 1);
  let expected = u64::from(uuid(&trips[0]["trip_id"]) == context);
  assert_eq!(trips[0]["match_count"], expected);
}

// ─── Discovery & swipes ──────────────────────────────────────────────────────

#[tokio::test]
async fn discover_requires_an_active_trip() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let (status, body) = call(&state, Method::GET, "/discover", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "create a trip first");
}

#[tokio::test]
async fn passing_hides_the_person_for_every_trip() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let bia = sign_up(&state, "Bia").await;
  create_trip(&state, &ana, "Roma", "2025-07-01", "2025-07-10").await;
  let bia_roma = create_trip(&state, &bia, "Roma", "2025-07-02", "2025-07-09").await;
  create_trip(&state, &bia, "Lisboa", "2025-08-01", "2025-08-05").await;

  let (_, deck) = call(&state, Method::GET, "/discover", Some(&ana.token), None).await;
  assert_eq!(deck["candidates"].as_array().unwrap().len(), 1);

  let (status, _) = swipe(&state, &ana, &bia, bia_roma, "pass").await;
  assert_eq!(status, StatusCode::CREATED);

  // Ana's next trip goes to Lisboa, where Bia also travels.
  let (_, trips) = call(&state, Method::GET, "/trips", Some(&ana.token), None).await;
  let roma = uuid(&trips[0]["trip_id"]);
  call(&state, Method::DELETE, &format!("/trips/{roma}"), Some(&ana.token), None).await;
  create_trip(&state, &ana, "Lisboa", "2025-08-01", "2025-08-05").await;

  let (_, deck) = call(&state, Method::GET, "/discover", Some(&ana.token), None).await;
  assert_eq!(deck["trip"]["destination"], "Lisboa");
  assert!(deck["candidates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn swipe_rules() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let bia = sign_up(&state, "Bia").await;
  let ana_trip = create_trip(&state, &ana, "Paris, France", "2025-06-15", "2025-06-25").await;
  let bia_trip = create_trip(&state, &bia, "Paris, France", "2025-06-16", "2025-06-24").await;

  let (status, _) = swipe(&state, &ana, &ana, ana_trip, "like").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = swipe(&state, &ana, &bia, ana_trip, "like").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = swipe(&state, &ana, &bia, Uuid::new_v4(), "like").await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = swipe(&state, &ana, &bia, bia_trip, "like").await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body["match"].is_null());

  let (status, _) = swipe(&state, &ana, &bia, bia_trip, "like").await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn paris_scenario() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let bia = sign_up(&state, "Bia").await;
  let caio = sign_up(&state, "Caio").await;

  let ana_trip = create_trip(&state, &ana, "Paris, France", "2025-06-15", "2025-06-25").await;
  let bia_trip = create_trip(&state, &bia, "Paris, France", "2025-06-16", "2025-06-24").await;
  let caio_trip = create_trip(&state, &caio, "Paris, France", "2025-06-10", "2025-06-20").await;

  // Ana sees Bia then Caio, in storage order.
  let (status, deck) = call(&state, Method::GET, "/discover", Some(&ana.token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(uuid(&deck["trip"]["trip_id"]), ana_trip);
  let owners: Vec<Uuid> = deck["candidates"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| uuid(&c["profile"]["profile_id"]))
    .collect();
  assert_eq!(owners, vec![bia.id, caio.id]);

  let (_, body) = swipe(&state, &ana, &caio, caio_trip, "pass").await;
  assert!(body["match"].is_null());
  let (_, body) = swipe(&state, &ana, &bia, bia_trip, "like").await;
  assert!(body["match"].is_null());

  let (_, next) = call(&state, Method::GET, "/discover/next", Some(&ana.token), None).await;
  assert!(next.is_null());

  // Bia likes Ana back: one match.
  let (_, body) = swipe(&state, &bia, &ana, ana_trip, "like").await;
  let match_id = uuid(&body["match"]["match_id"]);

  for user in [&ana, &bia] {
    let (_, list) = call(&state, Method::GET, "/matches", Some(&user.token), None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(uuid(&list[0]["match"]["match_id"]), match_id);
    assert_eq!(list[0]["trip"]["destination"], "Paris, France");
  }
  let (_, list) = call(&state, Method::GET, "/matches", Some(&caio.token), None).await;
  assert!(list.as_array().unwrap().is_empty());

  // Bia has the conversation open when Ana says hello.
  let mut bia_view = state.live.subscribe(match_id);
  let (status, sent) = call(
    &state,
    Method::POST,
    &format!("/matches/{match_id}/messages"),
    Some(&ana.token),
    Some(json!({ "content": "  Oi!  " })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(sent["seq"], 1);

  let pushed = bia_view.try_recv().unwrap();
  assert_eq!(pushed.content, "Oi!");
  assert_eq!(pushed.sender_id, ana.id);

  let (_, list) = call(&state, Method::GET, "/matches", Some(&bia.token), None).await;
  assert_eq!(list[0]["unread_count"], 1);
  assert_eq!(list[0]["counterpart"]["name"], "Ana");

  let (status, convo) = call(
    &state,
    Method::GET,
    &format!("/matches/{match_id}"),
    Some(&bia.token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(uuid(&convo["counterpart"]["profile_id"]), ana.id);
  assert_eq!(convo["messages"][0]["content"], "Oi!");
  assert_eq!(convo["messages"][0]["read"], true);

  let (_, list) = call(&state, Method::GET, "/matches", Some(&bia.token), None).await;
  assert_eq!(list[0]["unread_count"], 0);
}

// ─── Conversation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_messages_are_dropped() {
  let state = make_state().await;
  let (ana, _bia, match_id) = matched_pair(&state).await;
  let mut view = state.live.subscribe(match_id);

  let (status, body) = call(
    &state,
    Method::POST,
    &format!("/matches/{match_id}/messages"),
    Some(&ana.token),
    Some(json!({ "content": " \n\t " })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert!(body.is_null());
  assert!(view.try_recv().is_err());

  let (_, messages) = call(
    &state,
    Method::GET,
    &format!("/matches/{match_id}/messages"),
    Some(&ana.token),
    None,
  )
  .await;
  assert!(messages.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn message_cursor_and_read_marking() {
  let state = make_state().await;
  let (ana, bia, match_id) = matched_pair(&state).await;
  let uri = format!("/matches/{match_id}/messages");

  for (user, text) in [(&ana, "Oi!"), (&bia, "Olá!"), (&bia, "Chego dia 16")] {
    let (status, _) = call(&state, Method::POST, &uri, Some(&user.token), Some(json!({ "content": text }))).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, tail) = call(&state, Method::GET, &format!("{uri}?after=1"), Some(&ana.token), None).await;
  let seqs: Vec<i64> = tail.as_array().unwrap().iter().map(|m| m["seq"].as_i64().unwrap()).collect();
  assert_eq!(seqs, vec![2, 3]);

  let read_uri = format!("/matches/{match_id}/read");
  let (_, body) = call(&state, Method::POST, &read_uri, Some(&ana.token), None).await;
  assert_eq!(body["updated"], 2);
  let (_, body) = call(&state, Method::POST, &read_uri, Some(&ana.token), None).await;
  assert_eq!(body["updated"], 0);

  // Ana's own message is still unread for Bia.
  let (_, all) = call(&state, Method::GET, &uri, Some(&bia.token), None).await;
  assert_eq!(all[0]["read"], false);
  assert_eq!(all[1]["read"], true);
}

#[tokio::test]
async fn outsiders_cannot_see_a_match() {
  let state = make_state().await;
  let (_ana, _bia, match_id) = matched_pair(&state).await;
  let caio = sign_up(&state, "Caio").await;

  let (status, _) = call(&state, Method::GET, &format!("/matches/{match_id}"), Some(&caio.token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = call(
    &state,
    Method::POST,
    &format!("/matches/{match_id}/messages"),
    Some(&caio.token),
    Some(json!({ "content": "psst" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn matches_survive_trip_deletion() {
  let state = make_state().await;
  let ana = sign_up(&state, "Ana").await;
  let bia = sign_up(&state, "Bia").await;
  let caio = sign_up(&state, "Caio").await;
  let ana_trip = create_trip(&state, &ana, "Paris, France", "2025-06-15", "2025-06-25").await;
  let bia_trip = create_trip(&state, &bia, "Paris, France", "2025-06-16", "2025-06-24").await;
  let caio_trip = create_trip(&state, &caio, "Paris, France", "2025-06-10", "2025-06-20").await;

  for (other, other_trip) in [(&bia, bia_trip), (&caio, caio_trip)] {
    swipe(&state, &ana, other, other_trip, "like").await;
    let (_, body) = swipe(&state, other, &ana, ana_trip, "like").await;
    assert!(!body["match"].is_null());
  }

  for (user, trip) in [(&ana, ana_trip), (&bia, bia_trip), (&caio, caio_trip)] {
    let (status, _) = call(&state, Method::DELETE, &format!("/trips/{trip}"), Some(&user.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  let (_, list) = call(&state, Method::GET, "/matches", Some(&ana.token), None).await;
  let list = list.as_array().unwrap();
  assert_eq!(list.len(), 2);
  for item in list {
    assert!(item["trip"].is_null());
    let match_id = uuid(&item["match"]["match_id"]);
    let (status, convo) = call(&state, Method::GET, &format!("/matches/{match_id}"), Some(&ana.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(convo["trip"].is_null());
  }
}

// ─── Live socket ─────────────────────────────────────────────────────────────

type LiveClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the router on an ephemeral port for socket tests.
async fn serve(state: &AppState<SqliteStore>) -> SocketAddr {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = api_router(state.clone());
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  addr
}

async fn open_live(addr: SocketAddr, match_id: Uuid, user: &User, after: Option<i64>) -> LiveClient {
  let mut url = format!("ws://{addr}/matches/{match_id}/live?access_token={}", user.token);
  if let Some(after) = after {
    url.push_str(&format!("&after={after}"));
  }
  let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
  client
}

/// Next message frame, or `None` if nothing arrives within `wait`.
async fn next_frame(client: &mut LiveClient, wait: Duration) -> Option<Message> {
  match tokio::time::timeout(wait, client.next()).await {
    Ok(Some(frame)) => {
      let frame = frame.unwrap();
      Some(serde_json::from_str(frame.to_text().unwrap()).unwrap())
    }
    Ok(None) | Err(_) => None,
  }
}

/// Collect `count` frames, then check the socket stays quiet.
async fn expect_seqs(client: &mut LiveClient, count: usize) -> Vec<i64> {
  let mut seqs = Vec::new();
  for _ in 0..count {
    let message = next_frame(client, Duration::from_secs(5)).await.expect("live frame");
    seqs.push(message.seq);
  }
  assert!(
    next_frame(client, Duration::from_millis(200)).await.is_none(),
    "unexpected extra frame after {seqs:?}"
  );
  seqs
}

async fn wait_for_listener(state: &AppState<SqliteStore>) {
  for _ in 0..200 {
    if state.live.channel_count() > 0 {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("live socket never subscribed");
}

/// Poll the store until the read flags of `match_id` equal `expected`.
async fn wait_for_read_flags(state: &AppState<SqliteStore>, match_id: Uuid, expected: &[bool]) {
  let mut flags = Vec::new();
  for _ in 0..200 {
    flags = state
      .store
      .list_messages(match_id, None)
      .await
      .unwrap()
      .iter()
      .map(|m| m.read)
      .collect::<Vec<_>>();
    if flags == expected {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("read flags stayed {flags:?}, expected {expected:?}");
}

async fn post_message(state: &AppState<SqliteStore>, user: &User, match_id: Uuid, text: &str) {
  let (status, _) = call(
    state,
    Method::POST,
    &format!("/matches/{match_id}/messages"),
    Some(&user.token),
    Some(json!({ "content": text })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn live_socket_replays_after_cursor_once() {
  let state = make_state().await;
  let addr = serve(&state).await;
  let (ana, bia, match_id) = matched_pair(&state).await;
  for text in ["Oi!", "Vai ao Louvre?", "Chego dia 15"] {
    post_message(&state, &ana, match_id, text).await;
  }

  let mut bia_live = open_live(addr, match_id, &bia, Some(1)).await;
  assert_eq!(expect_seqs(&mut bia_live, 2).await, vec![2, 3]);

  // A copy of something already replayed is not sent again.
  let stored = state.store.list_messages(match_id, Some(2)).await.unwrap();
  state.live.publish(&stored[0]);
  post_message(&state, &ana, match_id, "Até lá").await;
  assert_eq!(expect_seqs(&mut bia_live, 1).await, vec![4]);
}

#[tokio::test]
async fn live_socket_orders_messages_published_out_of_order() {
  let state = make_state().await;
  let addr = serve(&state).await;
  let (ana, bia, match_id) = matched_pair(&state).await;

  let mut bia_live = open_live(addr, match_id, &bia, None).await;
  wait_for_listener(&state).await;

  let first = state
    .store
    .send_message(NewMessage::new(match_id, ana.id, "primeira").unwrap())
    .await
    .unwrap();
  let second = state
    .store
    .send_message(NewMessage::new(match_id, ana.id, "segunda").unwrap())
    .await
    .unwrap();
  state.live.publish(&second);
  state.live.publish(&first);

  assert_eq!(expect_seqs(&mut bia_live, 2).await, vec![1, 2]);
}

#[tokio::test]
async fn live_delivery_marks_only_counterpart_messages_read() {
  let state = make_state().await;
  let addr = serve(&state).await;
  let (ana, bia, match_id) = matched_pair(&state).await;

  let mut ana_live = open_live(addr, match_id, &ana, None).await;
  wait_for_listener(&state).await;

  // Ana sees her own message, and it stays unread.
  post_message(&state, &ana, match_id, "Oi!").await;
  let own = next_frame(&mut ana_live, Duration::from_secs(5)).await.expect("own message");
  assert_eq!((own.seq, own.sender_id, own.read), (1, ana.id, false));
  tokio::time::sleep(Duration::from_millis(100)).await;
  wait_for_read_flags(&state, match_id, &[false]).await;

  // Bia's reply reaches Ana over the socket and becomes read.
  post_message(&state, &bia, match_id, "Olá!").await;
  let reply = next_frame(&mut ana_live, Duration::from_secs(5)).await.expect("reply");
  assert_eq!((reply.seq, reply.sender_id), (2, bia.id));
  wait_for_read_flags(&state, match_id, &[false, true]).await;
}

#[tokio::test]
async fn live_socket_rejects_outsiders() {
  let state = make_state().await;
  let addr = serve(&state).await;
  let (_ana, _bia, match_id) = matched_pair(&state).await;
  let caio = sign_up(&state, "Caio").await;

  let url = format!("ws://{addr}/matches/{match_id}/live?access_token={}", caio.token);
  assert!(tokio_tungstenite::connect_async(url).await.is_err());
  assert_eq!(state.live.channel_count(), 0);
}
