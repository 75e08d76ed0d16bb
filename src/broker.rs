//! HTTP broker (spec §6): the axum server side of `HttpTransport`.
//!
//! One broker process serves an entire run: per-destination private
//! mailboxes, a public bulletin board, and a single shared `Dealer`.
//! Every handler here is non-blocking — a receive that finds nothing
//! yet answers 404 immediately. The long-polling with bounded backoff
//! spec §4.9 and §5 call for lives entirely on the client side
//! (`HttpTransport` in `transport.rs`), which keeps this server a thin,
//! stateless-per-request dispatcher over shared, mutex-guarded maps.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, info};

use crate::dealer::Dealer;
use crate::expression::ExprId;
use crate::field::DEFAULT_MODULUS;

type Mailbox = HashMap<(String, String), VecDeque<Vec<u8>>>;
type PublicBoard = HashMap<(String, String), Vec<u8>>;

/// Shared state behind every route. Cheap to clone — axum requires
/// `State` to be `Clone`, and every clone refers to the same maps.
#[derive(Clone)]
pub struct BrokerState {
    mailboxes: Arc<Mutex<Mailbox>>,
    board: Arc<Mutex<PublicBoard>>,
    dealer: Arc<Dealer>,
}

impl BrokerState {
    pub fn new(modulus: i64) -> Self {
        Self {
            mailboxes: Arc::new(Mutex::new(HashMap::new())),
            board: Arc::new(Mutex::new(HashMap::new())),
            dealer: Arc::new(Dealer::new(modulus)),
        }
    }
}

impl Default for BrokerState {
    fn default() -> Self {
        Self::new(DEFAULT_MODULUS)
    }
}

/// Builds the broker's route table.
pub fn router(state: BrokerState) -> Router {
    Router::new()
        .route("/register/:client_id", post(register))
        .route("/private/:dest/:label", post(send_private).get(retrieve_private))
        .route("/publish/:owner/:label", post(publish))
        .route("/public/:owner/:label", get(retrieve_public))
        .route("/triple/:client_id/:op_id", get(retrieve_triple))
        .with_state(state)
}

async fn register(State(state): State<BrokerState>, Path(client_id): Path<String>) -> impl IntoResponse {
    state.dealer.register_participant(&client_id);
    debug!(%client_id, "participant registered with dealer");
    StatusCode::NO_CONTENT
}

async fn send_private(
    State(state): State<BrokerState>,
    Path((dest, label)): Path<(String, String)>,
    body: Bytes,
) -> impl IntoResponse {
    let mut mailboxes = state.mailboxes.lock().expect("mailbox mutex poisoned");
    mailboxes.entry((dest, label)).or_default().push_back(body.to_vec());
    StatusCode::NO_CONTENT
}

async fn retrieve_private(
    State(state): State<BrokerState>,
    Path((dest, label)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut mailboxes = state.mailboxes.lock().expect("mailbox mutex poisoned");
    match mailboxes.get_mut(&(dest, label)).and_then(VecDeque::pop_front) {
        Some(bytes) => (StatusCode::OK, bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn publish(
    State(state): State<BrokerState>,
    Path((owner, label)): Path<(String, String)>,
    body: Bytes,
) -> impl IntoResponse {
    let mut board = state.board.lock().expect("board mutex poisoned");
    board.insert((owner, label), body.to_vec());
    StatusCode::NO_CONTENT
}

async fn retrieve_public(
    State(state): State<BrokerState>,
    Path((owner, label)): Path<(String, String)>,
) -> impl IntoResponse {
    let board = state.board.lock().expect("board mutex poisoned");
    match board.get(&(owner, label)) {
        Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn retrieve_triple(
    State(state): State<BrokerState>,
    Path((client_id, op_label)): Path<(String, String)>,
) -> impl IntoResponse {
    let op_id = match ExprId::from_label(&op_label) {
        Some(id) => id,
        None => return (StatusCode::BAD_REQUEST, "malformed operation id".to_string()).into_response(),
    };

    match state.dealer.triple_shares(&client_id, op_id) {
        Ok(triple) => (StatusCode::OK, Json(triple)).into_response(),
        Err(err) => {
            info!(%client_id, %err, "triple request rejected by dealer");
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
    }
}
