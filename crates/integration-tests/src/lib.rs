//! Integration tests for Mangosteen.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mangosteen-integration-tests
//! ```
//!
//! The tests are self-contained. Each one starts a [`MergeServer`], an
//! in-process storefront stand-in serving `POST /cart/merge` on an
//! ephemeral loopback port, and drives the real client stack against it
//! over HTTP.
//!
//! # Test Categories
//!
//! - `merge_flow` - End-to-end cart merge behavior
//! - `single_flight` - Concurrent merges collapsing into one request
//! - `reload_and_auto_merge` - Reload scheduling and load-time merges
//! - `storage_persistence` - JSON file store durability

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::error;

use mangosteen_client::merge::MERGE_PATH;
use mangosteen_client::ui::{NoticeLevel, Notifier, PageHandle};

// =============================================================================
// MergeServer
// =============================================================================

/// How the stand-in storefront answers merge requests.
#[derive(Clone)]
pub enum MergeBehavior {
    /// Accept the merge, counting lines with a positive product id and
    /// quantity and skipping the rest.
    Accept,
    /// Accept like [`MergeBehavior::Accept`], but only answer once
    /// [`MergeServer::release`] is called.
    HoldThenAccept,
    /// Refuse the merge with the given message.
    Reject(String),
    /// Answer with a plain HTTP error.
    Fail(StatusCode),
}

struct ServerState {
    behavior: Mutex<MergeBehavior>,
    requests: Mutex<Vec<Value>>,
    hold: Notify,
}

/// In-process storefront stand-in serving `POST /cart/merge`.
///
/// Records every request body so tests can assert on what the client
/// actually sent.
pub struct MergeServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MergeServer {
    /// Bind to an ephemeral loopback port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(ServerState {
            behavior: Mutex::new(MergeBehavior::Accept),
            requests: Mutex::new(Vec::new()),
            hold: Notify::new(),
        });

        let app = Router::new()
            .route(MERGE_PATH, post(merge_handler))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(error = %err, "merge server stopped unexpectedly");
            }
        });

        Ok(Self { addr, state })
    }

    /// Base URL clients should be pointed at.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Script how subsequent requests are answered.
    pub fn set_behavior(&self, behavior: MergeBehavior) {
        *self
            .state
            .behavior
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Release one response held by [`MergeBehavior::HoldThenAccept`].
    pub fn release(&self) {
        self.state.hold.notify_one();
    }

    /// Bodies of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Value> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }
}

async fn merge_handler(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body.clone());

    let behavior = state
        .behavior
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    match behavior {
        MergeBehavior::Accept => accept_response(&body),
        MergeBehavior::HoldThenAccept => {
            state.hold.notified().await;
            accept_response(&body)
        }
        MergeBehavior::Reject(message) => {
            Json(json!({ "success": false, "message": message })).into_response()
        }
        MergeBehavior::Fail(status) => (status, "storefront error").into_response(),
    }
}

/// Lines the real endpoint would take over: positive product id and
/// positive quantity, everything else skipped.
fn count_valid_lines(body: &Value) -> u32 {
    let Some(items) = body.as_array() else {
        return 0;
    };

    let mut added = 0;
    for item in items {
        let product_id = item.get("productId").and_then(Value::as_i64).unwrap_or(0);
        let quantity = item.get("quantity").and_then(Value::as_u64).unwrap_or(0);
        if product_id > 0 && quantity > 0 {
            added += 1;
        }
    }
    added
}

fn accept_response(body: &Value) -> Response {
    let added = count_valid_lines(body);
    let message = if added == 0 {
        "Cart merged successfully".to_owned()
    } else {
        format!("{added} item(s) merged into your cart")
    };

    Json(json!({ "success": true, "itemsAdded": added, "message": message })).into_response()
}

// =============================================================================
// Test doubles
// =============================================================================

/// Notifier recording every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notice delivered so far.
    #[must_use]
    pub fn seen(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_owned()));
    }
}

/// Page handle with a fixed path that counts reload requests.
pub struct RecordingPage {
    path: String,
    reloads: AtomicU32,
}

impl RecordingPage {
    /// Create a handle reporting the given path.
    #[must_use]
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reloads: AtomicU32::new(0),
        }
    }

    /// How many reloads have been requested.
    #[must_use]
    pub fn reload_count(&self) -> u32 {
        self.reloads.load(Ordering::Acquire)
    }
}

impl PageHandle for RecordingPage {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_line_accounting_matches_the_real_endpoint() {
        let body = json!([
            { "productId": 7, "quantity": 2, "productName": "Widget", "price": "9.99" },
            { "productId": 0, "quantity": 5 },
            { "productId": 8, "quantity": 0 },
            { "productId": -3, "quantity": 1 },
            { "quantity": 4 },
            { "productId": 9, "quantity": 1 }
        ]);

        assert_eq!(count_valid_lines(&body), 2);
    }

    #[test]
    fn test_non_array_bodies_count_nothing() {
        assert_eq!(count_valid_lines(&json!({ "productId": 7 })), 0);
        assert_eq!(count_valid_lines(&json!([])), 0);
        assert_eq!(count_valid_lines(&json!(null)), 0);
    }
}
