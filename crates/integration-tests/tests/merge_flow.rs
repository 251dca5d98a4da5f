//! End-to-end cart merge tests.
//!
//! Each test starts an in-process storefront stand-in and drives the real
//! client stack against it over loopback HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use rust_decimal::Decimal;

use mangosteen_client::cart::{GuestCartStore, keys};
use mangosteen_client::merge::{MergeBridge, MergeClient, MergeError, MergeOutcome};
use mangosteen_client::storage::{KeyValueStore, MemoryStore};
use mangosteen_client::ui::{HeadlessPage, NoticeLevel, Notifier};
use mangosteen_core::ProductId;
use mangosteen_integration_tests::{MergeBehavior, MergeServer, RecordingNotifier};

/// Wire a bridge over the given storage against the stand-in server.
fn bridge_over(
    storage: &Arc<dyn KeyValueStore>,
    server: &MergeServer,
) -> (MergeBridge, GuestCartStore, Arc<RecordingNotifier>) {
    let cart = GuestCartStore::new(Arc::clone(storage));
    let notifier = Arc::new(RecordingNotifier::new());
    let bridge = MergeBridge::new(
        cart.clone(),
        MergeClient::new(&server.base_url()),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::new(HeadlessPage::at("/")),
    );
    (bridge, cart, notifier)
}

fn price() -> Decimal {
    Decimal::new(999, 2)
}

#[tokio::test]
async fn test_merge_moves_guest_cart_to_server() {
    let server = MergeServer::start().await.expect("failed to start server");
    let storage = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
    let (bridge, cart, notifier) = bridge_over(&storage, &server);

    cart.add(ProductId::new(7), 2, "Widget", price())
        .expect("add failed");
    cart.add(ProductId::new(9), 1, "Gadget", Decimal::new(1250, 2))
        .expect("add failed");

    let outcome = bridge.merge().await;

    match outcome {
        MergeOutcome::Merged {
            items_added,
            message,
        } => {
            assert_eq!(items_added, 2);
            assert_eq!(message, "2 item(s) merged into your cart");
        }
        other => panic!("expected Merged, got {other:?}"),
    }

    // Local state is gone once the server has taken the lines over.
    assert!(cart.read().is_empty());
    assert_eq!(storage.get(keys::CART).unwrap(), None);
    assert_eq!(storage.get(keys::CART_COUNT).unwrap(), None);

    assert_eq!(
        notifier.seen(),
        vec![(
            NoticeLevel::Success,
            "2 item(s) merged into your cart".to_owned()
        )]
    );

    // Exactly one request, carrying both lines in wire form.
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].as_array().expect("body is not an array");
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["productId"], 7);
    assert_eq!(body[0]["quantity"], 2);
    assert_eq!(body[0]["productName"], "Widget");
    assert_eq!(body[0]["price"], "9.99");
    assert_eq!(body[1]["productId"], 9);
}

#[tokio::test]
async fn test_merge_rejection_leaves_local_cart_untouched() {
    let server = MergeServer::start().await.expect("failed to start server");
    server.set_behavior(MergeBehavior::Reject("Please sign in first".to_owned()));

    let storage = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
    let (bridge, cart, notifier) = bridge_over(&storage, &server);
    cart.add(ProductId::new(7), 2, "Widget", price())
        .expect("add failed");
    let blob_before = storage.get(keys::CART).unwrap();

    let outcome = bridge.merge().await;

    assert!(
        matches!(outcome, MergeOutcome::Rejected { message } if message == "Please sign in first")
    );
    assert_eq!(storage.get(keys::CART).unwrap(), blob_before);
    assert_eq!(
        notifier.seen(),
        vec![(NoticeLevel::Error, "Could not merge your cart".to_owned())]
    );
}

#[tokio::test]
async fn test_merge_http_failure_leaves_local_cart_untouched() {
    let server = MergeServer::start().await.expect("failed to start server");
    server.set_behavior(MergeBehavior::Fail(StatusCode::INTERNAL_SERVER_ERROR));

    let storage = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
    let (bridge, cart, notifier) = bridge_over(&storage, &server);
    cart.add(ProductId::new(7), 2, "Widget", price())
        .expect("add failed");
    let blob_before = storage.get(keys::CART).unwrap();

    let outcome = bridge.merge().await;

    match outcome {
        MergeOutcome::Unreachable(MergeError::Status { status, .. }) => {
            assert_eq!(status.as_u16(), 500);
        }
        other => panic!("expected Unreachable(Status), got {other:?}"),
    }
    assert_eq!(storage.get(keys::CART).unwrap(), blob_before);
    assert_eq!(
        notifier.seen(),
        vec![(
            NoticeLevel::Warning,
            "Cart merge is temporarily unavailable".to_owned()
        )]
    );
}

#[tokio::test]
async fn test_merge_empty_cart_sends_no_request() {
    let server = MergeServer::start().await.expect("failed to start server");
    let storage = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;
    let (bridge, _cart, notifier) = bridge_over(&storage, &server);

    let outcome = bridge.merge().await;

    assert!(matches!(outcome, MergeOutcome::NothingToMerge));
    assert_eq!(server.request_count(), 0);
    assert!(notifier.seen().is_empty());
}

#[tokio::test]
async fn test_merge_with_no_countable_lines_keeps_local_cart() {
    let server = MergeServer::start().await.expect("failed to start server");
    let storage = Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>;

    // A blob persisted by some earlier, buggier writer: decodes fine but
    // the server will not take the line over.
    let stale = r#"[{"productId":-4,"quantity":2,"productName":"Ghost","price":"0"}]"#;
    storage.set(keys::CART, stale).unwrap();

    let (bridge, cart, notifier) = bridge_over(&storage, &server);
    let outcome = bridge.merge().await;

    assert!(matches!(
        outcome,
        MergeOutcome::Merged { items_added: 0, .. }
    ));
    assert_eq!(server.request_count(), 1);

    // Nothing was taken over, so the local cart stays for a later attempt
    // and no notice is shown.
    assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some(stale));
    assert_eq!(cart.read().len(), 1);
    assert!(notifier.seen().is_empty());
}

#[tokio::test]
async fn test_endpoint_wire_contract() {
    let server = MergeServer::start().await.expect("failed to start server");

    let response = reqwest::Client::new()
        .post(format!("{}/cart/merge", server.base_url()))
        .json(&serde_json::json!([
            { "productId": 7, "quantity": 2, "productName": "Widget", "price": "9.99" },
            { "productId": 0, "quantity": 5 },
            { "productId": 8, "quantity": 0 }
        ]))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("response is not JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["itemsAdded"], 1);
}
