//! Integration tests for the charge flow.
//!
//! A client writes a payment document; the create trigger opens an intent,
//! the update trigger confirms it when needed and archives the order once
//! it succeeds. Everything runs through the dispatcher against in-memory
//! adapters.

mod common;

use common::{doc, path, Harness};
use serde_json::json;

use lidora_functions::domain::foundation::CollectionPath;
use lidora_functions::domain::trigger::DocumentEvent;
use lidora_functions::ports::{DocumentStore, PaymentError, TransferData};

const PAYMENT: &str = "customers/u1/payments/p1";

fn charge() -> lidora_functions::domain::foundation::Document {
    doc(json!({
        "subtotal": 10.00,
        "total": 12.00,
        "currency": "usd",
        "payment_method": "tok_1"
    }))
}

/// Signed-up user with a pending order of two items.
async fn shopper(h: &Harness) -> String {
    h.sign_up("u1", "a@x.com").await;
    let order_id = h.doc("customers/u1").unwrap()["order_id"]
        .as_str()
        .unwrap()
        .to_string();
    let order = path(&format!("customers/u1/orders/{}", order_id));
    h.store.insert(&order, doc(json!({"chef": "c1"})));
    for item in ["i1", "i2"] {
        h.store.insert(
            &order.subcollection("items").doc(item),
            doc(json!({"dish": item, "quantity": 1})),
        );
    }
    order_id
}

// =============================================================================
// Charge and archive
// =============================================================================

#[tokio::test]
async fn successful_charge_splits_and_archives_the_order() {
    let h = Harness::with_destination(Some("acct_chef"));
    let order_id = shopper(&h).await;

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    let handled = h.pump().await;

    assert_eq!(
        handled,
        vec!["create_payment_intent", "handle_payment_update"]
    );
    let intents = h.payments.intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 1200);
    assert_eq!(
        intents[0].transfer_data,
        Some(TransferData {
            amount: 1000,
            destination: "acct_chef".into()
        })
    );

    // Pending order is gone, history holds the same order and items.
    let pending = path(&format!("customers/u1/orders/{}", order_id));
    let history = path(&format!("customers/u1/order_history/{}", order_id));
    assert!(h.store.document(&pending).is_none());
    assert!(h
        .store
        .paths_in(&pending.subcollection("items"))
        .is_empty());
    let archived = h.store.document(&history).unwrap();
    assert_eq!(archived["chef"], json!("c1"));
    assert_eq!(archived["payment_id"], json!("p1"));
    assert_eq!(h.store.paths_in(&history.subcollection("items")).len(), 2);

    // A new pending order id is handed out and the receipt goes out.
    let customer = h.doc("customers/u1").unwrap();
    assert_ne!(customer["order_id"], json!(order_id));
    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@x.com");
    assert!(sent[0].body.contains("12.00 USD"));
    assert!(h.reporter.reports().is_empty());
}

#[tokio::test]
async fn redelivered_create_charges_once() {
    let h = Harness::new();
    shopper(&h).await;
    h.store.insert(&path(PAYMENT), charge());

    let event = DocumentEvent::created(path(PAYMENT), charge());
    h.dispatcher.dispatch_document(event.clone()).await;
    h.dispatcher.dispatch_document(event).await;

    assert_eq!(h.payments.call_count("create_payment_intent"), 2);
    assert_eq!(h.payments.intents().len(), 1);
}

// =============================================================================
// Confirmation
// =============================================================================

#[tokio::test]
async fn confirmation_happens_once_per_transition() {
    let h = Harness::new();
    shopper(&h).await;
    h.payments.set_create_status("requires_confirmation");

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    h.pump().await;
    assert_eq!(h.payments.call_count("confirm_payment_intent"), 1);
    assert_eq!(h.doc(PAYMENT).unwrap()["status"], json!("succeeded"));

    // Unrelated re-writes of the settled document do nothing.
    h.store
        .merge(&path(PAYMENT), doc(json!({"rating": 5})))
        .await
        .unwrap();
    h.pump().await;
    assert_eq!(h.payments.call_count("confirm_payment_intent"), 1);
    assert_eq!(h.mailer.sent().len(), 1);
}

#[tokio::test]
async fn redelivered_create_after_confirmation_settles_once() {
    let h = Harness::new();
    shopper(&h).await;
    h.payments.set_create_status("requires_confirmation");

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    h.pump().await;
    assert_eq!(h.doc(PAYMENT).unwrap()["status"], json!("succeeded"));
    let order_id = h.doc("customers/u1").unwrap()["order_id"].clone();

    let event = DocumentEvent::created(path(PAYMENT), charge());
    h.dispatcher.dispatch_document(event).await;
    h.pump().await;

    assert_eq!(h.doc(PAYMENT).unwrap()["status"], json!("succeeded"));
    assert_eq!(h.payments.call_count("confirm_payment_intent"), 1);
    assert_eq!(h.payments.intents().len(), 1);
    assert_eq!(h.mailer.sent().len(), 1);
    assert_eq!(h.doc("customers/u1").unwrap()["order_id"], order_id);
    assert!(h.reporter.reports().is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn declined_card_leaves_a_sanitized_error() {
    let h = Harness::new();
    let order_id = shopper(&h).await;
    h.payments.set_method_error(
        "create_payment_intent",
        PaymentError::rejected("card_error", "Your card was declined."),
    );

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    h.pump().await;

    let payment = h.doc(PAYMENT).unwrap();
    assert_eq!(payment["error"], json!("Your card was declined."));
    assert!(payment.get("id").is_none());
    assert!(payment.get("status").is_none());
    assert!(payment.get("client_secret").is_none());
    assert!(h
        .doc(&format!("customers/u1/orders/{}", order_id))
        .is_some());
    assert_eq!(h.reporter.reports_for("create_payment_intent").len(), 1);
}

#[tokio::test]
async fn provider_outage_hides_internal_details() {
    let h = Harness::new();
    shopper(&h).await;
    h.payments.set_method_error(
        "create_payment_intent",
        PaymentError::Network("connection reset by 10.0.0.7".into()),
    );

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    h.pump().await;

    let error = h.doc(PAYMENT).unwrap()["error"].as_str().unwrap().to_string();
    assert!(!error.contains("10.0.0.7"));
    let report = &h.reporter.reports_for("create_payment_intent")[0];
    assert!(report.message.contains("10.0.0.7"));
}

#[tokio::test]
async fn payment_without_customer_is_reported() {
    let h = Harness::new();

    h.store.set(&path(PAYMENT), charge()).await.unwrap();
    h.pump().await;

    assert!(!h.payments.was_called("create_payment_intent"));
    assert_eq!(h.reporter.reports_for("create_payment_intent").len(), 1);
    assert!(h
        .store
        .paths_in(&CollectionPath::parse("customers/u1/order_history").unwrap())
        .is_empty());
}
