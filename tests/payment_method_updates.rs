//! Integration tests for saved cards: attach, expiry sync and default card.

mod common;

use common::{doc, path, Harness};
use serde_json::json;

use lidora_functions::ports::DocumentStore;

const CARD: &str = "customers/u1/payment_methods/pm_1";

/// Signed-up user with one attached card; provider calls cleared.
async fn with_card(h: &Harness) {
    h.sign_up("u1", "a@x.com").await;
    h.store.set(&path(CARD), doc(json!({}))).await.unwrap();
    let handled = h.pump().await;
    assert_eq!(handled, vec!["attach_payment_method", "update_payment_method"]);
    h.payments.clear_calls();
}

#[tokio::test]
async fn attached_card_is_mirrored_and_made_default() {
    let h = Harness::new();
    with_card(&h).await;

    let card = h.doc(CARD).unwrap();
    assert_eq!(card["brand"], json!("visa"));
    assert_eq!(card["last4"], json!("4242"));
    assert_eq!(card["month"], json!(12));
    assert_eq!(card["year"], json!(2030));
    assert_eq!(card["primary"], json!(true));

    let customer = h.doc("customers/u1").unwrap();
    assert_eq!(customer["default_payment_method"], json!("pm_1"));
    let customer_id = customer["customer_id"].as_str().unwrap();
    assert_eq!(
        h.payments.default_payment_method(customer_id).as_deref(),
        Some("pm_1")
    );
    assert!(h.reporter.reports().is_empty());
}

#[tokio::test]
async fn non_expiry_edit_issues_no_provider_update() {
    let h = Harness::new();
    with_card(&h).await;

    h.store
        .merge(&path(CARD), doc(json!({"nickname": "work card"})))
        .await
        .unwrap();
    let handled = h.pump().await;

    assert_eq!(handled, vec!["update_payment_method"]);
    assert!(h.payments.calls().is_empty());
}

#[tokio::test]
async fn expiry_edit_issues_exactly_one_update() {
    let h = Harness::new();
    with_card(&h).await;

    h.store
        .merge(&path(CARD), doc(json!({"month": 5, "year": 2031})))
        .await
        .unwrap();
    h.pump().await;

    let updates = h.payments.calls_to("update_payment_method_expiry");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].args, vec!["pm_1", "5", "2031"]);
    assert!(!h.payments.was_called("set_default_payment_method"));
}

#[tokio::test]
async fn invalid_month_is_reported_on_the_card() {
    let h = Harness::new();
    with_card(&h).await;

    h.store
        .merge(&path(CARD), doc(json!({"month": 13})))
        .await
        .unwrap();
    h.pump().await;

    assert!(!h.payments.was_called("update_payment_method_expiry"));
    assert!(h.doc(CARD).unwrap().contains_key("error"));
    assert_eq!(h.reporter.reports_for("update_payment_method").len(), 1);
}

#[tokio::test]
async fn newest_card_becomes_the_default() {
    let h = Harness::new();
    with_card(&h).await;

    h.store
        .set(&path("customers/u1/payment_methods/pm_2"), doc(json!({})))
        .await
        .unwrap();
    h.pump().await;

    let customer = h.doc("customers/u1").unwrap();
    assert_eq!(customer["default_payment_method"], json!("pm_2"));
    let customer_id = customer["customer_id"].as_str().unwrap();
    assert_eq!(
        h.payments.default_payment_method(customer_id).as_deref(),
        Some("pm_2")
    );
}

#[tokio::test]
async fn removed_card_is_detached() {
    let h = Harness::new();
    with_card(&h).await;

    h.store.delete(&path(CARD)).await.unwrap();
    let handled = h.pump().await;

    assert_eq!(handled, vec!["detach_payment_method"]);
    assert_eq!(
        h.payments.calls_to("detach_payment_method")[0].args,
        vec!["pm_1"]
    );
}
