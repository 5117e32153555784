//! Payment recording, single-shot point accrual, the duplicate-payment
//! guard, the history ledger and invoices.

mod common;

use common::*;

use store_api::auth::CartActor;
use store_api::error::ErrorKind;
use store_api::services::cart::{self, AddToCartRequest};
use store_api::services::checkout::{self, AddressInput, CheckoutRequest, OrderView};
use store_api::services::history::{self, RecordHistoryRequest};
use store_api::services::invoice::{self, CreateInvoiceRequest};
use store_api::services::orders;
use store_api::services::payment::{self, CreatePaymentRequest};
use store_api::AppState;
use tribune_core::{JerseySize, PaymentStatus, Role, User};

/// Seeds a user with `points`, fills a cart with one line and checks out.
async fn checkout_order(
    state: &AppState,
    points: i64,
    price_francs: i64,
    quantity: i64,
) -> (User, OrderView) {
    let user = seed_user(state, &format!("Fan{points}"), points, Role::Customer).await;
    let product = seed_product(
        state,
        "Maillot Signature",
        price_francs,
        0,
        &[(JerseySize::M, quantity + 5)],
    )
    .await;

    let principal = principal_for(&user);
    let actor = CartActor::User(principal.clone());
    cart::add_item(
        state,
        &actor,
        AddToCartRequest {
            product_id: product.id.clone(),
            size: "M".to_string(),
            quantity,
        },
    )
    .await
    .expect("add to cart");

    let order = checkout::checkout(
        state,
        &principal,
        CheckoutRequest {
            delivery_address: AddressInput {
                street: "12 Rue des Stades".to_string(),
                city: "Dakar".to_string(),
                postal_code: "10200".to_string(),
                country: "SN".to_string(),
            },
            expected_delivery: None,
        },
    )
    .await
    .expect("checkout");

    (user, order)
}

fn payment_request(order_id: &str) -> CreatePaymentRequest {
    CreatePaymentRequest {
        order_id: order_id.to_string(),
        method: "card".to_string(),
        details: None,
    }
}

#[tokio::test]
async fn payment_charges_the_checkout_captured_discount_and_accrues_once() {
    let state = test_state().await;

    // FANA (10%): order total 100 000, charge 90 000, accrual band 100
    let (user, order) = checkout_order(&state, 1_500, 100_000, 1).await;
    let principal = principal_for(&user);

    let view = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .expect("create payment");

    assert_eq!(view.status, PaymentStatus::Paid);
    assert_eq!(view.amount.xof, 90_000.0);
    assert_eq!(view.points_added, 100);
    assert!(view.transaction_id.as_deref().unwrap().starts_with("TXN-"));

    // The balance moved exactly once
    let after = reload_user(&state, &user.id).await;
    assert_eq!(after.loyalty_points, 1_600);

    // Payment status never advances the order by itself
    let order_after = orders::get(&state, &principal, &order.id)
        .await
        .expect("order");
    assert_eq!(order_after.status, tribune_core::OrderStatus::Pending);
}

#[tokio::test]
async fn second_payment_for_an_order_is_a_conflict() {
    let state = test_state().await;
    let (user, order) = checkout_order(&state, 0, 20_000, 1).await;
    let principal = principal_for(&user);

    let first = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .expect("first payment");

    let err = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // The first payment is unmodified
    let stored = state
        .db
        .payments()
        .get_by_order(&order.id)
        .await
        .expect("query payment")
        .expect("payment exists");
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.amount.francs(), 20_000);

    // And no double accrual happened
    assert_eq!(
        reload_user(&state, &user.id).await.loyalty_points,
        first.points_added
    );
}

#[tokio::test]
async fn cancelled_order_cannot_be_paid() {
    let state = test_state().await;
    let (user, order) = checkout_order(&state, 0, 12_000, 1).await;
    let principal = principal_for(&user);

    orders::cancel(&state, &principal, &order.id)
        .await
        .expect("cancel");

    let err = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::State);
}

#[tokio::test]
async fn history_mirror_never_accrues_again() {
    let state = test_state().await;
    let (user, order) = checkout_order(&state, 0, 60_000, 1).await;
    let principal = principal_for(&user);

    let paid = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .expect("payment");
    let balance_after_payment = reload_user(&state, &user.id).await.loyalty_points;
    assert_eq!(balance_after_payment, paid.points_added);

    let entry = history::record(
        &state,
        &principal,
        RecordHistoryRequest {
            payment_id: paid.id.clone(),
        },
    )
    .await
    .expect("record history");

    assert_eq!(entry.status, PaymentStatus::Paid);
    assert_eq!(entry.amount.xof, paid.amount.xof);

    // Mirroring is accrual-free
    assert_eq!(
        reload_user(&state, &user.id).await.loyalty_points,
        balance_after_payment
    );
}

#[tokio::test]
async fn deleting_a_paid_history_entry_reverses_points_floored_at_zero() {
    let state = test_state().await;

    // Charge 60 000 → 100 points accrued
    let (user, order) = checkout_order(&state, 0, 60_000, 1).await;
    let principal = principal_for(&user);
    let admin = seed_user(&state, "Chef", 0, Role::Admin).await;

    let paid = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .expect("payment");
    let entry = history::record(
        &state,
        &principal,
        RecordHistoryRequest {
            payment_id: paid.id.clone(),
        },
    )
    .await
    .expect("record history");

    // Non-admins are turned away
    let err = history::delete(&state, &principal, &entry.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let response = history::delete(&state, &principal_for(&admin), &entry.id)
        .await
        .expect("delete history");
    assert_eq!(response.points_reversed, paid.points_added);

    // The reversal matches the accrual exactly, back to zero
    assert_eq!(reload_user(&state, &user.id).await.loyalty_points, 0);

    // Deleting again: the entry is gone
    let err = history::delete(&state, &principal_for(&admin), &entry.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn invoice_is_one_to_one_with_its_payment() {
    let state = test_state().await;
    let (user, order) = checkout_order(&state, 0, 30_000, 1).await;
    let principal = principal_for(&user);

    // No invoice before a payment exists
    let err = invoice::create(
        &state,
        &principal,
        CreateInvoiceRequest {
            payment_id: order.id.clone(), // a valid UUID that is not a payment
            legal_notice: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let paid = payment::create(&state, &principal, payment_request(&order.id))
        .await
        .expect("payment");

    let created = invoice::create(
        &state,
        &principal,
        CreateInvoiceRequest {
            payment_id: paid.id.clone(),
            legal_notice: Some("TVA non applicable".to_string()),
        },
    )
    .await
    .expect("invoice");
    assert!(created.number.starts_with("FACT-"));

    let err = invoice::create(
        &state,
        &principal,
        CreateInvoiceRequest {
            payment_id: paid.id,
            legal_notice: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let mine = invoice::list(&state, &principal).await.expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);
}
