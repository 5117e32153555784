//! Referral redemption flows: bonuses, set-once semantics and the
//! anti-abuse guards.

mod common;

use chrono::Utc;
use common::*;

use store_api::error::ErrorKind;
use store_api::services::referral::{self, RedeemRequest};
use store_api::services::rewards;
use tribune_core::Role;

fn redeem_request(code: &str) -> RedeemRequest {
    RedeemRequest {
        referral_code: code.to_string(),
    }
}

#[tokio::test]
async fn successful_redemption_credits_both_accounts_once() {
    let state = test_state().await;
    let referrer = seed_user(&state, "Parrain", 100, Role::Customer).await;
    let referee = seed_user(&state, "Filleul", 0, Role::Customer).await;

    let response = referral::redeem(
        &state,
        &principal_for(&referee),
        redeem_request(&referrer.referral_code),
    )
    .await
    .expect("redeem");

    assert_eq!(response.referrer_points, 75);
    assert_eq!(response.referee_points, 25);

    let referrer_after = reload_user(&state, &referrer.id).await;
    assert_eq!(referrer_after.loyalty_points, 175);
    assert_eq!(referrer_after.referral_points, 75);
    assert_eq!(referrer_after.total_earned, 75);

    let referee_after = reload_user(&state, &referee.id).await;
    assert_eq!(referee_after.loyalty_points, 25);
    assert_eq!(referee_after.total_earned, 25);
    assert_eq!(
        referee_after.referral_code_used.as_deref(),
        Some(referrer.referral_code.as_str())
    );

    // The referred set contains the referee exactly once
    let referred = state
        .db
        .users()
        .referred_ids(&referrer.id)
        .await
        .expect("referred ids");
    assert_eq!(referred, vec![referee.id.clone()]);

    // And the rewards view surfaces the same block
    let view = rewards::rewards(&state, &principal_for(&referrer))
        .await
        .expect("rewards");
    assert_eq!(view.referrals.referred_users, vec![referee.id]);
    assert_eq!(view.referrals.total_earned, 75);
}

#[tokio::test]
async fn own_code_is_rejected() {
    let state = test_state().await;
    let user = seed_user(&state, "Solo", 0, Role::Customer).await;

    let err = referral::redeem(
        &state,
        &principal_for(&user),
        redeem_request(&user.referral_code),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.message.contains("own referral code"));
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let state = test_state().await;
    let user = seed_user(&state, "Seeker", 0, Role::Customer).await;

    let err = referral::redeem(
        &state,
        &principal_for(&user),
        redeem_request("REF-DEADBEEF"),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn second_redemption_fails_with_already_redeemed() {
    let state = test_state().await;
    let referrer_a = seed_user(&state, "Premier", 0, Role::Customer).await;
    let referrer_b = seed_user(&state, "Second", 0, Role::Customer).await;
    let referee = seed_user(&state, "Gourmand", 0, Role::Customer).await;

    referral::redeem(
        &state,
        &principal_for(&referee),
        redeem_request(&referrer_a.referral_code),
    )
    .await
    .expect("first redemption");

    // A different code changes nothing: the field is set-once
    let err = referral::redeem(
        &state,
        &principal_for(&referee),
        redeem_request(&referrer_b.referral_code),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Balances unchanged by the failed attempt
    let referee_after = reload_user(&state, &referee.id).await;
    assert_eq!(referee_after.loyalty_points, 25);
    assert_eq!(reload_user(&state, &referrer_b.id).await.loyalty_points, 0);
}

#[tokio::test]
async fn already_recorded_referee_is_a_duplicate() {
    let state = test_state().await;
    let referrer = seed_user(&state, "Ancien", 0, Role::Customer).await;
    let referee = seed_user(&state, "Connu", 0, Role::Customer).await;

    // The referrer already recorded this user (without the referee having
    // a redeemed code on file)
    sqlx::query(
        "INSERT INTO referred_users (referrer_id, referred_id, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(&referrer.id)
    .bind(&referee.id)
    .bind(Utc::now())
    .execute(state.db.pool())
    .await
    .expect("seed referred pair");

    let err = referral::redeem(
        &state,
        &principal_for(&referee),
        redeem_request(&referrer.referral_code),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(reload_user(&state, &referrer.id).await.loyalty_points, 0);
}

#[tokio::test]
async fn inactive_account_cannot_redeem() {
    let state = test_state().await;
    let referrer = seed_user(&state, "Actif", 0, Role::Customer).await;
    let referee = seed_inactive_user(&state, "Inactif").await;

    let err = referral::redeem(
        &state,
        &principal_for(&referee),
        redeem_request(&referrer.referral_code),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Forbidden);
}
