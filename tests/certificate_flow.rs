//! Certificate lifecycle state machine
//!
//! Exercises the tracker against real consumed tokens: transition guards,
//! the terminal minted state, failure retry, the poller listing and stats.

mod common;

use veritrace::certificate::{CertStatus, CertTracker, CertUpdate, MintData};
use veritrace::error::CoreError;
use veritrace::{Allocator, Redeemer};

use common::*;

struct Harness {
    tracker: CertTracker,
    redeemer: Redeemer,
    tokens: Vec<String>,
}

/// Issue `count` tokens against a fresh order; consume none yet
async fn harness(count: i64) -> Harness {
    let db = setup_db().await;
    let producer = make_producer(&db).await;
    let requester = make_requester(&db).await;
    let batch = make_batch(&db, producer.id, "BATCH-A", 500).await;
    let order = make_order(&db, requester.id, count).await;

    let allocator = Allocator::new(db.clone());
    let outcome = allocator.fulfill(order.id, batch.id, count).await.unwrap();
    let tokens = outcome.tokens.into_iter().map(|t| t.token).collect();

    Harness {
        tracker: CertTracker::new(db.clone()),
        redeemer: Redeemer::new(db),
        tokens,
    }
}

fn mint_data() -> MintData {
    MintData {
        ref_id: "cert-1".to_string(),
        uri: "ipfs://QmExample".to_string(),
        tx_ref: "0xabc123".to_string(),
        recipient: "0xrecipient".to_string(),
    }
}

#[tokio::test]
async fn test_full_lifecycle_to_minted() {
    let h = harness(1).await;
    let token = &h.tokens[0];
    h.redeemer.consume(token).await.unwrap();

    h.tracker.mark_processing(token).await.unwrap();
    h.tracker.mark_minted(token, mint_data()).await.unwrap();

    let record = h.tracker.get_with_cert(token).await.unwrap().unwrap();
    assert_eq!(record.cert_status, Some(CertStatus::Minted));
    assert_eq!(record.cert_ref_id.as_deref(), Some("cert-1"));
    assert_eq!(record.cert_uri.as_deref(), Some("ipfs://QmExample"));
    assert_eq!(record.cert_tx_ref.as_deref(), Some("0xabc123"));
    assert_eq!(record.cert_recipient.as_deref(), Some("0xrecipient"));
    assert!(record.cert_minted_at.is_some());
}

/// Minted is terminal: every further update is a conflict
#[tokio::test]
async fn test_minted_rejects_all_updates() {
    let h = harness(1).await;
    let token = &h.tokens[0];
    h.redeemer.consume(token).await.unwrap();
    h.tracker.mark_processing(token).await.unwrap();
    h.tracker.mark_minted(token, mint_data()).await.unwrap();

    for status in [
        CertStatus::Pending,
        CertStatus::Processing,
        CertStatus::Minted,
        CertStatus::Failed,
    ] {
        let result = h.tracker.update_status(token, CertUpdate::new(status)).await;
        assert!(
            matches!(result, Err(CoreError::CertAlreadyMinted)),
            "minted record accepted a transition to {}",
            status
        );
    }

    let result = h.tracker.retry_failed(token).await;
    assert!(matches!(result, Err(CoreError::RetryNotFailed)));
}

/// Minting an unconsumed token is rejected
#[tokio::test]
async fn test_mint_requires_consumption() {
    let h = harness(1).await;
    let token = &h.tokens[0];

    let result = h.tracker.mark_minted(token, mint_data()).await;
    assert!(matches!(result, Err(CoreError::TokenNotConsumed)));

    // Processing is fine without consumption; the guard is mint-specific
    h.tracker.mark_processing(token).await.unwrap();
}

#[tokio::test]
async fn test_failed_then_retry_clears_error() {
    let h = harness(1).await;
    let token = &h.tokens[0];
    h.redeemer.consume(token).await.unwrap();

    h.tracker.mark_processing(token).await.unwrap();
    h.tracker.mark_failed(token, "network error").await.unwrap();

    let record = h.tracker.get_with_cert(token).await.unwrap().unwrap();
    assert_eq!(record.cert_status, Some(CertStatus::Failed));
    assert_eq!(record.cert_error.as_deref(), Some("network error"));

    h.tracker.retry_failed(token).await.unwrap();

    let record = h.tracker.get_with_cert(token).await.unwrap().unwrap();
    assert_eq!(record.cert_status, Some(CertStatus::Pending));
    assert!(record.cert_error.is_none(), "Retry must clear the error");
}

#[tokio::test]
async fn test_retry_only_from_failed() {
    let h = harness(1).await;
    let token = &h.tokens[0];
    h.redeemer.consume(token).await.unwrap();

    let result = h.tracker.retry_failed(token).await;
    assert!(matches!(result, Err(CoreError::RetryNotFailed)));

    h.tracker.mark_processing(token).await.unwrap();
    let result = h.tracker.retry_failed(token).await;
    assert!(matches!(result, Err(CoreError::RetryNotFailed)));
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let h = harness(1).await;
    let result = h.tracker.mark_processing("no-such-token").await;
    assert!(matches!(result, Err(CoreError::TokenNotFound)));
    assert!(h.tracker.get_with_cert("no-such-token").await.unwrap().is_none());
}

/// The poller listing: consumed with unset/pending/failed status only,
/// oldest consumption first, bounded
#[tokio::test]
async fn test_list_pending_filters_and_orders() {
    let h = harness(4).await;

    // Consume three of four, in a known order
    for token in &h.tokens[..3] {
        h.redeemer.consume(token).await.unwrap();
    }

    // tokens[1] goes all the way to minted, tokens[2] fails
    h.tracker.mark_processing(&h.tokens[1]).await.unwrap();
    h.tracker.mark_minted(&h.tokens[1], mint_data()).await.unwrap();
    h.tracker.mark_processing(&h.tokens[2]).await.unwrap();
    h.tracker.mark_failed(&h.tokens[2], "gas spike").await.unwrap();

    let pending = h.tracker.list_pending(100).await.unwrap();
    let listed: Vec<&str> = pending.iter().map(|p| p.token.as_str()).collect();

    assert_eq!(pending.len(), 2, "Unconsumed and minted tokens are excluded");
    assert!(listed.contains(&h.tokens[0].as_str()));
    assert!(listed.contains(&h.tokens[2].as_str()));
    assert!(
        pending.windows(2).all(|w| w[0].consumed_at <= w[1].consumed_at),
        "Listing is ordered by consumed_at ascending"
    );

    let bounded = h.tracker.list_pending(1).await.unwrap();
    assert_eq!(bounded.len(), 1);

    // Context travels with each row
    assert_eq!(pending[0].batch_number, "BATCH-A");
    assert_eq!(pending[0].producer_name, "VerdeLeite");
    assert_eq!(pending[0].requester_name, "Bairro Central");
}

#[tokio::test]
async fn test_stats_buckets() {
    let h = harness(5).await;

    for token in &h.tokens[..4] {
        h.redeemer.consume(token).await.unwrap();
    }

    // One minted, one processing, one failed, one left pending
    h.tracker.mark_processing(&h.tokens[0]).await.unwrap();
    h.tracker.mark_minted(&h.tokens[0], mint_data()).await.unwrap();
    h.tracker.mark_processing(&h.tokens[1]).await.unwrap();
    h.tracker.mark_processing(&h.tokens[2]).await.unwrap();
    h.tracker.mark_failed(&h.tokens[2], "boom").await.unwrap();

    let stats = h.tracker.stats().await.unwrap();
    assert_eq!(stats.minted, 1);
    assert_eq!(stats.processing, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.pending, 1, "Consumed with unset status counts as pending");
    assert_eq!(stats.total_consumed, 4);
}

/// Only supplied fields are touched by an update
#[tokio::test]
async fn test_partial_field_updates() {
    let h = harness(1).await;
    let token = &h.tokens[0];
    h.redeemer.consume(token).await.unwrap();

    h.tracker
        .update_status(
            token,
            CertUpdate {
                ref_id: Some("early-ref".to_string()),
                ..CertUpdate::new(CertStatus::Processing)
            },
        )
        .await
        .unwrap();

    // Second update carries no fields; ref_id must survive
    h.tracker
        .update_status(token, CertUpdate::new(CertStatus::Pending))
        .await
        .unwrap();

    let record = h.tracker.get_with_cert(token).await.unwrap().unwrap();
    assert_eq!(record.cert_status, Some(CertStatus::Pending));
    assert_eq!(record.cert_ref_id.as_deref(), Some("early-ref"));
}
