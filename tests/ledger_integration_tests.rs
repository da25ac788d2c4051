use chrono::{Duration, Utc};
use pixelnova::database::dao::DebitOutcome;
use pixelnova::test_utils::{balance_of, seed_balance, seed_user, TestServerBuilder};
use std::sync::Arc;

#[tokio::test]
async fn test_debit_draws_subscription_pool_first() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "splits@example.com", false).await;
    seed_balance(&server, user.id, 3, 2).await;

    let outcome = server
        .database
        .token_balances()
        .debit(user.id, 4)
        .await
        .unwrap();

    match outcome {
        DebitOutcome::Debited(receipt) => {
            assert_eq!(receipt.subscription_used, 3);
            assert_eq!(receipt.purchased_used, 1);
            assert_eq!(receipt.remaining_subscription, 0);
            assert_eq!(receipt.remaining_purchased, 1);
        }
        other => panic!("expected a successful debit, got {other:?}"),
    }

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 0);
    assert_eq!(balance.purchased_tokens, 1);
}

#[tokio::test]
async fn test_insufficient_debit_leaves_counters_unchanged() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "short@example.com", false).await;
    seed_balance(&server, user.id, 1, 1).await;

    let outcome = server
        .database
        .token_balances()
        .debit(user.id, 5)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DebitOutcome::Insufficient {
            subscription: 1,
            purchased: 1
        }
    );

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1);
    assert_eq!(balance.purchased_tokens, 1);
}

#[tokio::test]
async fn test_missing_balance_row_reads_as_zero() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "empty@example.com", false).await;

    let outcome = server
        .database
        .token_balances()
        .debit(user.id, 1)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DebitOutcome::Insufficient {
            subscription: 0,
            purchased: 0
        }
    );
}

#[tokio::test]
async fn test_concurrent_debits_of_last_token_yield_one_winner() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "race@example.com", false).await;
    seed_balance(&server, user.id, 1, 0).await;

    let dao = Arc::new(server.database.token_balances());
    let first = {
        let dao = dao.clone();
        let user_id = user.id;
        tokio::spawn(async move { dao.debit(user_id, 1).await.unwrap() })
    };
    let second = {
        let dao = dao.clone();
        let user_id = user.id;
        tokio::spawn(async move { dao.debit(user_id, 1).await.unwrap() })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let wins = outcomes
        .iter()
        .filter(|o| matches!(o, DebitOutcome::Debited(_)))
        .count();
    assert_eq!(wins, 1, "exactly one of two racing debits may win");

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens + balance.purchased_tokens, 0);
}

#[tokio::test]
async fn test_expire_sweep_zeroes_only_subscription_pool_and_is_idempotent() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "expiring@example.com", false).await;

    let dao = server.database.token_balances();
    dao.credit(user.id, 50, 20, Some(Utc::now() - Duration::days(1)))
        .await
        .unwrap();

    let swept = dao.expire_sweep(Utc::now()).await.unwrap();
    assert_eq!(swept, 1);

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 0);
    assert_eq!(balance.purchased_tokens, 20);

    // Nothing left to expire; the second run is a no-op
    let swept_again = dao.expire_sweep(Utc::now()).await.unwrap();
    assert_eq!(swept_again, 0);
}

#[tokio::test]
async fn test_expiry_warnings_flag_once() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "warned@example.com", false).await;

    let dao = server.database.token_balances();
    dao.credit(user.id, 10, 0, Some(Utc::now() + Duration::days(3)))
        .await
        .unwrap();

    let now = Utc::now();
    let expiring = dao.find_expiring_soon(now, 7).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].user_id, user.id);
    assert_eq!(expiring[0].subscription_tokens, 10);

    dao.mark_warned(user.id, now).await.unwrap();
    // Repeating the flag set is harmless, and the user drops out of
    // the next scan.
    dao.mark_warned(user.id, now).await.unwrap();
    assert!(dao.find_expiring_soon(now, 7).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refund_lands_in_subscription_pool() {
    let server = TestServerBuilder::new().build().await;
    let user = seed_user(&server, "refund@example.com", false).await;
    seed_balance(&server, user.id, 0, 1).await;

    server.database.token_balances().debit(user.id, 1).await.unwrap();
    server.ledger.refund(user.id, 1).await.unwrap();

    let balance = balance_of(&server, user.id).await.unwrap();
    assert_eq!(balance.subscription_tokens, 1);
    assert_eq!(balance.purchased_tokens, 0);
    // A refund must never stamp a fresh expiry
    assert!(balance.expires_at.is_none());
}
