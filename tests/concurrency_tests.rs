mod common;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shopfront::domain::account::{AccountId, Balance};
use shopfront::domain::principal::{Principal, Role};
use shopfront::error::ShopError;
use std::sync::Arc;

fn principal(id: &str, role: Role) -> Principal {
    Principal::new(AccountId::new(id).unwrap(), role)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_overdraft_attempts_never_go_negative() {
    let service = Arc::new(common::service().await);
    let alice = principal("alice", Role::Customer);

    // 50 attempts of 10 against a balance of 100: exactly 10 may succeed.
    let handles: Vec<_> = (0..50)
        .map(|_| {
            let service = Arc::clone(&service);
            let alice = alice.clone();
            tokio::spawn(async move { service.transfer(&alice, "alice", "bob", "10").await })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                assert!(!receipt.from.balance.is_negative());
                committed += 1;
            }
            Err(ShopError::InsufficientFunds(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(committed, 10);

    let root = principal("root", Role::Admin);
    let accounts = service.accounts(&root).await.unwrap();
    let alice = accounts.iter().find(|a| a.id.as_str() == "alice").unwrap();
    let bob = accounts.iter().find(|a| a.id.as_str() == "bob").unwrap();
    assert_eq!(alice.balance, Balance::ZERO);
    assert_eq!(bob.balance, Balance::new(dec!(150)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_random_transfers_conserve_total() {
    let service = Arc::new(common::service().await);
    let root = principal("root", Role::Admin);
    let ids = ["alice", "bob", "carol"];

    let mut rng = rand::thread_rng();
    let handles: Vec<_> = (0..200)
        .map(|_| {
            let from = ids[rng.gen_range(0..ids.len())];
            let offset = ids.iter().position(|i| *i == from).unwrap() + rng.gen_range(1..ids.len());
            let to = ids[offset % ids.len()];
            let amount = format!("{}.{:02}", rng.gen_range(0..40), rng.gen_range(1..100));
            let service = Arc::clone(&service);
            let root = root.clone();
            tokio::spawn(async move { service.transfer(&root, from, to, &amount).await })
        })
        .collect();

    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) | Err(ShopError::InsufficientFunds(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let accounts = service.accounts(&root).await.unwrap();
    assert!(accounts.iter().all(|a| !a.balance.is_negative()));
    let total: Decimal = accounts.iter().map(|a| a.balance.0).sum();
    assert_eq!(total, dec!(150));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_coupon_redemption_credits_once() {
    let service = Arc::new(common::service().await);
    let root = principal("root", Role::Admin);

    let handles: Vec<_> = ["alice", "bob", "carol"]
        .into_iter()
        .cycle()
        .take(30)
        .map(|user| {
            let service = Arc::clone(&service);
            let root = root.clone();
            tokio::spawn(async move { service.apply_coupon(&root, user, "WELCOME50").await })
        })
        .collect();

    let mut redeemed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => redeemed += 1,
            Err(ShopError::CouponAlreadyRedeemed(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(redeemed, 1);

    let accounts = service.accounts(&root).await.unwrap();
    let total: Decimal = accounts.iter().map(|a| a.balance.0).sum();
    assert_eq!(total, dec!(200));
}
