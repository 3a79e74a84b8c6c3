use std::sync::Arc;

use account_service::{AccountService, AccountServiceConfig};
use common::decimal::dec;
use common::error::Error;
use common::model::account::NewAccount;
use common::model::transfer::TransferRequest;

use dotenv::dotenv;

// PostgreSQL integration tests for account service
// These tests require a running PostgreSQL database
// Run with: cargo test --test account_postgres_tests -- --ignored

async fn create_test_service() -> anyhow::Result<Arc<AccountService>> {
    dotenv().ok(); // Load .env.test if it exists

    let config = AccountServiceConfig::new(
        std::env::var("TEST_DATABASE_URL")?,
        10,
        std::time::Duration::from_secs(5),
    );
    let pool = config.connect().await?;

    Ok(Arc::new(AccountService::with_config(&config, pool)))
}

/// Account numbers are unique, so every test run needs fresh ones
fn unique_number(tag: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}{}", tag, nanos % 1_000_000_000_000)
}

fn new_account(number: String, balance: common::decimal::Amount) -> NewAccount {
    NewAccount {
        first_name: "Pg".to_string(),
        last_name: "Test".to_string(),
        number,
        balance,
    }
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_account_lifecycle() -> anyhow::Result<()> {
    let service = create_test_service().await?;

    let account = service.create_account(new_account(unique_number("L"), dec!(10.25))).await?;
    assert!(account.id > 0);

    let fetched = service.get_account(account.id).await?.expect("account should exist");
    assert_eq!(fetched.balance, dec!(10.25));
    assert_eq!(service.list_accounts_by_id(account.id).await?.len(), 1);

    let duplicate = service.create_account(new_account(account.number.clone(), dec!(0))).await;
    assert!(matches!(duplicate, Err(Error::Conflict(_))));

    service.delete_account(account.id).await?;
    assert!(service.get_account(account.id).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "Requires test database"]
async fn test_postgres_transfer_is_atomic() -> anyhow::Result<()> {
    let service = create_test_service().await?;
    let source = service.create_account(new_account(unique_number("S"), dec!(100))).await?;
    let destination = service.create_account(new_account(unique_number("D"), dec!(50))).await?;

    let receipt = service
        .transfer(&TransferRequest {
            from_account_id: source.id,
            to_account_id: destination.id,
            amount: dec!(40),
        })
        .await?;
    assert_eq!(receipt.from_balance, dec!(60));
    assert_eq!(receipt.to_balance, dec!(90));

    let rejected = service
        .transfer(&TransferRequest {
            from_account_id: source.id,
            to_account_id: destination.id,
            amount: dec!(61),
        })
        .await;
    assert!(matches!(rejected, Err(Error::InsufficientBalance(_))));
    assert_eq!(service.get_account(source.id).await?.unwrap().balance, dec!(60));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires test database"]
async fn test_postgres_concurrent_transfers_serialize() -> anyhow::Result<()> {
    let service = create_test_service().await?;
    let source = service.create_account(new_account(unique_number("C"), dec!(100))).await?;
    let destination = service.create_account(new_account(unique_number("E"), dec!(0))).await?;

    let attempts = (0..20).map(|_| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .transfer(&TransferRequest {
                    from_account_id: source.id,
                    to_account_id: destination.id,
                    amount: dec!(10),
                })
                .await
        })
    });
    let results = futures::future::join_all(attempts).await;

    let accepted = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert_eq!(accepted, 10);
    assert_eq!(service.get_account(source.id).await?.unwrap().balance, dec!(0));
    assert_eq!(service.get_account(destination.id).await?.unwrap().balance, dec!(100));
    Ok(())
}
