//! Load Testing Tool
//!
//! Hammers two accounts with opposite-direction transfers and deposits,
//! then checks that no money was created or lost.
//!
//! Run with: cargo run --bin load_test --release -- --transfers 1000 --concurrency 32

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Semaphore;

use wallet_ledger::{db, Amount, Config, OpType, PgBackend, Wallet, WalletError, WalletStore};

/// 1000.00 per account
fn opening_balance() -> Decimal {
    Decimal::new(100_000, 2)
}

fn transfer_amount() -> Decimal {
    Decimal::new(125, 2)
}

fn deposit_amount() -> Decimal {
    Decimal::new(50, 2)
}

fn arg_value(args: &[String], flag: &str, default: usize) -> usize {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Default)]
struct Tally {
    succeeded: u64,
    retryable: u64,
    rejected: u64,
    failed: u64,
    deposits: u64,
}

impl Tally {
    fn record(&mut self, result: &Result<(), WalletError>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) if e.is_retryable() => self.retryable += 1,
            Err(e) if e.is_client_error() => self.rejected += 1,
            Err(e) => {
                eprintln!("Unexpected failure: {}", e);
                self.failed += 1;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let operations = arg_value(&args, "--transfers", 1000);
    let concurrency = arg_value(&args, "--concurrency", 32).max(1);

    let config = Config::from_env()?;

    println!(
        "Load Test - {} operations, concurrency {}, lock order {}",
        operations, concurrency, config.lock_order
    );
    println!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    db::ensure_schema(&pool).await?;

    let a = db::create_account_with_balance(&pool, "load_test_a", opening_balance()).await?;
    let b = db::create_account_with_balance(&pool, "load_test_b", opening_balance()).await?;

    let backend = PgBackend::new(pool.clone()).with_lock_timeout(config.lock_timeout);
    let wallet: Arc<dyn WalletStore> = Arc::new(Wallet::new(backend, config.wallet_options()));
    let amount = Amount::new(transfer_amount())?;
    let deposit = deposit_amount();

    let permits = Arc::new(Semaphore::new(concurrency));
    let start = Instant::now();
    let mut handles = Vec::with_capacity(operations);

    for i in 0..operations {
        let wallet = Arc::clone(&wallet);
        let permit = Arc::clone(&permits).acquire_owned().await?;
        handles.push(tokio::spawn(async move {
            let _permit = permit;
            match i % 5 {
                4 => {
                    let result = wallet.apply_delta(a, OpType::Deposit, deposit).await;
                    (true, result)
                }
                n if n % 2 == 0 => (false, wallet.transfer(a, b, amount).await),
                _ => (false, wallet.transfer(b, a, amount).await),
            }
        }));
    }

    let mut tally = Tally::default();
    for handle in handles {
        let (is_deposit, result) = handle.await?;
        if is_deposit && result.is_ok() {
            tally.deposits += 1;
        }
        tally.record(&result);
    }

    let elapsed = start.elapsed();

    let balance_a = wallet.get_account(a).await?.balance;
    let balance_b = wallet.get_account(b).await?.balance;
    let expected = opening_balance() * Decimal::from(2) + deposit * Decimal::from(tally.deposits);
    let conserved = balance_a + balance_b == expected;

    let rate = tally.succeeded as f64 / elapsed.as_secs_f64();

    println!("\n=== Load Test Results ===");
    println!("Total operations: {}", operations);
    println!("Successful: {}", tally.succeeded);
    println!("Retryable failures: {}", tally.retryable);
    println!("Rejected: {}", tally.rejected);
    println!("Other failures: {}", tally.failed);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} ops/sec", rate);
    println!(
        "Balances: {} + {} = {} (expected {})",
        balance_a,
        balance_b,
        balance_a + balance_b,
        expected
    );

    pool.close().await;

    if !conserved {
        anyhow::bail!("Conservation violated");
    }
    println!("Conservation: OK");

    Ok(())
}
