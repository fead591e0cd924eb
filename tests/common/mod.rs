//! Common test utilities

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use wallet_ledger::db;

/// Connect to the test database and make sure the schema and seed wallets exist
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool)
        .await
        .expect("Failed to ensure schema");

    pool
}

/// Provision a fresh account so tests never share rows
pub async fn fresh_account(pool: &PgPool, owner_ref: &str, balance: Decimal) -> i64 {
    db::create_account_with_balance(pool, owner_ref, balance)
        .await
        .expect("Failed to provision account")
}

/// Ledger rows of an account straight from the table, oldest first
pub async fn ledger_rows(pool: &PgPool, account_id: i64) -> Vec<(String, Decimal)> {
    sqlx::query_as(
        "SELECT op_type, amount FROM ledger_entry WHERE account_id = $1 ORDER BY id",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
    .expect("Failed to read ledger")
}
