//! Database module
//!
//! Schema bootstrap, schema verification and account provisioning.

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool};

/// Schema of the `account` and `ledger_entry` tables
const SCHEMA_SQL: &str = include_str!("../migrations/0001_wallet.sql");

/// Wallets every fresh installation starts with
const SEED_ACCOUNTS: &[(i64, &str)] = &[(1, "user1"), (2, "user2")];

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Advisory lock key serialising concurrent schema bootstraps
const SCHEMA_LOCK_KEY: i64 = 0x5741_4C4C_4554;

/// Create the tables if missing and seed the default wallets
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    // Unbound text runs over the simple query protocol, which accepts
    // several statements at once
    (&mut *tx).execute(SCHEMA_SQL).await?;

    for (id, owner_ref) in SEED_ACCOUNTS {
        sqlx::query(
            r#"
            INSERT INTO account (id, balance, owner_ref)
            VALUES ($1, 0, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(owner_ref)
        .execute(&mut *tx)
        .await?;
    }

    // Explicit ids above do not advance the sequence
    sqlx::query(
        r#"
        SELECT setval(
            pg_get_serial_sequence('account', 'id'),
            GREATEST((SELECT MAX(id) FROM account), 1)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Schema ensured, seed wallets present");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["account", "ledger_entry"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

/// Provision a new account with a zero balance and return its id
pub async fn create_account(pool: &PgPool, owner_ref: &str) -> Result<i64, sqlx::Error> {
    create_account_with_balance(pool, owner_ref, Decimal::ZERO).await
}

/// Provision a new account with an opening balance and return its id
pub async fn create_account_with_balance(
    pool: &PgPool,
    owner_ref: &str,
    balance: Decimal,
) -> Result<i64, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO account (balance, owner_ref)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(balance)
    .bind(owner_ref)
    .fetch_one(pool)
    .await?;

    tracing::debug!(account_id = id, owner_ref, "Account provisioned");
    Ok(id)
}
