//! Ledger schema, applied idempotently at core startup

use sqlx::PgPool;

const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    account_id BIGINT PRIMARY KEY,
    balance    NUMERIC(20, 2) NOT NULL CHECK (balance >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSFERS: &str = r#"
CREATE TABLE IF NOT EXISTS transfers (
    transfer_id              BIGSERIAL PRIMARY KEY,
    source_account_id        BIGINT NOT NULL REFERENCES accounts (account_id),
    destination_account_id   BIGINT NOT NULL REFERENCES accounts (account_id),
    amount                   NUMERIC(20, 2) NOT NULL CHECK (amount > 0),
    correlation_id           BIGINT NOT NULL DEFAULT 0,
    status                   SMALLINT NOT NULL,
    source_prev_balance      NUMERIC(20, 2) NOT NULL,
    destination_prev_balance NUMERIC(20, 2) NOT NULL,
    source_post_balance      NUMERIC(20, 2),
    destination_post_balance NUMERIC(20, 2),
    created_at               TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CHECK (source_account_id <> destination_account_id)
)
"#;

const CREATE_TRANSFERS_CORRELATION_IDX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transfers_correlation ON transfers (correlation_id)";

pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in [
        CREATE_ACCOUNTS,
        CREATE_TRANSFERS,
        CREATE_TRANSFERS_CORRELATION_IDX,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("Ledger schema ready");
    Ok(())
}
