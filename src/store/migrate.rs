//! Idempotent schema creation
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so startup migration is
//! safe to run on an existing database.

use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS producers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tax_id TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS requesters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        contact_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS batches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        batch_number TEXT NOT NULL,
        producer_id INTEGER NOT NULL,
        expiry_date TEXT NOT NULL,
        remaining_stock INTEGER NOT NULL CHECK(remaining_stock >= 0),
        created_at TEXT NOT NULL,
        FOREIGN KEY(producer_id) REFERENCES producers(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        requester_id INTEGER NOT NULL,
        requested_quantity INTEGER NOT NULL CHECK(requested_quantity > 0),
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK(status IN ('pending','partial','fulfilled')),
        created_at TEXT NOT NULL,
        FOREIGN KEY(requester_id) REFERENCES requesters(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fulfillments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL,
        batch_id INTEGER NOT NULL,
        allocated_quantity INTEGER NOT NULL CHECK(allocated_quantity > 0),
        created_at TEXT NOT NULL,
        FOREIGN KEY(order_id) REFERENCES orders(id) ON DELETE CASCADE,
        FOREIGN KEY(batch_id) REFERENCES batches(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tokens (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT UNIQUE NOT NULL,
        batch_id INTEGER NOT NULL,
        order_id INTEGER,
        requester_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'issued' CHECK(status IN ('issued','consumed')),
        issued_at TEXT NOT NULL,
        consumed_at TEXT,
        cert_status TEXT,
        cert_ref_id TEXT,
        cert_uri TEXT,
        cert_tx_ref TEXT,
        cert_recipient TEXT,
        cert_error TEXT,
        cert_minted_at TEXT,
        FOREIGN KEY(batch_id) REFERENCES batches(id) ON DELETE CASCADE,
        FOREIGN KEY(order_id) REFERENCES orders(id) ON DELETE SET NULL,
        FOREIGN KEY(requester_id) REFERENCES requesters(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_fulfillments_order ON fulfillments(order_id)",
    "CREATE INDEX IF NOT EXISTS idx_tokens_order ON tokens(order_id)",
    // Serves the certificate poller's consumed-but-unresolved scan
    "CREATE INDEX IF NOT EXISTS idx_tokens_cert ON tokens(status, cert_status)",
];

/// Create all tables and indexes
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Schema migration complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        migrate(db.pool()).await.unwrap();
        migrate(db.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_stock_check_constraint() {
        let db = Database::connect_in_memory().await.unwrap();
        migrate(db.pool()).await.unwrap();

        sqlx::query("INSERT INTO producers (tax_id, name) VALUES ('12.345.678/0001-90', 'Acme')")
            .execute(db.pool())
            .await
            .unwrap();

        let result = sqlx::query(
            "INSERT INTO batches (batch_number, producer_id, expiry_date, remaining_stock, created_at)
             VALUES ('B-001', 1, '2027-01-01', -1, '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err(), "Negative stock must violate the CHECK");
    }
}
