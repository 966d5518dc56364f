//! Demo data seeding (feature `demo-seed`)
//!
//! Seeds a minimal dataset on an empty store so a dev build is usable out of
//! the box. Production builds must disable the feature.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

/// Insert demo records if the store is empty
pub async fn seed_demo(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let producer_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM producers")
        .fetch_one(pool)
        .await?;
    if producer_count > 0 {
        return Ok(());
    }

    let now = Utc::now();
    let expiry = (now + Duration::days(60)).date_naive();

    sqlx::query("INSERT INTO producers (tax_id, name) VALUES (?1, ?2)")
        .bind("12.345.678/0001-90")
        .bind("VerdeLeite")
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT INTO requesters (name, contact_name, email, phone) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind("Bairro Central")
    .bind("Maria Silva")
    .bind("central@example.com")
    .bind("+55 11 99999-0000")
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO batches (batch_number, producer_id, expiry_date, remaining_stock, created_at)
         VALUES (?1, 1, ?2, ?3, ?4)",
    )
    .bind("BATCH-001")
    .bind(expiry)
    .bind(100_i64)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO orders (requester_id, requested_quantity, status, created_at)
         VALUES (1, ?1, 'pending', ?2)",
    )
    .bind(40_i64)
    .bind(now)
    .execute(pool)
    .await?;

    tracing::info!("Seeded demo producer, requester, batch and order");
    Ok(())
}
