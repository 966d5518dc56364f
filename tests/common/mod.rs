//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use veritrace::catalog::{
    Batch, BatchRepository, Order, OrderRepository, Producer, ProducerRepository, Requester,
    RequesterRepository,
};
use veritrace::store::{Database, migrate};

pub async fn setup_db() -> Arc<Database> {
    let db = Arc::new(Database::connect_in_memory().await.unwrap());
    migrate(db.pool()).await.unwrap();
    db
}

pub async fn make_producer(db: &Database) -> Producer {
    ProducerRepository::create(db.pool(), "12.345.678/0001-90", "VerdeLeite")
        .await
        .unwrap()
}

pub async fn make_requester(db: &Database) -> Requester {
    RequesterRepository::create(
        db.pool(),
        "Bairro Central",
        "Maria Silva",
        "central@example.com",
        "+55 11 99999-0000",
    )
    .await
    .unwrap()
}

pub async fn make_batch(db: &Database, producer_id: i64, number: &str, stock: i64) -> Batch {
    let expiry = NaiveDate::from_ymd_opt(2027, 6, 30).unwrap();
    BatchRepository::create(db.pool(), number, producer_id, expiry, stock)
        .await
        .unwrap()
}

pub async fn make_order(db: &Database, requester_id: i64, quantity: i64) -> Order {
    OrderRepository::create(db.pool(), requester_id, quantity)
        .await
        .unwrap()
}

pub async fn remaining_stock(db: &Database, batch_id: i64) -> i64 {
    sqlx::query_scalar("SELECT remaining_stock FROM batches WHERE id = ?1")
        .bind(batch_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn token_count_for_order(db: &Database, order_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE order_id = ?1")
        .bind(order_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

pub async fn fulfillment_count(db: &Database, order_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM fulfillments WHERE order_id = ?1")
        .bind(order_id)
        .fetch_one(db.pool())
        .await
        .unwrap()
}
