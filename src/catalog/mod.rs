//! Catalog of producers, requesters, batches and orders
//!
//! Thin data-entry layer over the store. Stock and order status are only
//! ever mutated by the allocation engine; the one sanctioned exception is
//! explicit batch replenishment.

pub mod models;
pub mod repository;

pub use models::{Batch, Fulfillment, Order, OrderStatus, OrderSummary, Producer, Requester};
pub use repository::{BatchRepository, OrderRepository, ProducerRepository, RequesterRepository};
