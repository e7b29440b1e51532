//! # MOR server
//! This crate hosts the REST server for the merchant-of-record service. It is responsible for:
//! * Authenticating callers against the identity service and enforcing admin-only routes.
//! * Exposing the settings, transaction, payout, withdrawal and customer APIs of the engine.
//! * Receiving payment provider webhooks.
//! * Periodically paying out merchants, when configured to.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following unauthenticated routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/{account_id}`: Payment provider webhooks for a merchant.
//!
//! Everything else lives under `/api` and needs an `Authorization: Bearer <token>` header. Admin routes are under
//! `/api/admin`. See [routes](routes/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod payout_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
