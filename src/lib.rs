//! Library crate for the rushing pick'em backend, exposing modules for binaries and tests.

/// Runtime configuration loaded from `config/app.json`.
pub mod config;
/// Persistence layer: entities, the store trait and its backends.
pub mod dao;
mod dto;
mod error;
/// Statistics provider client and its rate-limited request queue.
pub mod provider;
/// HTTP routes.
pub mod routes;
/// Business logic behind the routes and background tasks.
pub mod services;
/// Shared application state and the domain state machines.
pub mod state;
