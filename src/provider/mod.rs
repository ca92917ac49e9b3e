//! Outbound access to the NFL statistics provider.

mod client;
mod error;
/// Provider payloads and the domain types they decode into.
pub mod models;
/// Rate-limited request queue.
pub mod queue;
mod window;

pub use client::{
    API_KEY_ENV, SportradarClient, SportradarConfig, StatsProvider, UnconfiguredProvider,
};
pub use error::{ProviderError, ProviderResult};
pub use queue::{QueueStatus, RateLimitConfig, RequestQueue};
