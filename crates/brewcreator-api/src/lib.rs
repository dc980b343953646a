// brewcreator-api: Async Rust client for the BrewCreator cloud API
//
// Covers the identity-server login flow (CSRF scrape + PKCE), token
// lifecycle with durable persistence, the retrying authenticated request
// executor, the raw fleet endpoints, and the realtime push channel.

pub mod client;
pub mod error;
pub mod identity;
pub mod models;
pub mod store;
pub mod token;
pub mod transport;
pub mod websocket;

pub use client::{BrewCreatorClient, RetryPolicy};
pub use error::Error;
pub use store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};
pub use transport::{ServiceEndpoints, TransportConfig};
pub use websocket::RealtimeSession;
