//! Streaming connection to the ASR service (C3): token fetch/cache,
//! WebSocket auth handshake, ready-gated audio send, and partial/final
//! event parsing.

pub mod client;
pub mod token;
pub mod types;

pub use client::{TransportClient, TransportState};
pub use token::TokenCache;
pub use types::{SessionContext, TranscriptionEvent};
