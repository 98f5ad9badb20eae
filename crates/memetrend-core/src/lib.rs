//! # MemeTrend Core
//!
//! Pure logic for MemeTrend: meme records, virality scoring, the
//! embedding and chat-model traits, the similarity index, and the prompt
//! template.
//!
//! This crate performs no filesystem I/O and does not depend on tokio.
//! Persistence, HTTP clients, and the CLI live in the `memetrend` crate.

pub mod chat;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod prompt;
pub mod virality;

pub use error::MemeError;
