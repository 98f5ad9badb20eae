//! # MemeTrend
//!
//! A meme-powered data analytics oracle: collect tech memes, score how
//! viral they are, and ask a language model what the memes say about where
//! the data tooling world is heading.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ RecordStore  │──▶│  Virality    │──▶│  PNG chart   │
//! │ memes.json   │   │  Estimator   │   └──────────────┘
//! └──────┬───────┘   └──────────────┘
//!        │           ┌──────────────┐   ┌──────────────┐
//!        └──────────▶│ SearchIndex  │──▶│  Insight     │──▶ chat model
//!                    │ (+ glossary) │   │  Generator   │
//!                    └──────────────┘   └──────────────┘
//!                           ▲                  ▲
//!                 ┌─────────┴──────────────────┴───┐
//!                 │   Session (CLI and HTTP API)   │
//!                 └────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! memetrend init
//! memetrend add --text "Pandas is slow #DataScience" --desc "Sad panda cartoon"
//! memetrend trends
//! memetrend ask "Predict next big data tool from memes?"
//! memetrend serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`record_store`] | JSON-file meme storage |
//! | [`chart`] | Virality bar chart (PNG) |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama, local, hash) |
//! | [`llm`] | Chat-model providers (OpenAI, Ollama) |
//! | [`index_store`] | Index persistence |
//! | [`insight`] | Retrieval-augmented trend answers |
//! | [`session`] | Facade shared by CLI and server |
//! | [`server`] | HTTP API |
//!
//! Pure domain types and algorithms live in `memetrend-core`.

pub mod chart;
pub mod config;
pub mod embedding;
pub mod index_store;
pub mod insight;
pub mod llm;
pub mod record_store;
pub mod server;
pub mod session;
