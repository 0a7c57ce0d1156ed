//! In-Process Model Lifecycle Manager & Generation Orchestrator
//!
//! Core of a text-to-image web backend: a bounded cache of expensive,
//! stateful model pipelines loaded on demand, evicted under memory pressure
//! (LRU plus idle timeout), serialized against concurrent generation
//! requests, and torn down cleanly on error. Prompt-to-style selection is a
//! keyword-scoring classifier. HTTP routing, authentication, credit
//! accounting, and transcription stay in the embedding application; this
//! crate exposes the service types and error mapping those layers consume.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;
pub mod stats;
pub mod store;

pub use error::{AppError, Result};
