//! # tarot-runtime
//!
//! Interpretation provider implementations.
//!
//! ## Providers
//!
//! - **OpenAI** (default): streaming chat completions against the OpenAI
//!   wire protocol (also covers any compatible endpoint via
//!   `OPENAI_BASE_URL`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tarot_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let stream = provider.stream_reading(&request).await?;
//! ```

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use tarot_core::{
    FortuneError, InterpretationProvider, InterpretationStream, ReadingRequest, Result,
    StreamChunk,
};
