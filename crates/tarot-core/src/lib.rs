//! # tarot-core
//!
//! Domain types for a tarot reading and the provider-agnostic contract for
//! the interpretation generator.
//!
//! The generator is an opaque collaborator: the server hands it a question
//! plus three drawn cards and relays the text stream it returns. The
//! `InterpretationProvider` trait keeps the backend swappable (OpenAI
//! today, anything else tomorrow) without touching server logic, and it is
//! the seam the reading handler's debit-before-stream ordering is tested
//! against.

pub mod error;
pub mod provider;
pub mod reading;

pub use error::{FortuneError, Result};
pub use provider::{InterpretationProvider, InterpretationStream, StreamChunk};
pub use reading::{DrawnCard, ReadingRequest, SpreadPosition};
