//! Document handlers
//!
//! Every handler implements one of four variant traits on top of the shared
//! [`ImporterHandler`] contract:
//!
//! ```text
//! restriction check ──no──▶ no-op (content passed through, document accepted)
//!        │yes
//!        ▼
//! Tagger       → mutates metadata
//! Transformer  → rewrites content
//! Splitter     → derives child documents
//! Filter       → accepts or rejects
//! ```
//!
//! The concrete handlers live in the `taggers`, `transformers`, `splitters`
//! and `filters` modules.

pub mod handler;

pub use handler::*;
