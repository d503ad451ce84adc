//! Docq - Local Document Q&A
//!
//! Indexes a directory of PDF/Markdown/text files into a flat, exact-search
//! vector index and answers natural-language questions either grounded in the
//! indexed documents (with citations) or as general chat, routed by a small
//! heuristic cascade.

pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod server;
pub mod store;

pub use error::{DocqError, Result};
