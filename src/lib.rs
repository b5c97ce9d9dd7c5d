//! Lectern - Closed-Corpus Question Answering
//!
//! Indexes a directory of documents into a local vector index, then answers
//! questions strictly from that material through a local LLM. Two pipelines
//! share one vector space: indexing (load, segment, embed, persist) and
//! query (embed, search, filter by distance, generate or refuse).

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod index;
pub mod indexer;
pub mod retrieval;
pub mod store;

pub use error::{LecternError, Result};
