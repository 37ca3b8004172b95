//! # repo-qa
//!
//! A session-scoped web service for asking natural-language questions about
//! a git repository. Each `POST /clone` fetches a public repository into an
//! isolated session, chunks its text files, embeds the chunks, and builds a
//! per-session vector index; `POST /query` retrieves the most similar chunks
//! and returns a generated answer grounded in them, with citations.
//!
//! ## Pipeline
//!
//! ```text
//!   POST /clone                              POST /query
//!        │                                        │
//!        ▼                                        ▼
//!  ┌───────────┐   ┌──────────┐   ┌─────────┐   ┌────────────────┐
//!  │  Fetcher  │──▶│ Chunker  │──▶│ Indexer │   │ Session lookup │
//!  │ (shallow  │   │ (overlap │   │ (embed, │   │ (status gate)  │
//!  │  clone)   │   │ windows) │   │ cosine) │   └───────┬────────┘
//!  └───────────┘   └──────────┘   └────┬────┘           ▼
//!                                      │        ┌────────────────┐
//!                                      └───────▶│ Retrieval +    │
//!                                   session     │ grounded answer│
//!                                   registry    │ (+ citations)  │
//!                                               └────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, limits, and LLM settings
//! - [`error`] - Typed error taxonomy for fetch, index, and query failures
//! - [`models`] - Shared data types: chunks, citations, request/response bodies
//! - [`git`] - Shallow cloning with cleanup guarantees, and text-file walking
//! - [`chunking`] - Deterministic overlapping line-window chunker
//! - [`index`] - Per-session vector index with cosine similarity search
//! - [`llm`] - Embedding and generation collaborators (Ollama / OpenAI-compatible)
//! - [`session`] - Session registry: opaque ids, status gate, expiry sweep
//! - [`engine`] - Retrieval-answer engine producing grounded, cited answers
//! - [`api`] - Axum handlers for /status, /clone, /query, /remove
//! - [`state`] - Shared application state

pub mod api;
pub mod chunking;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod index;
pub mod llm;
pub mod models;
pub mod session;
pub mod state;
