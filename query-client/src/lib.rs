//! Client for the VaultIQ query API.
//!
//! Issues one `POST /api/query` per user query and reconciles the response,
//! which may arrive as a single buffered JSON document, as newline-delimited
//! streaming events, or as an incrementally-delivered byte stream of unknown
//! framing. The resolved answer, citations, loading flag and error message
//! are exposed through a caller-owned [`QueryResult`] slot.
//!
//! The DTOs in [`types`] double as the server-side wire shapes for the same
//! endpoint.

pub mod client;
pub mod error;
pub mod reconcile;
pub mod types;

pub use client::{QueryClient, QueryClientConfig, QuerySession};
pub use error::QueryClientError;
pub use types::{
    QueryRequest, QueryResponse, QueryResult, SourceCitation, SourceType, StreamChunk,
};
