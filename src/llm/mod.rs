//! Clients for the external chat-completion and embedding services.

pub mod chat;
pub mod embeddings;
pub mod retry;
