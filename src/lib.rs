//! # benefits-chat
//!
//! A Rust web service that answers medical-benefits questions with a
//! two-phase conversational flow (profile collection, then question
//! answering) over a hybrid keyword + semantic retrieval engine. The
//! knowledge base is extracted from HTML benefit tables and embedded
//! offline into a single index artifact.
//!
//! ## Architecture
//!
//! Retrieval is a fixed-order pipeline that narrows candidates cheaply
//! before paying for semantic scoring:
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  User Query  │
//!                    └──────┬───────┘
//!                           │
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Category gating         │  keyword → source allow-list
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Fuzzy prefilter         │  weighted ratio on `service`,
//!              │ (top 200)               │  query + domain synonyms
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Exact-match widening    │  payer+tier rows always kept
//!              │ Soft narrowing          │  payer, then tier, never to ∅
//!              │ Safety floor + backfill │  same-payer union if no pair
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Semantic re-rank        │  cosine vs. query embedding
//!              │ ×1.15 payer ×1.10 tier  │  exact-match boosts
//!              └────────────┬────────────┘
//!                           ▼
//!              ┌─────────────────────────┐
//!              │ Diversity top-k         │  one per (service,payer,tier)
//!              └─────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, data dirs, and LLM settings
//! - [`error`] - Error taxonomy: configuration, index, upstream, validation
//! - [`models`] - Shared data types: `Payer`, `Tier`, `BenefitRow`, `Snippet`, request/response types
//! - [`extract`] - HTML benefit-table extraction into atomic rows
//! - [`index`] - Embedding index build, persistence, and boot-time load
//! - [`search::fuzzy`] - Weighted-ratio fuzzy string similarity
//! - [`search::retriever`] - The hybrid retrieval pipeline
//! - [`llm`] - Chat-completion and embedding clients with bounded retry
//! - [`chat`] - The two conversation phases: profile collection and grounded QA
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state holding the immutable index

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod index;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
