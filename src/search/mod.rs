//! Hybrid retrieval: fuzzy keyword prefiltering plus semantic re-ranking.

pub mod fuzzy;
pub mod retriever;
