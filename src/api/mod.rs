//! HTTP surface.

pub mod chat;
