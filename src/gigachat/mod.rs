//! GigaChat protocol layer: configuration, wire types, transport and the
//! translation between the provider-agnostic model and the vendor format.

pub mod api;
pub mod chat;
pub mod config;
pub mod convert;
pub mod embeddings;
pub mod request;
pub mod streaming;
pub mod structured;
pub mod tools;
pub mod wire;
