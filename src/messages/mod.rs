//! Message codec: client request serializers, server reply deserializers,
//! tag dispatch, and the shared version-gated extra-map table.

pub mod client;
pub mod extra;
pub mod server;
pub mod tags;

pub use client::*;
pub use server::*;
pub use tags::MessageTag;
