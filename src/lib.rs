//! `boltstream`: a transport-agnostic, synchronous implementation of the
//! Bolt wire protocol core — PackStream encoding, message framing, version
//! negotiation, the typed graph/temporal/spatial structure codec, the full
//! client/server message set, and the physical connection state machine.
//!
//! Session pooling, Cypher parsing, routing-table management and async
//! scheduling are explicitly out of scope: this crate hands back typed
//! errors and plain structs for a higher-level driver to build on.

pub mod chunking;
pub mod connection;
pub mod errors;
pub mod handshake;
pub mod messages;
pub mod packstream;
pub mod structs;
pub mod value;
pub mod version;

pub use connection::{Connection, State, Summary, Transport};
pub use errors::{BoltError, Result};
pub use value::{Structure, Value, ValueKind};
pub use version::Version;
