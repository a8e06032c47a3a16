//! Shared types for the medical-imaging chat assistant client.
//!
//! This crate defines the transcript data model, the wire schema of the
//! chat stream, the request payload sent upstream, and the transport
//! traits that connect the stream reducer to an HTTP implementation.
//!
//! Types in this crate don't define any streaming behavior, they are the
//! contract shared by the reducer, the transports, and the UI layer.

#![deny(missing_docs)]

mod error;
mod event;
mod message;
mod request;
mod transcript;
mod transport;

pub use error::*;
pub use event::*;
pub use message::*;
pub use request::*;
pub use transcript::*;
pub use transport::*;
