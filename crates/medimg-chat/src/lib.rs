//! A chat client for the medical-imaging records assistant, assembling the
//! HTTP transport and the chat session.
//!
//! The crate includes a CLI tool for chatting in the terminal. And you can
//! also use it as a library to drive the assistant from your own host apps.

#![deny(missing_docs)]

mod env;

pub use env::{EnvConfig, EnvError};

/// Re-exports of [`medimg_chat_model`] crate.
pub mod model {
    pub use medimg_chat_model::*;
}

/// Re-exports of [`medimg_chat_stream`] crate.
pub mod stream {
    pub use medimg_chat_stream::*;
}

/// Re-exports of [`medimg_chat_http`] crate.
pub mod http {
    pub use medimg_chat_http::*;
}

/// Re-exports of [`medimg_chat_core`] crate.
pub mod core {
    pub use medimg_chat_core::*;
}
