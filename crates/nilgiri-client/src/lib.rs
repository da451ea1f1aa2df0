//! # nilgiri-client
//!
//! Calls the proxy's `/api/groq` and `/api/gemini` endpoints on behalf of a
//! UI and turns every outcome into either a [`CompletionReply`] or a typed
//! [`DispatchError`].

pub mod dispatcher;

pub use dispatcher::{wrap_prompt, DispatchError, Dispatcher};

pub use nilgiri_core::CompletionReply;
