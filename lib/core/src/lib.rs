//! Core types shared by the teamgate crates.
//!
//! Only the session identifier lives here; it is the one type the access
//! engine and the server both pass around.

pub mod id;

pub use id::SessionId;
