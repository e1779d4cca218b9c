//! teamgate web server.
//!
//! An axum front door that admits callers by their GitHub team
//! memberships and drops their sessions when GitHub reports those
//! memberships gone.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
