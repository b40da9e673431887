//! Parle API Library Crate
//!
//! This library contains the HTTP surface of the conversation companion:
//! configuration, application state, handlers and routing. The `api` binary
//! is a thin wrapper around it.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
