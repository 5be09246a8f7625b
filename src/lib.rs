//! Library crate for scoring-mirror, exposing modules for binaries and integration tests.

pub mod app;
pub mod config;
mod dto;
mod error;
pub mod extract;
pub mod model;
pub mod routes;
pub mod services;
pub mod sinks;
pub mod source;
pub mod state;
