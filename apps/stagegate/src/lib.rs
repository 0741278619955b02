//! # stagegate
//!
//! The stagegate binary's library surface: the HTTP API, the CLI and
//! registry configuration loading. All progression rules live in
//! `stagegate-core`.

pub mod api;
pub mod cli;
pub mod config;
