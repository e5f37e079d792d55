//! Streamgate - secure media-delivery gateway
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod server;
pub mod streaming;
