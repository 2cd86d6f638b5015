//! Warta Kernel Library
//!
//! This library exposes the list engine, resource adapters and HTTP routes
//! for integration testing. The main entry point for running the server is
//! the `warta` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod resources;
pub mod routes;
pub mod state;
pub mod store;
