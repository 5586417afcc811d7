//! RDBMS Config Server Library
//!
//! This module exports the resolver, the SQLite row store and the supporting
//! configuration for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod resolver;
pub mod types;
