//! Command-line interface for woof
//!
//! `discover` is the main command; `producers` and `config` are read-only
//! helpers for checking what discovery will do.

pub mod config;
pub mod discover;
pub mod error;
pub mod output;
pub mod producers;
