//! woof: compare the outputs of two runs of a variant-calling pipeline
//!
//! The library holds the input discovery engine; the `woof` binary wraps it
//! in a CLI.

pub mod discovery;

pub use discovery::{DiscoveryConfig, DiscoveryError, DiscoverySession, ProducerRegistry};
