//! Configuration and entity types for the evolutionary arena.

mod config;
mod seed;

pub use config::{ConfigError, EvolutionConfig};
pub use seed::{BLUE, RED, Seed, join, similarity};
