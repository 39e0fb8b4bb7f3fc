//! Configuration management for Arbor.
//!
//! Core settings ([`settings::Config`]) are stored as a TOML file and
//! loaded by the host at startup.

pub mod settings;

pub use settings::{Config, HistoryConfig, ImportConfig, PlanConfig};
