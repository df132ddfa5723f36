//! opsboard-core: data model and lookup tables for the opsboard engine.
//!
//! # Public API
//!
//! - [`Operation`], [`OperatorProfile`] -- snapshots owned by the external store
//! - [`Difficulty`], [`Priority`], [`Category`], [`OperationStatus`], [`Rank`] --
//!   fixed enumerations
//! - [`EngineConfig`] -- reward, bonus and rank tables (TOML-loadable)
//! - [`ConfigError`] -- configuration and data-integrity errors

pub mod config;
pub mod error;
pub mod types;

pub use config::{validate_ladder, EngineConfig, RankTier, TimingConfig};
pub use error::ConfigError;
pub use types::{
    Category, Difficulty, Operation, OperationStatus, OperatorProfile, Priority, Rank,
    RewardDescriptor,
};
