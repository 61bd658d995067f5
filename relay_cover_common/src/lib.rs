//! Relay Cover Common Library
//!
//! Shared constants, configuration loading and domain types for the relay
//! cover workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits, defaults and paths
//! - [`config`] - TOML loading and validation into typed [`config::CoverConfig`]
//! - [`cover`] - `Position`, `Motion`, `RelayCommand`, `CoverState`, `CoverError`
//! - [`channel`] - The `RelayChannel` contract and an in-memory recorder
//! - [`prelude`] - Common re-exports for convenience

pub mod channel;
pub mod config;
pub mod consts;
pub mod cover;
pub mod prelude;
