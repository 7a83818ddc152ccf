//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration loading, logging setup and the composition
//! root that builds a [`Session`](crate::application::session::Session) from
//! configuration.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`bootstrap`] - Composition root for runtime wiring

pub mod bootstrap;
pub mod config;
