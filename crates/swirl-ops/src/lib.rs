//! Core library for the Swirl operations platform.
//!
//! The deployable API service in `services/api` composes these modules; the
//! scheduling workflow under [`workflows::scheduling`] carries the shift-cover
//! cascade engine.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
