//! Property identity resolution and investment scoring.
//!
//! [`resolution`] decides which canonical property an external record describes and
//! folds its values in; [`scoring`] turns a canonical property into a deal score, an HMO
//! classification and a temporary-accommodation verdict.

pub mod config;
pub mod error;
pub mod resolution;
pub mod scoring;
pub mod telemetry;
