//! WebAmp CLI Library
//!
//! Headless front end for the WebAmp libraries: playlist management,
//! usage rankings and a terminal player driven by a simulated backend.
//!
//! This library exposes the building blocks of the `webamp` binary for testing.

pub mod commands;
pub mod config;
pub mod simulated;

pub use config::CliConfig;
pub use simulated::{SimulatedBackend, SimulationSettings};
