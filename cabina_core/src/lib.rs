//! # cabina_core - MV/LV Substation Sizing Engine
//!
//! `cabina_core` sizes a distributor-connected MV/LV substation and checks
//! the time-current coordination between the MV feeder relay and the LV main
//! breaker. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: pure functions that take input and return results
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, not just strings
//! - **Policy-driven**: every threshold of the coordination check lives in
//!   [`config::CabinaConfig`]
//!
//! ## Quick Start
//!
//! ```rust
//! use cabina_core::calculations::substation::{calculate, SubstationInput};
//! use cabina_core::config::CabinaConfig;
//!
//! let result = calculate(&SubstationInput::for_load("Cabina 1", 500.0), &CabinaConfig::default()).unwrap();
//! println!("{} kVA, coordination {}", result.transformer.selected_kva, result.coordination.rating);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - substation calculations and the selectivity evaluator
//! - [`catalog`] - standard transformer, cable and device ratings
//! - [`config`] - network settings and coordination policy
//! - [`study`] - study container with metadata and UUID-keyed items
//! - [`units`] - type-safe unit wrappers
//! - [`errors`] - structured error types

pub mod calculations;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod study;
pub mod units;

pub use config::{CabinaConfig, NetworkSettings};
pub use errors::{CalcError, CalcResult};
pub use study::{Study, StudyMetadata};
