//! Tidepool: an aquatic artificial-life engine.
//!
//! Fish with diploid genomes hunt, graze, court and age in a layered current
//! field, alongside algae, plankton, crustaceans and drifting detritus. The
//! engine is headless; a presentation layer drives it through
//! [`simulation::SimState`] queries and queued [`commands::Command`]s.

pub mod behavior;
pub mod calendar;
pub mod commands;
pub mod commit;
pub mod config;
pub mod currents;
pub mod entity;
pub mod feeding;
pub mod fields;
pub mod fish;
pub mod food;
pub mod genome;
pub mod organisms;
pub mod random;
pub mod reproduction;
pub mod simulation;
pub mod snapshot;
pub mod spatial_hash;
pub mod stats;
pub mod traits;
pub mod vegetation;
pub mod world;

pub use config::{ConfigError, SimConfig};
pub use simulation::{SimState, TickReport};
