//! # Overview
//! "Devsim" provides a discrete event simulation kernel following the
//! DEVS formalism, for hierarchies of atomic and coupled models.
//!
//! This repository contains:
//!
//! * Model graph, for building hierarchical atomic and coupled models
//! connected through named ports, and restructuring them while a
//! simulation runs.
//! * Dynamics framework, for implementing the behavior of atomic models
//! and registering it under a name.
//! * Simulator engine, for scheduling and executing the simulation of a
//! model graph over an experiment.
//! * Output plug-ins, for streaming or storing the observations of the
//! models.
//!
//! Devsim does not require nightly Rust.

extern crate self as devsim;

pub mod config;
pub mod dynamics;
pub mod manager;
pub mod models;
pub mod output;
pub mod simulator;
pub mod utils;

pub use devsim_derive::{register, SerializableDynamics};
pub use serde_json::Value;
