//! # SDNLB Balancer Service
//!
//! The load-balancing decision and migration engine for a multi-controller
//! SDN, together with its telemetry ingest, traffic simulator, control
//! loop, and REST/WebSocket boundary.
//!
//! Composition is leaves-first: the pure [`load_model`] sits under the
//! [`planner`], both read the [`state`] store, and the [`engine`] is the
//! single owner that serializes every mutation behind one process-wide
//! lock. The [`server`] and [`control_loop`] are thin drivers on top.

pub mod actuator;
pub mod client;
pub mod control_loop;
pub mod engine;
pub mod error;
pub mod load_model;
pub mod planner;
pub mod server;
pub mod simulator;
pub mod state;
pub mod telemetry;

pub use actuator::{LoggingActuator, MigrationActuator};
pub use engine::Engine;
pub use error::{BalancerError, Result};
pub use server::ApiServer;
pub use simulator::{TrafficPattern, TrafficSimulator};
pub use state::CoreState;
