//! Car pooling service.
//!
//! Assigns groups of passengers ("journeys") to cars with 4 to 6 seats,
//! queues groups that don't fit anywhere yet, and hands freed seats to the
//! queue in arrival order.

pub mod allocation;
pub mod config;
pub mod domain;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod web;
