//! Kaiwa Core Library
//!
//! This crate provides the core functionality for the Kaiwa voice companion,
//! including turn orchestration, speech adapters, remote clients, and telemetry.

pub mod conversation;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod speech;
pub mod telemetry;
