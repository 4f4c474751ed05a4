//! Pharmos Protocol - Shared types for the research pipeline
//!
//! This crate defines the fundamental types used across the Pharmos engine:
//! - Message types for backend model communication
//! - The research plan schema (worker catalog, tasks, plan)
//! - The plan-ordered outputs mapping

mod messages;
mod plan;

pub use messages::*;
pub use plan::*;
