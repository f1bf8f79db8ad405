//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the collision core:
//! - Math types and operations
//! - Memory pooling for per-call scratch buffers
//! - Logging utilities

pub mod math;
pub mod memory;
pub mod logging;
