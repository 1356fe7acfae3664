//! Document editor WASM API
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros, JS value conversion and error mapping
//! - `core`: the exported functions and the process-wide workspace

pub mod helpers;
pub mod core;

pub use core::*;
