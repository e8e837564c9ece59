//! Common test utilities and helpers
//!
//! Each integration test binary compiles this module separately and uses a
//! different subset of it.
#![allow(dead_code)]

pub mod app;
pub mod generator;
pub mod memory_db;

pub use app::*;
pub use generator::*;
pub use memory_db::*;
