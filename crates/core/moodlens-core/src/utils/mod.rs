//! Utility functions

pub mod logger;
pub mod math;

pub use logger::*;
pub use math::*;
