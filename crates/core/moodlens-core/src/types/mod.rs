//! Shared types

mod breakdown;
mod calibration;
mod capture;
mod collaborators;
mod emotion;
mod intervention;
mod observation;
mod state;

pub use breakdown::*;
pub use calibration::*;
pub use capture::*;
pub use collaborators::*;
pub use emotion::*;
pub use intervention::*;
pub use observation::*;
pub use state::*;
