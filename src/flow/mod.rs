// Capture flow domain — real-time driver for source, detection and
// sequencing.

pub mod driver;
pub mod error;

pub use driver::{CaptureCallback, CaptureFlow, FlowTiming};
pub use error::FlowError;
