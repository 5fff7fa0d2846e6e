// Detection domain — per-frame face presence and hand pose classification.

pub mod detector;
pub mod error;
pub mod fingers;
pub mod overlay;
pub mod pipeline;
pub mod types;
