// Capture sequencer domain — pose sequence state machine.

pub mod config;
pub mod session;
pub mod state;
