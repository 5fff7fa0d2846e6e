// Diagnostics domain — per-flow counters.

pub mod stats;
