// Frame source domain — live frames and still snapshots.

pub mod adapter;
pub mod encode;
pub mod error;
pub mod frame;
pub mod synthetic;
