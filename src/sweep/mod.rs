//! In-process scheduling of the queue sweeper.

pub mod worker;

pub use worker::spawn_sweep_worker;
