//! Background Tasks Module
//!
//! Periodic sweeps that reclaim expired cache entries. Nothing starts on its
//! own; callers spawn and stop the timers explicitly.

mod cleanup;

pub use cleanup::{spawn_image_sweeper, spawn_response_sweeper, spawn_sweep_task, SweepTask};
