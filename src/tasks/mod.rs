//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache engine.
//!
//! # Tasks
//! - Reclaimer: Removes expired entries in budgeted cycles at configured intervals

mod reclaimer;

pub use reclaimer::{
    ExitSignal, Reclaimer, ReclaimerHandle, ReclaimerSettings, ReclaimerState, Sweep,
};
