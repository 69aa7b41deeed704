// src/ops/mod.rs

//! Package lifecycle pipelines
//!
//! - [`build()`]: definition -> package archive
//! - [`install()`]: package archive -> files under the install root + index entry
//! - [`uninstall()`]: index entry -> files removed
//!
//! Each pipeline runs its steps strictly in order and stops at the first
//! error. Nothing is rolled back; the next run's sandbox preparation clears
//! any leftover scratch state.
//!
//! Pipelines share the sandbox directories, so only one may run at a time in
//! a process. Every entry point holds [`PipelineGuard`] for its whole run;
//! concurrent callers block until it is released.

pub mod build;
pub mod install;
pub mod uninstall;

pub use build::{BuildOptions, build};
pub use install::{InstallOptions, install};
pub use uninstall::{UninstallOptions, uninstall};

use crate::error::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};

static PIPELINE_LOCK: Mutex<()> = Mutex::new(());

/// Held for the duration of one pipeline run
pub struct PipelineGuard {
    _guard: MutexGuard<'static, ()>,
}

/// Wait until no other pipeline is running in this process
pub fn lock_pipeline() -> PipelineGuard {
    // A panicking pipeline leaves nothing behind that the next one's
    // sandbox preparation does not wipe.
    let guard = PIPELINE_LOCK
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    PipelineGuard { _guard: guard }
}

/// Whether the process runs with superuser identity
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

fn require_elevated(required: bool) -> Result<()> {
    if required && !is_elevated() {
        return Err(Error::NotElevated);
    }
    Ok(())
}
