//! Per-window busy flags.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use taskping_core::ReminderWindow;

#[derive(Debug, Default)]
pub(crate) struct RunFlags {
    flags: Mutex<HashMap<ReminderWindow, Arc<AtomicBool>>>,
}

impl RunFlags {
    fn flag(&self, window: ReminderWindow) -> Arc<AtomicBool> {
        let mut flags = match self.flags.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        flags.entry(window).or_default().clone()
    }

    /// Mark `window` as running. `None` when it already is.
    pub(crate) fn try_acquire(&self, window: ReminderWindow) -> Option<RunGuard> {
        let flag = self.flag(window);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { flag })
    }

    pub(crate) fn is_running(&self, window: ReminderWindow) -> bool {
        self.flag(window).load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, including when the run task panics.
#[derive(Debug)]
pub(crate) struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
