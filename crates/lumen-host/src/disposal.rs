// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ownership of everything the host must release on teardown.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lumen_core::Disposable;
use parking_lot::Mutex;
use tracing::{debug, error, info};

/// Result of one disposal pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisposalReport {
    pub disposed: usize,
    /// Names of instances whose disposal failed or panicked.
    pub failed: Vec<String>,
}

/// Tracks extension-owned and core-owned disposables.
///
/// Extensions are released first, in the order they were tracked. Core
/// instances are released afterwards in reverse registration order.
#[derive(Default)]
pub struct DisposalTracker {
    extensions: Mutex<Vec<(String, Arc<dyn Disposable>)>>,
    core: Mutex<Vec<(String, Arc<dyn Disposable>)>>,
    disposed: AtomicBool,
}

impl DisposalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks an extension-owned instance. Once disposal has run, the
    /// instance is disposed immediately instead and `false` is returned.
    pub fn track_extension(&self, name: impl Into<String>, instance: Arc<dyn Disposable>) -> bool {
        self.track(&self.extensions, name.into(), instance)
    }

    /// Like [`Self::track_extension`], for core-owned instances.
    pub fn track_core(&self, name: impl Into<String>, instance: Arc<dyn Disposable>) -> bool {
        self.track(&self.core, name.into(), instance)
    }

    fn track(
        &self,
        list: &Mutex<Vec<(String, Arc<dyn Disposable>)>>,
        name: String,
        instance: Arc<dyn Disposable>,
    ) -> bool {
        {
            // `dispose_all` flips the flag before draining under this lock,
            // so a push seen with the flag clear is always drained.
            let mut list = list.lock();
            if !self.is_disposed() {
                list.push((name, instance));
                return true;
            }
        }
        debug!(instance = %name, "tracked after disposal, disposing now");
        dispose_one(&name, instance.as_ref());
        false
    }

    pub fn tracked(&self) -> usize {
        self.extensions.lock().len() + self.core.lock().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Disposes everything once. Later calls return `None` and do nothing.
    pub fn dispose_all(&self) -> Option<DisposalReport> {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("disposal already ran");
            return None;
        }

        let extensions = std::mem::take(&mut *self.extensions.lock());
        let mut core = std::mem::take(&mut *self.core.lock());
        core.reverse();

        let mut report = DisposalReport::default();
        for (name, instance) in extensions.into_iter().chain(core) {
            if dispose_one(&name, instance.as_ref()) {
                report.disposed += 1;
            } else {
                report.failed.push(name);
            }
        }

        info!(
            disposed = report.disposed,
            failed = report.failed.len(),
            "disposal complete"
        );
        Some(report)
    }
}

fn dispose_one(name: &str, instance: &dyn Disposable) -> bool {
    match catch_unwind(AssertUnwindSafe(|| instance.dispose())) {
        Ok(Ok(())) => {
            debug!(instance = name, "disposed");
            true
        }
        Ok(Err(e)) => {
            error!(instance = name, error = %e, "error disposing");
            false
        }
        Err(_) => {
            error!(instance = name, "panic while disposing");
            false
        }
    }
}

impl std::fmt::Debug for DisposalTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalTracker")
            .field("extensions", &self.extensions.lock().len())
            .field("core", &self.core.lock().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::LumenError;

    use super::*;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
        panic: bool,
    }

    impl Recorder {
        fn ok(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                log: log.clone(),
                fail: false,
                panic: false,
            })
        }
    }

    impl Disposable for Recorder {
        fn dispose(&self) -> Result<(), LumenError> {
            self.log.lock().push(self.name);
            if self.panic {
                panic!("{} exploded", self.name);
            }
            if self.fail {
                return Err(LumenError::Internal(format!("{} refused", self.name)));
            }
            Ok(())
        }
    }

    #[test]
    fn order_is_extensions_then_core_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tracker = DisposalTracker::new();
        tracker.track_core("users", Recorder::ok("users", &log));
        tracker.track_extension("trakt", Recorder::ok("trakt", &log));
        tracker.track_core("items", Recorder::ok("items", &log));
        tracker.track_extension("anime", Recorder::ok("anime", &log));

        let report = tracker.dispose_all().unwrap();
        assert_eq!(report.disposed, 4);
        assert_eq!(*log.lock(), vec!["trakt", "anime", "items", "users"]);
    }

    #[test]
    fn second_dispose_is_a_no_op() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tracker = DisposalTracker::new();
        tracker.track_extension("trakt", Recorder::ok("trakt", &log));

        assert!(tracker.dispose_all().is_some());
        assert!(tracker.dispose_all().is_none());
        assert_eq!(log.lock().len(), 1);
        assert!(tracker.is_disposed());
    }

    #[test]
    fn late_arrivals_are_disposed_immediately() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tracker = DisposalTracker::new();
        assert!(tracker.track_extension("trakt", Recorder::ok("trakt", &log)));
        tracker.dispose_all().unwrap();

        assert!(!tracker.track_extension("scanner", Recorder::ok("scanner", &log)));
        assert!(!tracker.track_core("items", Recorder::ok("items", &log)));
        assert_eq!(*log.lock(), vec!["trakt", "scanner", "items"]);
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn failures_do_not_stop_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let tracker = DisposalTracker::new();
        tracker.track_extension(
            "broken",
            Arc::new(Recorder {
                name: "broken",
                log: log.clone(),
                fail: true,
                panic: false,
            }),
        );
        tracker.track_extension(
            "panicky",
            Arc::new(Recorder {
                name: "panicky",
                log: log.clone(),
                fail: false,
                panic: true,
            }),
        );
        tracker.track_core("items", Recorder::ok("items", &log));

        let report = tracker.dispose_all().unwrap();
        assert_eq!(report.disposed, 1);
        assert_eq!(report.failed, vec!["broken".to_string(), "panicky".to_string()]);
        assert_eq!(*log.lock(), vec!["broken", "panicky", "items"]);
    }
}
