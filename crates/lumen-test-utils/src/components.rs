// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Components that record every call the host makes on them.
//!
//! All of them write into a shared [`CallLog`] as `"<name>:<event>"`, so a
//! test can assert on the order across components.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lumen_core::{
    Component, Disposable, EntryPoint, LumenError, Plugin, StartupPhase,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Ordered record of component events, shared across components.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str, event: &str) {
        self.0.lock().push(format!("{name}:{event}"));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// How often `"<name>:<event>"` was recorded.
    pub fn count(&self, name: &str, event: &str) -> usize {
        let needle = format!("{name}:{event}");
        self.0.lock().iter().filter(|e| **e == needle).count()
    }
}

/// Keeps a [`RecordingEntryPoint::held`] entry point inside `run` until
/// released.
#[derive(Debug, Clone, Default)]
pub struct Hold {
    entered: Arc<Notify>,
    released: Arc<Notify>,
}

impl Hold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the held entry point is inside `run`.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// An entry point that records `run` and `shutdown`, and may fail `run`.
pub struct RecordingEntryPoint {
    name: String,
    phase: StartupPhase,
    log: CallLog,
    runs: AtomicUsize,
    fail: bool,
    hold: Option<Hold>,
}

impl RecordingEntryPoint {
    pub fn new(name: impl Into<String>, phase: StartupPhase, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            phase,
            log: log.clone(),
            runs: AtomicUsize::new(0),
            fail: false,
            hold: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// `run` records itself, then waits for `hold` to be released.
    pub fn held(mut self, hold: &Hold) -> Self {
        self.hold = Some(hold.clone());
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryPoint for RecordingEntryPoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> StartupPhase {
        self.phase
    }

    async fn run(&self) -> Result<(), LumenError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.log.push(&self.name, "run");
        if let Some(hold) = &self.hold {
            hold.entered.notify_one();
            hold.released.notified().await;
        }
        if self.fail {
            return Err(LumenError::Internal(format!("{} failed to start", self.name)));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), LumenError> {
        self.log.push(&self.name, "shutdown");
        Ok(())
    }
}

impl Component for RecordingEntryPoint {
    fn as_entry_point(self: Arc<Self>) -> Option<Arc<dyn EntryPoint>> {
        Some(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A disposable that records disposal and may fail or panic doing it.
pub struct RecordingDisposable {
    name: String,
    log: CallLog,
    fail: bool,
    panic: bool,
}

impl RecordingDisposable {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            fail: false,
            panic: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }
}

impl Disposable for RecordingDisposable {
    fn dispose(&self) -> Result<(), LumenError> {
        self.log.push(&self.name, "dispose");
        if self.panic {
            panic!("{} panicked during disposal", self.name);
        }
        if self.fail {
            return Err(LumenError::Internal(format!("{} refused to dispose", self.name)));
        }
        Ok(())
    }
}

impl Component for RecordingDisposable {
    fn as_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
        Some(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A plugin that is also disposable.
pub struct MockPlugin {
    name: String,
    id: Option<String>,
    has_configuration: bool,
    log: CallLog,
}

impl MockPlugin {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            id: None,
            has_configuration: false,
            log: log.clone(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_configuration(mut self) -> Self {
        self.has_configuration = true;
        self
    }
}

impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_configuration(&self) -> bool {
        self.has_configuration
    }
}

impl Disposable for MockPlugin {
    fn dispose(&self) -> Result<(), LumenError> {
        self.log.push(&self.name, "dispose");
        Ok(())
    }
}

impl Component for MockPlugin {
    fn as_plugin(self: Arc<Self>) -> Option<Arc<dyn Plugin>> {
        Some(self)
    }

    fn as_disposable(self: Arc<Self>) -> Option<Arc<dyn Disposable>> {
        Some(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_point_records_runs() {
        let log = CallLog::new();
        let entry = RecordingEntryPoint::new("scan", StartupPhase::PreStartup, &log);
        entry.run().await.unwrap();
        entry.shutdown().await.unwrap();
        assert_eq!(entry.runs(), 1);
        assert_eq!(log.entries(), vec!["scan:run", "scan:shutdown"]);
    }

    #[test]
    fn plugin_narrows_to_plugin_and_disposable() {
        let log = CallLog::new();
        let component: Arc<dyn Component> = Arc::new(MockPlugin::new("Trakt", &log));
        assert!(component.clone().as_plugin().is_some());
        assert!(component.clone().as_entry_point().is_none());
        component.as_disposable().unwrap().dispose().unwrap();
        assert_eq!(log.count("Trakt", "dispose"), 1);
    }
}
