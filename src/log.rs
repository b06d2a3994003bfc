//! Injectable log sink.
//!
//! The gateway absorbs most operational failures into absent results, so
//! the log line carrying coa/ioa/reason context is the only way to tell
//! an unattached address from a failed transmission after the fact. The
//! sink is an injected capability with a guaranteed-present no-op
//! default, so call sites never branch on "logger present".

use std::sync::Arc;

/// Severity-leveled log sink consumed by the RTU layer.
pub trait LogSink: Send + Sync {
    /// Fatal configuration problems; the RTU is about to refuse service.
    fn critical(&self, msg: &str);

    /// Operational errors.
    fn error(&self, msg: &str);

    /// Rejected or failed queries, invalid change requests.
    fn warning(&self, msg: &str);

    /// Lifecycle notes.
    fn info(&self, msg: &str);

    /// Per-query traces.
    fn debug(&self, msg: &str);
}

/// Sink that discards every message.
///
/// Installed when no logger is supplied at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopSink;

impl LogSink for NopSink {
    fn critical(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
}

/// Shared handle to the no-op sink.
pub fn nop_sink() -> Arc<dyn LogSink> {
    Arc::new(NopSink)
}

/// Sink forwarding to the `tracing` ecosystem.
///
/// Critical messages map to the error level, which is the highest level
/// `tracing` defines.
#[cfg(feature = "tracing-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing-support")))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing-support")]
impl LogSink for TracingSink {
    fn critical(&self, msg: &str) {
        tracing::error!(critical = true, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }
}

/// Sink collecting messages, for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    pub(crate) lines: std::sync::Mutex<Vec<(&'static str, String)>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn count(&self, level: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

#[cfg(test)]
impl LogSink for MemorySink {
    fn critical(&self, msg: &str) {
        self.lines.lock().unwrap().push(("critical", msg.into()));
    }
    fn error(&self, msg: &str) {
        self.lines.lock().unwrap().push(("error", msg.into()));
    }
    fn warning(&self, msg: &str) {
        self.lines.lock().unwrap().push(("warning", msg.into()));
    }
    fn info(&self, msg: &str) {
        self.lines.lock().unwrap().push(("info", msg.into()));
    }
    fn debug(&self, msg: &str) {
        self.lines.lock().unwrap().push(("debug", msg.into()));
    }
}
