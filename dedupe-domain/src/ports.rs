use dedupe_types::plan::DedupeWarning;

/// Structured event emitted while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupeEvent {
    Resolved {
        descriptor: String,
        from_version: String,
        to_version: String,
    },
    Unresolved {
        package: String,
        range: String,
        versions: Vec<String>,
    },
    Warning(DedupeWarning),
}

/// Consumer of planning events (terminal reporter, log, test collector).
///
/// The domain never writes to a terminal or file itself.
pub trait ReportSink {
    fn emit(&mut self, event: &DedupeEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReportSink;

impl ReportSink for NullReportSink {
    fn emit(&mut self, _event: &DedupeEvent) {}
}

/// Keeps every event in order; handy for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct CollectingReportSink {
    pub events: Vec<DedupeEvent>,
}

impl CollectingReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolved(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DedupeEvent::Resolved { .. }))
            .count()
    }

    pub fn unresolved(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DedupeEvent::Unresolved { .. }))
            .count()
    }

    pub fn warnings(&self) -> Vec<&DedupeWarning> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DedupeEvent::Warning(w) => Some(w),
                _ => None,
            })
            .collect()
    }
}

impl ReportSink for CollectingReportSink {
    fn emit(&mut self, event: &DedupeEvent) {
        self.events.push(event.clone());
    }
}
