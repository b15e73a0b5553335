//! Lifecycle hook registry (spec.md §4.8).
//!
//! No teacher equivalent; built fresh using the same "atomic pointer to an
//! immutable collection" pattern spec.md §9 prescribes for writers, filter
//! patterns, and context extractors.

use std::sync::Arc;

use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeLog,
    AfterLog,
    OnFilter,
    OnRotate,
    OnClose,
    OnError,
}

/// A hook sees the record (where applicable) and may fail. A `BeforeLog`
/// failure aborts that record's emission; failures from every other event
/// are reported through the write-error handler and never block the
/// pipeline.
pub type Hook = Arc<dyn Fn(&Record) -> Result<(), String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HookRegistry {
    before_log: Vec<Hook>,
    after_log: Vec<Hook>,
    on_filter: Vec<Hook>,
    on_rotate: Vec<Hook>,
    on_close: Vec<Hook>,
    on_error: Vec<Hook>,
}

impl HookRegistry {
    pub fn new() -> HookRegistry {
        HookRegistry::default()
    }

    /// Append `hook` for `event`, preserving insertion order.
    pub fn add(&self, event: HookEvent, hook: Hook) -> HookRegistry {
        let mut next = self.clone();
        next.list_mut(event).push(hook);
        next
    }

    fn list(&self, event: HookEvent) -> &[Hook] {
        match event {
            HookEvent::BeforeLog => &self.before_log,
            HookEvent::AfterLog => &self.after_log,
            HookEvent::OnFilter => &self.on_filter,
            HookEvent::OnRotate => &self.on_rotate,
            HookEvent::OnClose => &self.on_close,
            HookEvent::OnError => &self.on_error,
        }
    }

    fn list_mut(&mut self, event: HookEvent) -> &mut Vec<Hook> {
        match event {
            HookEvent::BeforeLog => &mut self.before_log,
            HookEvent::AfterLog => &mut self.after_log,
            HookEvent::OnFilter => &mut self.on_filter,
            HookEvent::OnRotate => &mut self.on_rotate,
            HookEvent::OnClose => &mut self.on_close,
            HookEvent::OnError => &mut self.on_error,
        }
    }

    /// Run every hook for `event` in insertion order. Returns the first
    /// error encountered, if any, along with how many hooks ran.
    pub fn run(&self, event: HookEvent, record: &Record) -> Result<(), String> {
        for hook in self.list(event) {
            hook(record)?;
        }
        Ok(())
    }

    /// Run every hook, collecting all errors instead of stopping at the
    /// first — used for events whose failures are reported but never abort
    /// the pipeline (`AfterLog`, `OnFilter`, `OnRotate`, `OnClose`,
    /// `OnError`).
    pub fn run_collect_errors(&self, event: HookEvent, record: &Record) -> Vec<String> {
        self.list(event).iter().filter_map(|hook| hook(record).err()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::Utc;
    use smallvec::smallvec;

    fn sample_record() -> Record {
        Record {
            timestamp: Utc::now(),
            level: Level::Info,
            message: "hi".to_string(),
            fields: smallvec![],
            caller: None,
        }
    }

    #[test]
    fn runs_hooks_in_insertion_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let registry = HookRegistry::new();
        let o1 = order.clone();
        let registry = registry.add(HookEvent::BeforeLog, Arc::new(move |_| {
            o1.lock().push(1);
            Ok(())
        }));
        let o2 = order.clone();
        let registry = registry.add(HookEvent::BeforeLog, Arc::new(move |_| {
            o2.lock().push(2);
            Ok(())
        }));
        registry.run(HookEvent::BeforeLog, &sample_record()).unwrap();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn before_log_error_propagates() {
        let registry = HookRegistry::new().add(
            HookEvent::BeforeLog,
            Arc::new(|_| Err("boom".to_string())),
        );
        assert_eq!(registry.run(HookEvent::BeforeLog, &sample_record()), Err("boom".to_string()));
    }

    #[test]
    fn after_log_errors_are_collected_not_short_circuited() {
        let registry = HookRegistry::new()
            .add(HookEvent::AfterLog, Arc::new(|_| Err("a".to_string())))
            .add(HookEvent::AfterLog, Arc::new(|_| Err("b".to_string())));
        let errors = registry.run_collect_errors(HookEvent::AfterLog, &sample_record());
        assert_eq!(errors, vec!["a".to_string(), "b".to_string()]);
    }
}
