//! Metrics sink boundary.
//!
//! Compiler code never touches `obs::metrics` directly; all instrumentation
//! flows through `MetricsEvent` and `MetricsSink`.
use crate::{error::ErrorKind, obs::metrics};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    CompileStart {
        entity: &'static str,
    },
    CompileFinish {
        entity: &'static str,
        criteria: u64,
        groups: u64,
        sort_keys: u64,
    },
    CompileRejected {
        entity: &'static str,
        kind: ErrorKind,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::CompileStart { entity } => metrics::with_state_mut(|m| {
                m.ops.compile_calls = m.ops.compile_calls.saturating_add(1);

                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.compile_calls = entry.compile_calls.saturating_add(1);
            }),

            MetricsEvent::CompileFinish {
                entity,
                criteria,
                groups,
                sort_keys,
            } => metrics::with_state_mut(|m| {
                m.ops.compile_ok = m.ops.compile_ok.saturating_add(1);
                m.ops.criteria = m.ops.criteria.saturating_add(criteria);
                m.ops.groups = m.ops.groups.saturating_add(groups);
                m.ops.sort_keys = m.ops.sort_keys.saturating_add(sort_keys);

                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.compile_ok = entry.compile_ok.saturating_add(1);
                entry.criteria = entry.criteria.saturating_add(criteria);
                entry.sort_keys = entry.sort_keys.saturating_add(sort_keys);
            }),

            MetricsEvent::CompileRejected { entity, kind } => metrics::with_state_mut(|m| {
                m.ops.compile_rejected = m.ops.compile_rejected.saturating_add(1);

                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.compile_rejected = entry.compile_rejected.saturating_add(1);

                let code = m.rejections.entry(kind.code().to_string()).or_default();
                *code = code.saturating_add(1);
            }),
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a live `&dyn MetricsSink` in `with_metrics_sink`,
        //   whose guard restores the previous slot on every exit, unwind included.
        // - `record` is synchronous and never keeps `ptr` past this call.
        // - Only a shared reference is materialized, matching the installing borrow.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current counters.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<i64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all counters on the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on the current thread.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The pointer is installed only for this dynamic scope and `Guard`
    //   restores the previous slot on all exits, including panic.
    // - `record` dereferences it synchronously and never persists it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        panic::{AssertUnwindSafe, catch_unwind},
        sync::atomic::{AtomicUsize, Ordering},
    };

    struct CountingSink<'a> {
        calls: &'a AtomicUsize,
    }

    impl MetricsSink for CountingSink<'_> {
        fn record(&self, _: MetricsEvent) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    const START: MetricsEvent = MetricsEvent::CompileStart { entity: "Student" };

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);

        let outer_calls = AtomicUsize::new(0);
        let inner_calls = AtomicUsize::new(0);
        let outer = CountingSink {
            calls: &outer_calls,
        };
        let inner = CountingSink {
            calls: &inner_calls,
        };

        record(START);
        assert_eq!(outer_calls.load(Ordering::SeqCst), 0);

        with_metrics_sink(&outer, || {
            record(START);
            with_metrics_sink(&inner, || record(START));
            record(START);
        });

        assert_eq!(outer_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);

        let calls = AtomicUsize::new(0);
        let sink = CountingSink { calls: &calls };

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(&sink, || {
                record(START);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn global_sink_accumulates_per_entity_and_code() {
        metrics_reset_all();

        record(START);
        record(MetricsEvent::CompileFinish {
            entity: "Student",
            criteria: 3,
            groups: 1,
            sort_keys: 2,
        });
        record(START);
        record(MetricsEvent::CompileRejected {
            entity: "Student",
            kind: ErrorKind::InvalidFieldName,
        });

        let counters = metrics_report(None).counters.unwrap();
        assert_eq!(counters.ops.compile_calls, 2);
        assert_eq!(counters.ops.compile_ok, 1);
        assert_eq!(counters.ops.compile_rejected, 1);
        assert_eq!(counters.ops.groups, 1);
        assert_eq!(counters.rejections.get("SIFT-005"), Some(&1));

        let student = counters.entities.get("Student").unwrap();
        assert_eq!(student.criteria, 3);
        assert_eq!(student.sort_keys, 2);
    }
}
