use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory compile counters.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
    /// Rejections keyed by stable error code.
    pub rejections: BTreeMap<String, u64>,
    pub window_start_ms: i64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            entities: BTreeMap::new(),
            rejections: BTreeMap::new(),
            window_start_ms: Utc::now().timestamp_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    pub compile_calls: u64,
    pub compile_ok: u64,
    pub compile_rejected: u64,

    // Shape of successful compilations
    pub criteria: u64,
    pub groups: u64,
    pub sort_keys: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub compile_calls: u64,
    pub compile_ok: u64,
    pub compile_rejected: u64,
    pub criteria: u64,
    pub sort_keys: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Raw counters since `window_start_ms`.
    pub counters: Option<EventState>,
    /// Per-entity counters with derived averages.
    pub entity_counters: Vec<EntitySummary>,
}

///
/// EntitySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntitySummary {
    pub entity: String,
    pub compile_calls: u64,
    pub compile_ok: u64,
    pub compile_rejected: u64,
    pub avg_criteria_per_compile: f64,
    pub avg_sort_keys_per_compile: f64,
}

/// Build a report from the in-memory counters.
///
/// `window_start_ms` filters by window start, not by per-event timestamps:
/// a window that opened before the requested instant yields an empty report.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<i64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|requested| requested > snap.window_start_ms) {
        return EventReport::default();
    }

    let average = |total: u64, calls: u64| {
        if calls > 0 {
            total as f64 / calls as f64
        } else {
            0.0
        }
    };

    let mut entity_counters: Vec<EntitySummary> = snap
        .entities
        .iter()
        .map(|(entity, ops)| EntitySummary {
            entity: entity.clone(),
            compile_calls: ops.compile_calls,
            compile_ok: ops.compile_ok,
            compile_rejected: ops.compile_rejected,
            avg_criteria_per_compile: average(ops.criteria, ops.compile_ok),
            avg_sort_keys_per_compile: average(ops.sort_keys, ops.compile_ok),
        })
        .collect();

    entity_counters.sort_by(|a, b| match b.compile_calls.cmp(&a.compile_calls) {
        Ordering::Equal => a.entity.cmp(&b.entity),
        other => other,
    });

    EventReport {
        counters: Some(snap),
        entity_counters,
    }
}

///
/// TESTS
///
