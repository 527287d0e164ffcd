//! Explicit one-shot and repeating timers driven by tick time.
//!
//! Timers only advance when their owner calls [`Timers::advance`], so a due
//! event is always handled between two ticks, never during one.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Entry<E> {
    id: TimerId,
    remaining_ms: f32,
    period_ms: Option<f32>,
    event: E,
}

#[derive(Clone, Debug)]
pub struct Timers<E> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Timers {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E: Clone> Timers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, delay_ms: f32, event: E) -> TimerId {
        self.insert(delay_ms, None, event)
    }

    /// First fires after one full period.
    pub fn schedule_repeating(&mut self, period_ms: f32, event: E) -> TimerId {
        self.insert(period_ms, Some(period_ms.max(f32::EPSILON)), event)
    }

    fn insert(&mut self, delay_ms: f32, period_ms: Option<f32>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            remaining_ms: delay_ms,
            period_ms,
            event,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Advance every timer and return the events that came due, earliest
    /// first. A repeating timer fires at most once per call.
    pub fn advance(&mut self, dt_ms: f32) -> Vec<E> {
        let mut due: Vec<(f32, E)> = Vec::new();
        for entry in &mut self.entries {
            entry.remaining_ms -= dt_ms;
            if entry.remaining_ms <= 0.0 {
                due.push((entry.remaining_ms, entry.event.clone()));
                if let Some(period) = entry.period_ms {
                    entry.remaining_ms = (entry.remaining_ms + period).max(0.0);
                    if entry.remaining_ms == 0.0 {
                        entry.remaining_ms = period;
                    }
                }
            }
        }
        self.entries
            .retain(|e| e.period_ms.is_some() || e.remaining_ms > 0.0);
        // Most negative remainder came due first.
        due.sort_by(|a, b| a.0.total_cmp(&b.0));
        due.into_iter().map(|(_, event)| event).collect()
    }
}
