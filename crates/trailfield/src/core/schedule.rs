/// Deferred work the simulation performs at a given simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Launch every particle of second-hand slot `n`.
    ExplodeSlot(u8),
    /// Launch the hour and minute trails.
    ExplodeHands,
    /// Re-launch hour/minute particles harder and spawn children.
    SecondaryExplosion,
    /// Inject a batch of non-attractable swarm particles, then re-arm.
    InjectDrift,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    at_ms: f64,
    seq: u64,
    event: ScheduledEvent,
}

/// A queue of events keyed by simulated milliseconds.
/// Events are only ever released by `drain_due`, inside the frame loop.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(16),
            next_seq: 0,
        }
    }

    /// Schedule `event` to fire once `now >= at_ms`.
    pub fn push_at(&mut self, at_ms: f64, event: ScheduledEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { at_ms, seq, event });
    }

    /// Remove and return every event due at `now_ms`, earliest first.
    /// Events sharing a timestamp come out in scheduling order.
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<ScheduledEvent> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.at_ms <= now_ms {
                due.push(*e);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.event).collect()
    }

    /// Drop every pending event matching `pred`. Returns how many were dropped.
    pub fn cancel_where(&mut self, pred: impl Fn(&ScheduledEvent) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.event));
        before - self.entries.len()
    }

    /// Drop every pending event.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
