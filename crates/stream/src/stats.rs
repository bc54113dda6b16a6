use std::time::Duration;

/// Counters for one streaming tick, reset at the start of each camera pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    /// The camera moved far enough for a coverage pass to run.
    pub coverage_ran: bool,
    pub roots_created: usize,
    pub roots_evicted: usize,
    pub splits: usize,
    pub unsplits: usize,
    /// Jobs that stored geometry. Jobs for dropped nodes free their slot but are not counted.
    pub completed: usize,
    pub dispatched: usize,
    /// Queued nodes discarded because nothing but the queue referenced them.
    pub cancelled: usize,
    /// Queue depth after the last dispatch pass.
    pub pending: usize,
    pub busy_generators: usize,
    pub resident_roots: usize,
    pub camera_time: Duration,
    pub update_time: Duration,
}

impl std::fmt::Display for StreamStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "roots={} (+{} -{}) split={} unsplit={} dispatched={} completed={} cancelled={} pending={} busy={} camera={:?} update={:?}",
            self.resident_roots,
            self.roots_created,
            self.roots_evicted,
            self.splits,
            self.unsplits,
            self.dispatched,
            self.completed,
            self.cancelled,
            self.pending,
            self.busy_generators,
            self.camera_time,
            self.update_time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zeroed() {
        let stats = StreamStats::default();
        assert!(!stats.coverage_ran);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.update_time, Duration::ZERO);
    }

    #[test]
    fn display_lists_queue_depth() {
        let stats = StreamStats {
            pending: 17,
            busy_generators: 4,
            ..StreamStats::default()
        };
        let s = stats.to_string();
        assert!(s.contains("pending=17"));
        assert!(s.contains("busy=4"));
    }
}
