use std::collections::BTreeMap;

/// Named counters and gauges for one client session.
///
/// Names are dotted paths (`stale.endpoint.start`, `render.passes`). Sorted
/// maps keep snapshots in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, i64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, name: &str) {
        self.add(name, 1);
    }

    /// Adds `by` to a counter; adding zero does not create it.
    pub fn add(&mut self, name: &str, by: u64) {
        if by == 0 {
            return;
        }
        match self.counters.get_mut(name) {
            Some(v) => *v = v.saturating_add(by),
            None => {
                self.counters.insert(name.to_string(), by);
            }
        }
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Sum of every counter under `prefix.` (or named exactly `prefix`).
    pub fn counter_total(&self, prefix: &str) -> u64 {
        self.counters
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| k.len() == prefix.len() || k[prefix.len()..].starts_with('.'))
            .map(|(_, v)| *v)
            .sum()
    }

    pub fn set_gauge(&mut self, name: &str, value: i64) {
        self.gauges.insert(name.to_string(), value);
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.clone(),
            gauges: self.gauges.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Metrics;

    #[test]
    fn counters_add_up_and_zero_is_not_recorded() {
        let mut m = Metrics::new();
        m.incr("render.passes");
        m.add("render.passes", 2);
        m.add("render.skipped_edges", 0);
        assert_eq!(m.counter("render.passes"), 3);
        assert_eq!(m.counter("render.skipped_edges"), 0);
        assert!(!m.snapshot().counters.contains_key("render.skipped_edges"));
    }

    #[test]
    fn totals_cover_a_dotted_prefix_only() {
        let mut m = Metrics::new();
        m.incr("stale.viewport");
        m.add("stale.endpoint.start", 2);
        m.incr("stale");
        m.incr("staleness");
        m.incr("requests.failed");
        assert_eq!(m.counter_total("stale"), 4);
        assert_eq!(m.counter_total("stale.endpoint"), 2);
        assert_eq!(m.counter_total("nothing"), 0);
    }

    #[test]
    fn gauges_keep_the_last_value() {
        let mut m = Metrics::new();
        assert_eq!(m.gauge("cache.edges"), None);
        m.set_gauge("cache.edges", 10);
        m.set_gauge("cache.edges", 7);
        assert_eq!(m.gauge("cache.edges"), Some(7));
        let snap = m.snapshot();
        assert_eq!(snap.gauges.into_iter().collect::<Vec<_>>(), vec![("cache.edges".to_string(), 7)]);
    }
}
