/// Ordered queue of notifications for whoever drives the UI.
///
/// Producers push while handling input or responses; the shell drains after
/// each call and forwards the events in emission order.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<E>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn keeps_emission_order() {
        let mut bus = EventBus::new();
        bus.emit("first");
        bus.emit("second");
        assert_eq!(bus.events(), &["first", "second"]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(1u32);
        let drained = bus.drain();
        assert_eq!(drained, vec![1]);
        assert!(bus.is_empty());
    }
}
