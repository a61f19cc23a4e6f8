use serde::Serialize;
use tracing::debug;

use streaming::{ApiCall, Channel, Outbound, Sequencer, SuggestField, Ticket};

/// Number of suggestion slots under each street-name input.
pub const SLOT_COUNT: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No suggestion; rendered greyed out and ignores the pointer.
    Empty,
    Filled,
    /// Filled and under the pointer.
    Highlighted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub text: String,
    pub state: SlotState,
}

impl Slot {
    fn empty() -> Self {
        Self {
            text: String::new(),
            state: SlotState::Empty,
        }
    }

    fn filled(text: String) -> Self {
        Self {
            text,
            state: SlotState::Filled,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == SlotState::Empty
    }
}

/// Autocomplete state for one street-name input.
///
/// Every keystroke issues a request on the field's own channel; replies that
/// are not the latest for that channel are dropped, which is the only
/// debouncing done.
#[derive(Debug, Clone)]
pub struct SuggestionController {
    field: SuggestField,
    input: String,
    slots: Vec<Slot>,
}

impl SuggestionController {
    pub fn new(field: SuggestField) -> Self {
        Self {
            field,
            input: String::new(),
            slots: vec![Slot::empty(); SLOT_COUNT],
        }
    }

    pub fn field(&self) -> SuggestField {
        self.field
    }

    pub fn channel(&self) -> Channel {
        Channel::Suggest(self.field)
    }

    /// Current text of the owning input.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Records new input text. An empty input clears the slots, makes any
    /// in-flight reply stale and issues nothing.
    pub fn on_input(&mut self, text: &str, seq: &mut Sequencer) -> Option<Outbound> {
        self.input = text.to_string();
        if text.is_empty() {
            self.clear_slots();
            seq.invalidate(self.channel());
            return None;
        }
        Some(Outbound::issue(
            seq,
            self.channel(),
            ApiCall::Auto {
                street_name: self.input.clone(),
            },
        ))
    }

    /// Fills the slots from a reply. Returns `false` if the reply was stale.
    pub fn on_reply(&mut self, ticket: &Ticket, suggestions: Vec<String>, seq: &Sequencer) -> bool {
        if ticket.channel != self.channel() || !seq.is_current(ticket) {
            debug!(
                channel = ticket.channel.label(),
                seq = ticket.seq,
                "stale suggestions discarded"
            );
            return false;
        }
        let mut texts = suggestions.into_iter();
        for slot in &mut self.slots {
            *slot = match texts.next() {
                Some(text) => Slot::filled(text),
                None => Slot::empty(),
            };
        }
        true
    }

    pub fn clear_slots(&mut self) {
        self.slots.fill(Slot::empty());
    }

    pub fn hover(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.state == SlotState::Filled => {
                slot.state = SlotState::Highlighted;
                true
            }
            _ => false,
        }
    }

    pub fn unhover(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.state == SlotState::Highlighted => {
                slot.state = SlotState::Filled;
                true
            }
            _ => false,
        }
    }

    /// Copies a filled slot's text into the input and asks again for that text.
    pub fn pick(&mut self, index: usize, seq: &mut Sequencer) -> Option<Outbound> {
        let text = self
            .slots
            .get(index)
            .filter(|s| !s.is_empty())
            .map(|s| s.text.clone())?;
        self.on_input(&text, seq)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{SLOT_COUNT, SlotState, SuggestionController};
    use streaming::{ApiCall, Sequencer, SuggestField};

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn texts(c: &SuggestionController) -> Vec<&str> {
        c.slots().iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn empty_input_clears_all_slots_without_request() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::StartFirst);
        let out = c.on_input("Tha", &mut seq).unwrap();
        assert!(c.on_reply(&out.ticket, strings(&["Thayer Street"]), &seq));

        assert_eq!(c.on_input("", &mut seq), None);
        assert_eq!(c.slots().len(), SLOT_COUNT);
        assert!(c.slots().iter().all(|s| s.is_empty() && s.text.is_empty()));
    }

    #[test]
    fn whitespace_input_still_asks_for_suggestions() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::StartFirst);
        let out = c.on_input(" ", &mut seq).unwrap();
        assert_eq!(
            out.call,
            ApiCall::Auto {
                street_name: " ".to_string()
            }
        );
        assert_eq!(c.input(), " ");
    }

    #[test]
    fn three_suggestions_fill_three_slots() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::FinishSecond);
        let out = c.on_input("W", &mut seq).unwrap();
        assert_eq!(
            out.call,
            ApiCall::Auto {
                street_name: "W".to_string()
            }
        );
        assert!(c.on_reply(&out.ticket, strings(&["Waterman", "Wayland", "Williams"]), &seq));
        assert_eq!(texts(&c), vec!["Waterman", "Wayland", "Williams", "", ""]);
        let states: Vec<_> = c.slots().iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![
                SlotState::Filled,
                SlotState::Filled,
                SlotState::Filled,
                SlotState::Empty,
                SlotState::Empty
            ]
        );
    }

    #[test]
    fn older_reply_is_dropped() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::StartFirst);
        let first = c.on_input("T", &mut seq).unwrap();
        let second = c.on_input("Th", &mut seq).unwrap();
        assert!(c.on_reply(&second.ticket, strings(&["Thayer"]), &seq));
        assert!(!c.on_reply(&first.ticket, strings(&["Taber", "Transit"]), &seq));
        assert_eq!(texts(&c), vec!["Thayer", "", "", "", ""]);
    }

    #[test]
    fn reply_after_clearing_the_field_is_dropped() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::StartSecond);
        let out = c.on_input("A", &mut seq).unwrap();
        c.on_input("", &mut seq);
        assert!(!c.on_reply(&out.ticket, strings(&["Angell"]), &seq));
        assert!(c.slots().iter().all(|s| s.is_empty()));
    }

    #[test]
    fn fields_do_not_share_a_channel() {
        let mut seq = Sequencer::new();
        let mut a = SuggestionController::new(SuggestField::StartFirst);
        let mut b = SuggestionController::new(SuggestField::StartSecond);
        let out_a = a.on_input("A", &mut seq).unwrap();
        let _out_b = b.on_input("B", &mut seq).unwrap();
        assert!(a.on_reply(&out_a.ticket, strings(&["Angell"]), &seq));
        assert!(!b.on_reply(&out_a.ticket, strings(&["Angell"]), &seq));
    }

    #[test]
    fn hover_and_pick_only_act_on_filled_slots() {
        let mut seq = Sequencer::new();
        let mut c = SuggestionController::new(SuggestField::FinishFirst);
        let out = c.on_input("Br", &mut seq).unwrap();
        c.on_reply(&out.ticket, strings(&["Brook Street", "Benefit"]), &seq);

        assert!(!c.hover(4));
        assert!(!c.hover(99));
        assert!(c.hover(0));
        assert_eq!(c.slots()[0].state, SlotState::Highlighted);
        assert!(c.unhover(0));
        assert!(!c.unhover(0));
        assert_eq!(c.slots()[0].state, SlotState::Filled);

        assert_eq!(c.pick(3, &mut seq), None);
        let again = c.pick(0, &mut seq).unwrap();
        assert_eq!(c.input(), "Brook Street");
        assert_eq!(
            again.call,
            ApiCall::Auto {
                street_name: "Brook Street".to_string()
            }
        );
        assert_eq!(again.ticket.seq, out.ticket.seq + 1);
    }
}
