use serde::Serialize;

use runtime::RequestSequencer;
use scene::EndpointSlot;

use crate::protocol::ApiCall;

/// One of the four street-name inputs that drive autocomplete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestField {
    StartFirst,
    StartSecond,
    FinishFirst,
    FinishSecond,
}

impl SuggestField {
    pub const ALL: [SuggestField; 4] = [
        SuggestField::StartFirst,
        SuggestField::StartSecond,
        SuggestField::FinishFirst,
        SuggestField::FinishSecond,
    ];

    pub fn index(self) -> usize {
        match self {
            SuggestField::StartFirst => 0,
            SuggestField::StartSecond => 1,
            SuggestField::FinishFirst => 2,
            SuggestField::FinishSecond => 3,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start_first" => Some(SuggestField::StartFirst),
            "start_second" => Some(SuggestField::StartSecond),
            "finish_first" => Some(SuggestField::FinishFirst),
            "finish_second" => Some(SuggestField::FinishSecond),
            _ => None,
        }
    }

    /// Endpoint whose intersection lookup this field feeds.
    pub fn endpoint(self) -> EndpointSlot {
        match self {
            SuggestField::StartFirst | SuggestField::StartSecond => EndpointSlot::Start,
            SuggestField::FinishFirst | SuggestField::FinishSecond => EndpointSlot::Finish,
        }
    }
}

/// Independent ordering domain for requests.
///
/// Responses are only ever compared against requests on the same channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Edge refreshes, timer ticks and clears.
    Viewport,
    Route,
    Endpoint(EndpointSlot),
    Suggest(SuggestField),
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Viewport => "viewport",
            Channel::Route => "route",
            Channel::Endpoint(EndpointSlot::Start) => "endpoint.start",
            Channel::Endpoint(EndpointSlot::Finish) => "endpoint.finish",
            Channel::Suggest(SuggestField::StartFirst) => "suggest.start_first",
            Channel::Suggest(SuggestField::StartSecond) => "suggest.start_second",
            Channel::Suggest(SuggestField::FinishFirst) => "suggest.finish_first",
            Channel::Suggest(SuggestField::FinishSecond) => "suggest.finish_second",
        }
    }
}

pub type Ticket = runtime::Ticket<Channel>;
pub type Sequencer = RequestSequencer<Channel>;

/// A backend call the shell must perform, stamped for stale-response checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub ticket: Ticket,
    pub call: ApiCall,
}

impl Outbound {
    pub fn issue(seq: &mut Sequencer, channel: Channel, call: ApiCall) -> Self {
        let ticket = seq.issue(channel);
        tracing::debug!(
            channel = channel.label(),
            seq = ticket.seq,
            endpoint = call.endpoint(),
            "request issued"
        );
        Self { ticket, call }
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, SuggestField};
    use scene::EndpointSlot;

    #[test]
    fn field_names_round_trip_through_parse() {
        for field in SuggestField::ALL {
            let name = serde_json::to_value(field).unwrap();
            assert_eq!(SuggestField::parse(name.as_str().unwrap()), Some(field));
        }
        assert_eq!(SuggestField::parse("nope"), None);
    }

    #[test]
    fn fields_map_to_their_endpoint() {
        assert_eq!(SuggestField::StartSecond.endpoint(), EndpointSlot::Start);
        assert_eq!(SuggestField::FinishFirst.endpoint(), EndpointSlot::Finish);
        assert_eq!(
            Channel::Suggest(SuggestField::FinishSecond).label(),
            "suggest.finish_second"
        );
    }
}
