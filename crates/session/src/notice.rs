use serde::Serialize;

use scene::RouteEndpoint;
use streaming::SuggestField;

use crate::suggest::Slot;

/// State changes the page reacts to (button colours, status text, slot
/// contents). Serialised as JSON for the host page listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    EndpointsChanged {
        start: RouteEndpoint,
        finish: RouteEndpoint,
        can_query_route: bool,
    },
    RouteStatus {
        message: String,
        length: Option<f64>,
    },
    SuggestionsChanged {
        field: SuggestField,
        /// Current input text; changes when a slot is picked.
        input: String,
        slots: Vec<Slot>,
    },
    RequestFailed {
        channel: String,
        reason: String,
    },
}
