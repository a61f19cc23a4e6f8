use serde::Serialize;
use tracing::debug;

use foundation::{GeoTransform, LatLon, NodeId};

use crate::overlay::PathOverlay;
use crate::style::MapStyle;
use crate::surface::RenderSurface;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSlot {
    Start,
    Finish,
}

impl EndpointSlot {
    pub const ALL: [EndpointSlot; 2] = [EndpointSlot::Start, EndpointSlot::Finish];

    fn index(self) -> usize {
        match self {
            EndpointSlot::Start => 0,
            EndpointSlot::Finish => 1,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" => Some(EndpointSlot::Start),
            "finish" => Some(EndpointSlot::Finish),
            _ => None,
        }
    }
}

/// A graph vertex the backend matched for an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPoint {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

impl ResolvedPoint {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RouteEndpoint {
    #[default]
    Unset,
    Pending,
    Resolved(ResolvedPoint),
}

impl RouteEndpoint {
    pub fn is_resolved(&self) -> bool {
        matches!(self, RouteEndpoint::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&ResolvedPoint> {
        match self {
            RouteEndpoint::Resolved(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    current: RouteEndpoint,
    /// What `current` was before the in-flight resolution started.
    before_request: RouteEndpoint,
}

/// The two route terminals and the overlay computed between them.
///
/// Transitions per slot:
/// - `begin`: any → `Pending`
/// - `resolve`: `Pending` → `Resolved` or `Unset` (no match)
/// - `abort`: `Pending` → whatever the slot held before `begin`
/// - `clear`: any → `Unset`
///
/// The overlay is dropped whenever an endpoint becomes `Unset`. A pending
/// endpoint keeps it, so a failed re-resolution leaves the route in place.
#[derive(Debug, Clone, Default)]
pub struct RouteEndpointStore {
    slots: [SlotState; 2],
    overlay: Option<PathOverlay>,
}

impl RouteEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EndpointSlot) -> &RouteEndpoint {
        &self.slots[slot.index()].current
    }

    pub fn start(&self) -> &RouteEndpoint {
        self.get(EndpointSlot::Start)
    }

    pub fn finish(&self) -> &RouteEndpoint {
        self.get(EndpointSlot::Finish)
    }

    /// Slot a map click should resolve: `start` while it is unset, `finish` otherwise.
    pub fn click_target(&self) -> EndpointSlot {
        if *self.start() == RouteEndpoint::Unset {
            EndpointSlot::Start
        } else {
            EndpointSlot::Finish
        }
    }

    pub fn begin(&mut self, slot: EndpointSlot) {
        let state = &mut self.slots[slot.index()];
        if state.current != RouteEndpoint::Pending {
            state.before_request = std::mem::take(&mut state.current);
        }
        state.current = RouteEndpoint::Pending;
        debug!(?slot, "endpoint pending");
    }

    /// Completes a pending resolution. `None` is the backend's "no match".
    ///
    /// Returns `false` (and changes nothing) if the slot is not pending.
    pub fn resolve(&mut self, slot: EndpointSlot, point: Option<ResolvedPoint>) -> bool {
        let state = &mut self.slots[slot.index()];
        if state.current != RouteEndpoint::Pending {
            debug!(?slot, "resolution ignored: slot not pending");
            return false;
        }
        state.current = match point {
            Some(p) => RouteEndpoint::Resolved(p),
            None => RouteEndpoint::Unset,
        };
        state.before_request = RouteEndpoint::Unset;
        if !state.current.is_resolved() {
            self.overlay = None;
        }
        debug!(?slot, resolved = state.current.is_resolved(), "endpoint resolved");
        true
    }

    /// Rolls a pending slot back after its request failed in transport.
    pub fn abort(&mut self, slot: EndpointSlot) -> bool {
        let state = &mut self.slots[slot.index()];
        if state.current != RouteEndpoint::Pending {
            return false;
        }
        state.current = std::mem::take(&mut state.before_request);
        true
    }

    pub fn clear(&mut self, slot: EndpointSlot) {
        let state = &mut self.slots[slot.index()];
        state.current = RouteEndpoint::Unset;
        state.before_request = RouteEndpoint::Unset;
        self.overlay = None;
    }

    pub fn can_query_route(&self) -> bool {
        self.start().is_resolved() && self.finish().is_resolved()
    }

    pub fn route_ids(&self) -> Option<(NodeId, NodeId)> {
        let start = self.start().resolved()?;
        let finish = self.finish().resolved()?;
        Some((start.id.clone(), finish.id.clone()))
    }

    pub fn overlay(&self) -> Option<&PathOverlay> {
        self.overlay.as_ref()
    }

    /// Installs a route result, replacing any previous one.
    ///
    /// Refused unless both endpoints are resolved.
    pub fn set_overlay(&mut self, overlay: PathOverlay) -> bool {
        if !self.can_query_route() {
            return false;
        }
        self.overlay = Some(overlay);
        true
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    /// Draws each resolved endpoint as a filled circle. Returns the number drawn.
    pub fn draw(
        &self,
        transform: &GeoTransform,
        style: &MapStyle,
        surface: &mut dyn RenderSurface,
    ) -> usize {
        let mut drawn = 0;
        for slot in EndpointSlot::ALL {
            let Some(point) = self.get(slot).resolved() else {
                continue;
            };
            let p = transform.forward(point.position());
            let color = match slot {
                EndpointSlot::Start => style.start_color,
                EndpointSlot::Finish => style.finish_color,
            };
            surface.draw_circle(p.x, p.y, style.endpoint_radius_px, color);
            drawn += 1;
        }
        drawn
    }
}
