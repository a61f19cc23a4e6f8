use tracing::{debug, info, warn};

use foundation::{ScreenPoint, Viewport};
use runtime::{EventBus, Metrics};
use scene::{EndpointSlot, PathOverlay, RenderSurface, ResolvedPoint, RouteEndpointStore};
use streaming::{
    ApiCall, ApiError, Channel, EdgesReply, Outbound, RenderLoop, RenderStats, Reply, Sequencer,
    SuggestField, Ticket,
};

use crate::config::{ClientConfig, ConfigError};
use crate::notice::Notice;
use crate::suggest::SuggestionController;

/// Everything one map page owns: viewport, endpoints, edge cache, the four
/// suggestion fields and the request sequencer.
///
/// The session performs no I/O. Operations that need the backend return an
/// [`Outbound`]; the caller performs it and hands the result to
/// [`MapSession::deliver`] together with the surface to draw on.
#[derive(Debug)]
pub struct MapSession {
    config: ClientConfig,
    viewport: Viewport,
    render: RenderLoop,
    endpoints: RouteEndpointStore,
    suggestions: Vec<SuggestionController>,
    seq: Sequencer,
    notices: EventBus<Notice>,
    metrics: Metrics,
}

impl MapSession {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let viewport = config.viewport()?;
        let render = RenderLoop::new(config.canvas_size_px, config.style());
        info!(
            lat = viewport.center().lat,
            lon = viewport.center().lon,
            span = viewport.span(),
            "map session created"
        );
        Ok(Self {
            config,
            viewport,
            render,
            endpoints: RouteEndpointStore::new(),
            suggestions: SuggestField::ALL
                .into_iter()
                .map(SuggestionController::new)
                .collect(),
            seq: Sequencer::new(),
            notices: EventBus::new(),
            metrics: Metrics::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn endpoints(&self) -> &RouteEndpointStore {
        &self.endpoints
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub fn suggestion(&self, field: SuggestField) -> &SuggestionController {
        &self.suggestions[field.index()]
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn refresh(&mut self) -> Outbound {
        self.render.refresh(&self.viewport, &mut self.seq)
    }

    /// Periodic refresh; shares the viewport channel with user refreshes.
    pub fn tick(&mut self) -> Outbound {
        self.metrics.incr("ticks");
        self.refresh()
    }

    pub fn pan(&mut self, dx_px: f64, dy_px: f64) -> Option<Outbound> {
        if !self.viewport.pan(dx_px, dy_px, self.render.size_px()) {
            return None;
        }
        Some(self.refresh())
    }

    pub fn zoom(&mut self, wheel_delta: f64) -> Option<Outbound> {
        if !self.viewport.zoom(wheel_delta) {
            return None;
        }
        Some(self.refresh())
    }

    /// Map click at canvas pixel `(x, y)`: resolves the nearest vertex into
    /// `start` if it is unset, otherwise into `finish`.
    pub fn click(&mut self, x: f64, y: f64, surface: &mut dyn RenderSurface) -> Option<Outbound> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let at = self
            .viewport
            .transform(self.render.size_px())
            .inverse(ScreenPoint::new(x, y));
        let slot = self.endpoints.click_target();
        let call = ApiCall::NearestNeighbor {
            lat: at.lat,
            lon: at.lon,
        };
        Some(self.begin_endpoint(slot, call, surface))
    }

    /// Resolves `slot` to the intersection of two named streets.
    pub fn resolve_intersection(
        &mut self,
        slot: EndpointSlot,
        street1: &str,
        street2: &str,
        surface: &mut dyn RenderSurface,
    ) -> Outbound {
        let call = ApiCall::FindIntersection {
            street1: street1.to_string(),
            street2: street2.to_string(),
        };
        self.begin_endpoint(slot, call, surface)
    }

    fn begin_endpoint(
        &mut self,
        slot: EndpointSlot,
        call: ApiCall,
        surface: &mut dyn RenderSurface,
    ) -> Outbound {
        self.endpoints.begin(slot);
        self.seq.invalidate(Channel::Route);
        self.emit_endpoints();
        self.redraw(surface);
        Outbound::issue(&mut self.seq, Channel::Endpoint(slot), call)
    }

    /// Unsets `slot`, drops the route overlay and asks the backend to reset
    /// its per-client state. The returned request is an edge refresh.
    pub fn clear_endpoint(
        &mut self,
        slot: EndpointSlot,
        surface: &mut dyn RenderSurface,
    ) -> Outbound {
        self.endpoints.clear(slot);
        self.seq.invalidate(Channel::Endpoint(slot));
        self.seq.invalidate(Channel::Route);
        self.emit_endpoints();
        self.redraw(surface);
        self.render.clear_request(&mut self.seq)
    }

    /// `None` unless both endpoints are resolved.
    pub fn query_route(&mut self) -> Option<Outbound> {
        let Some((start_id, finish_id)) = self.endpoints.route_ids() else {
            debug!("route query ignored: endpoints not resolved");
            return None;
        };
        Some(Outbound::issue(
            &mut self.seq,
            Channel::Route,
            ApiCall::ShortestPath {
                start_id,
                finish_id,
            },
        ))
    }

    pub fn suggest(&mut self, field: SuggestField, text: &str) -> Option<Outbound> {
        let out = self.suggestions[field.index()].on_input(text, &mut self.seq);
        if out.is_none() {
            self.emit_suggestions(field);
        }
        out
    }

    pub fn hover_suggestion(&mut self, field: SuggestField, index: usize) -> bool {
        let changed = self.suggestions[field.index()].hover(index);
        if changed {
            self.emit_suggestions(field);
        }
        changed
    }

    pub fn unhover_suggestion(&mut self, field: SuggestField, index: usize) -> bool {
        let changed = self.suggestions[field.index()].unhover(index);
        if changed {
            self.emit_suggestions(field);
        }
        changed
    }

    pub fn pick_suggestion(&mut self, field: SuggestField, index: usize) -> Option<Outbound> {
        let out = self.suggestions[field.index()].pick(index, &mut self.seq)?;
        self.emit_suggestions(field);
        Some(out)
    }

    /// Hands a completed request back to the session.
    ///
    /// Returns `true` if the result changed state. Stale results are dropped
    /// whether they succeeded or failed.
    pub fn deliver(
        &mut self,
        ticket: Ticket,
        result: Result<Reply, ApiError>,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        if !self.seq.is_current(&ticket) {
            debug!(
                channel = ticket.channel.label(),
                seq = ticket.seq,
                latest = self.seq.latest(ticket.channel),
                "stale response discarded"
            );
            self.metrics
                .incr(&format!("stale.{}", ticket.channel.label()));
            return false;
        }
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                self.on_failure(ticket, err, surface);
                return false;
            }
        };
        match (ticket.channel, reply) {
            (Channel::Viewport, Reply::Edges(edges)) => self.on_edges(ticket, &edges, surface),
            (Channel::Route, Reply::Edges(edges)) => self.on_route(&edges, surface),
            (Channel::Endpoint(slot), Reply::Endpoint(point)) => {
                self.on_endpoint(slot, point, surface)
            }
            (Channel::Suggest(field), Reply::Suggestions(list)) => {
                let applied = self.suggestions[field.index()].on_reply(&ticket, list, &self.seq);
                if applied {
                    self.emit_suggestions(field);
                }
                applied
            }
            (channel, reply) => {
                warn!(
                    channel = channel.label(),
                    reply = reply.kind(),
                    "reply does not match its channel"
                );
                self.metrics.incr("responses.mismatched");
                false
            }
        }
    }

    /// Full render pass with the current state.
    pub fn redraw(&mut self, surface: &mut dyn RenderSurface) -> RenderStats {
        let stats = self.render.render(&self.viewport, &self.endpoints, surface);
        self.record(stats);
        stats
    }

    fn on_edges(
        &mut self,
        ticket: Ticket,
        edges: &EdgesReply,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        self.metrics
            .add("decode.skipped_entries", edges.skipped as u64);
        match self.render.on_edges(
            &ticket,
            edges,
            &self.seq,
            &self.viewport,
            &self.endpoints,
            surface,
        ) {
            Some(stats) => {
                self.record(stats);
                true
            }
            None => false,
        }
    }

    fn on_route(&mut self, edges: &EdgesReply, surface: &mut dyn RenderSurface) -> bool {
        if !self.endpoints.can_query_route() {
            debug!("route reply ignored: endpoints changed");
            return false;
        }
        let overlay = PathOverlay::new(edges.path_edges.clone(), edges.length);
        let message = overlay.status_message();
        info!(
            edges = overlay.edge_ids().len(),
            length = ?overlay.total_length(),
            "route received"
        );
        self.notices.emit(Notice::RouteStatus {
            message,
            length: overlay.total_length(),
        });
        self.endpoints.set_overlay(overlay);
        if !edges.old_edges.is_empty() || !edges.new_edges.is_empty() {
            self.render.apply(edges);
        }
        self.redraw(surface);
        true
    }

    fn on_endpoint(
        &mut self,
        slot: EndpointSlot,
        point: Option<ResolvedPoint>,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        if point.is_none() {
            info!(?slot, "no matching vertex");
        }
        if !self.endpoints.resolve(slot, point) {
            return false;
        }
        self.emit_endpoints();
        self.redraw(surface);
        true
    }

    fn on_failure(&mut self, ticket: Ticket, err: ApiError, surface: &mut dyn RenderSurface) {
        warn!(
            channel = ticket.channel.label(),
            seq = ticket.seq,
            error = %err,
            "request failed"
        );
        self.metrics.incr("requests.failed");
        if let Channel::Endpoint(slot) = ticket.channel {
            if self.endpoints.abort(slot) {
                self.emit_endpoints();
                self.redraw(surface);
            }
        }
        self.notices.emit(Notice::RequestFailed {
            channel: ticket.channel.label().to_string(),
            reason: err.to_string(),
        });
    }

    fn record(&mut self, stats: RenderStats) {
        self.metrics
            .add("render.skipped_edges", stats.skipped as u64);
        self.metrics.incr("render.passes");
        self.metrics
            .set_gauge("cache.edges", self.render.cache().len() as i64);
    }

    fn emit_endpoints(&mut self) {
        self.notices.emit(Notice::EndpointsChanged {
            start: self.endpoints.start().clone(),
            finish: self.endpoints.finish().clone(),
            can_query_route: self.endpoints.can_query_route(),
        });
    }

    fn emit_suggestions(&mut self, field: SuggestField) {
        let controller = &self.suggestions[field.index()];
        self.notices.emit(Notice::SuggestionsChanged {
            field,
            input: controller.input().to_string(),
            slots: controller.slots().to_vec(),
        });
    }
}
