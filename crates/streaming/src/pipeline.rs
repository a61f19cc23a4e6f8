use tracing::{debug, warn};

use foundation::Viewport;
use scene::{MapStyle, RenderSurface, RouteEndpointStore, traffic_color};

use crate::cache::EdgeCache;
use crate::protocol::{ApiCall, EdgesReply, TrafficAnnotation};
use crate::request::{Channel, Outbound, Sequencer, Ticket};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    /// Visible edges with no cached geometry.
    pub skipped: usize,
    pub endpoints: usize,
}

/// Fetch, merge and draw cycle for the visible road network.
///
/// Owns the geometry cache and the traffic annotations of the last accepted
/// reply. Redraws are driven by the caller with the current viewport and
/// endpoints, so nothing here holds a reference to session state.
#[derive(Debug)]
pub struct RenderLoop {
    cache: EdgeCache,
    frame: Vec<TrafficAnnotation>,
    size_px: f64,
    style: MapStyle,
}

impl RenderLoop {
    pub fn new(size_px: f64, style: MapStyle) -> Self {
        Self {
            cache: EdgeCache::new(),
            frame: Vec::new(),
            size_px,
            style,
        }
    }

    pub fn cache(&self) -> &EdgeCache {
        &self.cache
    }

    pub fn frame(&self) -> &[TrafficAnnotation] {
        &self.frame
    }

    pub fn size_px(&self) -> f64 {
        self.size_px
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn refresh(&self, viewport: &Viewport, seq: &mut Sequencer) -> Outbound {
        let center = viewport.center();
        Outbound::issue(
            seq,
            Channel::Viewport,
            ApiCall::GetEdges {
                lat: center.lat,
                lon: center.lon,
                span: viewport.span(),
            },
        )
    }

    /// Asks the backend to reset its per-client state. The reply is an edges
    /// reply on the viewport channel.
    pub fn clear_request(&self, seq: &mut Sequencer) -> Outbound {
        Outbound::issue(seq, Channel::Viewport, ApiCall::Clear)
    }

    /// Handles an edges reply; `None` means it was stale and nothing changed.
    pub fn on_edges(
        &mut self,
        ticket: &Ticket,
        reply: &EdgesReply,
        seq: &Sequencer,
        viewport: &Viewport,
        endpoints: &RouteEndpointStore,
        surface: &mut dyn RenderSurface,
    ) -> Option<RenderStats> {
        if !seq.is_current(ticket) {
            debug!(
                channel = ticket.channel.label(),
                seq = ticket.seq,
                latest = seq.latest(ticket.channel),
                "stale edges reply discarded"
            );
            return None;
        }
        let overlay_ids = endpoints.overlay().map(|o| o.edge_ids());
        if !reply.path_edges.is_empty() && overlay_ids != Some(&reply.path_edges) {
            debug!(
                reported = reply.path_edges.len(),
                "backend path edges differ from the local overlay"
            );
        }
        self.apply(reply);
        Some(self.render(viewport, endpoints, surface))
    }

    /// Merges new geometry and makes the reply's edges the current frame.
    /// Returns the number of records added to the cache.
    pub fn apply(&mut self, reply: &EdgesReply) -> usize {
        let added = self
            .cache
            .merge(reply.new_edges.iter().map(|e| e.record.clone()));
        self.frame = reply.visible();
        debug!(
            added,
            cached = self.cache.len(),
            visible = self.frame.len(),
            "edges merged"
        );
        added
    }

    pub fn render(
        &self,
        viewport: &Viewport,
        endpoints: &RouteEndpointStore,
        surface: &mut dyn RenderSurface,
    ) -> RenderStats {
        let transform = viewport.transform(self.size_px);
        let overlay = endpoints.overlay();
        let mut stats = RenderStats::default();

        surface.clear_rect();
        for t in &self.frame {
            let Some(record) = self.cache.get(&t.edge_id) else {
                stats.skipped += 1;
                continue;
            };
            let a = transform.forward(record.from);
            let b = transform.forward(record.to);
            let on_path = overlay.is_some_and(|o| o.contains(&t.edge_id));
            surface.draw_segment(
                a.x,
                a.y,
                b.x,
                b.y,
                traffic_color(t.weight),
                self.style.edge_width(on_path),
            );
            stats.drawn += 1;
        }
        if stats.skipped > 0 {
            warn!(
                skipped = stats.skipped,
                "visible edges missing from cache; skipped"
            );
        }
        stats.endpoints = endpoints.draw(&transform, &self.style, surface);
        stats
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{RenderLoop, RenderStats};
    use crate::protocol::{ApiCall, decode_edges};
    use crate::request::{Channel, Sequencer};
    use foundation::{EdgeId, LatLon, NodeId, SpanLimits, Viewport};
    use scene::{
        Color, DrawCall, EndpointSlot, MapStyle, PathOverlay, RecordingSurface, ResolvedPoint,
        RouteEndpointStore,
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn viewport() -> Viewport {
        Viewport::new(LatLon::new(41.8268, -71.4025), 0.005, SpanLimits::default()).unwrap()
    }

    const E1_REPLY: &str = r#"{
        "oldEdges": [],
        "newEdges": [["e1", 1]],
        "newCoords": [[41.82, -71.40, 41.83, -71.41]],
        "pathEdges": {}
    }"#;

    #[test]
    fn refresh_carries_viewport_center_and_span() {
        let rl = RenderLoop::new(600.0, MapStyle::default());
        let mut seq = Sequencer::new();
        let out = rl.refresh(&viewport(), &mut seq);
        assert_eq!(out.ticket.channel, Channel::Viewport);
        assert_eq!(out.ticket.seq, 1);
        assert_eq!(
            out.call,
            ApiCall::GetEdges {
                lat: 41.8268,
                lon: -71.4025,
                span: 0.005
            }
        );
        assert_eq!(rl.clear_request(&mut seq).ticket.seq, 2);
    }

    #[test]
    fn single_new_edge_draws_one_green_segment() {
        let mut rl = RenderLoop::new(600.0, MapStyle::default());
        let mut seq = Sequencer::new();
        let vp = viewport();
        let endpoints = RouteEndpointStore::new();
        let mut surface = RecordingSurface::new();

        let out = rl.refresh(&vp, &mut seq);
        let reply = decode_edges(E1_REPLY).unwrap();
        let stats = rl
            .on_edges(&out.ticket, &reply, &seq, &vp, &endpoints, &mut surface)
            .unwrap();

        assert!(rl.cache().contains(&EdgeId::from("e1")));
        assert_eq!(
            stats,
            RenderStats {
                drawn: 1,
                skipped: 0,
                endpoints: 0
            }
        );
        assert_eq!(surface.clear_count(), 1);
        let segments = surface.segments();
        let [DrawCall::Segment { from, color, width, .. }] = segments.as_slice() else {
            panic!("expected one segment, got {segments:?}");
        };
        assert_eq!(*color, Color::GREEN);
        assert_eq!(*width, MapStyle::default().edge_width_px);
        // 0.0068° south and 0.0025° east of centre at 120000 px/deg
        assert_close(from.1, 300.0 + 0.0068 * 120_000.0);
    }

    #[test]
    fn stale_reply_neither_merges_nor_draws() {
        let mut rl = RenderLoop::new(600.0, MapStyle::default());
        let mut seq = Sequencer::new();
        let vp = viewport();
        let endpoints = RouteEndpointStore::new();
        let mut surface = RecordingSurface::new();

        let first = rl.refresh(&vp, &mut seq);
        let second = rl.refresh(&vp, &mut seq);
        let newer = decode_edges(
            r#"{"newEdges": [["e2", 6]], "newCoords": [[41.82, -71.40, 41.83, -71.41]]}"#,
        )
        .unwrap();
        assert!(
            rl.on_edges(&second.ticket, &newer, &seq, &vp, &endpoints, &mut surface)
                .is_some()
        );

        let older = decode_edges(E1_REPLY).unwrap();
        assert_eq!(
            rl.on_edges(&first.ticket, &older, &seq, &vp, &endpoints, &mut surface),
            None
        );
        assert!(!rl.cache().contains(&EdgeId::from("e1")));
        assert_eq!(surface.clear_count(), 1);
        assert_eq!(rl.frame().len(), 1);
        assert_eq!(rl.frame()[0].edge_id, EdgeId::from("e2"));
    }

    #[test]
    fn old_edge_without_geometry_is_skipped() {
        let mut rl = RenderLoop::new(600.0, MapStyle::default());
        let vp = viewport();
        let endpoints = RouteEndpointStore::new();
        let mut surface = RecordingSurface::new();

        let reply = decode_edges(
            r#"{
                "oldEdges": [["ghost", 1], ["e1", 9]],
                "newEdges": [["e1", 9]],
                "newCoords": [[41.82, -71.40, 41.83, -71.41]]
            }"#,
        )
        .unwrap();
        rl.apply(&reply);
        let stats = rl.render(&vp, &endpoints, &mut surface);
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.skipped, 1);
        let [DrawCall::Segment { color, .. }] = surface.segments().as_slice() else {
            panic!("expected one segment");
        };
        assert_eq!(*color, Color::RED);
    }

    #[test]
    fn overlay_edges_are_highlighted_and_endpoints_drawn_last() {
        let mut rl = RenderLoop::new(600.0, MapStyle::default());
        let vp = viewport();
        let mut endpoints = RouteEndpointStore::new();
        for (slot, id) in [(EndpointSlot::Start, "n1"), (EndpointSlot::Finish, "n2")] {
            endpoints.begin(slot);
            endpoints.resolve(
                slot,
                Some(ResolvedPoint {
                    id: NodeId::new(id).unwrap(),
                    lat: 41.8268,
                    lon: -71.4025,
                }),
            );
        }
        endpoints.set_overlay(PathOverlay::new(
            [EdgeId::from("e1")].into_iter().collect(),
            Some(0.4),
        ));

        rl.apply(&decode_edges(E1_REPLY).unwrap());
        let mut surface = RecordingSurface::new();
        let stats = rl.render(&vp, &endpoints, &mut surface);
        assert_eq!(stats.endpoints, 2);

        let frame = surface.frame();
        assert_eq!(frame.len(), 3);
        assert!(matches!(
            frame[0],
            DrawCall::Segment { width, .. } if width == MapStyle::default().path_width_px
        ));
        assert!(matches!(frame[1], DrawCall::Circle { .. }));
        assert!(matches!(frame[2], DrawCall::Circle { .. }));
    }
}
