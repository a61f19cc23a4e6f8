use std::cell::RefCell;
use std::rc::Rc;

use console_error_panic_hook::set_once;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use scene::EndpointSlot;
use session::{ClientConfig, MapSession, Notice};
use streaming::{Outbound, SuggestField};

mod canvas;
mod http;
mod logging;

use canvas::CanvasSurface;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

struct ClientState {
    session: MapSession,
    surface: CanvasSurface,
    listener: Option<js_sys::Function>,
    timer: Option<(i32, Closure<dyn FnMut()>)>,
}

type Shared = Rc<RefCell<ClientState>>;

/// Browser handle for one map canvas.
///
/// Every method runs one session operation, redraws if needed, starts the
/// resulting backend request in the background, and forwards pending notices
/// to the listener as JSON strings.
#[wasm_bindgen]
pub struct MapClient {
    state: Shared,
    base_url: Rc<str>,
    refresh_interval_ms: u32,
}

fn parse_slot(name: &str) -> Result<EndpointSlot, JsValue> {
    EndpointSlot::parse(name).ok_or_else(|| JsValue::from_str(&format!("unknown endpoint {name}")))
}

fn parse_field(name: &str) -> Result<SuggestField, JsValue> {
    SuggestField::parse(name).ok_or_else(|| JsValue::from_str(&format!("unknown field {name}")))
}

fn notice_json(notice: &Notice) -> Result<String, JsValue> {
    serde_json::to_string(notice).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Sends queued notices to the listener. The state borrow is released first so
/// the listener may call back into the client.
fn flush_notices(state: &Shared) {
    let (listener, notices) = {
        let mut s = state.borrow_mut();
        let notices = s.session.drain_notices();
        (s.listener.clone(), notices)
    };
    let Some(listener) = listener else {
        return;
    };
    for notice in &notices {
        let json = match notice_json(notice) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(?err, "notice not serialisable");
                continue;
            }
        };
        if let Err(err) = listener.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            tracing::warn!(?err, "notice listener threw");
        }
    }
}

/// Runs `out` in the background and hands the result back to the session.
fn dispatch(state: &Shared, base_url: &Rc<str>, out: Outbound) {
    let state = Rc::clone(state);
    let base_url = Rc::clone(base_url);
    spawn_local(async move {
        let result = http::perform(&base_url, &out.call).await;
        {
            let mut s = state.borrow_mut();
            let ClientState {
                session, surface, ..
            } = &mut *s;
            session.deliver(out.ticket, result, surface);
        }
        flush_notices(&state);
    });
}

#[wasm_bindgen]
impl MapClient {
    /// `config_json` is a `ClientConfig` object; an empty string selects defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config_json: &str) -> Result<MapClient, JsValue> {
        let config =
            ClientConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        logging::init(&config.log_level);
        let surface = CanvasSurface::from_canvas_id(canvas_id, config.canvas_size_px)?;
        let base_url: Rc<str> = Rc::from(config.base_url.as_str());
        let refresh_interval_ms = config.refresh_interval_ms;
        let session = MapSession::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(MapClient {
            state: Rc::new(RefCell::new(ClientState {
                session,
                surface,
                listener: None,
                timer: None,
            })),
            base_url,
            refresh_interval_ms,
        })
    }

    /// `listener(json)` receives every notice the session emits.
    pub fn set_listener(&self, listener: js_sys::Function) {
        self.state.borrow_mut().listener = Some(listener);
    }

    /// Issues the first refresh and starts the periodic one.
    pub fn start(&self) -> Result<(), JsValue> {
        self.refresh();
        if self.state.borrow().timer.is_some() {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let state = Rc::clone(&self.state);
        let base_url = Rc::clone(&self.base_url);
        let tick = Closure::<dyn FnMut()>::new(move || {
            let out = state.borrow_mut().session.tick();
            dispatch(&state, &base_url, out);
        });
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            i32::try_from(self.refresh_interval_ms).unwrap_or(i32::MAX),
        )?;
        self.state.borrow_mut().timer = Some((id, tick));
        Ok(())
    }

    /// Stops the periodic refresh. The tick closure holds the shared state, so
    /// this also releases it.
    pub fn stop(&self) {
        let timer = self.state.borrow_mut().timer.take();
        if let Some((id, _tick)) = timer {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }

    pub fn refresh(&self) {
        let out = self.state.borrow_mut().session.refresh();
        dispatch(&self.state, &self.base_url, out);
    }

    /// Drag by a pointer delta in canvas pixels.
    pub fn pan(&self, dx: f64, dy: f64) {
        let out = self.state.borrow_mut().session.pan(dx, dy);
        if let Some(out) = out {
            dispatch(&self.state, &self.base_url, out);
        }
    }

    pub fn zoom(&self, wheel_delta: f64) {
        let out = self.state.borrow_mut().session.zoom(wheel_delta);
        if let Some(out) = out {
            dispatch(&self.state, &self.base_url, out);
        }
    }

    /// Click (not a drag) at canvas pixel `(x, y)`.
    pub fn click(&self, x: f64, y: f64) {
        let out = {
            let mut s = self.state.borrow_mut();
            let ClientState {
                session, surface, ..
            } = &mut *s;
            session.click(x, y, surface)
        };
        if let Some(out) = out {
            dispatch(&self.state, &self.base_url, out);
        }
        flush_notices(&self.state);
    }

    /// `endpoint` is `"start"` or `"finish"`.
    pub fn resolve_intersection(
        &self,
        endpoint: &str,
        street1: &str,
        street2: &str,
    ) -> Result<(), JsValue> {
        let slot = parse_slot(endpoint)?;
        let out = {
            let mut s = self.state.borrow_mut();
            let ClientState {
                session, surface, ..
            } = &mut *s;
            session.resolve_intersection(slot, street1, street2, surface)
        };
        dispatch(&self.state, &self.base_url, out);
        flush_notices(&self.state);
        Ok(())
    }

    pub fn clear_endpoint(&self, endpoint: &str) -> Result<(), JsValue> {
        let slot = parse_slot(endpoint)?;
        let out = {
            let mut s = self.state.borrow_mut();
            let ClientState {
                session, surface, ..
            } = &mut *s;
            session.clear_endpoint(slot, surface)
        };
        dispatch(&self.state, &self.base_url, out);
        flush_notices(&self.state);
        Ok(())
    }

    /// Returns `false` if the route cannot be queried yet.
    pub fn query_route(&self) -> bool {
        let out = self.state.borrow_mut().session.query_route();
        match out {
            Some(out) => {
                dispatch(&self.state, &self.base_url, out);
                true
            }
            None => false,
        }
    }

    /// `field` is one of `start_first`, `start_second`, `finish_first`,
    /// `finish_second`.
    pub fn suggest(&self, field: &str, text: &str) -> Result<(), JsValue> {
        let field = parse_field(field)?;
        let out = self.state.borrow_mut().session.suggest(field, text);
        if let Some(out) = out {
            dispatch(&self.state, &self.base_url, out);
        }
        flush_notices(&self.state);
        Ok(())
    }

    pub fn hover_suggestion(&self, field: &str, index: usize) -> Result<(), JsValue> {
        let field = parse_field(field)?;
        self.state
            .borrow_mut()
            .session
            .hover_suggestion(field, index);
        flush_notices(&self.state);
        Ok(())
    }

    pub fn unhover_suggestion(&self, field: &str, index: usize) -> Result<(), JsValue> {
        let field = parse_field(field)?;
        self.state
            .borrow_mut()
            .session
            .unhover_suggestion(field, index);
        flush_notices(&self.state);
        Ok(())
    }

    pub fn pick_suggestion(&self, field: &str, index: usize) -> Result<(), JsValue> {
        let field = parse_field(field)?;
        let out = self
            .state
            .borrow_mut()
            .session
            .pick_suggestion(field, index);
        if let Some(out) = out {
            dispatch(&self.state, &self.base_url, out);
        }
        flush_notices(&self.state);
        Ok(())
    }

    pub fn redraw(&self) {
        let mut s = self.state.borrow_mut();
        let ClientState {
            session, surface, ..
        } = &mut *s;
        session.redraw(surface);
    }

    /// Counters and gauges as
    /// `{"counters": {...}, "gauges": {...}, "stale_total": n}`.
    pub fn metrics_json(&self) -> Result<String, JsValue> {
        let s = self.state.borrow();
        let metrics = s.session.metrics();
        let snapshot = metrics.snapshot();
        serde_json::to_string(&serde_json::json!({
            "counters": snapshot.counters,
            "gauges": snapshot.gauges,
            "stale_total": metrics.counter_total("stale"),
        }))
        .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
