//! Typed host events and their dispatch.
//!
//! The host (browser shell, CLI) translates its native input into `HostEvent`
//! values. Handlers are plain functions registered per `EventKind` and run in
//! registration order; each event runs to completion before the next one.

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

impl PointerButton {
    /// Maps DOM `MouseEvent.button` codes.
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Auxiliary),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    GlobeTexture,
    Font,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PointerMove { x_px: f64, y_px: f64 },
    PointerDown { x_px: f64, y_px: f64, button: PointerButton },
    PointerUp { x_px: f64, y_px: f64, button: PointerButton },
    Click { x_px: f64, y_px: f64 },
    Wheel { delta_y: f64 },
    Resize { width_px: f64, height_px: f64 },
    ToggleRotation,
    AssetLoaded(AssetKind),
    AssetFailed { kind: AssetKind, reason: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerDown,
    PointerUp,
    Click,
    Wheel,
    Resize,
    ToggleRotation,
    Asset,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::PointerMove { .. } => EventKind::PointerMove,
            HostEvent::PointerDown { .. } => EventKind::PointerDown,
            HostEvent::PointerUp { .. } => EventKind::PointerUp,
            HostEvent::Click { .. } => EventKind::Click,
            HostEvent::Wheel { .. } => EventKind::Wheel,
            HostEvent::Resize { .. } => EventKind::Resize,
            HostEvent::ToggleRotation => EventKind::ToggleRotation,
            HostEvent::AssetLoaded(_) | HostEvent::AssetFailed { .. } => EventKind::Asset,
        }
    }
}

pub type Handler<C> = fn(&mut C, &HostEvent);

/// Routes events to handlers registered for their kind.
pub struct Dispatcher<C> {
    handlers: Vec<(EventKind, Handler<C>)>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EventKind, handler: Handler<C>) -> &mut Self {
        self.handlers.push((kind, handler));
        self
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Runs every handler registered for the event's kind.
    ///
    /// Returns how many handlers ran; zero means the event was ignored.
    pub fn dispatch(&self, ctx: &mut C, event: &HostEvent) -> usize {
        let kind = event.kind();
        let mut ran = 0;
        for (k, handler) in &self.handlers {
            if *k == kind {
                handler(ctx, event);
                ran += 1;
            }
        }
        if ran == 0 {
            tracing::trace!(?kind, "event without handler");
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetKind, Dispatcher, EventKind, HostEvent, PointerButton};

    #[derive(Default)]
    struct Log(Vec<String>);

    fn first(log: &mut Log, e: &HostEvent) {
        log.0.push(format!("first:{:?}", e.kind()));
    }

    fn second(log: &mut Log, _e: &HostEvent) {
        log.0.push("second".to_string());
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut d: Dispatcher<Log> = Dispatcher::new();
        d.register(EventKind::Click, first).register(EventKind::Click, second);

        let mut log = Log::default();
        let ran = d.dispatch(&mut log, &HostEvent::Click { x_px: 1.0, y_px: 2.0 });
        assert_eq!(ran, 2);
        assert_eq!(log.0, vec!["first:Click".to_string(), "second".to_string()]);
    }

    #[test]
    fn unrelated_kinds_are_not_invoked() {
        let mut d: Dispatcher<Log> = Dispatcher::new();
        d.register(EventKind::Resize, first);

        let mut log = Log::default();
        assert_eq!(d.dispatch(&mut log, &HostEvent::ToggleRotation), 0);
        assert!(log.0.is_empty());
        assert_eq!(d.handler_count(EventKind::Resize), 1);
    }

    #[test]
    fn asset_events_share_one_kind() {
        assert_eq!(
            HostEvent::AssetLoaded(AssetKind::Font).kind(),
            HostEvent::AssetFailed {
                kind: AssetKind::GlobeTexture,
                reason: "404".into()
            }
            .kind()
        );
    }

    #[test]
    fn dom_button_codes() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(7), None);
    }
}
