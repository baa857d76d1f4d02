//! Touch gesture state machine
//!
//! Turns pointer down/move/up events and the long-press timer into commit,
//! cancel, and option-selection decisions. Everything runs on the caller's
//! thread; the long-press timer is a deadline the host either polls or fires
//! with the token it was handed.
//!
//! ```text
//! Idle -> PressStarted -> ReleasedEarly -> Committing -> Idle
//!              |
//!              +-> LongPressFired -> OptionsShown <-> Dragging -> Committing -> Idle
//!
//! any active state -> Cancelled -> Idle
//! ```

use super::geometry::{resolve_callout, CalloutGeometry, CalloutMetrics, Point, Rect};
use super::ButtonPosition;
use log::{debug, trace, warn};
use std::time::{Duration, Instant};

/// Default delay before the option callout appears
pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 300;

/// Default downward travel, as a fraction of key height, that selects the alternate input
pub const DEFAULT_DOWN_GESTURE_RATIO: f32 = 0.25;

/// Type of pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventType {
    Down,
    Move,
    Up,
    /// The platform took the pointer away (e.g. a system gesture)
    Cancel,
}

/// A pointer event with its location and time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub event_type: PointerEventType,
    pub point: Point,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn new(event_type: PointerEventType, point: Point, timestamp: Instant) -> Self {
        Self {
            event_type,
            point,
            timestamp,
        }
    }

    pub fn down(point: Point, timestamp: Instant) -> Self {
        Self::new(PointerEventType::Down, point, timestamp)
    }

    pub fn moved(point: Point, timestamp: Instant) -> Self {
        Self::new(PointerEventType::Move, point, timestamp)
    }

    pub fn up(point: Point, timestamp: Instant) -> Self {
        Self::new(PointerEventType::Up, point, timestamp)
    }

    pub fn cancel(point: Point, timestamp: Instant) -> Self {
        Self::new(PointerEventType::Cancel, point, timestamp)
    }
}

/// Gesture state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    PressStarted,
    LongPressFired,
    ReleasedEarly,
    OptionsShown,
    Dragging,
    Committing,
    Cancelled,
}

impl GestureState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PressStarted => "press-started",
            Self::LongPressFired => "long-press-fired",
            Self::ReleasedEarly => "released-early",
            Self::OptionsShown => "options-shown",
            Self::Dragging => "dragging",
            Self::Committing => "committing",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Identity of one touch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// State kept while a pointer is down
#[derive(Debug, Clone, PartialEq)]
pub struct TouchSession {
    pub id: SessionId,
    pub start_point: Point,
    pub latest_point: Point,
    pub start_time: Instant,
    pub long_press_fired: bool,
    pub options_shown: bool,
    /// Present only while the callout is visible
    pub active_option: Option<usize>,
}

/// A pending long-press deadline, bound to the session that scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPressTimer {
    pub session: SessionId,
    pub deadline: Instant,
}

/// Which input a finished gesture commits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitValue {
    Primary,
    Alternate,
    Option(usize),
}

/// Outcome of feeding an event to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureDecision {
    OptionsShown,
    OptionChanged(usize),
    OptionsHidden,
    Commit(CommitValue),
    Cancelled,
    /// The key needs to be drawn again
    Redraw,
}

/// Timing and tolerance settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    pub long_press_delay: Duration,
    /// Fraction of key height the pointer must travel down to pick the alternate input
    pub down_gesture_ratio: f32,
    /// Tolerance added around the key frame before a press is cancelled
    pub tracking_margin_inset: f32,
    /// Subtracted from the option row height
    pub callout_height_reduction: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            long_press_delay: Duration::from_millis(DEFAULT_LONG_PRESS_DELAY_MS),
            down_gesture_ratio: DEFAULT_DOWN_GESTURE_RATIO,
            tracking_margin_inset: 0.0,
            callout_height_reduction: 0.0,
        }
    }
}

/// Key layout facts the machine needs for one event
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub frame: Rect,
    pub position: ButtonPosition,
    pub option_count: usize,
    pub narrow_width: bool,
    pub has_alternate: bool,
    pub metrics: &'a CalloutMetrics,
}

/// The per-key gesture state machine
#[derive(Debug, Clone)]
pub struct GestureMachine {
    state: GestureState,
    session: Option<TouchSession>,
    timer: Option<LongPressTimer>,
    callout: Option<CalloutGeometry>,
    next_session: u64,
    settings: GestureSettings,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}

impl GestureMachine {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            state: GestureState::Idle,
            session: None,
            timer: None,
            callout: None,
            next_session: 1,
            settings,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn session(&self) -> Option<&TouchSession> {
        self.session.as_ref()
    }

    /// True while a pointer is down on this key
    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn callout(&self) -> Option<&CalloutGeometry> {
        self.callout.as_ref()
    }

    pub fn active_option(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.active_option)
    }

    pub fn pending_timer(&self) -> Option<LongPressTimer> {
        self.timer
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Replace the settings. Callers must only do this between gestures.
    pub fn set_settings(&mut self, settings: GestureSettings) {
        self.settings = settings;
    }

    /// Downward travel needed to commit the alternate input
    pub fn down_threshold(&self, frame: Rect) -> f32 {
        frame.height * self.settings.down_gesture_ratio
    }

    /// Region a pointer-down must land in to start a press
    pub fn press_region(&self, ctx: &GestureContext<'_>) -> Rect {
        let margin = self.settings.tracking_margin_inset.max(0.0);
        ctx.frame.outset(margin, margin)
    }

    /// Region the pointer may move in without cancelling a press.
    /// Extends below the press region when a down-swipe can pick the alternate.
    pub fn tracking_region(&self, ctx: &GestureContext<'_>) -> Rect {
        let mut region = self.press_region(ctx);
        if ctx.has_alternate {
            region.height += self.down_threshold(ctx.frame);
        }
        region
    }

    /// Feed one pointer event
    pub fn handle(&mut self, event: &PointerEvent, ctx: &GestureContext<'_>) -> Vec<GestureDecision> {
        match event.event_type {
            PointerEventType::Down => self.pointer_down(event, ctx),
            PointerEventType::Move => {
                let mut decisions = self.poll(event.timestamp, ctx);
                decisions.extend(self.pointer_move(event, ctx));
                decisions
            }
            PointerEventType::Up => {
                let mut decisions = self.poll(event.timestamp, ctx);
                decisions.extend(self.pointer_up(event, ctx));
                decisions
            }
            PointerEventType::Cancel => self.pointer_cancel(),
        }
    }

    /// Fire the long-press timer if its deadline has passed
    pub fn poll(&mut self, now: Instant, ctx: &GestureContext<'_>) -> Vec<GestureDecision> {
        match self.timer {
            Some(timer) if now >= timer.deadline => self.fire_long_press(timer, ctx),
            _ => Vec::new(),
        }
    }

    /// Fire a long-press timer the host scheduled itself.
    ///
    /// A timer from an earlier session, or one already fired or cancelled, is
    /// ignored.
    pub fn fire_long_press(
        &mut self,
        timer: LongPressTimer,
        ctx: &GestureContext<'_>,
    ) -> Vec<GestureDecision> {
        let current = self.session.as_ref().map(|s| s.id);
        if self.timer != Some(timer) || current != Some(timer.session) {
            trace!("ignoring stale long-press timer for session {:?}", timer.session);
            return Vec::new();
        }
        self.timer = None;
        if self.state != GestureState::PressStarted {
            return Vec::new();
        }

        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.long_press_fired = true;
        let latest = session.latest_point;

        // Without options a long press changes nothing; release decides as a tap.
        let Some(callout) = Self::resolve(&self.settings, ctx) else {
            debug!("long press on key without options");
            return Vec::new();
        };
        self.transition(GestureState::LongPressFired);

        let active = callout
            .hit_test(latest)
            .or_else(|| callout.nearest_cell(latest.x));
        if let Some(session) = self.session.as_mut() {
            session.options_shown = true;
            session.active_option = active;
        }
        self.callout = Some(callout);
        self.transition(GestureState::OptionsShown);

        vec![GestureDecision::OptionsShown, GestureDecision::Redraw]
    }

    fn pointer_down(&mut self, event: &PointerEvent, ctx: &GestureContext<'_>) -> Vec<GestureDecision> {
        if self.session.is_some() {
            debug!("pointer down while a touch session is active, ignoring");
            return Vec::new();
        }
        if !self.press_region(ctx).contains(event.point) {
            return Vec::new();
        }

        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.session = Some(TouchSession {
            id,
            start_point: event.point,
            latest_point: event.point,
            start_time: event.timestamp,
            long_press_fired: false,
            options_shown: false,
            active_option: None,
        });
        self.timer = match event.timestamp.checked_add(self.settings.long_press_delay) {
            Some(deadline) => Some(LongPressTimer { session: id, deadline }),
            None => {
                warn!(
                    "long-press delay {:?} out of range, long press disabled",
                    self.settings.long_press_delay
                );
                None
            }
        };
        self.transition(GestureState::PressStarted);

        vec![GestureDecision::Redraw]
    }

    fn pointer_move(&mut self, event: &PointerEvent, ctx: &GestureContext<'_>) -> Vec<GestureDecision> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        session.latest_point = event.point;
        trace!("pointer move to ({:.1}, {:.1})", event.point.x, event.point.y);

        match self.state {
            GestureState::PressStarted => {
                if self.tracking_region(ctx).contains(event.point) {
                    Vec::new()
                } else {
                    self.cancel()
                }
            }
            GestureState::OptionsShown | GestureState::Dragging => {
                self.transition(GestureState::Dragging);
                // Recomputed from scratch on every move.
                self.callout = Self::resolve(&self.settings, ctx);
                let hit = self.callout.as_ref().and_then(|c| c.hit_test(event.point));
                match (hit, self.session.as_mut()) {
                    (Some(index), Some(session)) if session.active_option != Some(index) => {
                        session.active_option = Some(index);
                        vec![GestureDecision::OptionChanged(index), GestureDecision::Redraw]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent, ctx: &GestureContext<'_>) -> Vec<GestureDecision> {
        let Some(session) = self.session.as_mut() else {
            trace!("pointer up without a touch session");
            return Vec::new();
        };
        session.latest_point = event.point;
        let session = session.clone();

        if session.options_shown {
            self.transition(GestureState::Committing);
            let mut decisions = vec![GestureDecision::OptionsHidden];
            if let Some(index) = session.active_option {
                decisions.push(GestureDecision::Commit(CommitValue::Option(index)));
            }
            decisions.push(GestureDecision::Redraw);
            self.finish();
            return decisions;
        }

        if !self.tracking_region(ctx).contains(event.point) {
            return self.cancel();
        }

        self.timer = None;
        self.transition(GestureState::ReleasedEarly);
        let travel = event.point.y - session.start_point.y;
        let value = if ctx.has_alternate && travel > self.down_threshold(ctx.frame) {
            CommitValue::Alternate
        } else {
            CommitValue::Primary
        };
        self.transition(GestureState::Committing);
        self.finish();

        vec![GestureDecision::Commit(value), GestureDecision::Redraw]
    }

    fn pointer_cancel(&mut self) -> Vec<GestureDecision> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let mut decisions = Vec::new();
        if session.options_shown {
            decisions.push(GestureDecision::OptionsHidden);
        }
        decisions.extend(self.cancel());
        decisions
    }

    fn cancel(&mut self) -> Vec<GestureDecision> {
        self.transition(GestureState::Cancelled);
        self.finish();
        vec![GestureDecision::Cancelled, GestureDecision::Redraw]
    }

    /// Drop the session and any pending timer, then return to idle
    fn finish(&mut self) {
        self.timer = None;
        self.session = None;
        self.callout = None;
        self.transition(GestureState::Idle);
    }

    fn transition(&mut self, to: GestureState) {
        if self.state != to {
            debug!("gesture {} -> {}", self.state.name(), to.name());
            self.state = to;
        }
    }

    fn resolve(settings: &GestureSettings, ctx: &GestureContext<'_>) -> Option<CalloutGeometry> {
        resolve_callout(
            ctx.frame,
            ctx.position,
            ctx.option_count,
            ctx.narrow_width,
            settings.callout_height_reduction,
            ctx.metrics,
        )
    }
}
