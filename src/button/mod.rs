//! Keyboard button: a key that commits its input on tap, its alternate input
//! on a short downward swipe, and one of its input options after a long press
//! and drag.

pub mod dispatch;
pub mod geometry;
pub mod gesture;
mod position;
pub mod shape;
pub mod theme;

pub use dispatch::{
    ButtonEvent, ButtonEventKind, ButtonId, CommitOutcome, Dispatcher, EventEmitter, KeyInput,
    SubscriptionId,
};
pub use geometry::{resolve_callout, CalloutGeometry, CalloutMetrics, Point, Rect, Size};
pub use gesture::{
    CommitValue, GestureContext, GestureDecision, GestureMachine, GestureSettings, GestureState,
    LongPressTimer, PointerEvent, PointerEventType, SessionId, TouchSession,
};
pub use position::{ButtonPosition, ButtonStyle};
pub use shape::{KeyLabels, SceneRequest, VectorScene};
pub use theme::{ButtonTheme, FontSizes, Rgba};

use crate::config::Config;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;
use thiserror::Error;

/// Error type for keyboard button operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ButtonError {
    /// Configuration can only change between gestures
    #[error("cannot reconfigure button {0:?} while a touch is in progress")]
    GestureInProgress(ButtonId),
}

/// What a key inserts and shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyConfig {
    /// Text inserted on a tap
    pub input: String,
    /// Label shown instead of `input`, if set
    pub display_text: Option<String>,
    /// Text inserted on a short downward swipe
    pub alternate_input: Option<String>,
    /// Options revealed by a long press, in display order
    pub input_options: Vec<String>,
    /// Labels for `input_options`; ignored unless the lengths match
    pub input_option_display_names: Option<Vec<String>>,
    pub position: ButtonPosition,
    pub narrow_option_width: bool,
    /// Hides every label
    pub trackpad_mode: bool,
}

impl KeyConfig {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Label drawn on the key body
    pub fn label(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.input)
    }

    /// True when the display names can be used for the option labels
    pub fn display_names_match(&self) -> bool {
        self.input_option_display_names
            .as_ref()
            .is_some_and(|names| names.len() == self.input_options.len())
    }

    /// Labels for the option cells, falling back to the raw options
    pub fn option_labels(&self) -> Vec<&str> {
        match &self.input_option_display_names {
            Some(names) if self.display_names_match() => names.iter().map(String::as_str).collect(),
            _ => self.input_options.iter().map(String::as_str).collect(),
        }
    }

    pub fn has_alternate(&self) -> bool {
        self.alternate_input.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Text a finished gesture inserts
    pub fn commit_text(&self, value: CommitValue) -> Option<&str> {
        match value {
            CommitValue::Primary => Some(&self.input),
            CommitValue::Alternate => self.alternate_input.as_deref().or(Some(&self.input)),
            CommitValue::Option(index) => self.input_options.get(index).map(String::as_str),
        }
    }
}

/// A single interactive keyboard key
#[derive(Debug)]
pub struct KeyboardButton {
    id: ButtonId,
    config: KeyConfig,
    style: ButtonStyle,
    theme: ButtonTheme,
    metrics: CalloutMetrics,
    frame: Rect,
    machine: GestureMachine,
    dispatcher: Dispatcher,
}

impl KeyboardButton {
    pub fn new(id: ButtonId, input: impl Into<String>) -> Self {
        Self {
            id,
            config: KeyConfig::new(input),
            style: ButtonStyle::default(),
            theme: ButtonTheme::default(),
            metrics: CalloutMetrics::default(),
            frame: Rect::default(),
            machine: GestureMachine::default(),
            dispatcher: Dispatcher::new(id),
        }
    }

    /// Build a button with settings, metrics, and theme taken from `config`
    pub fn from_config(id: ButtonId, input: impl Into<String>, config: &Config) -> Self {
        let mut button = Self::new(id, input);
        button.style = config.style;
        button.theme = ButtonTheme::for_style(config.style, config.ui.theme);
        button.metrics = config.callout;
        button.machine = GestureMachine::new(config.button.gesture_settings());
        button
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    pub fn style(&self) -> ButtonStyle {
        self.style
    }

    pub fn theme(&self) -> &ButtonTheme {
        &self.theme
    }

    pub fn metrics(&self) -> &CalloutMetrics {
        &self.metrics
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn position(&self) -> ButtonPosition {
        self.config.position
    }

    pub fn state(&self) -> GestureState {
        self.machine.state()
    }

    pub fn is_tracking(&self) -> bool {
        self.machine.is_tracking()
    }

    pub fn active_option(&self) -> Option<usize> {
        self.machine.active_option()
    }

    pub fn callout(&self) -> Option<&CalloutGeometry> {
        self.machine.callout()
    }

    pub fn pending_long_press(&self) -> Option<LongPressTimer> {
        self.machine.pending_timer()
    }

    /// Region a pointer-down must land in to start a press
    pub fn press_region(&self) -> Rect {
        let ctx = context(&self.config, self.frame, &self.metrics);
        self.machine.press_region(&ctx)
    }

    // Configuration

    fn ensure_idle(&self) -> Result<(), ButtonError> {
        if self.machine.is_tracking() {
            Err(ButtonError::GestureInProgress(self.id))
        } else {
            Ok(())
        }
    }

    /// Replace the whole key configuration
    pub fn configure(&mut self, config: KeyConfig) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        if config.input_option_display_names.is_some() && !config.display_names_match() {
            warn!(
                "button {:?}: {} display names for {} options, using raw options",
                self.id,
                config.input_option_display_names.as_ref().map_or(0, Vec::len),
                config.input_options.len()
            );
        }
        self.config = config;
        Ok(())
    }

    fn update(&mut self, change: impl FnOnce(&mut KeyConfig)) -> Result<(), ButtonError> {
        let mut config = self.config.clone();
        change(&mut config);
        self.configure(config)
    }

    pub fn set_input(&mut self, input: impl Into<String>) -> Result<(), ButtonError> {
        let input = input.into();
        self.update(|c| {
            c.input = input;
            c.display_text = None;
        })
    }

    /// Insert `input` but show `text` on the key
    pub fn set_input_with_text(
        &mut self,
        input: impl Into<String>,
        text: Option<String>,
    ) -> Result<(), ButtonError> {
        let input = input.into();
        self.update(|c| {
            c.input = input;
            c.display_text = text;
        })
    }

    pub fn set_alternate_input(&mut self, alternate: Option<String>) -> Result<(), ButtonError> {
        self.update(|c| c.alternate_input = alternate)
    }

    pub fn set_input_options(&mut self, options: Vec<String>) -> Result<(), ButtonError> {
        self.update(|c| c.input_options = options)
    }

    pub fn set_input_option_display_names(
        &mut self,
        names: Option<Vec<String>>,
    ) -> Result<(), ButtonError> {
        self.update(|c| c.input_option_display_names = names)
    }

    pub fn set_position(&mut self, position: ButtonPosition) -> Result<(), ButtonError> {
        self.update(|c| c.position = position)
    }

    pub fn set_narrow_option_width(&mut self, narrow: bool) -> Result<(), ButtonError> {
        self.update(|c| c.narrow_option_width = narrow)
    }

    /// Hide (or show again) every label on the key
    pub fn enable_trackpad_mode(&mut self, enable: bool) -> Result<(), ButtonError> {
        self.update(|c| c.trackpad_mode = enable)
    }

    /// Place the key and derive its position from the row it sits in
    pub fn layout(&mut self, frame: Rect, container: Rect) -> Result<(), ButtonError> {
        self.set_frame(frame)?;
        self.set_position(ButtonPosition::for_frame(frame, container))
    }

    pub fn set_frame(&mut self, frame: Rect) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        self.frame = frame;
        Ok(())
    }

    pub fn set_tracking_margin_inset(&mut self, inset: f32) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        let mut settings = *self.machine.settings();
        settings.tracking_margin_inset = inset.max(0.0);
        self.machine.set_settings(settings);
        Ok(())
    }

    pub fn set_callout_height_reduction(&mut self, reduction: f32) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        let mut settings = *self.machine.settings();
        settings.callout_height_reduction = reduction.max(0.0);
        self.machine.set_settings(settings);
        Ok(())
    }

    pub fn set_gesture_settings(&mut self, settings: GestureSettings) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        self.machine.set_settings(settings);
        Ok(())
    }

    pub fn set_metrics(&mut self, metrics: CalloutMetrics) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        self.metrics = metrics;
        Ok(())
    }

    /// Themes only affect drawing, so they may change at any time
    pub fn set_theme(&mut self, theme: ButtonTheme) {
        self.theme = theme;
    }

    /// Switch keyboard style, taking that style's fonts and callout metrics.
    /// Colors and keyboard bounds are kept.
    pub fn set_style(&mut self, style: ButtonStyle) -> Result<(), ButtonError> {
        self.ensure_idle()?;
        let mut metrics = CalloutMetrics::for_style(style);
        metrics.keyboard_bounds = self.metrics.keyboard_bounds;
        self.style = style;
        self.metrics = metrics;
        self.theme.fonts = FontSizes::for_style(style);
        Ok(())
    }

    // Collaborators

    /// Attach the text target. The button keeps only a weak reference.
    pub fn set_key_input<T: KeyInput + 'static>(&mut self, input: &Rc<RefCell<T>>) {
        self.dispatcher.set_key_input(input);
    }

    pub fn clear_key_input(&mut self) {
        self.dispatcher.clear_key_input();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ButtonEvent) + 'static) -> SubscriptionId {
        self.dispatcher.emitter().subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.emitter().unsubscribe(id)
    }

    pub fn events(&mut self) -> &mut EventEmitter {
        self.dispatcher.emitter()
    }

    // Interaction

    /// Feed a pointer event and dispatch whatever it decides
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Vec<GestureDecision> {
        let ctx = context(&self.config, self.frame, &self.metrics);
        let decisions = self.machine.handle(event, &ctx);
        self.dispatch(&decisions);
        decisions
    }

    /// Fire the long-press timer if it is due
    pub fn poll(&mut self, now: Instant) -> Vec<GestureDecision> {
        let ctx = context(&self.config, self.frame, &self.metrics);
        let decisions = self.machine.poll(now, &ctx);
        self.dispatch(&decisions);
        decisions
    }

    /// Fire a long-press timer scheduled by the host
    pub fn fire_long_press(&mut self, timer: LongPressTimer) -> Vec<GestureDecision> {
        let ctx = context(&self.config, self.frame, &self.metrics);
        let decisions = self.machine.fire_long_press(timer, &ctx);
        self.dispatch(&decisions);
        decisions
    }

    fn dispatch(&mut self, decisions: &[GestureDecision]) {
        for decision in decisions {
            match *decision {
                GestureDecision::OptionsShown => self.dispatcher.options_shown(),
                GestureDecision::OptionsHidden => self.dispatcher.options_hidden(),
                GestureDecision::Commit(value) => {
                    if let Some(text) = self.config.commit_text(value) {
                        self.dispatcher.commit(text);
                    }
                }
                GestureDecision::OptionChanged(_)
                | GestureDecision::Cancelled
                | GestureDecision::Redraw => {}
            }
        }
    }

    /// Drawing instructions for the current state
    pub fn scene(&self) -> VectorScene {
        let request = SceneRequest {
            key_frame: self.frame,
            callout: self.machine.callout(),
            active_option: self.machine.active_option(),
            pressed: self.machine.is_tracking(),
            corner_radius: self.metrics.corner_radius,
            labels: KeyLabels {
                primary: self.config.label(),
                alternate: self.config.alternate_input.as_deref(),
                options: self.config.option_labels(),
                trackpad: self.config.trackpad_mode,
            },
            theme: &self.theme,
        };
        shape::render(&request)
    }
}

fn context<'a>(config: &KeyConfig, frame: Rect, metrics: &'a CalloutMetrics) -> GestureContext<'a> {
    GestureContext {
        frame,
        position: config.position,
        option_count: config.input_options.len(),
        narrow_width: config.narrow_option_width,
        has_alternate: config.has_alternate(),
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Field {
        focused: bool,
        text: String,
    }

    impl KeyInput for Field {
        fn is_focused(&self) -> bool {
            self.focused
        }

        fn insert_text(&mut self, text: &str) {
            self.text.push_str(text);
        }
    }

    fn e_key() -> KeyboardButton {
        let mut button = KeyboardButton::new(ButtonId(1), "e");
        button
            .configure(KeyConfig {
                input: "e".into(),
                alternate_input: Some("é".into()),
                input_options: vec!["è".into(), "ê".into(), "ë".into()],
                ..KeyConfig::default()
            })
            .expect("idle");
        button.set_frame(Rect::new(100.0, 200.0, 30.0, 42.0)).expect("idle");
        button
    }

    #[test]
    fn option_labels_use_matching_display_names() {
        let mut config = KeyConfig::new("a");
        config.input_options = vec!["à".into(), "á".into()];
        config.input_option_display_names = Some(vec!["grave".into(), "acute".into()]);
        assert_eq!(config.option_labels(), vec!["grave", "acute"]);
    }

    #[test]
    fn mismatched_display_names_fall_back_to_options() {
        let mut config = KeyConfig::new("a");
        config.input_options = vec!["à".into(), "á".into()];
        config.input_option_display_names = Some(vec!["grave".into()]);
        assert!(!config.display_names_match());
        assert_eq!(config.option_labels(), vec!["à", "á"]);

        let mut button = KeyboardButton::new(ButtonId(1), "a");
        assert!(button.configure(config).is_ok());
    }

    #[test]
    fn display_text_overrides_label_only() {
        let mut button = KeyboardButton::new(ButtonId(1), "x");
        button
            .set_input_with_text("\n", Some("return".into()))
            .expect("idle");
        assert_eq!(button.config().label(), "return");
        assert_eq!(button.config().commit_text(CommitValue::Primary), Some("\n"));
    }

    #[test]
    fn alternate_commit_falls_back_to_primary() {
        let config = KeyConfig::new("q");
        assert_eq!(config.commit_text(CommitValue::Alternate), Some("q"));
        assert_eq!(config.commit_text(CommitValue::Option(0)), None);
    }

    #[test]
    fn reconfiguring_mid_gesture_is_rejected() {
        let mut button = e_key();
        let t0 = Instant::now();
        button.handle_pointer(&PointerEvent::down(button.frame().center(), t0));

        let err = button.set_input("f").expect_err("busy");
        assert_eq!(err, ButtonError::GestureInProgress(ButtonId(1)));
        assert_eq!(button.config().input, "e");
        assert!(button.set_position(ButtonPosition::Left).is_err());

        button.handle_pointer(&PointerEvent::up(
            button.frame().center(),
            t0 + Duration::from_millis(50),
        ));
        assert!(button.set_input("f").is_ok());
    }

    #[test]
    fn tap_inserts_into_focused_field() {
        let field = Rc::new(RefCell::new(Field {
            focused: true,
            text: String::new(),
        }));
        let mut button = e_key();
        button.set_key_input(&field);
        let t0 = Instant::now();
        let center = button.frame().center();

        button.handle_pointer(&PointerEvent::down(center, t0));
        button.handle_pointer(&PointerEvent::up(center, t0 + Duration::from_millis(40)));
        assert_eq!(field.borrow().text, "e");
    }

    #[test]
    fn long_press_via_host_timer() {
        let field = Rc::new(RefCell::new(Field {
            focused: true,
            text: String::new(),
        }));
        let mut button = e_key();
        button.set_key_input(&field);
        let t0 = Instant::now();
        let center = button.frame().center();

        button.handle_pointer(&PointerEvent::down(center, t0));
        let timer = button.pending_long_press().expect("timer");
        assert_eq!(timer.deadline, t0 + Duration::from_millis(300));
        button.fire_long_press(timer);
        assert_eq!(button.state(), GestureState::OptionsShown);

        button.handle_pointer(&PointerEvent::up(center, t0 + Duration::from_millis(400)));
        assert_eq!(field.borrow().text, "ê");
    }

    #[test]
    fn layout_derives_position() {
        let mut button = KeyboardButton::new(ButtonId(1), "q");
        let row = Rect::new(0.0, 0.0, 320.0, 50.0);
        button.layout(Rect::new(2.0, 4.0, 28.0, 42.0), row).expect("idle");
        assert_eq!(button.position(), ButtonPosition::Left);
        button.layout(Rect::new(290.0, 4.0, 28.0, 42.0), row).expect("idle");
        assert_eq!(button.position(), ButtonPosition::Right);
    }

    #[test]
    fn scene_tracks_press_state() {
        let mut button = e_key();
        let idle = button.scene();
        let t0 = Instant::now();
        button.handle_pointer(&PointerEvent::down(button.frame().center(), t0));
        let pressed = button.scene();
        assert_ne!(idle, pressed);

        button.poll(t0 + Duration::from_millis(300));
        let callout = button.scene();
        assert_eq!(callout.shapes().count(), 2);
        // Rendering is repeatable
        assert_eq!(callout, button.scene());
    }

    #[test]
    fn tablet_style_swaps_fonts_and_metrics() {
        let mut button = e_key();
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let mut metrics = CalloutMetrics::phone();
        metrics.keyboard_bounds = Some(bounds);
        button.set_metrics(metrics).expect("idle");
        let key_color = button.theme().key_color;

        button.set_style(ButtonStyle::Tablet).expect("idle");
        assert_eq!(button.style(), ButtonStyle::Tablet);
        assert_eq!(button.theme().fonts, FontSizes::for_style(ButtonStyle::Tablet));
        assert_eq!(button.theme().key_color, key_color);
        assert_eq!(
            button.metrics().corner_radius,
            CalloutMetrics::tablet().corner_radius
        );
        assert_eq!(
            button.metrics().option_width,
            CalloutMetrics::tablet().option_width
        );
        assert_eq!(button.metrics().keyboard_bounds, Some(bounds));
    }

    #[test]
    fn style_change_refused_mid_gesture() {
        let mut button = e_key();
        button.handle_pointer(&PointerEvent::down(button.frame().center(), Instant::now()));
        assert!(button.set_style(ButtonStyle::Tablet).is_err());
        assert_eq!(button.style(), ButtonStyle::Phone);
    }

    #[test]
    fn huge_long_press_delay_does_not_panic() {
        let mut button = e_key();
        button
            .set_gesture_settings(GestureSettings {
                long_press_delay: Duration::MAX,
                ..GestureSettings::default()
            })
            .expect("idle");
        let t0 = Instant::now();
        let center = button.frame().center();

        button.handle_pointer(&PointerEvent::down(center, t0));
        assert!(button.pending_long_press().is_none());
        button.handle_pointer(&PointerEvent::up(center, t0 + Duration::from_millis(900)));
        assert_eq!(button.state(), GestureState::Idle);
    }

    #[test]
    fn press_region_excludes_down_swipe_extension() {
        let button = e_key();
        let below = Point::new(button.frame().center().x, button.frame().max_y() + 5.0);
        assert!(!button.press_region().contains(below));
        assert!(button.press_region().contains(button.frame().center()));
    }

    #[test]
    fn trackpad_mode_button_has_no_text() {
        let mut button = e_key();
        button.enable_trackpad_mode(true).expect("idle");
        assert_eq!(button.scene().texts().count(), 0);
    }
}
