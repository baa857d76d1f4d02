//! Main application state and logic

use crate::button::{
    ButtonEvent, ButtonEventKind, ButtonId, ButtonTheme, GestureDecision, GestureState, KeyConfig,
    KeyInput, KeyboardButton, Point, PointerEvent, Rect,
};
use crate::config::Config;
use crate::report::{SessionLog, SessionReport};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Width of one key in cells
pub const KEY_WIDTH: u16 = 5;
/// Height of one key in cells
pub const KEY_HEIGHT: u16 = 3;
/// Gap between neighbouring keys
pub const KEY_GAP: u16 = 1;

/// Application running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Quitting => "QUITTING",
        }
    }
}

/// Mouse input, already reduced to the primary button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Drag,
    Release,
}

/// Text field the keys type into
#[derive(Debug, Default)]
pub struct TextDocument {
    pub focused: bool,
    pub text: String,
}

impl KeyInput for TextDocument {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn insert_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

/// Demo row: input, alternate, options, option display names
type KeySpec = (
    &'static str,
    Option<&'static str>,
    &'static [&'static str],
    Option<&'static [&'static str]>,
);

const DEMO_ROW: &[KeySpec] = &[
    ("q", Some("1"), &[], None),
    ("e", Some("é"), &["è", "ê", "ë"], None),
    ("a", Some("à"), &["á", "â", "ä", "æ", "ã"], None),
    ("n", None, &["ñ", "ń"], None),
    ("c", Some("ç"), &["ć", "č"], Some(&["c'", "cv"])),
    ("o", Some("ö"), &["ò", "ó", "ô", "õ", "ø"], None),
    ("u", Some("ü"), &["ù", "ú", "û"], None),
];

/// Main application
pub struct App {
    /// Application state
    pub state: AppState,
    /// Configuration
    pub config: Config,
    /// Whether the help panel replaces the commit log
    pub show_help: bool,
    /// Application start time
    pub start_time: Instant,
    /// Pointer events routed to a key
    pub total_events: u64,
    /// Last status message
    pub status_message: Option<String>,
    /// Status message timestamp
    pub status_time: Option<Instant>,
    buttons: Vec<KeyboardButton>,
    document: Rc<RefCell<TextDocument>>,
    events: mpsc::Receiver<ButtonEvent>,
    log: SessionLog,
    /// Index of the key that owns the pointer
    captured: Option<usize>,
    narrow: bool,
    trackpad: bool,
    area: Option<Rect>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let document = Rc::new(RefCell::new(TextDocument {
            focused: true,
            text: String::new(),
        }));
        let (tx, events) = mpsc::channel();

        let buttons = DEMO_ROW
            .iter()
            .enumerate()
            .map(|(i, (input, alternate, options, names))| {
                let mut button = KeyboardButton::from_config(ButtonId(i as u32 + 1), *input, &config);
                let key = KeyConfig {
                    input: input.to_string(),
                    alternate_input: alternate.map(str::to_string),
                    input_options: options.iter().map(|s| s.to_string()).collect(),
                    input_option_display_names: names
                        .map(|names| names.iter().map(|s| s.to_string()).collect()),
                    ..KeyConfig::default()
                };
                if let Err(e) = button.configure(key) {
                    warn!("demo key {}: {}", input, e);
                }
                button.set_key_input(&document);
                button.events().subscribe_channel(tx.clone());
                button
            })
            .collect();

        let mut app = Self {
            state: AppState::Running,
            config,
            show_help: false,
            start_time: Instant::now(),
            total_events: 0,
            status_message: None,
            status_time: None,
            buttons,
            document,
            events,
            log: SessionLog::new(),
            captured: None,
            narrow: false,
            trackpad: false,
            area: None,
        };
        app.push_return_key(tx);
        app
    }

    fn push_return_key(&mut self, tx: mpsc::Sender<ButtonEvent>) {
        let id = ButtonId(self.buttons.len() as u32 + 1);
        let mut button = KeyboardButton::from_config(id, "\n", &self.config);
        if let Err(e) = button.set_input_with_text("\n", Some("ret".to_string())) {
            warn!("return key: {}", e);
        }
        button.set_key_input(&self.document);
        button.events().subscribe_channel(tx);
        self.buttons.push(button);
    }

    pub fn buttons(&self) -> &[KeyboardButton] {
        &self.buttons
    }

    pub fn document(&self) -> std::cell::Ref<'_, TextDocument> {
        self.document.borrow()
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Width in cells of the key row
    pub fn row_width(&self) -> u16 {
        let count = self.buttons.len() as u16;
        count * (KEY_WIDTH + KEY_GAP) - KEY_GAP
    }

    /// Lay the key row out inside `tray`, centered horizontally.
    ///
    /// Skipped while a touch is in progress so the callout does not move
    /// under the pointer.
    pub fn layout(&mut self, tray: Rect) {
        if self.area == Some(tray) || self.captured.is_some() {
            return;
        }
        let row_width = self.row_width() as f32;
        let x0 = (tray.x + ((tray.width - row_width) / 2.0).max(0.0)).floor();
        let y0 = (tray.max_y() - KEY_HEIGHT as f32).floor();
        let row = Rect::new(x0, y0, row_width, KEY_HEIGHT as f32);

        let mut metrics = self.config.callout;
        metrics.keyboard_bounds = Some(tray);

        for (i, button) in self.buttons.iter_mut().enumerate() {
            let x = x0 + (i as u16 * (KEY_WIDTH + KEY_GAP)) as f32;
            let frame = Rect::new(x, y0, KEY_WIDTH as f32, KEY_HEIGHT as f32);
            let placed = button
                .set_metrics(metrics)
                .and_then(|_| button.layout(frame, row));
            if let Err(e) = placed {
                warn!("layout: {}", e);
            }
        }
        debug!("laid out {} keys in {:?}", self.buttons.len(), row);
        self.area = Some(tray);
    }

    /// Route a mouse event at a terminal cell to the keys
    pub fn handle_mouse(&mut self, action: PointerAction, column: u16, row: u16, now: Instant) {
        if self.state != AppState::Running {
            return;
        }
        self.tick(now);
        let point = Point::new(column as f32 + 0.5, row as f32 + 0.5);

        let target = match action {
            PointerAction::Press => {
                if let Some(stale) = self.captured.take() {
                    // A release was lost; end that touch first
                    self.send(stale, &PointerEvent::cancel(point, now));
                }
                let hit = self
                    .buttons
                    .iter()
                    .position(|b| b.press_region().contains(point));
                self.captured = hit;
                hit.map(|i| (i, PointerEvent::down(point, now)))
            }
            PointerAction::Drag => self.captured.map(|i| (i, PointerEvent::moved(point, now))),
            PointerAction::Release => self
                .captured
                .take()
                .map(|i| (i, PointerEvent::up(point, now))),
        };

        if let Some((index, event)) = target {
            self.total_events += 1;
            self.send(index, &event);
        }
    }

    /// Cancel the active touch, as when the host loses the pointer
    pub fn cancel_touch(&mut self, now: Instant) {
        if let Some(index) = self.captured.take() {
            let point = self.buttons[index].frame().center();
            self.send(index, &PointerEvent::cancel(point, now));
        }
    }

    /// Fire due long-press timers and collect button events
    pub fn tick(&mut self, now: Instant) {
        for index in 0..self.buttons.len() {
            let decisions = self.buttons[index].poll(now);
            self.after_decisions(index, &decisions);
        }
        self.drain_events();
    }

    fn send(&mut self, index: usize, event: &PointerEvent) {
        let decisions = self.buttons[index].handle_pointer(event);
        self.after_decisions(index, &decisions);
        self.drain_events();
    }

    fn after_decisions(&mut self, index: usize, decisions: &[GestureDecision]) {
        if decisions.contains(&GestureDecision::Cancelled) {
            self.log.record_cancel();
            self.set_status("Touch cancelled".to_string());
        }
        if self.captured == Some(index) && !self.buttons[index].is_tracking() {
            self.captured = None;
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.log.record_event(&event);
            if let ButtonEventKind::KeyPressed { text, inserted } = &event.kind {
                let message = if *inserted {
                    format!("Typed {:?}", text)
                } else {
                    format!("Dropped {:?} (no focused text)", text)
                };
                self.set_status(message);
            }
        }
    }

    /// Earliest pending long-press deadline, so the host can wake in time
    pub fn next_deadline(&self) -> Option<Instant> {
        self.buttons
            .iter()
            .filter_map(|b| b.pending_long_press())
            .map(|timer| timer.deadline)
            .min()
    }

    /// Keys in drawing order, the touched key last so its callout is on top
    pub fn draw_order(&self) -> impl Iterator<Item = &KeyboardButton> {
        let captured = self.captured;
        self.buttons
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != captured)
            .chain(captured.and_then(|i| self.buttons.get(i).map(|b| (i, b))))
            .map(|(_, b)| b)
    }

    /// State of the key being touched, or idle
    pub fn gesture_state(&self) -> GestureState {
        self.captured
            .map(|i| self.buttons[i].state())
            .unwrap_or(GestureState::Idle)
    }

    pub fn toggle_focus(&mut self) {
        let focused = {
            let mut document = self.document.borrow_mut();
            document.focused = !document.focused;
            document.focused
        };
        self.set_status(if focused { "Text focused" } else { "Text unfocused" }.to_string());
    }

    pub fn clear_text(&mut self) {
        self.document.borrow_mut().text.clear();
        self.set_status("Text cleared".to_string());
    }

    pub fn toggle_narrow(&mut self) {
        let narrow = !self.narrow;
        if self.update_buttons(|b| b.set_narrow_option_width(narrow)) {
            self.narrow = narrow;
            self.set_status(format!("Narrow options: {}", if narrow { "on" } else { "off" }));
        }
    }

    pub fn toggle_trackpad(&mut self) {
        let trackpad = !self.trackpad;
        if self.update_buttons(|b| b.enable_trackpad_mode(trackpad)) {
            self.trackpad = trackpad;
            self.set_status(format!("Trackpad mode: {}", if trackpad { "on" } else { "off" }));
        }
    }

    pub fn toggle_theme(&mut self) {
        self.config.ui.theme = self.config.ui.theme.toggled();
        let theme = ButtonTheme::for_style(self.config.style, self.config.ui.theme);
        for button in &mut self.buttons {
            button.set_theme(theme);
        }
        self.set_status(format!("Theme: {:?}", self.config.ui.theme));
    }

    /// Apply a setter to every key, refusing while a touch is in progress
    fn update_buttons(
        &mut self,
        mut change: impl FnMut(&mut KeyboardButton) -> Result<(), crate::button::ButtonError>,
    ) -> bool {
        if self.captured.is_some() {
            self.set_status("Finish the touch first".to_string());
            return false;
        }
        for button in &mut self.buttons {
            if let Err(e) = change(button) {
                warn!("{}", e);
                return false;
            }
        }
        true
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Set a status message
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_time = Some(Instant::now());
    }

    /// Get status message if still valid
    pub fn get_status(&self) -> Option<&str> {
        let lifetime = Duration::from_secs(self.config.ui.status_duration_secs as u64);
        match (&self.status_message, self.status_time) {
            (Some(msg), Some(time)) if time.elapsed() < lifetime => Some(msg),
            _ => None,
        }
    }

    /// Get elapsed time formatted
    pub fn elapsed_formatted(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{:02}:{:02}", mins, secs)
    }

    /// Generate a session report
    pub fn generate_report(&self) -> SessionReport {
        SessionReport::new(self.start_time, &self.log)
    }

    /// Export session report to JSON file
    pub fn export_report(&mut self, filename: &str) -> Result<String, std::io::Error> {
        let report = self.generate_report();
        let path = Path::new(filename);
        report.export_json(path)?;
        info!("exported report to {}", filename);
        let msg = format!("Exported to {}", filename);
        self.set_status(msg.clone());
        Ok(msg)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (App, Instant) {
        let mut app = App::default();
        app.layout(Rect::new(0.0, 0.0, 80.0, 12.0));
        (app, Instant::now())
    }

    fn key_cell(app: &App, index: usize) -> (u16, u16) {
        let center = app.buttons()[index].frame().center();
        (center.x as u16, center.y as u16)
    }

    #[test]
    fn layout_places_keys_on_bottom_row() {
        let (app, _) = app();
        let first = app.buttons()[0].frame();
        assert_eq!(first.max_y(), 12.0);
        assert_eq!(first.width, KEY_WIDTH as f32);
        let last = app.buttons().last().map(|b| b.frame()).expect("keys");
        assert_eq!(last.max_x() - first.min_x(), app.row_width() as f32);
    }

    #[test]
    fn click_types_key() {
        let (mut app, t0) = app();
        let (x, y) = key_cell(&app, 0);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        assert_eq!(app.gesture_state(), GestureState::PressStarted);
        app.handle_mouse(PointerAction::Release, x, y, t0 + Duration::from_millis(50));

        assert_eq!(app.document().text, "q");
        assert_eq!(app.gesture_state(), GestureState::Idle);
        assert_eq!(app.log().commits().len(), 1);
        assert_eq!(app.get_status(), Some("Typed \"q\""));
    }

    #[test]
    fn hold_and_drag_types_option() {
        let (mut app, t0) = app();
        let (x, y) = key_cell(&app, 1);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        app.tick(t0 + Duration::from_millis(310));
        assert_eq!(app.gesture_state(), GestureState::OptionsShown);

        let last = app.buttons()[1]
            .callout()
            .and_then(|c| c.cells.last().copied())
            .expect("callout");
        let (cx, cy) = (last.center().x as u16, last.center().y as u16);
        app.handle_mouse(PointerAction::Drag, cx, cy, t0 + Duration::from_millis(350));
        app.handle_mouse(PointerAction::Release, cx, cy, t0 + Duration::from_millis(400));

        assert_eq!(app.document().text, "ë");
    }

    #[test]
    fn unfocused_text_drops_commit() {
        let (mut app, t0) = app();
        app.toggle_focus();
        let (x, y) = key_cell(&app, 0);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        app.handle_mouse(PointerAction::Release, x, y, t0 + Duration::from_millis(30));

        assert!(app.document().text.is_empty());
        assert!(!app.log().commits()[0].inserted);
    }

    #[test]
    fn return_key_inserts_newline() {
        let (mut app, t0) = app();
        let index = app.buttons().len() - 1;
        assert_eq!(app.buttons()[index].config().label(), "ret");
        let (x, y) = key_cell(&app, index);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        app.handle_mouse(PointerAction::Release, x, y, t0 + Duration::from_millis(30));
        assert_eq!(app.document().text, "\n");
    }

    #[test]
    fn cancel_touch_records_cancellation() {
        let (mut app, t0) = app();
        let (x, y) = key_cell(&app, 2);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        app.cancel_touch(t0 + Duration::from_millis(20));

        assert_eq!(app.log().cancellations(), 1);
        assert!(app.document().text.is_empty());
        assert_eq!(app.gesture_state(), GestureState::Idle);
    }

    #[test]
    fn press_outside_keys_is_ignored() {
        let (mut app, t0) = app();
        app.handle_mouse(PointerAction::Press, 0, 0, t0);
        app.handle_mouse(PointerAction::Release, 0, 0, t0);
        assert_eq!(app.total_events, 0);
    }

    #[test]
    fn toggles_refuse_mid_touch() {
        let (mut app, t0) = app();
        let (x, y) = key_cell(&app, 0);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        app.toggle_narrow();
        assert!(!app.buttons()[0].config().narrow_option_width);

        app.handle_mouse(PointerAction::Release, x, y, t0 + Duration::from_millis(30));
        app.toggle_narrow();
        assert!(app.buttons().iter().all(|b| b.config().narrow_option_width));
    }

    #[test]
    fn next_deadline_follows_pending_press() {
        let (mut app, t0) = app();
        assert!(app.next_deadline().is_none());
        let (x, y) = key_cell(&app, 1);
        app.handle_mouse(PointerAction::Press, x, y, t0);
        assert_eq!(app.next_deadline(), Some(t0 + Duration::from_millis(300)));

        let order: Vec<ButtonId> = app.draw_order().map(|b| b.id()).collect();
        assert_eq!(order.last(), Some(&app.buttons()[1].id()));
        assert_eq!(order.len(), app.buttons().len());
    }

    #[test]
    fn trackpad_mode_hides_labels() {
        let (mut app, _) = app();
        app.toggle_trackpad();
        assert!(app.buttons().iter().all(|b| b.scene().texts().count() == 0));
    }

    #[test]
    fn theme_toggle_restyles_keys() {
        let (mut app, _) = app();
        let before = app.buttons()[0].theme().key_color;
        app.toggle_theme();
        assert_ne!(app.buttons()[0].theme().key_color, before);
    }
}
