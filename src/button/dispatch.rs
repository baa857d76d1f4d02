//! Commit dispatch and button events

use log::{debug, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc;

/// Identity of a keyboard button, carried by every event it emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(pub u32);

/// Text target that committed keys are inserted into
pub trait KeyInput {
    /// Whether this target currently has input focus
    fn is_focused(&self) -> bool;

    /// Insert text at the target's insertion point
    fn insert_text(&mut self, text: &str);
}

/// Kind of button event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEventKind {
    /// A key was committed. `inserted` is false when no focused text target took it.
    KeyPressed { text: String, inserted: bool },
    OptionsShown,
    OptionsHidden,
}

/// An event raised by a keyboard button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub kind: ButtonEventKind,
}

/// Handle returned by [`EventEmitter::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ButtonEvent)>;

/// Per-button list of event listeners, called in subscription order
#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ButtonEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Forward every event into a channel. The listener stays registered
    /// after the receiver is dropped but sends nothing.
    pub fn subscribe_channel(&mut self, sender: mpsc::Sender<ButtonEvent>) -> SubscriptionId {
        self.subscribe(move |event| {
            let _ = sender.send(event.clone());
        })
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self, event: &ButtonEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}

/// Result of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Whether the text reached a focused input target
    pub inserted: bool,
}

/// Inserts committed text and raises button events
#[derive(Debug)]
pub struct Dispatcher {
    button: ButtonId,
    key_input: Option<Weak<RefCell<dyn KeyInput>>>,
    emitter: EventEmitter,
}

impl Dispatcher {
    pub fn new(button: ButtonId) -> Self {
        Self {
            button,
            key_input: None,
            emitter: EventEmitter::new(),
        }
    }

    pub fn button(&self) -> ButtonId {
        self.button
    }

    /// Attach the text target. Only a weak reference is kept.
    pub fn set_key_input<T: KeyInput + 'static>(&mut self, input: &Rc<RefCell<T>>) {
        let input: Rc<RefCell<dyn KeyInput>> = input.clone();
        self.key_input = Some(Rc::downgrade(&input));
    }

    pub fn clear_key_input(&mut self) {
        self.key_input = None;
    }

    pub fn has_key_input(&self) -> bool {
        self.key_input
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    pub fn emitter(&mut self) -> &mut EventEmitter {
        &mut self.emitter
    }

    /// Insert `text` into the focused target, then raise key-pressed.
    ///
    /// A missing, dropped, busy, or unfocused target drops the text silently.
    /// The key-pressed event is raised either way.
    pub fn commit(&mut self, text: &str) -> CommitOutcome {
        let inserted = match self.key_input.as_ref().and_then(Weak::upgrade) {
            Some(input) => insert_into(&input, text),
            None => false,
        };

        self.emit(ButtonEventKind::KeyPressed {
            text: text.to_string(),
            inserted,
        });
        CommitOutcome { inserted }
    }

    pub fn options_shown(&mut self) {
        self.emit(ButtonEventKind::OptionsShown);
    }

    pub fn options_hidden(&mut self) {
        self.emit(ButtonEventKind::OptionsHidden);
    }

    fn emit(&mut self, kind: ButtonEventKind) {
        let event = ButtonEvent {
            button: self.button,
            kind,
        };
        self.emitter.emit(&event);
    }
}

fn insert_into(input: &RefCell<dyn KeyInput>, text: &str) -> bool {
    let Ok(mut input) = input.try_borrow_mut() else {
        warn!("key input busy during commit, dropping {:?}", text);
        return false;
    };
    if !input.is_focused() {
        debug!("key input not focused, dropping {:?}", text);
        return false;
    }
    input.insert_text(text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TextField {
        focused: bool,
        text: String,
    }

    impl KeyInput for TextField {
        fn is_focused(&self) -> bool {
            self.focused
        }

        fn insert_text(&mut self, text: &str) {
            self.text.push_str(text);
        }
    }

    fn recorder(dispatcher: &mut Dispatcher) -> Rc<RefCell<Vec<ButtonEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        dispatcher
            .emitter()
            .subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn commit_inserts_into_focused_input() {
        let field = Rc::new(RefCell::new(TextField {
            focused: true,
            ..TextField::default()
        }));
        let mut dispatcher = Dispatcher::new(ButtonId(7));
        dispatcher.set_key_input(&field);
        let events = recorder(&mut dispatcher);

        let outcome = dispatcher.commit("é");
        assert!(outcome.inserted);
        assert_eq!(field.borrow().text, "é");
        assert_eq!(
            events.borrow().as_slice(),
            &[ButtonEvent {
                button: ButtonId(7),
                kind: ButtonEventKind::KeyPressed {
                    text: "é".into(),
                    inserted: true,
                },
            }]
        );
    }

    #[test]
    fn unfocused_input_drops_text_but_still_notifies() {
        let field = Rc::new(RefCell::new(TextField::default()));
        let mut dispatcher = Dispatcher::new(ButtonId(1));
        dispatcher.set_key_input(&field);
        let events = recorder(&mut dispatcher);

        let outcome = dispatcher.commit("a");
        assert!(!outcome.inserted);
        assert!(field.borrow().text.is_empty());
        assert_eq!(
            events.borrow()[0].kind,
            ButtonEventKind::KeyPressed {
                text: "a".into(),
                inserted: false,
            }
        );
    }

    #[test]
    fn dropped_input_is_not_resurrected() {
        let mut dispatcher = Dispatcher::new(ButtonId(1));
        {
            let field = Rc::new(RefCell::new(TextField {
                focused: true,
                ..TextField::default()
            }));
            dispatcher.set_key_input(&field);
            assert!(dispatcher.has_key_input());
        }
        assert!(!dispatcher.has_key_input());
        assert!(!dispatcher.commit("a").inserted);
    }

    #[test]
    fn busy_input_is_treated_as_unfocused() {
        let field = Rc::new(RefCell::new(TextField {
            focused: true,
            ..TextField::default()
        }));
        let mut dispatcher = Dispatcher::new(ButtonId(1));
        dispatcher.set_key_input(&field);

        let events = recorder(&mut dispatcher);

        let _guard = field.borrow_mut();
        assert!(!dispatcher.commit("a").inserted);
        assert!(matches!(
            events.borrow()[0].kind,
            ButtonEventKind::KeyPressed { inserted: false, .. }
        ));
    }

    #[test]
    fn no_input_commit_still_notifies() {
        let mut dispatcher = Dispatcher::new(ButtonId(3));
        let events = recorder(&mut dispatcher);
        assert!(!dispatcher.commit("x").inserted);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn options_events_carry_button_only() {
        let mut dispatcher = Dispatcher::new(ButtonId(2));
        let events = recorder(&mut dispatcher);
        dispatcher.options_shown();
        dispatcher.options_hidden();
        let kinds: Vec<_> = events.borrow().iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![ButtonEventKind::OptionsShown, ButtonEventKind::OptionsHidden]
        );
        assert!(events.borrow().iter().all(|e| e.button == ButtonId(2)));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut emitter = EventEmitter::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = emitter.subscribe(move |_| *sink.borrow_mut() += 1);
        let event = ButtonEvent {
            button: ButtonId(0),
            kind: ButtonEventKind::OptionsShown,
        };

        emitter.emit(&event);
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        emitter.emit(&event);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn channel_subscription_forwards_events() {
        let mut dispatcher = Dispatcher::new(ButtonId(4));
        let (tx, rx) = mpsc::channel();
        dispatcher.emitter().subscribe_channel(tx);
        dispatcher.commit("q");
        let event = rx.try_recv().expect("event");
        assert_eq!(
            event.kind,
            ButtonEventKind::KeyPressed {
                text: "q".into(),
                inserted: false,
            }
        );
    }
}
