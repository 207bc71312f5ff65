// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Push-based sequences.
//!
//! An observer receives `on_next*` followed by at most one terminal call
//! (`on_error` or `on_completed`). Both observer flavours share one
//! transition table; the safe flavour also owns a subscription handle that
//! it disposes exactly once when it terminates, when its `on_next` delegate
//! fails, or when the caller cancels.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{Exception, Result};

// ── Disposable ──────────────────────────────────────────────────────

struct DisposableInner {
    disposed: Cell<bool>,
    action: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Cancellation handle. Clones share state; the action runs at most once.
#[derive(Clone)]
pub struct Disposable {
    inner: Rc<DisposableInner>,
}

impl Disposable {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self::from_action(Some(Box::new(action)))
    }

    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self::from_action(None)
    }

    fn from_action(action: Option<Box<dyn FnOnce()>>) -> Self {
        Self {
            inner: Rc::new(DisposableInner {
                disposed: Cell::new(false),
                action: RefCell::new(action),
            }),
        }
    }

    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let action = self.inner.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ── Transition table ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Active,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Next,
    Error,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Deliver,
    DeliverAndTerminate,
    Ignore,
}

fn transition(state: ObserverState, signal: Signal) -> (ObserverState, Action) {
    use ObserverState::*;
    match (state, signal) {
        (Active, Signal::Next) => (Active, Action::Deliver),
        (Active, Signal::Error | Signal::Completed) => (Terminated, Action::DeliverAndTerminate),
        (Terminated, _) => (Terminated, Action::Ignore),
    }
}

// ── Observer ────────────────────────────────────────────────────────

type OnNext<T> = Box<dyn FnMut(&T) -> Result<()>>;
type OnError = Box<dyn FnMut(&Exception) -> Result<()>>;
type OnCompleted = Box<dyn FnMut() -> Result<()>>;

enum Flavour {
    /// Delegate-backed.
    Anonymous,
    /// Delegate-backed, releasing `handle` when the subscription ends.
    Safe { handle: Disposable },
}

pub struct Observer<T> {
    state: ObserverState,
    flavour: Flavour,
    on_next: OnNext<T>,
    on_error: OnError,
    on_completed: OnCompleted,
}

impl<T> Observer<T> {
    /// An anonymous observer. Errors are re-raised to the producer and
    /// completion is ignored until `with_error`/`with_completed` say
    /// otherwise.
    pub fn new(on_next: impl FnMut(&T) -> Result<()> + 'static) -> Self {
        Self {
            state: ObserverState::Active,
            flavour: Flavour::Anonymous,
            on_next: Box::new(on_next),
            on_error: Box::new(|error: &Exception| Err(error.clone())),
            on_completed: Box::new(|| Ok(())),
        }
    }

    pub fn with_error(mut self, on_error: impl FnMut(&Exception) -> Result<()> + 'static) -> Self {
        self.on_error = Box::new(on_error);
        self
    }

    pub fn with_completed(mut self, on_completed: impl FnMut() -> Result<()> + 'static) -> Self {
        self.on_completed = Box::new(on_completed);
        self
    }

    /// The same delegates, now tied to `handle`.
    pub fn make_safe(self, handle: Disposable) -> Self {
        Self {
            flavour: Flavour::Safe { handle },
            ..self
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    pub fn is_safe(&self) -> bool {
        matches!(self.flavour, Flavour::Safe { .. })
    }

    fn step(&mut self, signal: Signal) -> Action {
        let (next, action) = transition(self.state, signal);
        self.state = next;
        action
    }

    pub fn on_next(&mut self, value: &T) -> Result<()> {
        if self.step(Signal::Next) != Action::Deliver {
            return Ok(());
        }
        let result = (self.on_next)(value);
        if result.is_err() && self.is_safe() {
            self.state = ObserverState::Terminated;
            self.release();
        }
        result
    }

    pub fn on_error(&mut self, error: &Exception) -> Result<()> {
        if self.step(Signal::Error) != Action::DeliverAndTerminate {
            return Ok(());
        }
        tracing::trace!(%error, "observer terminated with error");
        let result = (self.on_error)(error);
        self.release();
        result
    }

    pub fn on_completed(&mut self) -> Result<()> {
        if self.step(Signal::Completed) != Action::DeliverAndTerminate {
            return Ok(());
        }
        tracing::trace!("observer completed");
        let result = (self.on_completed)();
        self.release();
        result
    }

    /// Cancel from outside: no further deliveries, handle released.
    pub fn dispose(&mut self) {
        self.state = ObserverState::Terminated;
        self.release();
    }

    fn release(&self) {
        if let Flavour::Safe { handle } = &self.flavour {
            handle.dispose();
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("state", &self.state)
            .field("safe", &self.is_safe())
            .finish()
    }
}

// ── Subject ─────────────────────────────────────────────────────────

enum Terminal {
    Error(Exception),
    Completed,
}

struct SubjectInner<T> {
    observers: IndexMap<u64, Rc<RefCell<Observer<T>>>>,
    next_id: u64,
    terminal: Option<Terminal>,
}

/// A hot sequence that is also an observer: whatever it is told, it tells
/// every current subscriber.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T: 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                observers: IndexMap::new(),
                next_id: 0,
                terminal: None,
            })),
        }
    }

    /// Subscribe `observer`. Disposing the returned handle stops future
    /// deliveries to it. Subscribing after termination replays the terminal
    /// call and returns an already disposed handle.
    pub fn subscribe(&self, observer: Observer<T>) -> Result<Disposable> {
        let replay = match &self.inner.borrow().terminal {
            Some(Terminal::Error(error)) => Some(Some(error.clone())),
            Some(Terminal::Completed) => Some(None),
            None => None,
        };
        if let Some(error) = replay {
            let mut observer = observer;
            let handle = Disposable::empty();
            handle.dispose();
            match error {
                Some(error) => observer.on_error(&error)?,
                None => observer.on_completed()?,
            }
            return Ok(handle);
        }

        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            id
        };
        let weak: Weak<RefCell<SubjectInner<T>>> = Rc::downgrade(&self.inner);
        let handle = Disposable::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().observers.shift_remove(&id);
            }
        });
        let observer = observer.make_safe(handle.clone());
        self.inner
            .borrow_mut()
            .observers
            .insert(id, Rc::new(RefCell::new(observer)));
        Ok(handle)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminal.is_some()
    }

    fn snapshot(&self) -> Vec<Rc<RefCell<Observer<T>>>> {
        self.inner.borrow().observers.values().cloned().collect()
    }

    /// Deliver to every subscriber in subscription order. The first
    /// subscriber error stops delivery and is returned.
    pub fn on_next(&self, value: &T) -> Result<()> {
        if self.is_terminated() {
            return Ok(());
        }
        for observer in self.snapshot() {
            deliver(&observer, |o| o.on_next(value))?;
        }
        Ok(())
    }

    pub fn on_error(&self, error: &Exception) -> Result<()> {
        if !self.terminate(Terminal::Error(error.clone())) {
            return Ok(());
        }
        for observer in self.drain() {
            deliver(&observer, |o| o.on_error(error))?;
        }
        Ok(())
    }

    pub fn on_completed(&self) -> Result<()> {
        if !self.terminate(Terminal::Completed) {
            return Ok(());
        }
        for observer in self.drain() {
            deliver(&observer, |o| o.on_completed())?;
        }
        Ok(())
    }

    fn terminate(&self, terminal: Terminal) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.terminal.is_some() {
            return false;
        }
        inner.terminal = Some(terminal);
        true
    }

    fn drain(&self) -> Vec<Rc<RefCell<Observer<T>>>> {
        let mut inner = self.inner.borrow_mut();
        std::mem::take(&mut inner.observers).into_values().collect()
    }
}

/// Run `signal` on `observer` unless it is already running a callback,
/// which happens when a subscriber calls back into its own subject. That
/// nested delivery is dropped.
fn deliver<T>(
    observer: &RefCell<Observer<T>>,
    signal: impl FnOnce(&mut Observer<T>) -> Result<()>,
) -> Result<()> {
    match observer.try_borrow_mut() {
        Ok(mut observer) => signal(&mut observer),
        Err(_) => {
            tracing::trace!("skipped re-entrant delivery");
            Ok(())
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Default)]
    struct Calls {
        next: Cell<u32>,
        error: Cell<u32>,
        completed: Cell<u32>,
    }

    fn counting(calls: &Rc<Calls>) -> Observer<i32> {
        let (n, e, c) = (calls.clone(), calls.clone(), calls.clone());
        Observer::new(move |_| {
            n.next.set(n.next.get() + 1);
            Ok(())
        })
        .with_error(move |_| {
            e.error.set(e.error.get() + 1);
            Ok(())
        })
        .with_completed(move || {
            c.completed.set(c.completed.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn calls_after_a_terminal_are_ignored() {
        let calls = Rc::new(Calls::default());
        let mut observer = counting(&calls);
        observer.on_next(&1).unwrap();
        observer.on_completed().unwrap();
        observer.on_next(&2).unwrap();
        observer.on_error(&Exception::user("late")).unwrap();
        observer.on_completed().unwrap();
        assert_eq!(calls.next.get(), 1);
        assert_eq!(calls.completed.get(), 1);
        assert_eq!(calls.error.get(), 0);
        assert_eq!(observer.state(), ObserverState::Terminated);
    }

    #[test]
    fn default_error_handler_rethrows_the_same_exception() {
        let mut observer: Observer<i32> = Observer::new(|_| Ok(()));
        let error = Exception::user("boom");
        let raised = observer.on_error(&error).unwrap_err();
        assert!(Exception::ptr_eq(&error, &raised));
        // Default completion is a no-op.
        let mut observer: Observer<i32> = Observer::new(|_| Ok(()));
        assert!(observer.on_completed().is_ok());
    }

    #[test]
    fn safe_observer_disposes_once_on_terminal() {
        let released = Rc::new(Cell::new(0));
        let counter = released.clone();
        let handle = Disposable::new(move || counter.set(counter.get() + 1));

        let calls = Rc::new(Calls::default());
        let mut observer = counting(&calls).make_safe(handle.clone());
        assert!(observer.is_safe());
        observer.on_error(&Exception::user("x")).unwrap();
        observer.on_completed().unwrap();
        observer.dispose();
        handle.dispose();
        assert!(handle.is_disposed());
        assert_eq!(released.get(), 1);
        assert_eq!(calls.error.get(), 1);
        assert_eq!(calls.completed.get(), 0);
    }

    #[test]
    fn safe_observer_disposes_on_cancel_without_terminal() {
        let handle = Disposable::empty();
        let mut observer = Observer::new(|_: &i32| Ok(())).make_safe(handle.clone());
        observer.dispose();
        assert!(handle.is_disposed());
        assert_eq!(observer.state(), ObserverState::Terminated);
    }

    #[test]
    fn failing_on_next_terminates_a_safe_observer() {
        let handle = Disposable::empty();
        let mut observer = Observer::new(|v: &i32| {
            if *v > 1 {
                Err(Exception::user("too big"))
            } else {
                Ok(())
            }
        })
        .make_safe(handle.clone());
        observer.on_next(&1).unwrap();
        assert!(observer.on_next(&2).is_err());
        assert!(handle.is_disposed());
        assert!(observer.on_next(&0).is_ok());
        assert_eq!(observer.state(), ObserverState::Terminated);
    }

    #[test]
    fn subject_fans_out_until_disposed() {
        let subject = Subject::new();
        let first = Rc::new(Calls::default());
        let second = Rc::new(Calls::default());
        let h1 = subject.subscribe(counting(&first)).unwrap();
        let _h2 = subject.subscribe(counting(&second)).unwrap();
        assert_eq!(subject.observer_count(), 2);

        subject.on_next(&1).unwrap();
        h1.dispose();
        assert_eq!(subject.observer_count(), 1);
        subject.on_next(&2).unwrap();
        subject.on_completed().unwrap();
        subject.on_next(&3).unwrap();

        assert_eq!(first.next.get(), 1);
        assert_eq!(first.completed.get(), 0);
        assert_eq!(second.next.get(), 2);
        assert_eq!(second.completed.get(), 1);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn late_subscriber_sees_the_terminal() {
        let subject: Subject<i32> = Subject::new();
        subject.on_error(&Exception::user("gone")).unwrap_or(());
        let calls = Rc::new(Calls::default());
        let handle = subject.subscribe(counting(&calls)).unwrap();
        assert!(handle.is_disposed());
        assert_eq!(calls.error.get(), 1);

        let rethrown = subject.subscribe(Observer::new(|_| Ok(()))).unwrap_err();
        assert!(matches!(rethrown.kind(), ErrorKind::User(_)));
    }

    #[test]
    fn subscriber_can_unsubscribe_itself_mid_delivery() {
        let subject = Subject::new();
        let slot: Rc<RefCell<Option<Disposable>>> = Rc::new(RefCell::new(None));
        let seen = Rc::new(Cell::new(0));
        let (slot_in, seen_in) = (slot.clone(), seen.clone());
        let handle = subject
            .subscribe(Observer::new(move |_: &i32| {
                seen_in.set(seen_in.get() + 1);
                if let Some(handle) = slot_in.borrow().as_ref() {
                    handle.dispose();
                }
                Ok(())
            }))
            .unwrap();
        *slot.borrow_mut() = Some(handle);

        subject.on_next(&1).unwrap();
        subject.on_next(&2).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn subscriber_can_complete_its_subject_mid_delivery() {
        let subject = Rc::new(Subject::new());
        let weak = Rc::downgrade(&subject);
        let closer = Rc::new(Calls::default());
        let (n, c) = (closer.clone(), closer.clone());
        subject
            .subscribe(
                Observer::new(move |_: &i32| {
                    n.next.set(n.next.get() + 1);
                    match weak.upgrade() {
                        Some(subject) => subject.on_completed(),
                        None => Ok(()),
                    }
                })
                .with_completed(move || {
                    c.completed.set(c.completed.get() + 1);
                    Ok(())
                }),
            )
            .unwrap();
        let other = Rc::new(Calls::default());
        subject.subscribe(counting(&other)).unwrap();

        subject.on_next(&1).unwrap();
        assert!(subject.is_terminated());
        assert_eq!(subject.observer_count(), 0);
        // The nested completion cannot reach the busy subscriber.
        assert_eq!(closer.next.get(), 1);
        assert_eq!(closer.completed.get(), 0);
        // The second subscriber was already completed when its turn came.
        assert_eq!(other.next.get(), 0);
        assert_eq!(other.completed.get(), 1);

        subject.on_next(&2).unwrap();
        assert_eq!(closer.next.get(), 1);
    }
}
