use std::fmt;

use hecs::Entity;

use crate::source::Source;

/// Raised after an object's world matrix changed and everything derived from it is up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChanged {
    pub entity: Entity,
    pub source: Option<Source>,
}

pub type Observer = Box<dyn Fn(&PositionChanged) + Send + Sync>;

/// Handle returned by [`PositionObservers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Callback,
    Subscriber(ObserverId),
}

/// Everyone interested in an object's position changes.
///
/// There is a single ordered list: the callback, if set, always runs first, followed by
/// subscribers in the order they subscribed.
#[derive(Default)]
pub struct PositionObservers {
    observers: Vec<(Slot, Observer)>,
    next_id: u64,
}

impl PositionObservers {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the callback, replacing any previous one.
    pub fn set_callback(&mut self, callback: impl Fn(&PositionChanged) + Send + Sync + 'static) {
        let callback: Observer = Box::new(callback);
        if self.has_callback() {
            self.observers[0].1 = callback;
        } else {
            self.observers.insert(0, (Slot::Callback, callback));
        }
    }

    pub fn has_callback(&self) -> bool {
        matches!(self.observers.first(), Some((Slot::Callback, _)))
    }

    pub fn clear_callback(&mut self) {
        if self.has_callback() {
            self.observers.remove(0);
        }
    }

    pub fn subscribe(
        &mut self,
        observer: impl Fn(&PositionChanged) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.observers
            .push((Slot::Subscriber(id), Box::new(observer)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers
            .retain(|(slot, _)| *slot != Slot::Subscriber(id));
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn notify(&self, event: &PositionChanged) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }
}

impl fmt::Debug for PositionObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|(slot, _)| slot))
            .finish()
    }
}
