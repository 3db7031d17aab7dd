use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Handle returned by [`EventRegistry::on`], used to remove exactly that
/// registration later. Registering the same closure twice yields two
/// distinct handles, and both registrations fire per emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

/// Named-channel publish/subscribe over a single payload type.
///
/// All methods take `&self` so a registry can be shared via `Rc` and
/// mutated from inside callbacks; everything runs on one logical thread
/// of control. Callback panics are not caught here.
pub struct EventRegistry<T> {
    channels: RefCell<HashMap<String, Vec<(ListenerId, Listener<T>)>>>,
    next_id: Cell<u64>,
}

impl<T> EventRegistry<T> {
    pub fn new() -> Self {
        Self {
            channels: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Append `callback` to the channel's ordered list, creating the
    /// channel if absent. Invocation order is registration order.
    pub fn on(&self, event: &str, callback: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.channels
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push((id, Rc::new(RefCell::new(callback))));
        id
    }

    /// Remove the registration behind `listener`. No-op if it is not
    /// present on that channel.
    pub fn off(&self, event: &str, listener: ListenerId) {
        if let Some(listeners) = self.channels.borrow_mut().get_mut(event) {
            if let Some(pos) = listeners.iter().position(|(id, _)| *id == listener) {
                listeners.remove(pos);
            }
        }
    }

    /// Clear one channel entirely.
    pub fn off_event(&self, event: &str) {
        self.channels.borrow_mut().remove(event);
    }

    /// Clear every channel.
    pub fn off_all(&self) {
        self.channels.borrow_mut().clear();
    }

    /// Invoke every callback registered on `event`, in registration order,
    /// synchronously, with `payload`. Emitting on an empty channel is a
    /// no-op.
    ///
    /// Dispatch iterates a snapshot of the list taken at emission start:
    /// reentrant `on`/`off` calls from inside a callback never affect the
    /// emission already in progress.
    pub fn emit(&self, event: &str, payload: &T) {
        let snapshot: Vec<Listener<T>> = match self.channels.borrow().get(event) {
            Some(listeners) => listeners.iter().map(|(_, cb)| cb.clone()).collect(),
            None => return,
        };
        for listener in snapshot {
            (listener.borrow_mut())(payload);
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.channels
            .borrow()
            .get(event)
            .map_or(0, |listeners| listeners.len())
    }
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
