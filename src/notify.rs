use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Mutable slot holding the callback to run on [`CallbackSlot::fire`].
///
/// Clones share the slot, so whoever fires always sees the callback that is
/// installed at that moment rather than the one present when it was wired.
#[derive(Clone)]
pub struct CallbackSlot {
    inner: Rc<RefCell<Rc<dyn Fn()>>>,
}

impl CallbackSlot {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Rc::new(|| {}))),
        }
    }

    pub fn install(&self, callback: impl Fn() + 'static) {
        *self.inner.borrow_mut() = Rc::new(callback);
    }

    pub fn clear(&self) {
        self.install(|| {});
    }

    pub fn fire(&self) {
        // Cloned out so the callback may reinstall the slot while running.
        let callback = Rc::clone(&self.inner.borrow());
        callback();
    }
}

impl Default for CallbackSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("holders", &Rc::strong_count(&self.inner))
            .finish()
    }
}
