//! Internal disposal bag for managing cleanup hooks.

/// Boxed cleanup hook.
pub(crate) type Disposer = Box<dyn FnOnce() + Send>;

/// Container for disposal hooks with LIFO execution order.
#[derive(Default)]
pub(crate) struct DisposeBag {
    hooks: Vec<Disposer>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, f: Disposer) {
        self.hooks.push(f);
    }

    /// Moves the hooks out so they can run without holding a lock.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    /// Execute all hooks in reverse order (LIFO).
    pub(crate) fn run_all_reverse(&mut self) {
        while let Some(f) = self.hooks.pop() {
            (f)();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
