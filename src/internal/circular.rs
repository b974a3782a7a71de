//! Circular dependency detection infrastructure.
//!
//! Each top-level resolution owns a [`ResolutionPath`]: the identities
//! currently being built, outermost first. Entering an identity already on the
//! path is a cycle; growing the path past the configured depth is an error.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Identities currently under construction for one resolution.
#[derive(Debug)]
pub(crate) struct ResolutionPath {
    stack: Vec<Key>,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Pushes `key`, failing on a repeat or when the depth limit is hit.
    pub(crate) fn enter(&mut self, key: Key) -> DiResult<()> {
        // Circular detection BEFORE pushing the new key
        if self.stack.contains(&key) {
            let mut path: Vec<&'static str> =
                self.stack.iter().map(Key::display_name).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }

        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }

        self.stack.push(key);
        Ok(())
    }

    pub(crate) fn leave(&mut self, key: &Key) {
        let last = self.stack.pop();
        debug_assert_eq!(last.as_ref(), Some(key));
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Keeps a key on the path for as long as the guard lives.
pub(crate) struct PathGuard<'a> {
    path: &'a RefCell<ResolutionPath>,
    key: Key,
}

impl<'a> PathGuard<'a> {
    pub(crate) fn enter(path: &'a RefCell<ResolutionPath>, key: Key) -> DiResult<Self> {
        path.borrow_mut().enter(key)?;
        Ok(Self { path, key })
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.borrow_mut().leave(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_reports_full_path() {
        let path = RefCell::new(ResolutionPath::new(16));
        let _a = PathGuard::enter(&path, Key::token("A")).unwrap();
        let _b = PathGuard::enter(&path, Key::token("B")).unwrap();

        let err = PathGuard::enter(&path, Key::token("A")).err().unwrap();
        assert_eq!(err, DiError::Circular(vec!["A", "B", "A"]));
        assert_eq!(path.borrow().depth(), 2);
    }

    #[test]
    fn guards_pop_on_drop() {
        let path = RefCell::new(ResolutionPath::new(16));
        {
            let _a = PathGuard::enter(&path, Key::token("A")).unwrap();
            assert_eq!(path.borrow().depth(), 1);
        }
        assert_eq!(path.borrow().depth(), 0);
        // Re-entering after the guard dropped is not a cycle
        assert!(PathGuard::enter(&path, Key::token("A")).is_ok());
    }

    #[test]
    fn depth_limit() {
        let path = RefCell::new(ResolutionPath::new(2));
        let _a = PathGuard::enter(&path, Key::token("A")).unwrap();
        let _b = PathGuard::enter(&path, Key::token("B")).unwrap();
        let err = PathGuard::enter(&path, Key::token("C")).err().unwrap();
        assert_eq!(err, DiError::DepthExceeded(2));
    }
}
