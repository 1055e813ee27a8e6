//! Scoped acquisition with guaranteed release.
//!
//! Every listener, frame callback, split or timeline a view creates hands
//! back a [`Disposer`]. The view's [`Scope`] runs them in reverse
//! acquisition order exactly once, on explicit teardown or on drop.

use std::panic::{AssertUnwindSafe, catch_unwind};

pub struct Disposer {
    label: &'static str,
    release: Option<Box<dyn FnOnce()>>,
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("label", &self.label)
            .field("pending", &self.release.is_some())
            .finish()
    }
}

impl Disposer {
    pub fn new(label: &'static str, release: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            release: Some(Box::new(release)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn is_pending(&self) -> bool {
        self.release.is_some()
    }

    /// Runs the release closure if it has not run yet. A panicking release is
    /// contained and logged.
    pub fn dispose(&mut self) {
        let Some(release) = self.release.take() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(release)).is_err() {
            tracing::warn!(label = self.label, "disposer panicked during teardown");
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    disposers: Vec<Disposer>,
    torn_down: bool,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disposers: Vec::new(),
            torn_down: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Takes ownership of `d`. A scope that is already torn down releases it
    /// on the spot so nothing acquired late can leak.
    pub fn adopt(&mut self, mut d: Disposer) {
        if self.torn_down {
            tracing::debug!(scope = %self.name, label = d.label, "late disposer released");
            d.dispose();
            return;
        }
        self.disposers.push(d);
    }

    pub fn defer(&mut self, label: &'static str, release: impl FnOnce() + 'static) {
        self.adopt(Disposer::new(label, release));
    }

    #[tracing::instrument(skip(self), fields(scope = %self.name, count = self.disposers.len()))]
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        while let Some(mut d) = self.disposers.pop() {
            d.dispose();
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.teardown();
    }
}
