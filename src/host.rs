//! Host-side plumbing: input events and the per-frame callback loop.
//!
//! Both registries hand out ids and scoped [`Disposer`]s. Dispatch snapshots
//! the handler list first, so handlers may register or cancel others while
//! running.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use crate::{
    core::{Point, TargetId},
    lifecycle::Disposer,
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    PointerMove { x: f64, y: f64 },
    PointerEnter { target: TargetId },
    PointerLeave { target: TargetId },
    Scroll { offset: f64 },
    Resize { viewport_height: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerEnter,
    PointerLeave,
    Scroll,
    Resize,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerMove { .. } => EventKind::PointerMove,
            Self::PointerEnter { .. } => EventKind::PointerEnter,
            Self::PointerLeave { .. } => EventKind::PointerLeave,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Resize { .. } => EventKind::Resize,
        }
    }

    pub fn pointer(&self) -> Option<Point> {
        match self {
            Self::PointerMove { x, y } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

type Handler = Rc<RefCell<dyn FnMut(&Event)>>;

#[derive(Default)]
pub struct EventBus {
    next: Cell<u64>,
    listeners: RefCell<BTreeMap<ListenerId, (EventKind, Handler)>>,
}

impl EventBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn listen(&self, kind: EventKind, f: impl FnMut(&Event) + 'static) -> ListenerId {
        let id = ListenerId(self.next.get());
        self.next.set(id.0 + 1);
        let handler: Handler = Rc::new(RefCell::new(f));
        self.listeners.borrow_mut().insert(id, (kind, handler));
        id
    }

    /// Like [`EventBus::listen`], returning a disposer that unregisters.
    pub fn listen_scoped(
        self: &Rc<Self>,
        kind: EventKind,
        f: impl FnMut(&Event) + 'static,
    ) -> Disposer {
        let id = self.listen(kind, f);
        let bus: Weak<Self> = Rc::downgrade(self);
        Disposer::new("listener", move || {
            if let Some(bus) = bus.upgrade() {
                bus.unlisten(id);
            }
        })
    }

    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    pub fn dispatch(&self, event: &Event) {
        let kind = event.kind();
        let handlers: Vec<(ListenerId, Handler)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, (k, _))| *k == kind)
            .map(|(id, (_, h))| (*id, h.clone()))
            .collect();

        for (id, h) in handlers {
            // Removed by an earlier handler in this same dispatch.
            if !self.listeners.borrow().contains_key(&id) {
                continue;
            }
            match h.try_borrow_mut() {
                Ok(mut f) => f(event),
                Err(_) => tracing::trace!(?id, "re-entrant dispatch skipped"),
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

type FrameFn = Rc<RefCell<dyn FnMut(f64)>>;

/// Callbacks run once per display refresh until cancelled.
#[derive(Default)]
pub struct FrameLoop {
    next: Cell<u64>,
    callbacks: RefCell<BTreeMap<FrameId, FrameFn>>,
    elapsed: Cell<f64>,
}

impl FrameLoop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn request(&self, f: impl FnMut(f64) + 'static) -> FrameId {
        let id = FrameId(self.next.get());
        self.next.set(id.0 + 1);
        let cb: FrameFn = Rc::new(RefCell::new(f));
        self.callbacks.borrow_mut().insert(id, cb);
        id
    }

    pub fn request_scoped(self: &Rc<Self>, f: impl FnMut(f64) + 'static) -> Disposer {
        let id = self.request(f);
        let frames: Weak<Self> = Rc::downgrade(self);
        Disposer::new("frame", move || {
            if let Some(frames) = frames.upgrade() {
                frames.cancel(id);
            }
        })
    }

    pub fn cancel(&self, id: FrameId) -> bool {
        self.callbacks.borrow_mut().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }

    /// Seconds of frame time delivered so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed.get()
    }

    pub fn tick(&self, dt: f64) {
        self.elapsed.set(self.elapsed.get() + dt);
        let callbacks: Vec<(FrameId, FrameFn)> = self
            .callbacks
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, cb.clone()))
            .collect();

        for (id, cb) in callbacks {
            if !self.callbacks.borrow().contains_key(&id) {
                continue;
            }
            if let Ok(mut f) = cb.try_borrow_mut() {
                f(dt);
            }
        }
    }
}
