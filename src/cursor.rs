//! Two-follower pointer smoothing for the custom cursor.
//!
//! Each display refresh moves a tight dot and a loose ring a fixed fraction
//! of the way toward the raw pointer position.

use std::{cell::RefCell, rc::Rc};

use crate::{
    anim::Lerp,
    config::CursorConfig,
    core::{Point, Prop, TargetId},
    error::{CurtainError, CurtainResult},
    host::{Event, EventKind},
    lifecycle::Scope,
    runtime::Runtime,
};

/// `prev + (raw - prev) * factor`.
pub fn lerp_step(prev: f64, raw: f64, factor: f64) -> f64 {
    <f64 as Lerp>::lerp(&prev, &raw, factor)
}

/// Upper bound on ticks for a follower to get within `eps` of a fixed
/// target starting `distance` away.
pub fn ticks_to_converge(distance: f64, eps: f64, factor: f64) -> u64 {
    if distance <= eps || factor >= 1.0 {
        return u64::from(distance > eps);
    }
    ((eps / distance).ln() / (1.0 - factor).ln()).ceil().max(0.0) as u64
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Follower {
    pub pos: Point,
    pub factor: f64,
}

impl Follower {
    pub fn new(factor: f64) -> CurtainResult<Self> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CurtainError::validation(
                "follower factor must be in (0, 1]",
            ));
        }
        Ok(Self {
            pos: Point::ZERO,
            factor,
        })
    }

    pub fn step(&mut self, raw: Point) -> Point {
        self.pos = <Point as Lerp>::lerp(&self.pos, &raw, self.factor);
        self.pos
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CursorFrame {
    pub dot: (f64, f64),
    pub ring: (f64, f64),
    pub dot_size: f64,
    pub ring_size: f64,
}

#[derive(Clone, Debug)]
pub struct PointerState {
    raw: Point,
    dot: Follower,
    ring: Follower,
    hovering: bool,
    sizes: [f64; 4], // dot, dot hover, ring, ring hover
}

impl PointerState {
    pub fn new(cfg: &CursorConfig) -> CurtainResult<Self> {
        Ok(Self {
            raw: Point::ZERO,
            dot: Follower::new(cfg.dot_factor)?,
            ring: Follower::new(cfg.ring_factor)?,
            hovering: false,
            sizes: [
                cfg.dot_size,
                cfg.dot_hover_size,
                cfg.ring_size,
                cfg.ring_hover_size,
            ],
        })
    }

    pub fn raw(&self) -> Point {
        self.raw
    }

    pub fn on_move(&mut self, p: Point) {
        self.raw = p;
    }

    pub fn set_hover(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn tick(&mut self) -> CursorFrame {
        let dot = self.dot.step(self.raw);
        let ring = self.ring.step(self.raw);
        let [ds, dh, rs, rh] = self.sizes;
        CursorFrame {
            dot: (dot.x, dot.y),
            ring: (ring.x, ring.y),
            dot_size: if self.hovering { dh } else { ds },
            ring_size: if self.hovering { rh } else { rs },
        }
    }
}

/// Mounted cursor: two stage targets driven by a frame callback.
pub struct CursorFollower {
    pub dot: TargetId,
    pub ring: TargetId,
    state: Rc<RefCell<PointerState>>,
}

impl CursorFollower {
    /// Spawns the dot and ring under `root` and wires pointer, hover and
    /// frame callbacks into `scope`. Hover applies to targets under `root`
    /// carrying one of the configured interactive markers.
    #[tracing::instrument(skip(rt, scope))]
    pub fn mount(rt: &Rc<Runtime>, root: TargetId, scope: &mut Scope) -> CurtainResult<Self> {
        let cfg = rt.config().cursor.clone();
        let state = Rc::new(RefCell::new(PointerState::new(&cfg)?));

        let (dot, ring) = {
            let mut stage = rt.stage().borrow_mut();
            (
                stage.spawn(Some(root), &["cursor-dot"]),
                stage.spawn(Some(root), &["cursor-ring"]),
            )
        };
        let stage = Rc::downgrade(rt.stage());
        scope.defer("cursor-targets", move || {
            if let Some(stage) = stage.upgrade() {
                let mut stage = stage.borrow_mut();
                stage.remove(dot);
                stage.remove(ring);
            }
        });

        let s = state.clone();
        scope.adopt(rt.events().listen_scoped(EventKind::PointerMove, move |e| {
            if let Some(p) = e.pointer() {
                s.borrow_mut().on_move(p);
            }
        }));

        for (kind, hovering) in [(EventKind::PointerEnter, true), (EventKind::PointerLeave, false)]
        {
            let s = state.clone();
            let stage = Rc::downgrade(rt.stage());
            let markers = cfg.interactive.clone();
            scope.adopt(rt.events().listen_scoped(kind, move |e| {
                let target = match e {
                    Event::PointerEnter { target } | Event::PointerLeave { target } => *target,
                    _ => return,
                };
                let Some(stage) = stage.upgrade() else {
                    return;
                };
                let stage = stage.borrow();
                let interactive = stage.is_descendant(target, root)
                    && markers.iter().any(|m| stage.has_marker(target, m));
                if interactive {
                    s.borrow_mut().set_hover(hovering);
                }
            }));
        }

        let s = state.clone();
        let stage = Rc::downgrade(rt.stage());
        scope.adopt(rt.frames().request_scoped(move |_dt| {
            let frame = s.borrow_mut().tick();
            let Some(stage) = stage.upgrade() else {
                return;
            };
            let mut stage = stage.borrow_mut();
            for (id, (x, y), size) in [
                (dot, frame.dot, frame.dot_size),
                (ring, frame.ring, frame.ring_size),
            ] {
                stage.set(id, Prop::X, x);
                stage.set(id, Prop::Y, y);
                stage.set(id, Prop::Width, size);
                stage.set(id, Prop::Height, size);
            }
        }));

        Ok(Self { dot, ring, state })
    }

    pub fn state(&self) -> PointerState {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn lerp_step_moves_fraction_of_distance() {
        assert_eq!(lerp_step(0.0, 100.0, 0.2), 20.0);
        assert_eq!(lerp_step(20.0, 100.0, 1.0), 100.0);
    }

    #[test]
    fn converges_within_predicted_ticks() {
        let eps = 0.01;
        for factor in [0.05, 0.1, 0.2, 0.5, 0.9, 1.0] {
            let mut f = Follower::new(factor).unwrap();
            let target = Point::new(300.0, -200.0);
            let distance = target.to_vec2().hypot();
            let bound = ticks_to_converge(distance, eps, factor);
            for _ in 0..bound {
                f.step(target);
            }
            assert!(
                (f.pos - target).hypot() <= eps * 1.0001,
                "factor {factor} needed more than {bound} ticks"
            );
        }
    }

    #[test]
    fn followers_lag_differently() {
        let mut ps = PointerState::new(&CursorConfig::default()).unwrap();
        ps.on_move(Point::new(100.0, 0.0));
        let f = ps.tick();
        assert!((f.dot.0 - 20.0).abs() < 1e-9);
        assert!((f.ring.0 - 10.0).abs() < 1e-9);
        assert_eq!(f.dot_size, 8.0);
        ps.set_hover(true);
        let f = ps.tick();
        assert_eq!((f.dot_size, f.ring_size), (10.0, 40.0));
    }

    #[test]
    fn rejects_out_of_range_factor() {
        assert!(Follower::new(0.0).is_err());
        assert!(Follower::new(1.5).is_err());
    }

    #[test]
    fn mounted_cursor_follows_and_unmounts_cleanly() {
        let rt = Runtime::init(SiteConfig::default()).unwrap();
        let (root, link) = {
            let mut stage = rt.stage().borrow_mut();
            let root = stage.spawn(None, &["layout"]);
            let link = stage.spawn(Some(root), &["a"]);
            (root, link)
        };
        let mut scope = Scope::new("cursor");
        let cursor = CursorFollower::mount(&rt, root, &mut scope).unwrap();

        rt.dispatch(Event::PointerMove { x: 50.0, y: 50.0 });
        rt.dispatch(Event::PointerEnter { target: link });
        rt.tick(0.016);
        {
            let stage = rt.stage().borrow();
            assert!((stage.value(cursor.dot, Prop::X) - 10.0).abs() < 1e-9);
            assert!((stage.value(cursor.ring, Prop::Y) - 5.0).abs() < 1e-9);
            assert_eq!(stage.value(cursor.ring, Prop::Width), 40.0);
        }
        rt.dispatch(Event::PointerLeave { target: link });
        assert!(!cursor.state().is_hovering());

        scope.teardown();
        assert!(rt.events().is_empty());
        assert!(rt.frames().is_empty());
        assert!(!rt.stage().borrow().contains(cursor.dot));
    }
}
