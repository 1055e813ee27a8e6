//! Scroll-driven playheads and the pinned card-stack gallery.

use std::{cell::RefCell, rc::Rc};

use crate::{
    anim::{Lerp, PropMap, TweenSpec},
    anim_ease::Ease,
    config::GalleryConfig,
    core::{Prop, TargetId},
    error::CurtainResult,
    host::{Event, EventKind},
    lifecycle::Scope,
    runtime::Runtime,
    stage::Stage,
    timeline::{Position, Timeline, TimelineOptions},
};

/// Document-space scroll range mapped onto progress `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollRange {
    pub start: f64,
    pub end: f64,
}

impl ScrollRange {
    /// One viewport height of scroll per transition between `items`.
    pub fn for_items(trigger_top: f64, viewport_height: f64, items: usize) -> Self {
        let steps = items.saturating_sub(1) as f64;
        Self {
            start: trigger_top,
            end: trigger_top + viewport_height.max(0.0) * steps,
        }
    }

    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Clamped, monotonic in `offset`.
    pub fn progress(&self, offset: f64) -> f64 {
        if self.is_empty() {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollBinding {
    range: ScrollRange,
    scrub: f64,
    pin: bool,
    offset: f64,
    target: f64,   // progress implied by the raw scroll offset
    progress: f64, // smoothed progress driving the timeline
}

impl ScrollBinding {
    pub fn new(range: ScrollRange, scrub: f64, pin: bool) -> Self {
        Self {
            range,
            scrub: if scrub.is_finite() { scrub.max(0.0) } else { 0.0 },
            pin,
            offset: 0.0,
            target: 0.0,
            progress: 0.0,
        }
    }

    pub fn range(&self) -> ScrollRange {
        self.range
    }

    pub fn target_progress(&self) -> f64 {
        self.target
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn update_scroll(&mut self, offset: f64) {
        self.offset = offset;
        self.target = self.range.progress(offset);
        if self.scrub <= 0.0 {
            self.progress = self.target;
        }
    }

    /// Recomputes the range (viewport resize) keeping the current offset.
    pub fn rebind(&mut self, range: ScrollRange) {
        self.range = range;
        self.update_scroll(self.offset);
    }

    /// Moves smoothed progress toward the scroll target. With a scrub lag of
    /// `s` seconds each tick covers `dt / s` of the remaining distance.
    pub fn tick(&mut self, dt: f64) -> f64 {
        if self.scrub <= 0.0 {
            self.progress = self.target;
            return self.progress;
        }
        let f = (dt / self.scrub).clamp(0.0, 1.0);
        self.progress = <f64 as Lerp>::lerp(&self.progress, &self.target, f);
        if (self.progress - self.target).abs() < 1e-5 {
            self.progress = self.target;
        }
        self.progress
    }

    /// Whether this binding owns the trigger's vertical offset at all.
    pub fn pins(&self) -> bool {
        self.pin
    }

    pub fn is_pinned(&self) -> bool {
        self.pin && self.target > 0.0 && self.target < 1.0
    }

    /// Translation that keeps the trigger visually fixed while pinned.
    pub fn pin_offset(&self) -> f64 {
        if !self.pin {
            return 0.0;
        }
        (self.offset - self.range.start).clamp(0.0, self.range.len())
    }
}

/// A timeline and the scroll binding that drives it. Killing one kills the
/// other; neither can outlive the pair.
#[derive(Debug)]
pub struct ScrollTimeline {
    timeline: Timeline,
    binding: Option<ScrollBinding>,
    trigger: TargetId,
}

impl ScrollTimeline {
    pub fn new(timeline: Timeline, binding: ScrollBinding, trigger: TargetId) -> Self {
        Self {
            timeline,
            binding: Some(binding),
            trigger,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn binding(&self) -> Option<&ScrollBinding> {
        self.binding.as_ref()
    }

    pub fn is_killed(&self) -> bool {
        self.binding.is_none()
    }

    pub fn on_scroll(&mut self, offset: f64) {
        if let Some(b) = self.binding.as_mut() {
            b.update_scroll(offset);
        }
    }

    pub fn rebind(&mut self, range: ScrollRange) {
        if let Some(b) = self.binding.as_mut() {
            b.rebind(range);
        }
    }

    pub fn tick(&mut self, dt: f64, stage: &mut Stage) {
        let Some(b) = self.binding.as_mut() else {
            return;
        };
        let p = b.tick(dt);
        let pin = b.pins().then(|| b.pin_offset());
        self.timeline.set_progress(p, stage);
        if let Some(offset) = pin {
            stage.set(self.trigger, Prop::Y, offset);
        }
    }

    pub fn kill(&mut self) {
        self.binding = None;
        self.timeline.kill();
    }
}

/// Builds the card-stack sequence: for each pair `(i, i+1)` card `i` scales
/// down and its image zooms in while card `i+1` slides up from below, all in
/// the slice `[i, i+1]` of the timeline.
pub fn card_stack_timeline(
    stage: &mut Stage,
    cards: &[TargetId],
    images: &[Option<TargetId>],
    cfg: &GalleryConfig,
) -> CurtainResult<Timeline> {
    for (i, card) in cards.iter().enumerate() {
        stage.set(*card, Prop::YPercent, if i == 0 { 0.0 } else { 100.0 });
        stage.set(*card, Prop::Scale, 1.0);
    }
    for img in images.iter().flatten() {
        stage.set(*img, Prop::Scale, 1.0);
    }

    let mut tl = Timeline::new(TimelineOptions::default().paused(true));
    let step = |props: PropMap| TweenSpec::to(props).duration(1.0).ease(Ease::Linear);
    for i in 0..cards.len().saturating_sub(1) {
        let at = Position::At(i as f64);
        tl.to(
            &cards[i..=i],
            step(PropMap::new().with(Prop::Scale, cfg.card_scale)),
            at,
        )?;
        let image: Vec<TargetId> = images.get(i).copied().flatten().into_iter().collect();
        tl.to(&image, step(PropMap::new().with(Prop::Scale, cfg.image_zoom)), at)?;
        tl.to(
            &cards[i + 1..=i + 1],
            step(PropMap::new().with(Prop::YPercent, 0.0)),
            at,
        )?;
    }
    Ok(tl)
}

/// Mounts the gallery found under `root` (`#sticky-cards` trigger holding
/// `image-card` targets, each optionally holding an `image`). Missing
/// markup mounts nothing.
#[tracing::instrument(skip(rt, scope))]
pub fn mount_gallery(
    rt: &Rc<Runtime>,
    root: TargetId,
    scope: &mut Scope,
) -> CurtainResult<Option<Rc<RefCell<ScrollTimeline>>>> {
    let cfg = rt.config().gallery.clone();
    let (trigger, intro, items, timeline) = {
        let mut stage = rt.stage().borrow_mut();
        let Some(trigger) = stage.query_one(root, "#sticky-cards") else {
            tracing::debug!("no gallery trigger; nothing to mount");
            return Ok(None);
        };
        let intro = stage.query_one(root, "#intro");
        let cards = stage.query(trigger, "image-card");
        let images: Vec<Option<TargetId>> =
            cards.iter().map(|c| stage.query_one(*c, "image")).collect();
        let tl = card_stack_timeline(&mut stage, &cards, &images, &cfg)?;
        (trigger, intro, cards.len(), tl)
    };

    // A full-screen intro section sits above the trigger, so the trigger's
    // top follows the viewport height.
    let range_for = {
        let rt = Rc::downgrade(rt);
        move || {
            rt.upgrade().map(|rt| {
                let vh = rt.viewport_height();
                let mut stage = rt.stage().borrow_mut();
                if let Some(intro) = intro {
                    let below = stage.top_of(intro).unwrap_or(0.0) + vh;
                    stage.set_top(trigger, below);
                }
                let top = stage.top_of(trigger).unwrap_or(0.0);
                ScrollRange::for_items(top, vh, items)
            })
        }
    };
    let Some(range) = range_for() else {
        return Ok(None);
    };
    let binding = ScrollBinding::new(range, cfg.scrub, cfg.pin);
    let sticky = Rc::new(RefCell::new(ScrollTimeline::new(timeline, binding, trigger)));
    sticky
        .borrow_mut()
        .tick(0.0, &mut rt.stage().borrow_mut());

    let s = sticky.clone();
    scope.adopt(rt.events().listen_scoped(EventKind::Scroll, move |e| {
        if let Event::Scroll { offset } = e {
            s.borrow_mut().on_scroll(*offset);
        }
    }));

    let s = sticky.clone();
    scope.adopt(rt.events().listen_scoped(EventKind::Resize, move |_| {
        if let Some(range) = range_for() {
            s.borrow_mut().rebind(range);
        }
    }));

    let s = sticky.clone();
    let stage = Rc::downgrade(rt.stage());
    scope.adopt(rt.frames().request_scoped(move |dt| {
        if let Some(stage) = stage.upgrade() {
            s.borrow_mut().tick(dt, &mut stage.borrow_mut());
        }
    }));

    let s = sticky.clone();
    scope.defer("scroll-timeline", move || s.borrow_mut().kill());

    Ok(Some(sticky))
}
