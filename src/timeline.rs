//! Ordered composition of tweens and nested timelines.
//!
//! Children are kept sorted by start time (stable for equal starts, so the
//! declared order breaks ties). Rendering at time `t` is a pure function of
//! `t` plus the start values each `to` tween captured the first time it ran,
//! which makes seeking backwards and scrubbing well defined.

use std::fmt;

use crate::{
    anim::{PropMap, Tween, TweenSpec},
    core::{TargetId, mix64},
    error::{CurtainError, CurtainResult},
    stage::Stage,
};

/// Where a step is placed relative to the steps before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// When the previous step ends.
    #[default]
    After,
    /// Together with the previous step (`<`).
    WithPrevious,
    /// Absolute time in seconds.
    At(f64),
    /// Previous step's end shifted by the given seconds (may be negative).
    Offset(f64),
    /// Previous step's start shifted by the given seconds.
    WithPreviousOffset(f64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineOptions {
    #[serde(default)]
    pub delay: f64, // seconds before local time zero
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub seed: u64, // random stagger seed
}

impl TimelineOptions {
    pub fn delay(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
    Completed,
    Killed,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ScheduleEntry {
    pub target: TargetId,
    pub start: f64,
    pub duration: f64,
}

enum Child {
    Tween(Tween),
    Timeline(Box<Timeline>),
}

impl Child {
    fn len(&self) -> f64 {
        match self {
            Self::Tween(tw) => tw.duration,
            Self::Timeline(tl) => tl.total_duration(),
        }
    }

    fn render(&mut self, local: f64, stage: &mut Stage) {
        match self {
            Self::Tween(tw) => tw.render(local, stage),
            Self::Timeline(tl) => {
                let delay = tl.options.delay;
                tl.render_at(local - delay, stage);
            }
        }
    }
}

struct Placed {
    start: f64,
    child: Child,
}

pub struct Timeline {
    options: TimelineOptions,
    children: Vec<Placed>,
    prev: Option<(f64, f64)>, // (start, end) of the last step
    steps: u64,
    time: f64, // local playhead; negative while the start delay runs
    state: PlayState,
    reversed: bool,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("options", &self.options)
            .field("children", &self.children.len())
            .field("time", &self.time)
            .field("state", &self.state)
            .field("reversed", &self.reversed)
            .finish_non_exhaustive()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineOptions::default())
    }
}

impl Timeline {
    pub fn new(options: TimelineOptions) -> Self {
        let delay = if options.delay.is_finite() {
            options.delay.max(0.0)
        } else {
            0.0
        };
        Self {
            options: TimelineOptions { delay, ..options },
            children: Vec::new(),
            prev: None,
            steps: 0,
            time: -delay,
            state: if options.paused {
                PlayState::Paused
            } else {
                PlayState::Playing
            },
            reversed: false,
            on_complete: None,
        }
    }

    pub fn options(&self) -> TimelineOptions {
        self.options
    }

    fn resolve(&self, pos: Position) -> f64 {
        let (prev_start, prev_end) = self.prev.unwrap_or((0.0, 0.0));
        let at = match pos {
            Position::After => prev_end,
            Position::WithPrevious => prev_start,
            Position::At(t) => t,
            Position::Offset(d) => prev_end + d,
            Position::WithPreviousOffset(d) => prev_start + d,
        };
        if at.is_finite() { at.max(0.0) } else { prev_end }
    }

    fn insert(&mut self, start: f64, child: Child) {
        let idx = self.children.partition_point(|p| p.start <= start);
        self.children.insert(idx, Placed { start, child });
    }

    /// Adds one step across `targets`. An empty target list is a valid
    /// no-op step: it occupies zero time at its position.
    pub fn add(
        &mut self,
        targets: &[TargetId],
        spec: TweenSpec,
        pos: Position,
    ) -> CurtainResult<&mut Self> {
        if self.state == PlayState::Killed {
            return Err(CurtainError::animation("cannot add to a killed timeline"));
        }
        spec.validate()?;

        let start = self.resolve(pos);
        let seed = mix64(self.options.seed ^ self.steps);
        self.steps += 1;

        if targets.is_empty() {
            tracing::debug!(start, "step has no targets; skipped");
            self.prev = Some((start, start));
            return Ok(self);
        }

        let offsets = match &spec.stagger {
            Some(s) => s.offsets(targets.len(), seed),
            None => vec![0.0; targets.len()],
        };

        let mut end = start;
        for (target, off) in targets.iter().zip(offsets) {
            let at = start + off;
            end = end.max(at + spec.duration);
            self.insert(at, Child::Tween(Tween::new(*target, &spec)));
        }
        self.prev = Some((start, end));
        Ok(self)
    }

    pub fn to(
        &mut self,
        targets: &[TargetId],
        spec: TweenSpec,
        pos: Position,
    ) -> CurtainResult<&mut Self> {
        self.add(targets, spec, pos)
    }

    pub fn from_to(
        &mut self,
        targets: &[TargetId],
        spec: TweenSpec,
        pos: Position,
    ) -> CurtainResult<&mut Self> {
        if spec.from.is_none() {
            return Err(CurtainError::animation("from_to step needs start values"));
        }
        self.add(targets, spec, pos)
    }

    pub fn set(
        &mut self,
        targets: &[TargetId],
        to: PropMap,
        pos: Position,
    ) -> CurtainResult<&mut Self> {
        self.add(targets, TweenSpec::set(to), pos)
    }

    /// Nests `child` as a single step. Its own delay is part of its length.
    pub fn add_timeline(&mut self, child: Timeline, pos: Position) -> CurtainResult<&mut Self> {
        if self.state == PlayState::Killed {
            return Err(CurtainError::animation("cannot add to a killed timeline"));
        }
        let start = self.resolve(pos);
        let end = start + child.total_duration();
        self.steps += 1;
        self.insert(start, Child::Timeline(Box::new(child)));
        self.prev = Some((start, end));
        Ok(self)
    }

    /// Latest `start + duration` over all children.
    pub fn duration(&self) -> f64 {
        self.children
            .iter()
            .map(|p| p.start + p.child.len())
            .fold(0.0, f64::max)
    }

    /// Duration including the start delay.
    pub fn total_duration(&self) -> f64 {
        self.options.delay + self.duration()
    }

    /// Flattened `(target, start, duration)` entries in start order,
    /// relative to local time zero.
    pub fn schedule(&self) -> Vec<ScheduleEntry> {
        let mut out = Vec::new();
        self.collect_schedule(0.0, &mut out);
        out.sort_by(|a, b| a.start.total_cmp(&b.start));
        out
    }

    fn collect_schedule(&self, base: f64, out: &mut Vec<ScheduleEntry>) {
        for p in &self.children {
            match &p.child {
                Child::Tween(tw) => out.push(ScheduleEntry {
                    target: tw.target,
                    start: base + p.start,
                    duration: tw.duration,
                }),
                Child::Timeline(tl) => {
                    tl.collect_schedule(base + p.start + tl.options.delay, out)
                }
            }
        }
    }

    /// Start times of the children targeting `target`.
    pub fn starts_for(&self, target: TargetId) -> Vec<f64> {
        self.schedule()
            .into_iter()
            .filter(|e| e.target == target)
            .map(|e| e.start)
            .collect()
    }

    pub fn on_complete(&mut self, f: impl FnOnce() + 'static) -> &mut Self {
        if self.state != PlayState::Killed {
            self.on_complete = Some(Box::new(f));
        }
        self
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_killed(&self) -> bool {
        self.state == PlayState::Killed
    }

    pub fn is_active(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn progress(&self) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            if self.time >= 0.0 { 1.0 } else { 0.0 }
        } else {
            (self.time / d).clamp(0.0, 1.0)
        }
    }

    pub fn play(&mut self) {
        if self.state == PlayState::Killed {
            return;
        }
        self.reversed = false;
        self.state = PlayState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
        }
    }

    /// Plays backwards from the current playhead toward zero.
    pub fn reverse(&mut self) {
        if self.state == PlayState::Killed {
            return;
        }
        self.reversed = true;
        self.state = PlayState::Playing;
    }

    /// Moves the playhead by `dt` seconds of wall clock and renders.
    /// Fires the completion callback once when the end is reached going
    /// forward. Returns whether the timeline is still playing.
    pub fn advance(&mut self, dt: f64, stage: &mut Stage) -> bool {
        if self.state != PlayState::Playing {
            return false;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let end = self.duration();

        if self.reversed {
            self.time = (self.time - dt).max(0.0);
            self.render_at(self.time, stage);
            if self.time <= 0.0 {
                self.state = PlayState::Paused;
            }
            return self.is_active();
        }

        self.time = (self.time + dt).min(end);
        self.render_at(self.time, stage);
        if self.time >= end && self.time >= 0.0 {
            self.state = PlayState::Completed;
            tracing::trace!(duration = end, "timeline complete");
            if let Some(cb) = self.on_complete.take() {
                cb();
            }
        }
        self.is_active()
    }

    /// Jumps the playhead without firing callbacks.
    pub fn seek(&mut self, t: f64, stage: &mut Stage) {
        if self.state == PlayState::Killed {
            return;
        }
        let t = if t.is_finite() { t } else { 0.0 };
        self.time = t.clamp(-self.options.delay, self.duration());
        self.render_at(self.time, stage);
    }

    pub fn set_progress(&mut self, p: f64, stage: &mut Stage) {
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        self.seek(p * self.duration(), stage);
    }

    /// Writes the initial state (start values of `from_to` steps) without
    /// moving the playhead.
    pub fn render_initial(&mut self, stage: &mut Stage) {
        if self.state == PlayState::Killed {
            return;
        }
        self.render_at(self.time, stage);
    }

    fn render_at(&mut self, t: f64, stage: &mut Stage) {
        // Not-yet-started children restore their start values latest-first,
        // so the earliest step's start value is what remains.
        for p in self.children.iter_mut().rev() {
            if t < p.start {
                p.child.render(t - p.start, stage);
            }
        }
        for p in self.children.iter_mut() {
            if t >= p.start {
                p.child.render(t - p.start, stage);
            }
        }
    }

    /// Stops all mutation and drops pending callbacks. Idempotent.
    pub fn kill(&mut self) {
        if self.state == PlayState::Killed {
            return;
        }
        tracing::debug!(children = self.children.len(), "timeline killed");
        self.state = PlayState::Killed;
        self.on_complete = None;
        self.children.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{anim_ease::Ease, core::Prop, stagger::Stagger};

    fn fade(d: f64) -> TweenSpec {
        TweenSpec::from_to(
            PropMap::new().with(Prop::Opacity, 0.0),
            PropMap::new().with(Prop::Opacity, 1.0),
        )
        .duration(d)
        .ease(Ease::Linear)
    }

    fn targets(stage: &mut Stage, n: usize) -> Vec<TargetId> {
        (0..n).map(|_| stage.spawn(None, &["t"])).collect()
    }

    #[test]
    fn sequential_steps_start_at_running_sum() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 3);
        let mut tl = Timeline::default();
        tl.add(&t[0..1], fade(0.5), Position::After).unwrap();
        tl.add(&t[1..2], fade(0.25), Position::After).unwrap();
        tl.add(&t[2..3], fade(0.25), Position::After).unwrap();

        assert_eq!(tl.starts_for(t[0]), vec![0.0]);
        assert_eq!(tl.starts_for(t[1]), vec![0.5]);
        assert_eq!(tl.starts_for(t[2]), vec![0.75]);
        assert_eq!(tl.duration(), 1.0);
    }

    #[test]
    fn with_previous_shares_start() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 3);
        let mut tl = Timeline::default();
        tl.add(&t[0..1], fade(1.0), Position::After).unwrap();
        tl.add(&t[1..2], fade(2.0), Position::After).unwrap();
        tl.add(&t[2..3], fade(0.5), Position::WithPrevious).unwrap();

        assert_eq!(tl.starts_for(t[1]), tl.starts_for(t[2]));
        assert_eq!(tl.duration(), 3.0);
    }

    #[test]
    fn absolute_and_offset_positions() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 3);
        let mut tl = Timeline::default();
        tl.add(&t[0..1], fade(1.0), Position::At(2.0)).unwrap();
        tl.add(&t[1..2], fade(1.0), Position::Offset(-0.5)).unwrap();
        tl.add(&t[2..3], fade(1.0), Position::WithPreviousOffset(0.25))
            .unwrap();
        assert_eq!(tl.starts_for(t[0]), vec![2.0]);
        assert_eq!(tl.starts_for(t[1]), vec![2.5]);
        assert_eq!(tl.starts_for(t[2]), vec![2.75]);
    }

    #[test]
    fn stagger_spreads_starts_and_extends_step() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 4);
        let after = stage.spawn(None, &["after"]);
        let mut tl = Timeline::default();
        tl.add(&t, fade(0.3).stagger(Stagger::each(0.5)), Position::After)
            .unwrap();
        tl.add(&[after], fade(0.1), Position::After).unwrap();

        for (i, id) in t.iter().enumerate() {
            assert_eq!(tl.starts_for(*id), vec![i as f64 * 0.5]);
        }
        assert!((tl.starts_for(after)[0] - 1.8).abs() < 1e-12);
    }

    #[test]
    fn random_stagger_is_fixed_once_added() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 5);
        let mut tl = Timeline::new(TimelineOptions::default().seed(3));
        tl.add(&t, fade(0.3).stagger(Stagger::random(0.5)), Position::After)
            .unwrap();
        let before = tl.schedule();
        tl.advance(0.7, &mut stage);
        assert_eq!(tl.schedule(), before);

        let mut starts: Vec<f64> = before.iter().map(|e| e.start).collect();
        starts.sort_by(f64::total_cmp);
        assert_eq!(starts, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn advance_interpolates_and_completes_once() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 1);
        let fired = Rc::new(Cell::new(0));
        let mut tl = Timeline::default();
        tl.add(&t, fade(1.0), Position::After).unwrap();
        let f = fired.clone();
        tl.on_complete(move || f.set(f.get() + 1));

        tl.render_initial(&mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.0);
        assert!(tl.advance(0.5, &mut stage));
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.5);
        assert!(!tl.advance(0.75, &mut stage));
        assert_eq!(stage.value(t[0], Prop::Opacity), 1.0);
        tl.advance(1.0, &mut stage);
        assert_eq!(fired.get(), 1);
        assert_eq!(tl.state(), PlayState::Completed);
    }

    #[test]
    fn delay_holds_start_values() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 1);
        let mut tl = Timeline::new(TimelineOptions::default().delay(1.0));
        tl.add(&t, fade(1.0), Position::After).unwrap();
        tl.advance(0.5, &mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.0);
        tl.advance(1.0, &mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.5);
        assert_eq!(tl.total_duration(), 2.0);
    }

    #[test]
    fn kill_stops_mutation_and_drops_callback() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 1);
        let fired = Rc::new(Cell::new(false));
        let mut tl = Timeline::default();
        tl.add(&t, fade(1.0), Position::After).unwrap();
        let f = fired.clone();
        tl.on_complete(move || f.set(true));

        tl.advance(0.25, &mut stage);
        let frozen = stage.value(t[0], Prop::Opacity);
        tl.kill();
        tl.kill();
        assert!(!tl.advance(5.0, &mut stage));
        tl.seek(1.0, &mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), frozen);
        assert!(!fired.get());
        assert!(tl.add(&t, fade(1.0), Position::After).is_err());
    }

    #[test]
    fn reverse_returns_to_start_values() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 1);
        stage.set(t[0], Prop::YPercent, -100.0);
        let mut tl = Timeline::default();
        tl.to(
            &t,
            TweenSpec::to(PropMap::new().with(Prop::YPercent, 0.0))
                .duration(1.0)
                .ease(Ease::Linear),
            Position::After,
        )
        .unwrap();
        tl.advance(1.0, &mut stage);
        assert_eq!(stage.value(t[0], Prop::YPercent), 0.0);
        tl.reverse();
        tl.advance(0.5, &mut stage);
        assert_eq!(stage.value(t[0], Prop::YPercent), -50.0);
        tl.advance(0.5, &mut stage);
        assert_eq!(stage.value(t[0], Prop::YPercent), -100.0);
        assert!(!tl.is_active());
    }

    #[test]
    fn nested_timeline_counts_as_one_step() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 2);
        let mut inner = Timeline::new(TimelineOptions::default().delay(0.5));
        inner.add(&t[0..1], fade(1.0), Position::After).unwrap();

        let mut outer = Timeline::default();
        outer.add_timeline(inner, Position::After).unwrap();
        outer.add(&t[1..2], fade(1.0), Position::After).unwrap();

        assert_eq!(outer.starts_for(t[0]), vec![0.5]);
        assert_eq!(outer.starts_for(t[1]), vec![1.5]);
        assert_eq!(outer.duration(), 2.5);

        outer.seek(1.0, &mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.5);
    }

    #[test]
    fn empty_targets_are_a_noop_step() {
        let mut tl = Timeline::default();
        tl.add(&[], fade(1.0), Position::After).unwrap();
        assert_eq!(tl.duration(), 0.0);
        let mut stage = Stage::new();
        assert!(!tl.advance(0.016, &mut stage));
        assert_eq!(tl.state(), PlayState::Completed);
    }

    #[test]
    fn set_progress_maps_unit_interval() {
        let mut stage = Stage::new();
        let t = targets(&mut stage, 1);
        let mut tl = Timeline::new(TimelineOptions::default().paused(true));
        tl.add(&t, fade(4.0), Position::After).unwrap();
        tl.set_progress(0.25, &mut stage);
        assert_eq!(stage.value(t[0], Prop::Opacity), 0.25);
        assert_eq!(tl.progress(), 0.25);
        tl.set_progress(7.0, &mut stage);
        assert_eq!(tl.progress(), 1.0);
    }
}
