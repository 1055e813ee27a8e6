use crate::{
    anim_ease::Ease,
    core::{Point, Prop, TargetId, Vec2},
    error::{CurtainError, CurtainResult},
    stage::Stage,
    stagger::Stagger,
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Ordered set of property values. Later entries win on duplicate props.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropMap(pub Vec<(Prop, f64)>);

impl PropMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prop: Prop, value: f64) -> Self {
        self.insert(prop, value);
        self
    }

    pub fn insert(&mut self, prop: Prop, value: f64) {
        match self.0.iter_mut().find(|(p, _)| *p == prop) {
            Some(slot) => slot.1 = value,
            None => self.0.push((prop, value)),
        }
    }

    pub fn get(&self, prop: Prop) -> Option<f64> {
        self.0.iter().find(|(p, _)| *p == prop).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prop, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn capture(stage: &Stage, target: TargetId, props: &PropMap) -> PropMap {
        PropMap(
            props
                .iter()
                .map(|(p, _)| (p, stage.value(target, p)))
                .collect(),
        )
    }
}

/// Step description before it is expanded across its targets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TweenSpec {
    pub from: Option<PropMap>,
    pub to: PropMap,
    pub duration: f64, // seconds
    pub ease: Ease,
    pub stagger: Option<Stagger>,
}

impl TweenSpec {
    /// Engine defaults: half a second, `OutQuad`, no stagger.
    pub const DEFAULT_DURATION: f64 = 0.5;

    pub fn to(to: PropMap) -> Self {
        Self {
            from: None,
            to,
            duration: Self::DEFAULT_DURATION,
            ease: Ease::default(),
            stagger: None,
        }
    }

    pub fn from_to(from: PropMap, to: PropMap) -> Self {
        Self {
            from: Some(from),
            ..Self::to(to)
        }
    }

    /// Zero-duration jump to `to`.
    pub fn set(to: PropMap) -> Self {
        Self {
            duration: 0.0,
            ease: Ease::Linear,
            ..Self::to(to)
        }
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = secs;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn stagger(mut self, stagger: Stagger) -> Self {
        self.stagger = Some(stagger);
        self
    }

    pub fn validate(&self) -> CurtainResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(CurtainError::animation(
                "tween duration must be finite and >= 0",
            ));
        }
        if self.to.is_empty() {
            return Err(CurtainError::animation("tween must animate at least one prop"));
        }
        if let Some(s) = &self.stagger {
            s.validate()?;
        }
        Ok(())
    }
}

/// A single-target property transition placed on a timeline.
#[derive(Clone, Debug)]
pub struct Tween {
    pub target: TargetId,
    pub from: Option<PropMap>,
    pub to: PropMap,
    pub duration: f64,
    pub ease: Ease,
    captured: Option<PropMap>, // start values read on first render of a `to` tween
}

impl Tween {
    pub fn new(target: TargetId, spec: &TweenSpec) -> Self {
        Self {
            target,
            from: spec.from.clone(),
            to: spec.to.clone(),
            duration: spec.duration,
            ease: spec.ease,
            captured: None,
        }
    }

    fn start_values(&self) -> Option<&PropMap> {
        self.from.as_ref().or(self.captured.as_ref())
    }

    /// Progress in [0,1] at `local` seconds after the tween's start.
    pub fn progress_at(&self, local: f64) -> f64 {
        if local < 0.0 {
            0.0
        } else if self.duration <= 0.0 {
            1.0
        } else {
            (local / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Writes the tween's state at `local` seconds after its start.
    ///
    /// Before the start, only tweens that know their start values write
    /// (explicit `from`, or a `to` tween that already ran once).
    pub fn render(&mut self, local: f64, stage: &mut Stage) {
        if local < 0.0 {
            if let Some(start) = self.start_values() {
                for (prop, v) in start.iter() {
                    stage.set(self.target, prop, v);
                }
            }
            return;
        }

        if self.start_values().is_none() {
            if !stage.contains(self.target) {
                return;
            }
            self.captured = Some(PropMap::capture(stage, self.target, &self.to));
        }

        let t = self.ease.apply(self.progress_at(local));
        let start = self.start_values().cloned().unwrap_or_default();
        for (prop, end) in self.to.iter() {
            let a = start.get(prop).unwrap_or_else(|| prop.natural());
            stage.set(self.target, prop, <f64 as Lerp>::lerp(&a, &end, t));
        }
    }
}
