//! Page transition "curtain": cover, swap content exactly once, reveal.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    anim::{PropMap, TweenSpec},
    config::TransitionConfig,
    core::{Prop, TargetId},
    error::CurtainResult,
    stage::Stage,
    timeline::{Position, Timeline, TimelineOptions},
};

/// Route/content swap capability.
pub trait Router {
    fn navigate(&self, href: &str);
    fn current_route(&self) -> String;
}

/// Router that records navigations and reports the pending swap.
#[derive(Debug, Default)]
pub struct MemoryRouter {
    current: RefCell<String>,
    pending: RefCell<Option<String>>,
    history: RefCell<Vec<String>>,
}

impl MemoryRouter {
    pub fn new(initial: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            current: RefCell::new(initial.into()),
            ..Self::default()
        })
    }

    pub fn take_pending(&self) -> Option<String> {
        self.pending.borrow_mut().take()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl Router for MemoryRouter {
    fn navigate(&self, href: &str) {
        *self.current.borrow_mut() = href.to_string();
        *self.pending.borrow_mut() = Some(href.to_string());
        self.history.borrow_mut().push(href.to_string());
    }

    fn current_route(&self) -> String {
        self.current.borrow().clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    CoveringOut,
    Swapping,
    RevealingIn,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigateOutcome {
    Started,
    SameRoute,
    Busy,
    UnknownRoute,
}

/// One navigation. The phase cell is shared with the cover timeline's
/// completion callback, which is the only place the swap happens.
#[derive(Clone, Debug)]
pub struct TransitionSession {
    pub from: String,
    pub to: String,
    phase: Rc<Cell<Phase>>,
    swaps: Rc<Cell<u32>>,
}

impl TransitionSession {
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn swaps(&self) -> u32 {
        self.swaps.get()
    }
}

/// Top and bottom banner columns that make up the curtain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Banners {
    pub top: Vec<TargetId>,
    pub bottom: Vec<TargetId>,
}

impl Banners {
    pub fn query(stage: &Stage, root: TargetId) -> Self {
        Self {
            top: stage.query(root, "banner-top"),
            bottom: stage.query(root, "banner-bottom"),
        }
    }

    /// Spawns `columns` banners per edge under `root`.
    pub fn spawn(stage: &mut Stage, root: TargetId, columns: usize) -> Self {
        let top = (0..columns)
            .map(|_| stage.spawn(Some(root), &["banner-top"]))
            .collect();
        let bottom = (0..columns)
            .map(|_| stage.spawn(Some(root), &["banner-bottom"]))
            .collect();
        Self { top, bottom }
    }
}

fn curtain_timeline(
    banners: &Banners,
    cfg: &TransitionConfig,
    seed: u64,
    start: (f64, f64),
    end: (f64, f64),
) -> CurtainResult<Timeline> {
    let mut tl = Timeline::new(TimelineOptions::default().seed(seed));
    let slide = |v: f64| {
        TweenSpec::to(PropMap::new().with(Prop::YPercent, v))
            .duration(cfg.duration)
            .ease(cfg.ease)
            .stagger(cfg.stagger())
    };
    tl.set(
        &banners.top,
        PropMap::new().with(Prop::YPercent, start.0),
        Position::After,
    )?
    .set(
        &banners.bottom,
        PropMap::new().with(Prop::YPercent, start.1),
        Position::After,
    )?
    .to(&banners.top, slide(end.0), Position::After)?
    .to(&banners.bottom, slide(end.1), Position::WithPrevious)?;
    Ok(tl)
}

/// Banners slide in from off-screen until they cover the viewport.
pub fn cover_timeline(banners: &Banners, cfg: &TransitionConfig, seed: u64) -> CurtainResult<Timeline> {
    curtain_timeline(banners, cfg, seed, (-100.0, 100.0), (0.0, 0.0))
}

/// Banners slide back off-screen, revealing the page.
pub fn reveal_timeline(banners: &Banners, cfg: &TransitionConfig, seed: u64) -> CurtainResult<Timeline> {
    curtain_timeline(banners, cfg, seed, (0.0, 0.0), (-100.0, 100.0))
}

pub struct Orchestrator {
    router: Rc<dyn Router>,
    config: TransitionConfig,
    banners: Banners,
    session: Option<TransitionSession>,
    finished: Option<TransitionSession>,
    cover: Option<Timeline>,
    reveal: Option<Timeline>,
}

impl Orchestrator {
    pub fn new(router: Rc<dyn Router>, config: TransitionConfig, banners: Banners) -> Self {
        Self {
            router,
            config,
            banners,
            session: None,
            finished: None,
            cover: None,
            reveal: None,
        }
    }

    pub fn banners(&self) -> &Banners {
        &self.banners
    }

    pub fn session(&self) -> Option<&TransitionSession> {
        self.session.as_ref()
    }

    /// The most recently completed session.
    pub fn last_session(&self) -> Option<&TransitionSession> {
        self.finished.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase())
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase(),
            Phase::CoveringOut | Phase::Swapping | Phase::RevealingIn
        )
    }

    /// Starts covering the viewport on the way to `href`. Requests for the
    /// current route and requests made while a session is in flight are
    /// ignored.
    #[tracing::instrument(skip(self, stage, seed))]
    pub fn navigate(&mut self, href: &str, stage: &mut Stage, seed: u64) -> NavigateOutcome {
        let from = self.router.current_route();
        if from == href {
            tracing::debug!("already on route; transition suppressed");
            return NavigateOutcome::SameRoute;
        }
        if self.is_busy() {
            tracing::debug!(phase = ?self.phase(), "transition in flight; request ignored");
            return NavigateOutcome::Busy;
        }

        let mut cover = match cover_timeline(&self.banners, &self.config, seed) {
            Ok(tl) => tl,
            Err(err) => {
                // The curtain is decoration; never block the navigation itself.
                tracing::warn!(%err, "cover timeline rejected; navigating directly");
                Timeline::default()
            }
        };

        let phase = Rc::new(Cell::new(Phase::CoveringOut));
        let swaps = Rc::new(Cell::new(0));
        {
            let phase = phase.clone();
            let swaps = swaps.clone();
            let router = self.router.clone();
            let href = href.to_string();
            cover.on_complete(move || {
                if phase.get() != Phase::CoveringOut {
                    return;
                }
                phase.set(Phase::Swapping);
                swaps.set(swaps.get() + 1);
                router.navigate(&href);
            });
        }

        // The banners change owner: any running reveal stops here.
        if let Some(mut reveal) = self.reveal.take() {
            reveal.kill();
        }
        cover.render_initial(stage);
        self.cover = Some(cover);
        self.session = Some(TransitionSession {
            from,
            to: href.to_string(),
            phase,
            swaps,
        });
        NavigateOutcome::Started
    }

    /// Signals that the new view is mounted. Inside a session this starts
    /// the reveal; with no session (first load) it plays a plain reveal.
    pub fn content_ready(&mut self, stage: &mut Stage, seed: u64) {
        match self.phase() {
            Phase::Swapping | Phase::Idle | Phase::Done => {}
            Phase::CoveringOut | Phase::RevealingIn => return,
        }
        if let Some(mut cover) = self.cover.take() {
            cover.kill();
        }
        if let Some(mut old) = self.reveal.take() {
            old.kill();
        }
        match reveal_timeline(&self.banners, &self.config, seed) {
            Ok(mut tl) => {
                tl.render_initial(stage);
                self.reveal = Some(tl);
            }
            Err(err) => tracing::warn!(%err, "reveal timeline rejected"),
        }
        if let Some(s) = &self.session {
            if s.phase() == Phase::Swapping {
                s.phase.set(Phase::RevealingIn);
            }
        }
    }

    /// Advances whichever curtain animation is running.
    pub fn tick(&mut self, dt: f64, stage: &mut Stage) {
        if let Some(cover) = self.cover.as_mut() {
            cover.advance(dt, stage);
        }
        if let Some(reveal) = self.reveal.as_mut() {
            if !reveal.advance(dt, stage) {
                self.reveal = None;
                if let Some(s) = self.session.take() {
                    if s.phase() == Phase::RevealingIn {
                        s.phase.set(Phase::Done);
                        tracing::debug!(from = %s.from, to = %s.to, "transition done");
                    }
                    self.finished = Some(s);
                }
            }
        }
    }

    /// Kills both curtain timelines. The session, if any, is abandoned.
    pub fn kill(&mut self) {
        if let Some(mut tl) = self.cover.take() {
            tl.kill();
        }
        if let Some(mut tl) = self.reveal.take() {
            tl.kill();
        }
        self.session = None;
    }
}
