//! The site's pages: their animated markup and load-triggered sequences.

use std::{cell::RefCell, rc::Rc};

use crate::{
    anim::{PropMap, TweenSpec},
    config::IntroConfig,
    core::{Prop, TargetId},
    error::{CurtainError, CurtainResult},
    lifecycle::Scope,
    runtime::Runtime,
    scroll,
    stage::{SplitKind, Stage},
    stagger::Stagger,
    timeline::{Position, Timeline, TimelineOptions},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Question,
    Subject,
    Focus,
    Signal,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Question, Page::Subject, Page::Focus, Page::Signal];

    pub fn route(self) -> &'static str {
        match self {
            Self::Question => "/",
            Self::Subject => "/subject",
            Self::Focus => "/focus",
            Self::Signal => "/signal",
        }
    }

    pub fn from_route(route: &str) -> CurtainResult<Self> {
        let route = route.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.route() == route)
            .ok_or_else(|| CurtainError::validation(format!("unknown route '{route}'")))
    }
}

/// Populates the animated part of a page's markup under a new root.
pub fn build_scene(stage: &mut Stage, parent: Option<TargetId>, page: Page) -> TargetId {
    let root = stage.spawn(parent, &["view", page.route()]);
    let text = |stage: &mut Stage, marker: &str, body: &str| {
        stage.spawn_text(Some(root), &[marker], body);
    };
    match page {
        Page::Question => {
            text(stage, "#text-header", "Is This Reality?");
            text(stage, "#text-subheader", "Or Just a Thought?");
            text(stage, "#text-portrait", "Portrait");
            text(stage, "#text-vision", "Vision");
            for word in ["Mood", "Still Life", "Snapshot", "Focus"] {
                stage.spawn_text(Some(root), &["text-float", "span"], word);
            }
            stage.spawn(Some(root), &["#image-sub", "image"]);
            stage.spawn(Some(root), &["#image-main", "image"]);
        }
        Page::Subject => {
            text(stage, "#text-header", "Perhaps");
            text(
                stage,
                "#text-para-sub",
                "Beyond the lens is the subject\na story of expression and presence.\nEach frame holds emotion and identity.",
            );
            text(
                stage,
                "#text-para-main",
                "In the space between light and shadow,\nmoments whisper their secrets.\nEach frame holds a question.",
            );
            text(stage, "#text-pose", "Pose");
            text(stage, "#text-still", "Still");
            for word in ["Frame", "Light", "Shadow"] {
                stage.spawn_text(Some(root), &["text-float", "span"], word);
            }
            stage.spawn(Some(root), &["#image-main", "image"]);
        }
        Page::Signal => {
            text(stage, "#text-header", "Signal");
            text(
                stage,
                "#text-para-main",
                "Every picture sends a signal.\nReach out and answer it.",
            );
            for _ in 0..3 {
                stage.spawn(Some(root), &["image-set", "image"]);
            }
            stage.spawn(Some(root), &["#links", "a"]);
        }
        Page::Focus => {
            let intro = stage.spawn_text(Some(root), &["#intro", "p"], "Focus");
            stage.set_top(intro, 0.0);
            let trigger = stage.spawn(Some(root), &["#sticky-cards"]);
            for _ in 0..5 {
                let card = stage.spawn(Some(trigger), &["image-card"]);
                stage.spawn(Some(card), &["image", "img"]);
            }
            stage.spawn(Some(root), &["#outro", "p"]);
        }
    }
    root
}

/// Which targets one intro step animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select {
    /// Every target with the marker.
    All(&'static str),
    /// The split parts of the first target with the marker.
    Split(&'static str, SplitKind),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntroStep {
    pub select: Select,
    pub tween: TweenSpec,
}

fn reveal(select: Select, from: &[(Prop, f64)], duration: f64) -> IntroStep {
    let mut start = PropMap::new().with(Prop::Opacity, 0.0);
    let mut end = PropMap::new().with(Prop::Opacity, 1.0);
    for (p, v) in from {
        start.insert(*p, *v);
        end.insert(*p, 0.0);
    }
    IntroStep {
        select,
        tween: TweenSpec::from_to(start, end).duration(duration),
    }
}

impl IntroStep {
    fn stagger(mut self, s: Stagger) -> Self {
        self.tween.stagger = Some(s);
        self
    }
}

/// Ordered reveal steps of a page. The focus page has none: it is driven
/// by scroll instead.
pub fn intro_script(page: Page, cfg: &IntroConfig) -> Vec<IntroStep> {
    use Select::{All, Split};
    use SplitKind::{Chars, Lines};

    let chars = Stagger::each(cfg.char_stagger);
    let floats = Stagger::random(cfg.float_stagger);
    let d = TweenSpec::DEFAULT_DURATION;
    match page {
        Page::Question => vec![
            reveal(Split("#text-header", Chars), &[(Prop::Y, 20.0)], 0.5).stagger(chars),
            reveal(Split("#text-vision", Chars), &[(Prop::X, -20.0)], 0.3).stagger(chars),
            reveal(Split("#text-subheader", Chars), &[(Prop::X, 10.0)], 0.2).stagger(chars),
            reveal(All("#image-main"), &[], 0.3),
            reveal(All("text-float"), &[], 0.3).stagger(floats),
            reveal(All("#image-sub"), &[(Prop::Y, 50.0)], 0.3),
            reveal(Split("#text-portrait", Chars), &[(Prop::X, 20.0)], 0.3).stagger(chars),
        ],
        Page::Subject => vec![
            reveal(Split("#text-still", Chars), &[(Prop::X, -20.0)], 0.5).stagger(chars),
            reveal(Split("#text-header", Chars), &[(Prop::X, 20.0)], 0.5).stagger(chars),
            reveal(Split("#text-para-main", Lines), &[(Prop::Y, 20.0)], 0.5).stagger(chars),
            reveal(All("#image-main"), &[(Prop::Y, 200.0)], 0.3),
            reveal(All("text-float"), &[], d).stagger(floats),
            reveal(Split("#text-pose", Chars), &[(Prop::X, -20.0)], 0.5).stagger(chars),
            reveal(Split("#text-para-sub", Lines), &[(Prop::Y, 20.0)], 0.5).stagger(chars),
        ],
        Page::Signal => vec![
            reveal(Split("#text-header", Chars), &[(Prop::Y, -20.0)], 0.5).stagger(chars),
            reveal(Split("#text-para-main", Lines), &[(Prop::Y, 20.0)], 0.5).stagger(chars),
            reveal(All("image-set"), &[], d).stagger(floats),
            reveal(All("#links"), &[], d),
        ],
        Page::Focus => Vec::new(),
    }
}

/// Builds the intro timeline for the page under `root`, splitting text as
/// needed. Split reverts are registered with `scope`.
pub fn intro_timeline(
    stage: &mut Stage,
    root: TargetId,
    steps: &[IntroStep],
    options: TimelineOptions,
    scope: &mut Scope,
    rt_stage: &Rc<RefCell<Stage>>,
) -> CurtainResult<Timeline> {
    let mut tl = Timeline::new(options);
    for step in steps {
        let targets = match step.select {
            Select::All(marker) => stage.query(root, marker),
            Select::Split(marker, kind) => match stage.query_one(root, marker) {
                Some(source) => {
                    let split = stage.split(source, kind);
                    let parts = split.parts.clone();
                    let weak = Rc::downgrade(rt_stage);
                    scope.defer("split", move || {
                        if let Some(stage) = weak.upgrade() {
                            split.revert(&mut stage.borrow_mut());
                        }
                    });
                    parts
                }
                None => {
                    tracing::debug!(marker, "intro target missing; step skipped");
                    Vec::new()
                }
            },
        };
        tl.from_to(&targets, step.tween.clone(), Position::After)?;
    }
    Ok(tl)
}

/// Handle to whatever a mounted page animates.
#[derive(Clone, Debug)]
pub enum Mounted {
    Intro(Rc<RefCell<Timeline>>),
    Gallery(Rc<RefCell<scroll::ScrollTimeline>>),
    Static,
}

/// Starts the page's animations for the view under `root`. Everything is
/// torn down through `scope`.
#[tracing::instrument(skip(rt, scope))]
pub fn mount(rt: &Rc<Runtime>, page: Page, root: TargetId, scope: &mut Scope) -> CurtainResult<Mounted> {
    if page == Page::Focus {
        return Ok(match scroll::mount_gallery(rt, root, scope)? {
            Some(g) => Mounted::Gallery(g),
            None => Mounted::Static,
        });
    }

    let cfg = &rt.config().intro;
    let steps = intro_script(page, cfg);
    let options = TimelineOptions::default()
        .delay(cfg.delay)
        .seed(rt.next_seed());
    let mut tl = {
        let mut stage = rt.stage().borrow_mut();
        let mut tl = intro_timeline(&mut stage, root, &steps, options, scope, rt.stage())?;
        tl.render_initial(&mut stage);
        tl
    };
    if tl.duration() <= 0.0 {
        tl.kill();
        return Ok(Mounted::Static);
    }

    let tl = Rc::new(RefCell::new(tl));
    let t = tl.clone();
    scope.defer("intro-timeline", move || t.borrow_mut().kill());

    let t = tl.clone();
    let stage = Rc::downgrade(rt.stage());
    scope.adopt(rt.frames().request_scoped(move |dt| {
        if let Some(stage) = stage.upgrade() {
            t.borrow_mut().advance(dt, &mut stage.borrow_mut());
        }
    }));

    Ok(Mounted::Intro(tl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn routes_round_trip() {
        for p in Page::ALL {
            assert_eq!(Page::from_route(p.route()).unwrap(), p);
        }
        assert!(Page::from_route("/nope").is_err());
    }

    #[test]
    fn question_intro_is_sequential_after_delay() {
        let mut stage = Stage::new();
        let root = build_scene(&mut stage, None, Page::Question);
        let mut scope = Scope::new("question");
        let shared = Rc::new(RefCell::new(Stage::new()));
        let steps = intro_script(Page::Question, &IntroConfig::default());
        let tl = intro_timeline(
            &mut stage,
            root,
            &steps,
            TimelineOptions::default().delay(1.0),
            &mut scope,
            &shared,
        )
        .unwrap();

        // "IsThisReality?" has 14 visible chars: 13 * 0.05 + 0.5
        let header = stage.query_one(root, "#text-header").unwrap();
        let chars = stage.query(header, "char");
        assert_eq!(chars.len(), 14);
        let first = tl.starts_for(chars[0])[0];
        let last = tl.starts_for(chars[13])[0];
        assert_eq!(first, 0.0);
        assert!((last - 0.65).abs() < 1e-9);

        let vision = stage.query_one(root, "#text-vision").unwrap();
        let vision_chars = stage.query(vision, "char");
        assert!((tl.starts_for(vision_chars[0])[0] - 1.15).abs() < 1e-9);
        assert_eq!(tl.options().delay, 1.0);
    }

    #[test]
    fn mounting_hides_then_reveals_and_teardown_reverts_splits() {
        let rt = Runtime::init(SiteConfig {
            seed: Some(1),
            ..SiteConfig::default()
        })
        .unwrap();
        let root = build_scene(&mut rt.stage().borrow_mut(), None, Page::Signal);
        let before = rt.stage().borrow().len();
        let mut scope = Scope::new("signal");
        let mounted = mount(&rt, Page::Signal, root, &mut scope).unwrap();
        let Mounted::Intro(tl) = mounted else {
            panic!("signal page has an intro");
        };

        let links = rt.stage().borrow().query_one(root, "#links").unwrap();
        assert_eq!(rt.stage().borrow().value(links, Prop::Opacity), 0.0);

        let total = tl.borrow().total_duration();
        let mut t = 0.0;
        while t <= total + 0.1 {
            rt.tick(0.05);
            t += 0.05;
        }
        assert_eq!(rt.stage().borrow().value(links, Prop::Opacity), 1.0);

        scope.teardown();
        assert!(tl.borrow().is_killed());
        assert!(rt.frames().is_empty());
        assert_eq!(rt.stage().borrow().len(), before);
    }

    #[test]
    fn focus_mounts_gallery() {
        let rt = Runtime::init(SiteConfig::default()).unwrap();
        let root = build_scene(&mut rt.stage().borrow_mut(), None, Page::Focus);
        let mut scope = Scope::new("focus");
        let mounted = mount(&rt, Page::Focus, root, &mut scope).unwrap();
        assert!(matches!(mounted, Mounted::Gallery(_)));
        assert_eq!(rt.events().len(), 2);
        scope.teardown();
        assert!(rt.events().is_empty());
    }
}
