#![forbid(unsafe_code)]

pub mod anim;
pub mod anim_ease;
pub mod config;
pub mod core;
pub mod cursor;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod pages;
pub mod runtime;
pub mod scroll;
pub mod site;
pub mod stage;
pub mod stagger;
pub mod timeline;
pub mod transitions;

pub use anim::{Lerp, PropMap, Tween, TweenSpec};
pub use anim_ease::Ease;
pub use config::{CursorConfig, GalleryConfig, IntroConfig, SiteConfig, TransitionConfig};
pub use core::{Point, Prop, TargetId, Vec2};
pub use cursor::{CursorFollower, CursorFrame, Follower, PointerState};
pub use error::{CurtainError, CurtainResult};
pub use host::{Event, EventBus, EventKind, FrameLoop};
pub use lifecycle::{Disposer, Scope};
pub use pages::{Mounted, Page};
pub use runtime::Runtime;
pub use scroll::{ScrollBinding, ScrollRange, ScrollTimeline};
pub use site::Site;
pub use stage::{Split, SplitKind, Stage};
pub use stagger::{Stagger, StaggerFrom};
pub use timeline::{PlayState, Position, ScheduleEntry, Timeline, TimelineOptions};
pub use transitions::{
    Banners, MemoryRouter, NavigateOutcome, Orchestrator, Phase, Router, TransitionSession,
};
