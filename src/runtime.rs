use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    config::SiteConfig,
    core::mix64,
    error::CurtainResult,
    host::{Event, EventBus, FrameLoop},
    stage::Stage,
};

/// Handle created once at startup and passed to every component that
/// animates, listens or schedules frames.
pub struct Runtime {
    config: SiteConfig,
    stage: Rc<RefCell<Stage>>,
    frames: Rc<FrameLoop>,
    events: Rc<EventBus>,
    viewport_height: Cell<f64>,
    seed: Cell<u64>,
}

impl Runtime {
    #[tracing::instrument(skip(config))]
    pub fn init(config: SiteConfig) -> CurtainResult<Rc<Self>> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        });
        tracing::debug!(seed, "runtime initialised");
        Ok(Rc::new(Self {
            viewport_height: Cell::new(config.viewport_height),
            config,
            stage: Rc::new(RefCell::new(Stage::new())),
            frames: FrameLoop::new(),
            events: EventBus::new(),
            seed: Cell::new(seed),
        }))
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn stage(&self) -> &Rc<RefCell<Stage>> {
        &self.stage
    }

    pub fn frames(&self) -> &Rc<FrameLoop> {
        &self.frames
    }

    pub fn events(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height.get()
    }

    /// Updates the viewport and notifies resize listeners.
    pub fn resize(&self, viewport_height: f64) {
        if !(viewport_height.is_finite() && viewport_height > 0.0) {
            tracing::debug!(viewport_height, "ignoring invalid viewport height");
            return;
        }
        self.viewport_height.set(viewport_height);
        self.events.dispatch(&Event::Resize { viewport_height });
    }

    /// Fresh seed for one animation run (random stagger orders).
    pub fn next_seed(&self) -> u64 {
        let s = mix64(self.seed.get());
        self.seed.set(s);
        s
    }

    pub fn dispatch(&self, event: Event) {
        self.events.dispatch(&event);
    }

    pub fn tick(&self, dt: f64) {
        self.frames.tick(dt);
    }
}
