//! Ties the runtime, router, curtain, cursor and the current page together.

use std::rc::Rc;

use crate::{
    core::{Point, TargetId},
    cursor::CursorFollower,
    error::{CurtainError, CurtainResult},
    host::Event,
    lifecycle::Scope,
    pages::{self, Mounted, Page},
    runtime::Runtime,
    transitions::{Banners, MemoryRouter, NavigateOutcome, Orchestrator, Phase, Router},
};

struct View {
    page: Page,
    root: TargetId,
    scope: Scope,
    mounted: Mounted,
}

pub struct Site {
    rt: Rc<Runtime>,
    router: Rc<MemoryRouter>,
    orchestrator: Orchestrator,
    layout_root: TargetId,
    cursor: CursorFollower,
    view: Option<View>,
    layout_scope: Scope, // dropped last
}

impl Site {
    /// Builds the layout (banners and cursor) and mounts `initial`.
    #[tracing::instrument(skip(rt))]
    pub fn open(rt: Rc<Runtime>, initial: &str) -> CurtainResult<Self> {
        if !rt.config().has_route(initial) {
            return Err(CurtainError::validation(format!(
                "route '{initial}' is not configured"
            )));
        }
        let page = Page::from_route(initial)?;
        let router = MemoryRouter::new(page.route());

        let mut layout_scope = Scope::new("layout");
        let (layout_root, banners) = {
            let mut stage = rt.stage().borrow_mut();
            let root = stage.spawn(None, &["layout"]);
            let banners = Banners::spawn(&mut stage, root, rt.config().transition.columns);
            (root, banners)
        };
        let stage = Rc::downgrade(rt.stage());
        layout_scope.defer("layout-root", move || {
            if let Some(stage) = stage.upgrade() {
                stage.borrow_mut().remove(layout_root);
            }
        });
        let cursor = CursorFollower::mount(&rt, layout_root, &mut layout_scope)?;
        let orchestrator = Orchestrator::new(
            router.clone(),
            rt.config().transition.clone(),
            banners,
        );

        let mut site = Self {
            rt,
            router,
            orchestrator,
            layout_root,
            cursor,
            view: None,
            layout_scope,
        };
        site.mount(page)?;
        Ok(site)
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.rt
    }

    pub fn current_route(&self) -> String {
        self.router.current_route()
    }

    pub fn page(&self) -> Option<Page> {
        self.view.as_ref().map(|v| v.page)
    }

    pub fn view_root(&self) -> Option<TargetId> {
        self.view.as_ref().map(|v| v.root)
    }

    pub fn mounted(&self) -> Option<&Mounted> {
        self.view.as_ref().map(|v| &v.mounted)
    }

    pub fn phase(&self) -> Phase {
        self.orchestrator.phase()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn cursor(&self) -> &CursorFollower {
        &self.cursor
    }

    pub fn history(&self) -> Vec<String> {
        self.router.history()
    }

    fn mount(&mut self, page: Page) -> CurtainResult<()> {
        self.unmount();
        let root = pages::build_scene(&mut self.rt.stage().borrow_mut(), Some(self.layout_root), page);
        let mut scope = Scope::new(page.route());
        let stage = Rc::downgrade(self.rt.stage());
        scope.defer("view-root", move || {
            if let Some(stage) = stage.upgrade() {
                stage.borrow_mut().remove(root);
            }
        });
        let mounted = pages::mount(&self.rt, page, root, &mut scope)?;
        self.view = Some(View {
            page,
            root,
            scope,
            mounted,
        });
        let seed = self.rt.next_seed();
        self.orchestrator
            .content_ready(&mut self.rt.stage().borrow_mut(), seed);
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(mut view) = self.view.take() {
            view.scope.teardown();
        }
    }

    /// Starts a transition to `href`. Routes missing from the site config
    /// are refused before any curtain runs.
    pub fn navigate(&mut self, href: &str) -> NavigateOutcome {
        if !self.rt.config().has_route(href) {
            tracing::debug!(href, "route not configured; navigation refused");
            return NavigateOutcome::UnknownRoute;
        }
        let seed = self.rt.next_seed();
        self.orchestrator
            .navigate(href, &mut self.rt.stage().borrow_mut(), seed)
    }

    pub fn pointer_move(&self, p: Point) {
        self.rt.dispatch(Event::PointerMove { x: p.x, y: p.y });
    }

    pub fn pointer_enter(&self, target: TargetId) {
        self.rt.dispatch(Event::PointerEnter { target });
    }

    pub fn pointer_leave(&self, target: TargetId) {
        self.rt.dispatch(Event::PointerLeave { target });
    }

    pub fn scroll(&self, offset: f64) {
        self.rt.dispatch(Event::Scroll { offset });
    }

    /// Runs one display refresh: frame callbacks, the curtain, and the
    /// content swap if the router asked for one.
    pub fn frame(&mut self, dt: f64) {
        self.rt.tick(dt);
        self.orchestrator
            .tick(dt, &mut self.rt.stage().borrow_mut());

        if let Some(route) = self.router.take_pending() {
            self.swap_to(&route);
        }
    }

    /// Mounts the page for `route`. A failed mount still reveals, with no
    /// page, so the curtain never stays closed.
    fn swap_to(&mut self, route: &str) {
        let mounted = Page::from_route(route).and_then(|page| self.mount(page));
        if let Err(err) = mounted {
            tracing::warn!(%err, route, "content swap failed; revealing without a page");
            self.unmount();
            let seed = self.rt.next_seed();
            self.orchestrator
                .content_ready(&mut self.rt.stage().borrow_mut(), seed);
        }
    }

    /// Tears down the current view and the layout.
    pub fn close(&mut self) {
        self.unmount();
        self.orchestrator.kill();
        self.layout_scope.teardown();
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        self.close();
    }
}
