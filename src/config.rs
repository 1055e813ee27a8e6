use std::path::Path;

use crate::{
    anim_ease::Ease,
    error::{CurtainError, CurtainResult},
    pages::Page,
    stagger::{Stagger, StaggerFrom},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub routes: Vec<String>,
    pub viewport_height: f64,
    pub seed: Option<u64>, // None: a fresh seed per runtime
    pub transition: TransitionConfig,
    pub cursor: CursorConfig,
    pub gallery: GalleryConfig,
    pub intro: IntroConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            routes: ["/", "/subject", "/focus", "/signal"]
                .into_iter()
                .map(String::from)
                .collect(),
            viewport_height: 900.0,
            seed: None,
            transition: TransitionConfig::default(),
            cursor: CursorConfig::default(),
            gallery: GalleryConfig::default(),
            intro: IntroConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub ease: Ease,
    pub stagger_each: f64,
    pub stagger_from: StaggerFrom,
    pub duration: f64,
    pub columns: usize, // banners per edge
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            ease: Ease::OutExpo,
            stagger_each: 0.2,
            stagger_from: StaggerFrom::Random,
            duration: 0.5,
            columns: 4,
        }
    }
}

impl TransitionConfig {
    pub fn stagger(&self) -> Stagger {
        Stagger::each(self.stagger_each).from(self.stagger_from)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub dot_factor: f64,
    pub ring_factor: f64,
    pub dot_size: f64,
    pub dot_hover_size: f64,
    pub ring_size: f64,
    pub ring_hover_size: f64,
    pub interactive: Vec<String>, // markers that switch the cursor to hover size
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            dot_factor: 0.2,
            ring_factor: 0.1,
            dot_size: 8.0,
            dot_hover_size: 10.0,
            ring_size: 30.0,
            ring_hover_size: 40.0,
            interactive: ["link", "image", "a", "img", "span", "p"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub scrub: f64, // seconds of lag behind the scroll position; 0 snaps
    pub card_scale: f64,
    pub image_zoom: f64,
    pub pin: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            scrub: 0.5,
            card_scale: 0.5,
            image_zoom: 1.5,
            pin: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub delay: f64,
    pub char_stagger: f64,
    pub float_stagger: f64,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            delay: 1.0,
            char_stagger: 0.05,
            float_stagger: 0.5,
        }
    }
}

fn finite_non_negative(v: f64, what: &str) -> CurtainResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(CurtainError::config(format!(
            "{what} must be finite and >= 0"
        )));
    }
    Ok(())
}

fn unit_factor(v: f64, what: &str) -> CurtainResult<()> {
    if !(v > 0.0 && v <= 1.0) {
        return Err(CurtainError::config(format!("{what} must be in (0, 1]")));
    }
    Ok(())
}

impl SiteConfig {
    pub fn from_json_str(s: &str) -> CurtainResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> CurtainResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            CurtainError::config(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    pub fn has_route(&self, route: &str) -> bool {
        self.routes.iter().any(|r| r == route)
    }

    pub fn validate(&self) -> CurtainResult<()> {
        if self.routes.is_empty() {
            return Err(CurtainError::config("routes must be non-empty"));
        }
        for (i, r) in self.routes.iter().enumerate() {
            if !r.starts_with('/') {
                return Err(CurtainError::config(format!(
                    "route '{r}' must start with '/'"
                )));
            }
            if self.routes[..i].contains(r) {
                return Err(CurtainError::config(format!("duplicate route '{r}'")));
            }
            if Page::from_route(r).is_err() {
                return Err(CurtainError::config(format!("route '{r}' has no page")));
            }
        }
        if !(self.viewport_height.is_finite() && self.viewport_height > 0.0) {
            return Err(CurtainError::config("viewport_height must be > 0"));
        }

        let t = &self.transition;
        finite_non_negative(t.stagger_each, "transition.stagger_each")?;
        finite_non_negative(t.duration, "transition.duration")?;
        if t.columns == 0 {
            return Err(CurtainError::config("transition.columns must be > 0"));
        }

        let c = &self.cursor;
        unit_factor(c.dot_factor, "cursor.dot_factor")?;
        unit_factor(c.ring_factor, "cursor.ring_factor")?;
        for (v, what) in [
            (c.dot_size, "cursor.dot_size"),
            (c.dot_hover_size, "cursor.dot_hover_size"),
            (c.ring_size, "cursor.ring_size"),
            (c.ring_hover_size, "cursor.ring_hover_size"),
        ] {
            finite_non_negative(v, what)?;
        }

        let g = &self.gallery;
        finite_non_negative(g.scrub, "gallery.scrub")?;
        finite_non_negative(g.card_scale, "gallery.card_scale")?;
        finite_non_negative(g.image_zoom, "gallery.image_zoom")?;

        let i = &self.intro;
        finite_non_negative(i.delay, "intro.delay")?;
        finite_non_negative(i.char_stagger, "intro.char_stagger")?;
        finite_non_negative(i.float_stagger, "intro.float_stagger")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SiteConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = SiteConfig::from_json_str(
            r#"{ "cursor": { "ring_factor": 0.05 }, "transition": { "ease": "linear" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.cursor.ring_factor, 0.05);
        assert_eq!(cfg.cursor.dot_factor, 0.2);
        assert_eq!(cfg.transition.ease, Ease::Linear);
        assert_eq!(cfg.transition.columns, 4);
        assert_eq!(cfg.routes.len(), 4);
    }

    #[test]
    fn route_subset_is_allowed() {
        let cfg = SiteConfig::from_json_str(r#"{ "routes": ["/", "/focus"] }"#).unwrap();
        assert!(cfg.has_route("/focus"));
        assert!(!cfg.has_route("/signal"));
    }

    #[test]
    fn rejects_bad_factors_and_routes() {
        let mut cfg = SiteConfig::default();
        cfg.cursor.dot_factor = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SiteConfig::default();
        cfg.routes.push("/".to_string());
        assert!(cfg.validate().is_err());

        let mut cfg = SiteConfig::default();
        cfg.transition.columns = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SiteConfig::default();
        cfg.routes.push("/about".to_string());
        assert!(cfg.validate().is_err());

        assert!(SiteConfig::from_json_str("{ \"routes\": [] }").is_err());
        assert!(SiteConfig::from_json_str("not json").is_err());
    }
}
