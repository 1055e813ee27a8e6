use crate::error::{CurtainError, CurtainResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    #[default]
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    OutExpo,
    InOutExpo,
}

impl Ease {
    pub const ALL: [Ease; 9] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
        Ease::InOutCubic,
        Ease::OutExpo,
        Ease::InOutExpo,
    ];

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::OutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::InOutExpo => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }

    /// Accepts both snake_case names and the dotted `family.direction` names
    /// common in web animation engines (`expo.out`, `power1.out`, `none`).
    pub fn parse(name: &str) -> CurtainResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        let ease = match key.as_str() {
            "linear" | "none" => Self::Linear,
            "in_quad" | "power1.in" | "quad.in" => Self::InQuad,
            "out_quad" | "power1.out" | "quad.out" | "power1" => Self::OutQuad,
            "in_out_quad" | "power1.inout" | "quad.inout" => Self::InOutQuad,
            "in_cubic" | "power2.in" | "cubic.in" => Self::InCubic,
            "out_cubic" | "power2.out" | "cubic.out" | "power2" => Self::OutCubic,
            "in_out_cubic" | "power2.inout" | "cubic.inout" => Self::InOutCubic,
            "out_expo" | "expo.out" | "expo" => Self::OutExpo,
            "in_out_expo" | "expo.inout" => Self::InOutExpo,
            "" => return Err(CurtainError::validation("ease name must be non-empty")),
            other => {
                return Err(CurtainError::validation(format!(
                    "unknown ease '{other}'"
                )));
            }
        };
        Ok(ease)
    }
}
