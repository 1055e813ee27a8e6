use crate::{
    core::permutation,
    error::{CurtainError, CurtainResult},
};

/// Where the stagger wave starts within a target collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaggerFrom {
    #[default]
    Start,
    End,
    Center,
    Edges,
    Random,
}

impl StaggerFrom {
    pub fn parse(name: &str) -> CurtainResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" | "first" => Ok(Self::Start),
            "end" | "last" => Ok(Self::End),
            "center" => Ok(Self::Center),
            "edges" => Ok(Self::Edges),
            "random" => Ok(Self::Random),
            other => Err(CurtainError::validation(format!(
                "unknown stagger origin '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stagger {
    pub each: f64, // seconds between consecutive starts
    #[serde(default)]
    pub from: StaggerFrom,
}

impl Stagger {
    pub fn each(each: f64) -> Self {
        Self {
            each,
            from: StaggerFrom::Start,
        }
    }

    pub fn random(each: f64) -> Self {
        Self {
            each,
            from: StaggerFrom::Random,
        }
    }

    pub fn from(mut self, from: StaggerFrom) -> Self {
        self.from = from;
        self
    }

    pub fn validate(&self) -> CurtainResult<()> {
        if !self.each.is_finite() || self.each < 0.0 {
            return Err(CurtainError::animation(
                "stagger each must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Start offset (seconds) for each of `n` targets, indexed by input
    /// position. `seed` only matters for [`StaggerFrom::Random`]; the caller
    /// computes offsets once per run so the order never changes mid-play.
    pub fn offsets(&self, n: usize, seed: u64) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        let ranks: Vec<f64> = match self.from {
            StaggerFrom::Start => (0..n).map(|i| i as f64).collect(),
            StaggerFrom::End => (0..n).map(|i| (n - 1 - i) as f64).collect(),
            StaggerFrom::Center | StaggerFrom::Edges => {
                let mid = (n - 1) as f64 / 2.0;
                let dist: Vec<f64> = (0..n).map(|i| (i as f64 - mid).abs()).collect();
                let min = dist.iter().copied().fold(f64::INFINITY, f64::min);
                let max = dist.iter().copied().fold(0.0, f64::max);
                if self.from == StaggerFrom::Center {
                    dist.iter().map(|d| d - min).collect()
                } else {
                    dist.iter().map(|d| max - d).collect()
                }
            }
            StaggerFrom::Random => {
                let order = permutation(n, seed);
                let mut ranks = vec![0.0; n];
                for (slot, target) in order.into_iter().enumerate() {
                    ranks[target] = slot as f64;
                }
                ranks
            }
        };
        ranks.into_iter().map(|r| r * self.each).collect()
    }

    /// Delay of the last target to start.
    pub fn span(&self, n: usize, seed: u64) -> f64 {
        self.offsets(n, seed)
            .into_iter()
            .fold(0.0, f64::max)
    }
}
