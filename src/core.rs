pub use kurbo::{Point, Vec2};

/// Handle to a visual target living on the [`crate::stage::Stage`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TargetId(pub u64);

/// Animatable visual property of a target.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    X,
    Y,
    XPercent,
    YPercent,
    Scale,
    Opacity,
    Width,
    Height,
}

impl Prop {
    /// Value a target reports for a property nobody has written yet.
    pub fn natural(self) -> f64 {
        match self {
            Self::Scale | Self::Opacity => 1.0,
            Self::X | Self::Y | Self::XPercent | Self::YPercent | Self::Width | Self::Height => 0.0,
        }
    }
}

/// SplitMix64 step. Drives every seeded permutation in the crate.
pub fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fisher-Yates permutation of `0..n` driven by `seed`.
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut out: Vec<usize> = (0..n).collect();
    let mut state = seed;
    for i in (1..n).rev() {
        state = mix64(state);
        let j = (state % (i as u64 + 1)) as usize;
        out.swap(i, j);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_permutation() {
        for seed in [0u64, 1, 42, u64::MAX] {
            let mut p = permutation(9, seed);
            p.sort_unstable();
            assert_eq!(p, (0..9).collect::<Vec<_>>());
        }
    }

    #[test]
    fn permutation_is_deterministic_per_seed() {
        assert_eq!(permutation(16, 7), permutation(16, 7));
        assert_ne!(permutation(16, 7), permutation(16, 8));
    }

    #[test]
    fn natural_defaults() {
        assert_eq!(Prop::Opacity.natural(), 1.0);
        assert_eq!(Prop::Scale.natural(), 1.0);
        assert_eq!(Prop::YPercent.natural(), 0.0);
    }
}
