//! The fixed ladder of pre-rendered picture widths and the selection rule.
//!
//! Each tier is served as a separate file whose name ends in `w<tier>.<ext>`.
//! A tier's *footprint* is the box it was rendered into: `tier` pixels wide
//! and `tier * 3/4` high by default, landscape regardless of the picture's
//! own orientation.

use super::calculations::{Extent, fit_within};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TierError {
    #[error("tier sizes must be non-zero")]
    Zero,
    #[error("tier sizes must be strictly descending ({larger} is followed by {smaller})")]
    NotDescending { larger: u32, smaller: u32 },
    #[error("footprint ratio values must be non-zero")]
    ZeroRatio,
}

/// One rendered width, e.g. `Tier(800)` for `...w800.jpg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(u32);

impl Tier {
    pub fn new(width: u32) -> Self {
        Self(width)
    }

    pub fn width(self) -> u32 {
        self.0
    }

    /// Filename suffix identifying this tier, e.g. `w600.jpg`.
    pub fn file_suffix(self, extension: &str) -> String {
        format!("w{}.{}", self.0, extension)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Ordered tiers, largest first.
///
/// An empty list is valid and selects nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TierList {
    tiers: Vec<Tier>,
    /// Footprint box as `(width, height)` ratio.
    footprint_ratio: (u32, u32),
}

impl TierList {
    /// Build a list from pixel widths, largest first.
    pub fn new(sizes: &[u32], footprint_ratio: (u32, u32)) -> Result<Self, TierError> {
        if footprint_ratio.0 == 0 || footprint_ratio.1 == 0 {
            return Err(TierError::ZeroRatio);
        }
        if sizes.contains(&0) {
            return Err(TierError::Zero);
        }
        if let Some(pair) = sizes.windows(2).find(|pair| pair[0] <= pair[1]) {
            return Err(TierError::NotDescending {
                larger: pair[0],
                smaller: pair[1],
            });
        }
        Ok(Self {
            tiers: sizes.iter().copied().map(Tier).collect(),
            footprint_ratio,
        })
    }

    pub fn largest(&self) -> Option<Tier> {
        self.tiers.first().copied()
    }

    pub fn smallest(&self) -> Option<Tier> {
        self.tiers.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The box a tier was rendered into.
    pub fn footprint(&self, tier: Tier) -> Extent {
        let (ratio_w, ratio_h) = self.footprint_ratio;
        let width = tier.0 as f64;
        Extent::new(width, width * ratio_h as f64 / ratio_w as f64)
    }

    /// Pick the smallest tier that still covers `desired`.
    ///
    /// Walks from the largest tier down to the second-smallest. At each step
    /// the *next smaller* tier's footprint is fitted around the picture; if
    /// `desired` is bigger than that on either axis, the current tier is the
    /// answer. If no step matches, the smallest tier is returned. Ties go to
    /// the smaller tier only when it covers `desired` exactly.
    pub fn select(&self, intrinsic: Extent, desired: Extent) -> Option<Tier> {
        let smallest = self.smallest()?;
        self.tiers
            .windows(2)
            .find(|pair| {
                let next_smaller = fit_within(intrinsic, self.footprint(pair[1]));
                desired.exceeds(next_smaller)
            })
            .map(|pair| pair[0])
            .or(Some(smallest))
    }
}

impl Default for TierList {
    fn default() -> Self {
        Self {
            tiers: [800, 600, 400, 300, 200].into_iter().map(Tier).collect(),
            footprint_ratio: (4, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDSCAPE: Extent = Extent {
        width: 1600.0,
        height: 1200.0,
    };

    fn widths(list: &TierList) -> Vec<u32> {
        list.iter().map(Tier::width).collect()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn default_list_matches_served_tiers() {
        let list = TierList::default();
        assert_eq!(widths(&list), vec![800, 600, 400, 300, 200]);
        assert_eq!(list.largest(), Some(Tier::new(800)));
        assert_eq!(list.smallest(), Some(Tier::new(200)));
    }

    #[test]
    fn new_rejects_ascending_sizes() {
        let err = TierList::new(&[200, 400], (4, 3)).unwrap_err();
        assert_eq!(
            err,
            TierError::NotDescending {
                larger: 200,
                smaller: 400
            }
        );
    }

    #[test]
    fn new_rejects_duplicates() {
        assert!(TierList::new(&[800, 800, 400], (4, 3)).is_err());
    }

    #[test]
    fn new_rejects_zero_and_zero_ratio() {
        assert_eq!(TierList::new(&[800, 0], (4, 3)), Err(TierError::Zero));
        assert_eq!(TierList::new(&[800], (0, 3)), Err(TierError::ZeroRatio));
    }

    #[test]
    fn footprint_is_four_by_three() {
        let list = TierList::default();
        assert_eq!(list.footprint(Tier::new(800)), Extent::new(800.0, 600.0));
        assert_eq!(list.footprint(Tier::new(200)), Extent::new(200.0, 150.0));
    }

    #[test]
    fn tier_suffix_and_display() {
        assert_eq!(Tier::new(600).file_suffix("jpg"), "w600.jpg");
        assert_eq!(Tier::new(600).to_string(), "w600");
    }

    // =========================================================================
    // Selection
    // =========================================================================

    #[test]
    fn select_large_desire_clamps_to_largest() {
        let list = TierList::default();
        let tier = list.select(LANDSCAPE, Extent::new(907.0, 680.0));
        assert_eq!(tier, Some(Tier::new(800)));
    }

    #[test]
    fn select_picks_smallest_covering_tier() {
        // 480x360 is bigger than w400's 400x300 but fits in w600's 600x450
        let list = TierList::default();
        let tier = list.select(LANDSCAPE, Extent::new(480.0, 360.0));
        assert_eq!(tier, Some(Tier::new(600)));
    }

    #[test]
    fn select_exact_footprint_prefers_smaller() {
        // Exactly w400's footprint is covered by w400
        let list = TierList::default();
        let tier = list.select(LANDSCAPE, Extent::new(400.0, 300.0));
        assert_eq!(tier, Some(Tier::new(400)));
    }

    #[test]
    fn select_tiny_desire_falls_back_to_smallest() {
        let list = TierList::default();
        assert_eq!(list.select(LANDSCAPE, Extent::new(50.0, 37.0)), Some(Tier::new(200)));
        assert_eq!(list.select(LANDSCAPE, Extent::new(0.0, 0.0)), Some(Tier::new(200)));
    }

    #[test]
    fn select_portrait_uses_landscape_footprints() {
        // 1200x1600 fitted to w600's 600x450 box is exactly 338x450, while
        // w400's 400x300 box only gives 225x300
        let list = TierList::default();
        let portrait = Extent::new(1200.0, 1600.0);
        assert_eq!(list.select(portrait, Extent::new(338.0, 450.0)), Some(Tier::new(600)));
    }

    #[test]
    fn select_empty_list_selects_nothing() {
        let list = TierList::new(&[], (4, 3)).unwrap();
        assert_eq!(list.select(LANDSCAPE, Extent::new(500.0, 500.0)), None);
    }

    #[test]
    fn select_single_tier_always_returns_it() {
        let list = TierList::new(&[800], (4, 3)).unwrap();
        assert_eq!(list.select(LANDSCAPE, Extent::new(1.0, 1.0)), Some(Tier::new(800)));
        assert_eq!(list.select(LANDSCAPE, Extent::new(5000.0, 5000.0)), Some(Tier::new(800)));
    }

    #[test]
    fn select_is_monotonic_in_desired_size() {
        let list = TierList::default();
        for intrinsic in [LANDSCAPE, Extent::new(1200.0, 1600.0), Extent::new(500.0, 400.0)] {
            let mut previous = Tier::new(0);
            for step in 0..200 {
                let side = step as f64 * 5.0;
                let desired = fit_within(intrinsic, Extent::new(side, side * 0.7));
                let tier = list.select(intrinsic, desired).unwrap();
                assert!(tier >= previous, "{intrinsic:?} at {side} dropped to {tier}");
                previous = tier;
            }
        }
    }
}
