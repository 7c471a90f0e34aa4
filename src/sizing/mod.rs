//! Picture sizing: which tier to load for a given viewport.
//!
//! | Step | Function |
//! |---|---|
//! | **Available area** | [`Viewport::available`] (viewport minus padding) |
//! | **Desired size** | [`fit_within`] of the picture into the area × pixel ratio |
//! | **Tier** | [`TierList::select`], the smallest tier still covering the desired size |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math
//! - **Tiers**: the rendered-width ladder and the selection rule
//!
//! [`plan`] chains the three steps and is what the controller and the
//! `select` command call.

mod calculations;
mod tiers;

pub use calculations::{Dimensions, Extent, fit_within};
pub use tiers::{Tier, TierError, TierList};

use serde::Serialize;

/// Observed viewport in CSS pixels, with the device pixel ratio it was
/// observed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Same width and height. Pixel ratio is not part of change detection.
    pub fn same_size(&self, other: &Viewport) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// CSS pixels left for a picture after `padding` on every side.
    pub fn available(&self, padding: u32) -> (u32, u32) {
        (
            self.width.saturating_sub(padding.saturating_mul(2)),
            self.height.saturating_sub(padding.saturating_mul(2)),
        )
    }
}

/// Outcome of sizing one picture for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Selection {
    /// Device pixels the picture will be drawn at.
    pub desired: Extent,
    pub tier: Tier,
}

/// Size a picture for a viewport and choose its tier.
///
/// Returns `None` only when `tiers` is empty.
pub fn plan(
    intrinsic: Dimensions,
    viewport: &Viewport,
    padding: u32,
    tiers: &TierList,
) -> Option<Selection> {
    let (width, height) = viewport.available(padding);
    let bounds = Extent::new(width as f64, height as f64).scale(viewport.pixel_ratio);
    let intrinsic = Extent::from(intrinsic);
    let desired = fit_within(intrinsic, bounds);
    tiers
        .select(intrinsic, desired)
        .map(|tier| Selection { desired, tier })
}
