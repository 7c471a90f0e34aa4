//! Pure dimension math for picture sizing.
//!
//! Nothing here touches the page; every function is a plain computation over
//! [`Extent`] values so the whole module is unit testable.

use serde::{Deserialize, Serialize};

/// Intrinsic pixel size of a picture, as encoded in its container markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Taller than wide. Square pictures count as landscape.
    pub fn is_portrait(self) -> bool {
        self.height > self.width
    }
}

/// A width/height pair in (possibly fractional) pixels.
///
/// Bounds derived from the viewport are multiplied by the device pixel ratio,
/// so they are not always whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scale both axes by the same factor.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// True if this extent is larger than `other` on either axis.
    pub fn exceeds(self, other: Extent) -> bool {
        self.width > other.width || self.height > other.height
    }
}

impl From<Dimensions> for Extent {
    fn from(dims: Dimensions) -> Self {
        Self {
            width: dims.width as f64,
            height: dims.height as f64,
        }
    }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// Two candidates are computed independently: one clamped on width, one
/// clamped on height (each unchanged if the source already fits on that
/// axis). The result takes the smaller value of the two on each axis. The
/// scaled axis is rounded half away from zero; the clamped axis keeps the
/// bound exactly. Negative bounds are treated as zero.
///
/// # Examples
/// ```
/// # use picstory::sizing::{Extent, fit_within};
/// // 1600x1200 into 980x680 → height is the tighter constraint
/// let fit = fit_within(Extent::new(1600.0, 1200.0), Extent::new(980.0, 680.0));
/// assert_eq!(fit, Extent::new(907.0, 680.0));
///
/// // Already small enough → unchanged
/// let fit = fit_within(Extent::new(300.0, 200.0), Extent::new(800.0, 600.0));
/// assert_eq!(fit, Extent::new(300.0, 200.0));
/// ```
pub fn fit_within(source: Extent, bounds: Extent) -> Extent {
    let max_width = bounds.width.max(0.0);
    let max_height = bounds.height.max(0.0);
    let Extent { width, height } = source;

    let (width_w, width_h) = if width > max_width {
        (max_width, (height * max_width / width).round())
    } else {
        (width, height)
    };

    let (height_w, height_h) = if height > max_height {
        ((width * max_height / height).round(), max_height)
    } else {
        (width, height)
    };

    Extent {
        width: width_w.min(height_w),
        height: width_h.min(height_h),
    }
}
