//! The story controller: owns the picture table and reacts to resizes.
//!
//! ## States
//!
//! ```text
//!            start (story page)             stop
//!   Idle ─────────────────────────► Polling ─────► Idle
//!     │  start (other page): Inert
//! ```
//!
//! `start` discovers pictures and evaluates once as if the viewport had just
//! changed. While polling, each [`StoryController::poll`] compares the
//! viewport with the last snapshot and re-evaluates only when the width or
//! height moved.
//!
//! ## Evaluation
//!
//! For every picture: fit it into the padded viewport (× pixel ratio), pick a
//! tier, and rewrite the image `src` if that tier is larger than what is
//! already loaded. Smaller tiers are never loaded over larger ones. Every
//! image also gets `max-height` set to the padded viewport height; width is
//! left to the stylesheet.

use crate::config::{LoaderConfig, PageConfig, ViewportConfig};
use crate::discovery::{Discovery, PictureDescriptor, discover};
use crate::markup::{has_class, tier_url};
use crate::page::{Document, NodeId};
use crate::sizing::{Extent, Tier, TierError, TierList, Viewport, plan};
use serde::Serialize;
use std::cell::Cell;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Where the page reports its size from.
///
/// Either value may be missing (no window, headless embedding); the
/// controller then falls back to the configured viewport and ratio 1.
pub trait ViewportSource {
    /// Inner width and height in CSS pixels.
    fn inner_size(&self) -> Option<(u32, u32)>;

    fn device_pixel_ratio(&self) -> Option<f64>;
}

/// A viewport that reports whatever it was last set to.
#[derive(Debug, Default)]
pub struct FixedViewport {
    size: Cell<Option<(u32, u32)>>,
    pixel_ratio: Cell<Option<f64>>,
}

impl FixedViewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            size: Cell::new(Some((width, height))),
            pixel_ratio: Cell::new(Some(pixel_ratio)),
        }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set(Some((width, height)));
    }

    pub fn set_pixel_ratio(&self, pixel_ratio: f64) {
        self.pixel_ratio.set(Some(pixel_ratio));
    }
}

impl ViewportSource for FixedViewport {
    fn inner_size(&self) -> Option<(u32, u32)> {
        self.size.get()
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        self.pixel_ratio.get()
    }
}

/// Read the viewport, filling gaps from config.
///
/// A zero width counts as no signal.
pub fn observe<S: ViewportSource + ?Sized>(source: &S, config: &ViewportConfig) -> Viewport {
    let [fallback_w, fallback_h] = config.fallback;
    let (width, height) = source
        .inner_size()
        .filter(|&(width, _)| width > 0)
        .unwrap_or((fallback_w, fallback_h));
    let pixel_ratio = source
        .device_pixel_ratio()
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0);
    Viewport::new(width, height, pixel_ratio)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    Idle,
    Polling,
}

/// One image moving to a larger tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upgrade {
    pub image: NodeId,
    pub from: Option<Tier>,
    pub to: Tier,
    pub src: String,
    /// Device pixels the picture is drawn at.
    pub desired: Extent,
}

/// What one evaluation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub viewport: Viewport,
    /// Value written to every image's `max-height`, in CSS px.
    pub max_height: u32,
    pub upgrades: Vec<Upgrade>,
}

/// Outcome of [`StoryController::start`].
#[derive(Debug)]
pub enum Activation {
    /// Story page: pictures discovered, first evaluation done.
    Started {
        discovery: Discovery,
        evaluation: Evaluation,
    },
    /// Not a story page; nothing was touched.
    Inert,
    /// Already polling; nothing was repeated.
    AlreadyRunning,
}

/// Owns every piece of loader state for one page.
#[derive(Debug)]
pub struct StoryController {
    tiers: TierList,
    viewport: ViewportConfig,
    page: PageConfig,
    pictures: BTreeMap<NodeId, PictureDescriptor>,
    last_viewport: Option<Viewport>,
    state: PollState,
}

impl StoryController {
    pub fn new(config: &LoaderConfig) -> Result<Self, TierError> {
        Ok(Self::with_tiers(
            config.tier_list()?,
            config.viewport.clone(),
            config.page.clone(),
        ))
    }

    pub fn with_tiers(tiers: TierList, viewport: ViewportConfig, page: PageConfig) -> Self {
        Self {
            tiers,
            viewport,
            page,
            pictures: BTreeMap::new(),
            last_viewport: None,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    pub fn picture(&self, image: NodeId) -> Option<&PictureDescriptor> {
        self.pictures.get(&image)
    }

    /// Live images and their descriptors, in creation order.
    pub fn pictures(&self) -> impl Iterator<Item = (NodeId, &PictureDescriptor)> {
        self.pictures.iter().map(|(&image, picture)| (image, picture))
    }

    /// Page-ready hook: discover, evaluate once, start polling.
    pub fn start<D, S>(&mut self, doc: &mut D, source: &S) -> Activation
    where
        D: Document + ?Sized,
        S: ViewportSource + ?Sized,
    {
        if self.state == PollState::Polling {
            return Activation::AlreadyRunning;
        }
        if !has_class(&doc.root_class(), &self.page.story_class) {
            debug!(story_class = %self.page.story_class, "not a story page");
            return Activation::Inert;
        }

        let suffix = self
            .tiers
            .largest()
            .map(|tier| tier.file_suffix(&self.page.image_extension));
        let discovery = discover(doc, suffix.as_deref());
        self.pictures.extend(
            discovery
                .pictures
                .iter()
                .map(|(&image, picture)| (image, picture.clone())),
        );
        info!(
            pictures = discovery.pictures.len(),
            skipped = discovery.skipped.len(),
            "story loader started"
        );

        let evaluation = self.size_changed(doc, source);
        self.state = PollState::Polling;
        Activation::Started {
            discovery,
            evaluation,
        }
    }

    /// Timer hook: re-evaluate if the viewport size changed.
    ///
    /// Does nothing unless polling.
    pub fn poll<D, S>(&mut self, doc: &mut D, source: &S) -> Option<Evaluation>
    where
        D: Document + ?Sized,
        S: ViewportSource + ?Sized,
    {
        if self.state != PollState::Polling {
            return None;
        }
        let viewport = observe(source, &self.viewport);
        if self
            .last_viewport
            .is_some_and(|last| last.same_size(&viewport))
        {
            return None;
        }
        Some(self.evaluate(doc, viewport))
    }

    /// Re-evaluate unconditionally at the current viewport.
    pub fn size_changed<D, S>(&mut self, doc: &mut D, source: &S) -> Evaluation
    where
        D: Document + ?Sized,
        S: ViewportSource + ?Sized,
    {
        let viewport = observe(source, &self.viewport);
        self.evaluate(doc, viewport)
    }

    /// Stop reacting to ticks. Pictures keep whatever they have loaded.
    pub fn stop(&mut self) {
        if self.state == PollState::Polling {
            info!("story loader stopped");
        }
        self.state = PollState::Idle;
    }

    fn evaluate<D: Document + ?Sized>(&mut self, doc: &mut D, viewport: Viewport) -> Evaluation {
        self.last_viewport = Some(viewport);
        let padding = self.viewport.padding;
        let (_, max_height) = viewport.available(padding);
        let max_height_css = format!("{max_height}px");
        let largest = self.tiers.largest();
        let extension = self.page.image_extension.as_str();

        let mut upgrades = Vec::new();
        for (&image, picture) in self.pictures.iter_mut() {
            let larger = plan(picture.dimensions, &viewport, padding, &self.tiers)
                .filter(|selection| picture.loaded.is_none_or(|loaded| loaded < selection.tier));
            if let Some(selection) = larger {
                let src = largest
                    .and_then(|largest| {
                        tier_url(&picture.base_url, largest, selection.tier, extension)
                    })
                    .unwrap_or_else(|| picture.base_url.clone());
                match doc.set_attribute(image, "src", &src) {
                    Ok(()) => {
                        debug!(
                            %image,
                            from = ?picture.loaded,
                            to = %selection.tier,
                            %src,
                            "loading larger picture"
                        );
                        upgrades.push(Upgrade {
                            image,
                            from: picture.loaded,
                            to: selection.tier,
                            src,
                            desired: selection.desired,
                        });
                        picture.loaded = Some(selection.tier);
                    }
                    Err(e) => warn!(%image, error = %e, "could not update picture source"),
                }
            }

            if let Err(e) = doc.set_style(image, "max-height", &max_height_css) {
                warn!(%image, error = %e, "could not update picture height");
            }
        }

        Evaluation {
            viewport,
            max_height,
            upgrades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageTree;
    use crate::test_helpers::{find_picture, story_tree};

    fn controller() -> StoryController {
        StoryController::new(&LoaderConfig::default()).unwrap()
    }

    fn started(viewport: &FixedViewport) -> (StoryController, PageTree) {
        let mut tree = story_tree();
        let mut controller = controller();
        let activation = controller.start(&mut tree, viewport);
        assert!(matches!(activation, Activation::Started { .. }));
        (controller, tree)
    }

    // =========================================================================
    // Viewport observation
    // =========================================================================

    #[test]
    fn observe_falls_back_without_signal() {
        let source = FixedViewport::default();
        let viewport = observe(&source, &ViewportConfig::default());
        assert_eq!(viewport, Viewport::new(800, 600, 1.0));
    }

    #[test]
    fn observe_treats_zero_width_as_missing() {
        let source = FixedViewport::new(0, 500, 2.0);
        let viewport = observe(&source, &ViewportConfig::default());
        assert_eq!((viewport.width, viewport.height), (800, 600));
        assert_eq!(viewport.pixel_ratio, 2.0);
    }

    #[test]
    fn observe_ignores_nonsense_pixel_ratio() {
        let source = FixedViewport::new(1000, 700, f64::NAN);
        assert_eq!(observe(&source, &ViewportConfig::default()).pixel_ratio, 1.0);
        source.set_pixel_ratio(-2.0);
        assert_eq!(observe(&source, &ViewportConfig::default()).pixel_ratio, 1.0);
    }

    // =========================================================================
    // start
    // =========================================================================

    #[test]
    fn start_on_other_page_is_inert() {
        let mut tree = PageTree::new("index");
        let mut controller = controller();
        let activation = controller.start(&mut tree, &FixedViewport::new(1000, 700, 1.0));
        assert!(matches!(activation, Activation::Inert));
        assert_eq!(controller.state(), PollState::Idle);
        assert!(controller.poll(&mut tree, &FixedViewport::new(500, 400, 1.0)).is_none());
    }

    #[test]
    fn start_evaluates_immediately() {
        let viewport = FixedViewport::new(1000, 700, 1.0);
        let mut tree = story_tree();
        let mut controller = controller();

        let Activation::Started {
            discovery,
            evaluation,
        } = controller.start(&mut tree, &viewport)
        else {
            panic!("expected a started loader");
        };

        assert_eq!(discovery.pictures.len(), 3);
        assert_eq!(evaluation.upgrades.len(), 3);
        assert_eq!(evaluation.max_height, 680);
        assert_eq!(controller.state(), PollState::Polling);

        let harbour = find_picture(&controller, &tree, "pic0");
        assert_eq!(
            tree.attribute(harbour, "src").as_deref(),
            Some("/stories/harbour/harbour.1a2b3c4d.w800.jpg")
        );
        assert_eq!(tree.style(harbour, "max-height"), Some("680px"));
    }

    #[test]
    fn start_twice_does_not_rediscover() {
        let viewport = FixedViewport::new(1000, 700, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        assert!(matches!(
            controller.start(&mut tree, &viewport),
            Activation::AlreadyRunning
        ));
        assert_eq!(controller.pictures().count(), 3);
    }

    #[test]
    fn start_with_empty_story_is_noop() {
        let mut tree = PageTree::new("story");
        let mut controller = controller();
        let Activation::Started { evaluation, .. } =
            controller.start(&mut tree, &FixedViewport::new(1000, 700, 1.0))
        else {
            panic!("expected a started loader");
        };
        assert!(evaluation.upgrades.is_empty());
    }

    // =========================================================================
    // Tier selection through the page
    // =========================================================================

    #[test]
    fn small_viewport_loads_smallest_covering_tier() {
        let (controller, tree) = started(&FixedViewport::new(500, 400, 1.0));
        let harbour = find_picture(&controller, &tree, "pic0");
        assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(600)));
        assert_eq!(
            tree.attribute(harbour, "src").as_deref(),
            Some("/stories/harbour/harbour.1a2b3c4d.w600.jpg")
        );
    }

    #[test]
    fn growing_viewport_upgrades() {
        let viewport = FixedViewport::new(320, 240, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        let harbour = find_picture(&controller, &tree, "pic0");
        assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(300)));

        viewport.set_size(1000, 700);
        let evaluation = controller.poll(&mut tree, &viewport).unwrap();
        let upgrade = evaluation
            .upgrades
            .iter()
            .find(|u| u.image == harbour)
            .unwrap();
        assert_eq!(upgrade.from, Some(Tier::new(300)));
        assert_eq!(upgrade.to, Tier::new(800));
        assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(800)));
    }

    #[test]
    fn shrinking_never_downgrades() {
        let viewport = FixedViewport::new(1000, 700, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        let harbour = find_picture(&controller, &tree, "pic0");

        for (w, h) in [(500, 400), (320, 240), (100, 100)] {
            viewport.set_size(w, h);
            let evaluation = controller.poll(&mut tree, &viewport).unwrap();
            assert!(evaluation.upgrades.is_empty());
            assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(800)));
        }
        assert_eq!(
            tree.attribute(harbour, "src").as_deref(),
            Some("/stories/harbour/harbour.1a2b3c4d.w800.jpg")
        );
        // Height still tracks the viewport
        assert_eq!(tree.style(harbour, "max-height"), Some("80px"));
    }

    #[test]
    fn shrink_and_grow_back_fetches_nothing() {
        let viewport = FixedViewport::new(500, 400, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        let harbour = find_picture(&controller, &tree, "pic0");
        let src_before = tree.attribute(harbour, "src");

        viewport.set_size(450, 360);
        assert!(controller.poll(&mut tree, &viewport).unwrap().upgrades.is_empty());
        viewport.set_size(500, 400);
        assert!(controller.poll(&mut tree, &viewport).unwrap().upgrades.is_empty());

        assert_eq!(tree.attribute(harbour, "src"), src_before);
    }

    #[test]
    fn pixel_ratio_selects_larger_tier() {
        let (controller, tree) = started(&FixedViewport::new(320, 240, 2.0));
        let harbour = find_picture(&controller, &tree, "pic0");
        assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(600)));
    }

    // =========================================================================
    // Polling
    // =========================================================================

    #[test]
    fn poll_without_change_does_nothing() {
        let viewport = FixedViewport::new(1000, 700, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        assert!(controller.poll(&mut tree, &viewport).is_none());
    }

    #[test]
    fn poll_ignores_pixel_ratio_only_change() {
        let viewport = FixedViewport::new(500, 400, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        viewport.set_pixel_ratio(2.0);
        assert!(controller.poll(&mut tree, &viewport).is_none());
    }

    #[test]
    fn poll_reacts_to_height_only_change() {
        let viewport = FixedViewport::new(1000, 700, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        viewport.set_size(1000, 701);
        let evaluation = controller.poll(&mut tree, &viewport).unwrap();
        assert_eq!(evaluation.max_height, 681);
    }

    #[test]
    fn stopped_controller_ignores_polls() {
        let viewport = FixedViewport::new(320, 240, 1.0);
        let (mut controller, mut tree) = started(&viewport);
        controller.stop();
        assert_eq!(controller.state(), PollState::Idle);

        viewport.set_size(1000, 700);
        assert!(controller.poll(&mut tree, &viewport).is_none());
        let harbour = find_picture(&controller, &tree, "pic0");
        assert_eq!(controller.picture(harbour).unwrap().loaded, Some(Tier::new(300)));
    }

    #[test]
    fn missing_viewport_uses_fallback() {
        let mut tree = story_tree();
        let mut controller = controller();
        let Activation::Started { evaluation, .. } =
            controller.start(&mut tree, &FixedViewport::default())
        else {
            panic!("expected a started loader");
        };
        assert_eq!(evaluation.viewport, Viewport::new(800, 600, 1.0));
        assert_eq!(evaluation.max_height, 580);
    }

    #[test]
    fn empty_tier_list_only_sets_height() {
        let tiers = TierList::new(&[], (4, 3)).unwrap();
        let mut controller =
            StoryController::with_tiers(tiers, ViewportConfig::default(), PageConfig::default());
        let mut tree = story_tree();
        let viewport = FixedViewport::new(1000, 700, 1.0);

        let Activation::Started {
            discovery,
            evaluation,
        } = controller.start(&mut tree, &viewport)
        else {
            panic!("expected a started loader");
        };
        assert_eq!(discovery.pictures.len(), 3);
        assert!(evaluation.upgrades.is_empty());

        viewport.set_size(500, 400);
        let evaluation = controller.poll(&mut tree, &viewport).unwrap();
        assert!(evaluation.upgrades.is_empty());

        for (image, picture) in controller.pictures() {
            assert_eq!(picture.loaded, None);
            assert_eq!(tree.attribute(image, "src"), None);
            assert_eq!(tree.style(image, "max-height"), Some("380px"));
        }
    }

    #[test]
    fn oversized_padding_clamps_to_zero() {
        let viewport_config = ViewportConfig {
            padding: 3_000_000_000,
            ..ViewportConfig::default()
        };
        let mut controller = StoryController::with_tiers(
            TierList::default(),
            viewport_config,
            PageConfig::default(),
        );
        let mut tree = story_tree();
        let Activation::Started { evaluation, .. } =
            controller.start(&mut tree, &FixedViewport::new(1000, 700, 1.0))
        else {
            panic!("expected a started loader");
        };
        assert_eq!(evaluation.max_height, 0);
        assert!(evaluation.upgrades.iter().all(|u| u.to == Tier::new(200)));
    }

    #[test]
    fn foreign_url_is_left_as_is() {
        let mut tree = PageTree::new("story");
        crate::test_helpers::add_picture(&mut tree, "pic size1600x1200", Some("plain.png"));
        let mut controller = controller();
        controller.start(&mut tree, &FixedViewport::new(500, 400, 1.0));

        let (image, picture) = controller.pictures().next().unwrap();
        assert_eq!(picture.loaded, Some(Tier::new(600)));
        assert_eq!(tree.attribute(image, "src").as_deref(), Some("plain.png"));
    }
}
