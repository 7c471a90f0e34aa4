//! Replaying a window's size history against a story page.
//!
//! The page is built from the story, the controller starts at the first
//! viewport and every later viewport is applied as one poll. The result
//! records which tier each picture loaded and when.

use crate::config::LoaderConfig;
use crate::controller::{Activation, Evaluation, FixedViewport, StoryController};
use crate::page::{Document, NodeId, PageTree};
use crate::sizing::{Dimensions, TierError, Viewport};
use crate::story::Story;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error("invalid tiers: {0}")]
    Tiers(#[from] TierError),
    #[error("at least one viewport is required")]
    NoViewports,
    #[error("page is not a story page (root class lacks {0:?})")]
    NotAStory(String),
}

/// A live picture on the simulated page.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedPicture {
    /// Element id of the container, e.g. `pic0`.
    pub id: String,
    pub image: NodeId,
    pub dimensions: Dimensions,
    pub base_url: String,
    /// `src` of the live image after the last step.
    pub final_src: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub viewport: Viewport,
    /// `None` when the size did not change and the poll did nothing.
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub pictures: Vec<SimulatedPicture>,
    pub skipped: usize,
    pub steps: Vec<SimulationStep>,
}

impl Simulation {
    /// Container id of a live image, for display.
    pub fn picture_id(&self, image: NodeId) -> Option<&str> {
        self.pictures
            .iter()
            .find(|picture| picture.image == image)
            .map(|picture| picture.id.as_str())
    }
}

pub fn simulate(
    story: &Story,
    config: &LoaderConfig,
    viewports: &[Viewport],
) -> Result<Simulation, SimulateError> {
    let (first, rest) = viewports.split_first().ok_or(SimulateError::NoViewports)?;
    let mut controller = StoryController::new(config)?;
    let tiers = config.tier_list()?;
    let mut tree = PageTree::from_story(story, &tiers, &config.page);

    let source = FixedViewport::new(first.width, first.height, first.pixel_ratio);
    let (discovery, evaluation) = match controller.start(&mut tree, &source) {
        Activation::Started {
            discovery,
            evaluation,
        } => (discovery, evaluation),
        Activation::Inert | Activation::AlreadyRunning => {
            return Err(SimulateError::NotAStory(config.page.story_class.clone()));
        }
    };

    let mut steps = vec![SimulationStep {
        viewport: *first,
        evaluation: Some(evaluation),
    }];
    for viewport in rest {
        source.set_size(viewport.width, viewport.height);
        source.set_pixel_ratio(viewport.pixel_ratio);
        steps.push(SimulationStep {
            viewport: *viewport,
            evaluation: controller.poll(&mut tree, &source),
        });
    }
    controller.stop();

    let pictures = discovery
        .pictures
        .iter()
        .map(|(&image, picture)| SimulatedPicture {
            id: tree
                .attribute(picture.container, "id")
                .unwrap_or_else(|| picture.container.to_string()),
            image,
            dimensions: picture.dimensions,
            base_url: picture.base_url.clone(),
            final_src: tree.attribute(image, "src"),
        })
        .collect();

    Ok(Simulation {
        pictures,
        skipped: discovery.skipped.len(),
        steps,
    })
}
