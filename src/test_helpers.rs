//! Shared test utilities for the picstory test suite.
//!
//! Provides a sample story, page builders and lookup helpers that panic with
//! a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut tree = story_tree();
//! let mut controller = StoryController::new(&LoaderConfig::default()).unwrap();
//! controller.start(&mut tree, &FixedViewport::new(1000, 700, 1.0));
//!
//! let image = find_picture(&controller, &tree, "pic0");
//! assert_eq!(tree.style(image, "max-height"), Some("680px"));
//! ```

use crate::config::PageConfig;
use crate::controller::StoryController;
use crate::page::{Document, NodeId, PageTree};
use crate::sizing::TierList;
use crate::story::{Story, parse_story};

// =========================================================================
// Fixtures
// =========================================================================

/// A landscape, a portrait and a square picture; the last one has neither
/// hash nor caption.
pub const SAMPLE_STORY_TOML: &str = r#"
title = "Harbour walk"
description = "An evening along the *old* harbour."
base_url = "/stories/harbour/"

[[pics]]
file = "harbour"
hash = "1a2b3c4d"
width = 1600
height = 1200
caption = "Boats at dusk"

[[pics]]
file = "crane"
hash = "0f9e8d7c"
width = 1200
height = 1600
caption = "The *old* crane"

[[pics]]
file = "lighthouse"
width = 1000
height = 1000
"#;

pub fn sample_story() -> Story {
    parse_story(SAMPLE_STORY_TOML).unwrap()
}

/// The sample story as a page, with default tiers and page settings.
pub fn story_tree() -> PageTree {
    PageTree::from_story(&sample_story(), &TierList::default(), &PageConfig::default())
}

// =========================================================================
// Hand-built pictures
// =========================================================================

/// Nodes of one `div > noscript > img` picture.
#[derive(Debug, Clone, Copy)]
pub struct PictureNodes {
    pub container: NodeId,
    pub wrapper: NodeId,
    pub placeholder: NodeId,
}

/// Append a picture to the page body with the given container class and
/// placeholder `src`.
pub fn add_picture(tree: &mut PageTree, class: &str, src: Option<&str>) -> PictureNodes {
    let root = tree.root();
    let container = tree.append_element(root, "div").unwrap();
    tree.set_attribute(container, "class", class).unwrap();
    let wrapper = tree.append_element(container, "noscript").unwrap();
    let placeholder = tree.append_element(wrapper, "img").unwrap();
    if let Some(src) = src {
        tree.set_attribute(placeholder, "src", src).unwrap();
    }
    PictureNodes {
        container,
        wrapper,
        placeholder,
    }
}

// =========================================================================
// Lookups
// =========================================================================

/// Live image of the picture whose container has element id `id`.
pub fn find_picture(controller: &StoryController, tree: &PageTree, id: &str) -> NodeId {
    let container = tree
        .find_by_id(id)
        .unwrap_or_else(|| panic!("no element with id '{id}'"));
    controller
        .pictures()
        .find(|(_, picture)| picture.container == container)
        .map(|(image, _)| image)
        .unwrap_or_else(|| {
            let known: Vec<String> = controller
                .pictures()
                .map(|(image, picture)| format!("{image} in {}", picture.container))
                .collect();
            panic!("no live picture in '{id}'. Known: {known:?}")
        })
}
