//! Finding placeholder pictures and swapping in live images.
//!
//! The page ships every picture as fallback markup:
//!
//! ```text
//! div.pic.size1600x1200          ← container: intrinsic size in its classes
//! └── noscript                   ← wrapper
//!     └── img[src=...w800.jpg]   ← placeholder, largest tier
//! ```
//!
//! Discovery pulls each placeholder out of its wrapper, inserts an empty live
//! `img` in front of the wrapper and records a [`PictureDescriptor`] keyed by
//! the live image. The live image gets no `alt`: the caption next to it says
//! the same thing.
//!
//! A picture whose markup cannot be understood is skipped with a warning and
//! left exactly as it was, so it still shows its fallback.

use crate::markup::{MarkupError, parse_container_class};
use crate::page::{Document, NodeId, PageError};
use crate::sizing::{Dimensions, Tier};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("noscript wrapper {0} has no container element")]
    NoContainer(NodeId),
    #[error("placeholder {0} has no src")]
    NoSource(NodeId),
    #[error("bad container markup: {0}")]
    Markup(#[from] MarkupError),
    #[error("page update failed: {0}")]
    Page(#[from] PageError),
}

/// Everything known about one live picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PictureDescriptor {
    /// Placeholder URL, at the largest tier.
    pub base_url: String,
    pub dimensions: Dimensions,
    pub portrait: bool,
    /// Largest tier loaded so far. Only ever grows.
    pub loaded: Option<Tier>,
    pub container: NodeId,
}

/// A placeholder that was left alone.
#[derive(Debug)]
pub struct SkippedPicture {
    pub placeholder: NodeId,
    pub reason: DiscoveryError,
}

/// Result of one discovery pass.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Live image → descriptor.
    pub pictures: BTreeMap<NodeId, PictureDescriptor>,
    pub skipped: Vec<SkippedPicture>,
}

/// Replace every `noscript`-wrapped placeholder with a live image.
///
/// Placeholders are collected before the first mutation, so the scan is not
/// disturbed by the images it inserts. `expected_suffix` is the file suffix
/// of the largest tier; base URLs without it are kept but logged.
pub fn discover<D: Document + ?Sized>(doc: &mut D, expected_suffix: Option<&str>) -> Discovery {
    let placeholders: Vec<NodeId> = doc
        .images()
        .into_iter()
        .filter(|&img| {
            doc.parent(img)
                .and_then(|parent| doc.tag_name(parent))
                .is_some_and(|tag| tag == "noscript")
        })
        .collect();

    let mut discovery = Discovery::default();
    for placeholder in placeholders {
        match replace_placeholder(doc, placeholder) {
            Ok((image, picture)) => {
                let foreign = expected_suffix.filter(|suffix| !picture.base_url.ends_with(suffix));
                if let Some(suffix) = foreign {
                    warn!(
                        url = %picture.base_url,
                        expected = suffix,
                        "picture URL has no largest-tier suffix; it will not be resized"
                    );
                }
                discovery.pictures.insert(image, picture);
            }
            Err(reason) => {
                warn!(%placeholder, %reason, "skipping picture");
                discovery.skipped.push(SkippedPicture {
                    placeholder,
                    reason,
                });
            }
        }
    }
    discovery
}

/// Validate first, then mutate. The live image is attached before the
/// placeholder is removed, and detached again if the removal fails, so any
/// error leaves the picture showing its fallback.
fn replace_placeholder<D: Document + ?Sized>(
    doc: &mut D,
    placeholder: NodeId,
) -> Result<(NodeId, PictureDescriptor), DiscoveryError> {
    let wrapper = doc
        .parent(placeholder)
        .ok_or(PageError::UnknownNode(placeholder))?;
    let container = doc
        .parent(wrapper)
        .ok_or(DiscoveryError::NoContainer(wrapper))?;
    let class = parse_container_class(&doc.class_name(container))?;
    let base_url = doc
        .attribute(placeholder, "src")
        .filter(|src| !src.is_empty())
        .ok_or(DiscoveryError::NoSource(placeholder))?;

    let image = doc.create_element("img");
    doc.set_attribute(image, "alt", "")?;
    doc.insert_before(container, image, wrapper)?;
    if let Err(e) = doc.remove_child(wrapper, placeholder) {
        if let Err(undo) = doc.remove_child(container, image) {
            warn!(%image, error = %undo, "could not detach live image");
        }
        return Err(e.into());
    }

    Ok((
        image,
        PictureDescriptor {
            base_url,
            dimensions: class.dimensions,
            portrait: class.portrait,
            loaded: None,
            container,
        },
    ))
}
