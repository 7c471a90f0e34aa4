//! The fallback-markup contract shared by rendering and discovery.
//!
//! A picture container carries its facts in its class list:
//!
//! ```text
//! <div class="pic size1600x1200">            landscape, 1600x1200 px
//! <div class="pic portrait size1200x1600">   portrait, 1200x1600 px
//! ```
//!
//! and the fallback image inside points at the largest tier:
//!
//! ```text
//! harbour.1a2b3c4d.w800.jpg  →  harbour.1a2b3c4d.w400.jpg
//! ```
//!
//! Everything here is string handling with no page access.

use crate::sizing::{Dimensions, Tier};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarkupError {
    #[error("no size<W>x<H> token in class list {0:?}")]
    MissingSize(String),
    #[error("size token {0:?} has a zero or out-of-range dimension")]
    InvalidSize(String),
}

static SIZE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^size([0-9]+)x([0-9]+)$").unwrap());

const PORTRAIT_TOKEN: &str = "portrait";

/// Facts decoded from a picture container's class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerClass {
    pub dimensions: Dimensions,
    pub portrait: bool,
}

/// Decode a container class list.
///
/// The first `size<W>x<H>` token wins. `portrait` must be a whole token.
pub fn parse_container_class(class_list: &str) -> Result<ContainerClass, MarkupError> {
    let portrait = class_tokens(class_list).any(|token| token == PORTRAIT_TOKEN);

    let captures = class_tokens(class_list)
        .find_map(|token| SIZE_TOKEN.captures(token))
        .ok_or_else(|| MarkupError::MissingSize(class_list.to_string()))?;

    let token = captures.get(0).map_or("", |m| m.as_str());
    let parse = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|&value| value > 0)
            .ok_or_else(|| MarkupError::InvalidSize(token.to_string()))
    };

    Ok(ContainerClass {
        dimensions: Dimensions::new(parse(1)?, parse(2)?),
        portrait,
    })
}

/// Class list for a container, the inverse of [`parse_container_class`].
pub fn container_class(dimensions: Dimensions, extra: &str) -> String {
    let mut class = String::from(extra);
    if dimensions.is_portrait() {
        push_token(&mut class, PORTRAIT_TOKEN);
    }
    push_token(
        &mut class,
        &format!("size{}x{}", dimensions.width, dimensions.height),
    );
    class
}

/// Whether a root class list marks the page as a story.
pub fn has_class(class_list: &str, class: &str) -> bool {
    class_tokens(class_list).any(|token| token == class)
}

/// Rewrite a largest-tier URL to another tier.
///
/// Returns `None` if `base_url` does not end in the largest tier's suffix.
pub fn tier_url(base_url: &str, largest: Tier, target: Tier, extension: &str) -> Option<String> {
    let stem = base_url.strip_suffix(&largest.file_suffix(extension))?;
    Some(format!("{}{}", stem, target.file_suffix(extension)))
}

fn class_tokens(class_list: &str) -> impl Iterator<Item = &str> {
    class_list.split_ascii_whitespace()
}

fn push_token(class: &mut String, token: &str) {
    if !class.is_empty() {
        class.push(' ');
    }
    class.push_str(token);
}
