//! Story files: the pictures a page shows, in order.
//!
//! A story is described in TOML:
//!
//! ```toml
//! title = "Harbour walk"
//! base_url = "/stories/harbour/"
//! description = "An evening along the *old* harbour."
//!
//! [[pics]]
//! file = "harbour"
//! hash = "1a2b3c4d"
//! width = 1600
//! height = 1200
//! caption = "Boats at dusk"
//! ```
//!
//! Each picture is served at every tier as
//! `<base_url><file>.<hash>.w<tier>.<ext>`. The hash segment changes when the
//! source file changes, so tier URLs can be cached forever.

use crate::sizing::{Dimensions, Tier};
use pulldown_cmark::{Event, Parser};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Story validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Story {
    pub title: String,
    /// Markdown shown above the pictures.
    #[serde(default)]
    pub description: Option<String>,
    /// Prefix for every picture URL, usually ending in `/`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub pics: Vec<StoryPic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryPic {
    /// File name without tier suffix or extension.
    pub file: String,
    /// Short content hash (8 hex characters).
    #[serde(default)]
    pub hash: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Markdown caption rendered below the picture.
    #[serde(default)]
    pub caption: Option<String>,
}

impl StoryPic {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Caption reduced to plain text, for `alt` attributes.
    pub fn alt_text(&self) -> String {
        self.caption.as_deref().map(plain_text).unwrap_or_default()
    }
}

impl Story {
    /// Element id of the `index`-th picture container.
    pub fn pic_id(index: usize) -> String {
        format!("pic{index}")
    }

    /// URL of `pic` at `tier`.
    pub fn pic_url(&self, pic: &StoryPic, tier: Tier, extension: &str) -> String {
        match &pic.hash {
            Some(hash) => format!(
                "{}{}.{}.{}",
                self.base_url,
                pic.file,
                hash,
                tier.file_suffix(extension)
            ),
            None => format!("{}{}.{}", self.base_url, pic.file, tier.file_suffix(extension)),
        }
    }

    pub fn validate(&self) -> Result<(), StoryError> {
        if self.title.trim().is_empty() {
            return Err(StoryError::Validation("title must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for pic in &self.pics {
            if pic.file.is_empty() || pic.file.contains(['/', '.']) {
                return Err(StoryError::Validation(format!(
                    "picture file {:?} must be a bare name",
                    pic.file
                )));
            }
            if !seen.insert(pic.file.as_str()) {
                return Err(StoryError::Validation(format!(
                    "picture {:?} appears twice",
                    pic.file
                )));
            }
            if pic.width == 0 || pic.height == 0 {
                return Err(StoryError::Validation(format!(
                    "picture {:?} has a zero dimension",
                    pic.file
                )));
            }
            let bad_hash = pic
                .hash
                .as_deref()
                .filter(|hash| !(hash.len() == 8 && hash.chars().all(|c| c.is_ascii_hexdigit())));
            if let Some(hash) = bad_hash {
                return Err(StoryError::Validation(format!(
                    "picture {:?} hash {hash:?} must be 8 hex characters",
                    pic.file
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate a story from TOML text.
pub fn parse_story(content: &str) -> Result<Story, StoryError> {
    let story: Story = toml::from_str(content)?;
    story.validate()?;
    Ok(story)
}

/// Load and validate a story file.
pub fn load_story(path: &Path) -> Result<Story, StoryError> {
    let content = fs::read_to_string(path)?;
    parse_story(&content)
}

/// Text content of a markdown fragment, without markup.
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out
}
