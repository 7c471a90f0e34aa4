//! # Picstory
//!
//! Resolution-adaptive picture loading for story pages.
//!
//! A story page ships every picture as a `noscript` placeholder pointing at
//! the largest pre-rendered width. At page-ready the loader swaps each
//! placeholder for a live image, then keeps watching the window and loads the
//! smallest pre-rendered tier that still covers the drawn size. Tiers only
//! ever go up: a shrinking window keeps what it already downloaded.
//!
//! # Lifecycle
//!
//! ```text
//! 1. Render     story.toml  →  HTML with noscript placeholders
//! 2. Discover   page        →  live images + picture table
//! 3. Evaluate   viewport    →  tier per picture, src rewrites, max-height
//! 4. Poll       every 100ms →  re-evaluate when the window size changed
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sizing`] | Fit math, the tier ladder and tier selection |
//! | [`markup`] | Container class grammar (`size1600x1200`, `portrait`) and tier URLs |
//! | [`page`] | The [`page::Document`] seam and the in-memory [`page::PageTree`] |
//! | [`discovery`] | Placeholder → live image replacement |
//! | [`controller`] | Picture table, viewport observation and resize reaction |
//! | [`poller`] | Timer thread and the tick-driven poll loop |
//! | [`story`] | Story files (TOML) |
//! | [`render`] | Story page HTML using Maud |
//! | [`simulate`] | Replays a viewport history against a story |
//! | [`config`] | `picstory.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Page Is a Trait
//!
//! Discovery and the controller only see [`page::Document`]. The CLI and the
//! tests drive an arena tree; any other page representation plugs in by
//! implementing the same dozen calls.
//!
//! ## Width Tiers in the URL
//!
//! Every picture exists on the server as `name.hash.w<tier>.jpg`. Switching
//! tier is a suffix rewrite, so the loader needs no manifest. A URL without
//! the largest-tier suffix is left alone.
//!
//! ## Never Downgrade
//!
//! The browser already holds the larger file. Loading a smaller one on shrink
//! would spend bandwidth to show a worse picture.

pub mod config;
pub mod controller;
pub mod discovery;
pub mod markup;
pub mod output;
pub mod page;
pub mod poller;
pub mod render;
pub mod simulate;
pub mod sizing;
pub mod story;

#[cfg(test)]
pub(crate) mod test_helpers;
