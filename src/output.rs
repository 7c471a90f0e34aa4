//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what a picture *is* (its position in the story and its
//! name) and shows URLs and node ids as indented context lines. Tiers are
//! always written the way they appear in file names (`w800`).
//!
//! # Output Format
//!
//! ## Select
//!
//! ```text
//! Picture 1600x1200 in 1000x700 @1x
//!     Available: 980x680
//!     Desired: 907x680
//!     Tier: w800
//! ```
//!
//! ## Check
//!
//! ```text
//! Harbour walk (3 pictures)
//!     001 harbour 1600x1200
//!         Caption: Boats at dusk
//!     002 crane 1200x1600 portrait
//!     003 lighthouse 1000x1000
//! Tiers: w800 w600 w400 w300 w200
//! ```
//!
//! ## Simulate
//!
//! ```text
//! 1000x700 @1x → max-height 680px
//!     pic0: w800
//!         Source: /stories/harbour/harbour.1a2b3c4d.w800.jpg
//! 1000x700 @1x (unchanged)
//! 500x400 @1x → max-height 380px
//!     no upgrades
//!
//! 3 pictures, 3 upgrades
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::controller::{Evaluation, Upgrade};
use crate::simulate::Simulation;
use crate::sizing::{Dimensions, Selection, TierList, Viewport};
use crate::story::Story;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1000x700 @1x`, `320x240 @1.5x`
fn viewport_label(viewport: &Viewport) -> String {
    format!(
        "{}x{} @{}x",
        viewport.width, viewport.height, viewport.pixel_ratio
    )
}

fn dimensions_label(dimensions: Dimensions) -> String {
    let size = format!("{}x{}", dimensions.width, dimensions.height);
    if dimensions.is_portrait() {
        format!("{size} portrait")
    } else {
        size
    }
}

/// `w800`, or `w300 → w800` for an upgrade over an earlier tier.
fn upgrade_label(upgrade: &Upgrade) -> String {
    match upgrade.from {
        Some(from) => format!("{from} → {}", upgrade.to),
        None => upgrade.to.to_string(),
    }
}

// ============================================================================
// select
// ============================================================================

pub fn format_selection(
    intrinsic: Dimensions,
    viewport: &Viewport,
    padding: u32,
    selection: Option<&Selection>,
) -> Vec<String> {
    let (avail_w, avail_h) = viewport.available(padding);
    let mut lines = vec![
        format!(
            "Picture {}x{} in {}",
            intrinsic.width,
            intrinsic.height,
            viewport_label(viewport)
        ),
        format!("{}Available: {avail_w}x{avail_h}", indent(1)),
    ];
    match selection {
        Some(selection) => {
            lines.push(format!(
                "{}Desired: {}x{}",
                indent(1),
                selection.desired.width,
                selection.desired.height
            ));
            lines.push(format!("{}Tier: {}", indent(1), selection.tier));
        }
        None => lines.push(format!("{}Tier: none (no tiers configured)", indent(1))),
    }
    lines
}

pub fn print_selection(
    intrinsic: Dimensions,
    viewport: &Viewport,
    padding: u32,
    selection: Option<&Selection>,
) {
    for line in format_selection(intrinsic, viewport, padding, selection) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_story(story: &Story, tiers: &TierList) -> Vec<String> {
    let mut lines = vec![format!("{} ({} pictures)", story.title, story.pics.len())];
    for (i, pic) in story.pics.iter().enumerate() {
        lines.push(format!(
            "{}{} {} {}",
            indent(1),
            format_index(i + 1),
            pic.file,
            dimensions_label(pic.dimensions())
        ));
        let caption = pic.alt_text();
        if !caption.is_empty() {
            lines.push(format!("{}Caption: {}", indent(2), caption));
        }
    }
    let tier_names: Vec<String> = tiers.iter().map(|tier| tier.to_string()).collect();
    lines.push(format!("Tiers: {}", tier_names.join(" ")));
    lines
}

pub fn print_story(story: &Story, tiers: &TierList) {
    for line in format_story(story, tiers) {
        println!("{}", line);
    }
}

// ============================================================================
// simulate
// ============================================================================

/// One evaluation, with pictures labelled by `label`.
pub fn format_evaluation(
    evaluation: &Evaluation,
    depth: usize,
    label: impl Fn(&Upgrade) -> String,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{} → max-height {}px",
        indent(depth),
        viewport_label(&evaluation.viewport),
        evaluation.max_height
    )];
    if evaluation.upgrades.is_empty() {
        lines.push(format!("{}no upgrades", indent(depth + 1)));
    }
    for upgrade in &evaluation.upgrades {
        lines.push(format!(
            "{}{}: {}",
            indent(depth + 1),
            label(upgrade),
            upgrade_label(upgrade)
        ));
        lines.push(format!("{}Source: {}", indent(depth + 2), upgrade.src));
    }
    lines
}

pub fn format_simulation(simulation: &Simulation) -> Vec<String> {
    let mut lines = Vec::new();
    let label = |upgrade: &Upgrade| {
        simulation
            .picture_id(upgrade.image)
            .map(str::to_string)
            .unwrap_or_else(|| upgrade.image.to_string())
    };

    let mut upgrades = 0;
    for step in &simulation.steps {
        match &step.evaluation {
            Some(evaluation) => {
                upgrades += evaluation.upgrades.len();
                lines.extend(format_evaluation(evaluation, 0, &label));
            }
            None => lines.push(format!("{} (unchanged)", viewport_label(&step.viewport))),
        }
    }

    lines.push(String::new());
    let mut summary = format!(
        "{} pictures, {} upgrades",
        simulation.pictures.len(),
        upgrades
    );
    if simulation.skipped > 0 {
        summary.push_str(&format!(", {} skipped", simulation.skipped));
    }
    lines.push(summary);
    lines
}

pub fn print_simulation(simulation: &Simulation) {
    for line in format_simulation(simulation) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
