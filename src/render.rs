//! Story page HTML.
//!
//! The rendered page works without scripts: every picture is a `noscript`
//! placeholder at the largest tier. With the loader script present, the
//! placeholders are swapped for live images sized to the window.
//!
//! ```text
//! body.story
//! ├── h1
//! ├── div.description            (markdown)
//! ├── div#pic0.pic.size1600x1200
//! │   ├── noscript > img
//! │   └── div.caption            (markdown)
//! └── script[src]                (if configured)
//! ```
//!
//! Uses [maud](https://maud.lambda.xyz/) for templating; all story text is
//! escaped except the markdown output.

use crate::config::PageConfig;
use crate::markup::container_class;
use crate::sizing::TierList;
use crate::story::{Story, StoryPic};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

const STORY_CSS: &str = "\
body.story { margin: 0 auto; max-width: 100%; text-align: center; }
.pic { margin: 10px auto; }
.pic img { display: block; margin: 0 auto; max-width: 100%; }
.caption { font-style: italic; }
";

/// Render the full story page.
pub fn render_story_page(story: &Story, tiers: &TierList, page: &PageConfig) -> Markup {
    let script_src = Some(page.script_src.as_str()).filter(|src| !src.is_empty());
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (story.title) }
                style { (PreEscaped(STORY_CSS)) }
            }
            body class=(page.story_class) {
                h1 { (story.title) }
                @if let Some(description) = &story.description {
                    div.description { (markdown(description)) }
                }
                @for (index, pic) in story.pics.iter().enumerate() {
                    (render_pic(story, index, pic, tiers, page))
                }
                @if let Some(src) = script_src {
                    script src=(src) {}
                }
            }
        }
    }
}

fn render_pic(
    story: &Story,
    index: usize,
    pic: &StoryPic,
    tiers: &TierList,
    page: &PageConfig,
) -> Markup {
    let src = tiers
        .largest()
        .map(|largest| story.pic_url(pic, largest, &page.image_extension));
    html! {
        div id=(Story::pic_id(index)) class=(container_class(pic.dimensions(), "pic")) {
            noscript {
                img src=[src] alt=(pic.alt_text());
            }
            @if let Some(caption) = &pic.caption {
                div.caption { (markdown(caption)) }
            }
        }
    }
}

fn markdown(source: &str) -> PreEscaped<String> {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    PreEscaped(out)
}
