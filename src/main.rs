use clap::{Parser, Subcommand};
use picstory::sizing::{Dimensions, Viewport, plan};
use picstory::{config, output, render, simulate, story};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "picstory")]
#[command(about = "Resolution-adaptive picture loading for story pages")]
#[command(long_about = "\
Resolution-adaptive picture loading for story pages

A story page links every picture at its largest pre-rendered width inside a
noscript placeholder. The loader replaces each placeholder with a live image
and picks the smallest width tier that still covers the window, upgrading as
the window grows and never downgrading.

Story file (story.toml):

  title = \"Harbour walk\"
  base_url = \"/stories/harbour/\"

  [[pics]]
  file = \"harbour\"           # served as harbour.1a2b3c4d.w800.jpg etc.
  hash = \"1a2b3c4d\"
  width = 1600
  height = 1200
  caption = \"Boats at *dusk*\"

Run 'picstory gen-config' to generate a documented picstory.toml.")]
#[command(version)]
struct Cli {
    /// Loader config file (stock defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `picstory=trace`. RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit one picture into a viewport and pick its tier
    Select {
        /// Intrinsic picture size, WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        size: (u32, u32),
        /// Window size in CSS pixels, WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        viewport: (u32, u32),
        #[arg(long, default_value_t = 1.0)]
        pixel_ratio: f64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render a story page to HTML
    Render {
        story: PathBuf,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a sequence of window sizes against a story page
    Simulate {
        story: PathBuf,
        /// Window sizes in order, WIDTHxHEIGHT
        #[arg(long = "viewport", value_parser = parse_size, required = true, num_args = 1..)]
        viewports: Vec<(u32, u32)>,
        #[arg(long, default_value_t = 1.0)]
        pixel_ratio: f64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate a story file and the loader config
    Check { story: PathBuf },
    /// Print a stock picstory.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Select {
            size,
            viewport,
            pixel_ratio,
            json,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let tiers = config.tier_list()?;
            let intrinsic = Dimensions::new(size.0, size.1);
            let viewport = Viewport::new(viewport.0, viewport.1, pixel_ratio);
            let selection = plan(intrinsic, &viewport, config.viewport.padding, &tiers);
            debug!(?selection, "planned");
            if json {
                println!("{}", serde_json::to_string_pretty(&selection)?);
            } else {
                output::print_selection(
                    intrinsic,
                    &viewport,
                    config.viewport.padding,
                    selection.as_ref(),
                );
            }
        }
        Command::Render {
            story,
            output: destination,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let story = story::load_story(&story)?;
            let html =
                render::render_story_page(&story, &config.tier_list()?, &config.page).into_string();
            match destination {
                Some(path) => {
                    std::fs::write(&path, html)?;
                    info!(
                        path = %path.display(),
                        pictures = story.pics.len(),
                        "story page written"
                    );
                }
                None => println!("{}", html),
            }
        }
        Command::Simulate {
            story,
            viewports,
            pixel_ratio,
            json,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let story = story::load_story(&story)?;
            let viewports: Vec<Viewport> = viewports
                .into_iter()
                .map(|(width, height)| Viewport::new(width, height, pixel_ratio))
                .collect();
            let simulation = simulate::simulate(&story, &config, &viewports)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&simulation)?);
            } else {
                output::print_simulation(&simulation);
            }
        }
        Command::Check { story } => {
            let config = config::load_config(cli.config.as_deref())?;
            println!("==> Checking {}", story.display());
            let story = story::load_story(&story)?;
            output::print_story(&story, &config.tier_list()?);
            println!("==> Story is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with command output.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|e| format!("bad number {part:?} in {s:?}: {e}"))
    };
    Ok((parse(width)?, parse(height)?))
}
