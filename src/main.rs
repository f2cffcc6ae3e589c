//! `lineup` command-line interface
//!
//! Run with: `lineup <command> <job.json>`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use lineup::rendering::raster::{encode_png, fingerprint};
use lineup::{render_blockers, render_lineup, validate, Job, LineupType, RenderOptions, ScreenSpec};

#[derive(Parser)]
#[command(name = "lineup")]
#[command(about = "Render lineup guides for LED video-wall screens", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print validation warnings for every screen in a job file
    Validate {
        job: PathBuf,
    },
    /// Render PNG lineup guides
    Render {
        job: PathBuf,
        /// Only render the screen with this name
        #[arg(long)]
        screen: Option<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        jobs: Option<usize>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Print the SHA-256 fingerprint of one screen's rendered raster
    Fingerprint {
        job: PathBuf,
        #[arg(long)]
        screen: String,
        #[command(flatten)]
        style: StyleArgs,
    },
}

/// Overrides applied on top of the job file's options.
#[derive(Args)]
struct StyleArgs {
    #[arg(long)]
    lineup_type: Option<LineupType>,
    /// Hide the centered screen name and resolution
    #[arg(long)]
    no_overlay: bool,
    /// Circle-X: black background instead of the screen color
    #[arg(long)]
    black_bg: bool,
    /// Image composited at the bottom-left corner
    #[arg(long)]
    branding: Option<PathBuf>,
    /// Preferred font file name or path
    #[arg(long)]
    font: Option<String>,
}

impl StyleArgs {
    fn apply(&self, opts: &mut RenderOptions) -> Result<()> {
        if let Some(lineup_type) = self.lineup_type {
            opts.lineup_type = lineup_type;
        }
        if self.no_overlay {
            opts.show_overlay = false;
        }
        if self.black_bg {
            opts.circlex_grid_black_bg = true;
        }
        if let Some(font) = &self.font {
            opts.font_name = font.clone();
        }
        if let Some(path) = &self.branding {
            let branding = image::open(path)
                .with_context(|| format!("failed to read branding image {}", path.display()))?;
            opts.branding_image = Some(branding.to_rgba8());
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { job } => run_validate(&job),
        Commands::Render {
            job,
            screen,
            out,
            jobs,
            style,
        } => run_render(&job, screen.as_deref(), &out, jobs, &style),
        Commands::Fingerprint { job, screen, style } => run_fingerprint(&job, &screen, &style),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_job(path: &Path) -> Result<Job> {
    Job::load(path).with_context(|| format!("failed to load job {}", path.display()))
}

fn run_validate(path: &Path) -> Result<()> {
    let job = load_job(path)?;
    for screen in &job.screens {
        let warnings = validate(screen, &job.catalog);
        if warnings.is_empty() {
            println!("{}: ok", screen.screen_name);
        }
        for warning in warnings {
            println!("{}: {}", screen.screen_name, warning);
        }
    }
    Ok(())
}

/// File name for a rendered guide. Path separators in names become `-`.
fn output_name(screen: &ScreenSpec, lineup_type: LineupType) -> String {
    let stem = match lineup_type {
        LineupType::Rgb => screen.screen_name.clone(),
        other => format!("{}_{}", screen.tile_label, other),
    };
    format!("{}.png", stem.replace(['/', '\\'], "-"))
}

fn run_render(
    path: &Path,
    only: Option<&str>,
    out: &Path,
    jobs: Option<usize>,
    style: &StyleArgs,
) -> Result<()> {
    let mut job = load_job(path)?;
    style.apply(&mut job.options)?;
    let lineup_type = job.options.lineup_type;

    let selected: Vec<&ScreenSpec> = match only {
        Some(name) => vec![job
            .screen(name)
            .ok_or_else(|| anyhow!("no screen named '{}'", name))?],
        None => job.screens.iter().collect(),
    };

    let ready: Vec<&ScreenSpec> = selected
        .into_iter()
        .filter(|screen| {
            let blockers = render_blockers(screen, lineup_type);
            for blocker in &blockers {
                warn!("skipping {}: {}", screen.screen_name, blocker);
            }
            blockers.is_empty()
        })
        .collect();
    if ready.is_empty() {
        bail!("no screens ready for {} rendering", lineup_type);
    }

    fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let workers = jobs.unwrap_or_else(num_cpus::get).clamp(1, ready.len());
    let chunk = ready.len().div_ceil(workers);
    info!(
        "rendering {} screens on {} threads",
        ready.len(),
        ready.len().div_ceil(chunk)
    );

    let job = &job;
    let outcomes: Vec<(String, Result<PathBuf>)> = thread::scope(|scope| {
        let handles: Vec<_> = ready
            .chunks(chunk)
            .map(|screens| {
                scope.spawn(move || {
                    screens
                        .iter()
                        .map(|screen| (screen.screen_name.clone(), render_to_file(job, screen, out)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| vec![(String::from("?"), Err(anyhow!("render thread panicked")))])
            })
            .collect()
    });

    let mut failed = 0usize;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(file) => println!("{}", file.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {:#}", name, e);
            }
        }
    }
    if failed > 0 {
        bail!("{} screen(s) failed to render", failed);
    }
    Ok(())
}

fn render_to_file(job: &Job, screen: &ScreenSpec, out: &Path) -> Result<PathBuf> {
    let image = render_lineup(screen, &job.catalog, &job.options)?;
    let file = out.join(output_name(screen, job.options.lineup_type));
    let png = encode_png(&image)?;
    fs::write(&file, png).with_context(|| format!("failed to write {}", file.display()))?;
    info!("{} -> {}", screen.screen_name, file.display());
    Ok(file)
}

fn run_fingerprint(path: &Path, name: &str, style: &StyleArgs) -> Result<()> {
    let mut job = load_job(path)?;
    style.apply(&mut job.options)?;
    let screen = job
        .screen(name)
        .ok_or_else(|| anyhow!("no screen named '{}'", name))?;
    let image = render_lineup(screen, &job.catalog, &job.options)?;
    println!("{}", fingerprint(&image));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn output_names_follow_lineup_type() {
        let screen = ScreenSpec::new("SCA", "SCA/E", 1, 1, "FULL");
        assert_eq!(output_name(&screen, LineupType::Rgb), "SCA.png");
        assert_eq!(
            output_name(&screen, LineupType::GreyscaleSteps),
            "SCA-E_GreyscaleSteps.png"
        );
        assert_eq!(
            output_name(&screen, LineupType::CircleXGrid),
            "SCA-E_CircleXGrid.png"
        );
    }

    #[test]
    fn style_args_override_options() {
        let cli = Cli::parse_from([
            "lineup",
            "render",
            "job.json",
            "--lineup-type",
            "circle-x",
            "--no-overlay",
            "--black-bg",
            "--font",
            "DejaVuSans.ttf",
        ]);
        let Commands::Render { style, .. } = cli.command else {
            panic!("expected render");
        };
        let mut opts = RenderOptions::default();
        style.apply(&mut opts).unwrap();
        assert_eq!(opts.lineup_type, LineupType::CircleXGrid);
        assert!(!opts.show_overlay);
        assert!(opts.circlex_grid_black_bg);
        assert_eq!(opts.font_name, "DejaVuSans.ttf");
    }
}
