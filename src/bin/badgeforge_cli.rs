//! BadgeForge CLI
//!
//! Commands: layout, preview, export, count
//! Outputs JSON to stdout
//! Returns non-zero when attendees cannot be loaded

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use badgeforge::{plan_text, AppConfig, BadgeSession, RenderOutcome};

#[derive(Parser)]
#[command(name = "badgeforge-cli")]
#[command(about = "BadgeForge CLI - render attendee badges into a ZIP archive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, default_value = "badgeforge.json")]
    config: PathBuf,

    /// Layout document path or URL (overrides the config file)
    #[arg(short, long)]
    layout: Option<String>,

    /// Template root directory or base URL (overrides the config file)
    #[arg(short, long)]
    templates: Option<String>,

    /// Skip the hit counter
    #[arg(long)]
    no_counter: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved layout in draw order
    Layout,

    /// Render one attendee's badge
    Preview {
        /// Attendee file (JSON)
        #[arg(short, long)]
        attendees: PathBuf,

        /// 0-based attendee position
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Write the PNG here
        #[arg(short, long, default_value = "badge_preview.png")]
        out: PathBuf,

        /// Print a data URL instead of writing a file
        #[arg(long)]
        data_url: bool,
    },

    /// Render every attendee into one ZIP archive
    Export {
        /// Attendee file (JSON)
        #[arg(short, long)]
        attendees: PathBuf,

        /// Archive path (defaults to the configured archive name)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write the export manifest as JSON
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Print the current badge count
    Count,
}

fn init_logger(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::from_default_env().filter_level(level).init();
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": error.to_string() });
    println!("{}", output);
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let mut config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => return fail(format!("Failed to load config: {}", e)),
    };
    if let Some(layout) = cli.layout {
        config.layout = layout;
    }
    if let Some(root) = cli.templates {
        config.templates.root = root;
    }
    if cli.no_counter {
        config.counter.enabled = false;
    }

    let mut session = match BadgeSession::open(config).await {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    match cli.command {
        Commands::Layout => {
            let output = serde_json::json!({
                "success": true,
                "fields": session.layout().fields(),
                "layout": session.layout(),
            });
            print_json(&output);
            ExitCode::SUCCESS
        }

        Commands::Preview { attendees, index, out, data_url } => {
            if let Err(code) = load(&mut session, &attendees).await {
                return code;
            }
            let outcome = match session.preview(index).await {
                Ok(o) => o,
                Err(e) => return fail(e),
            };
            let RenderOutcome::Drawn { template, used_fallback } = outcome else {
                return fail("No template could be loaded");
            };

            let text = session
                .registry()
                .get(index)
                .map(|attendee| plan_text(attendee, session.layout()))
                .unwrap_or_default();
            let mut output = serde_json::json!({
                "success": true,
                "template": template,
                "usedFallback": used_fallback,
                "text": text,
            });
            if data_url {
                match session.preview_canvas().to_data_url() {
                    Ok(url) => output["dataUrl"] = url.into(),
                    Err(e) => return fail(e),
                }
            } else {
                let png = match session.preview_canvas().encode_png() {
                    Ok(png) => png,
                    Err(e) => return fail(e),
                };
                if let Err(e) = std::fs::write(&out, png) {
                    return fail(format!("{}: {}", out.display(), e));
                }
                output["out"] = out.display().to_string().into();
            }
            print_json(&output);
            ExitCode::SUCCESS
        }

        Commands::Export { attendees, out, manifest } => {
            if let Err(code) = load(&mut session, &attendees).await {
                return code;
            }
            let export = match session.export_all().await {
                Ok(e) => e,
                Err(e) => return fail(e),
            };
            let out = out.unwrap_or_else(|| PathBuf::from(&session.config().archive_name));
            if let Err(e) = std::fs::write(&out, &export.outcome.archive) {
                return fail(format!("{}: {}", out.display(), e));
            }
            if let Some(path) = &manifest {
                let written = serde_json::to_vec_pretty(&export.outcome.manifest)
                    .map_err(|e| e.to_string())
                    .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
                if let Err(e) = written {
                    return fail(format!("{}: {}", path.display(), e));
                }
            }

            // give the counter a moment; the export is already on disk
            let count = tokio::time::timeout(Duration::from_secs(3), export.counter)
                .await
                .ok()
                .and_then(|joined| joined.ok())
                .flatten();

            let output = serde_json::json!({
                "success": true,
                "out": out.display().to_string(),
                "badges": export.outcome.badge_count(),
                "skipped": export.outcome.manifest.skipped,
                "manifestHash": export.outcome.manifest.manifest_hash,
                "count": count,
            });
            print_json(&output);
            ExitCode::SUCCESS
        }

        Commands::Count => {
            let output = serde_json::json!({
                "success": true,
                "count": session.fetch_count().await,
            });
            print_json(&output);
            ExitCode::SUCCESS
        }
    }
}

async fn load(session: &mut BadgeSession, attendees: &Path) -> Result<(), ExitCode> {
    match session.load_attendees(attendees).await {
        Ok(_) => {
            log::info!("{}", session.count_label());
            Ok(())
        }
        Err(e) => {
            let output = serde_json::json!({
                "success": false,
                "error": format!("Error parsing file: {}", e),
            });
            println!("{}", output);
            Err(ExitCode::from(2))
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}
