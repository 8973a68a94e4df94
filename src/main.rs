//! Thin CLI binary. The command-line wrapper itself is named out of scope
//! (spec §1): this just binds flags to `engine::Engine`'s five verbs and
//! prints what comes back. Profile/override parsing from a config file is
//! likewise an external collaborator's job — a bare-default `Profile` and
//! `OverrideTree` are used until one is wired up.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

use staticlens::config::EngineSettings;
use staticlens::engine::{Engine, OutputFormat};
use staticlens::logging;
use staticlens::model::{Confidence, Severity};
use staticlens::resolver::{OverrideTree, Profile};

fn clap_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(name = "staticlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Whole-program static analysis over a Swift-like source tree")]
#[command(styles = clap_style())]
struct Cli {
    /// Project root to analyze.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every enabled rule and print diagnostics.
    Check {
        #[arg(long, value_enum, default_value = "human")]
        format: CliFormat,
        #[arg(long, value_enum, default_value = "hint")]
        min_severity: CliSeverity,
    },
    /// Like `check`, but exits non-zero when anything meets `--fail-on`.
    Ci {
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "error")]
        fail_on: CliSeverity,
        #[arg(long, value_enum, default_value = "human")]
        format: CliFormat,
    },
    /// Write the current violation set as a baseline file.
    Baseline {
        #[arg(long, default_value = "baseline.json")]
        out: PathBuf,
        #[arg(long)]
        expires: Option<String>,
    },
    /// Apply high-confidence structured edits.
    Fix {
        #[arg(long, value_enum, default_value = "high")]
        confidence: CliConfidence,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a rule's documentation record.
    Explain { rule_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliFormat {
    Human,
    Json,
    AgentJson,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Human => OutputFormat::Human,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::AgentJson => OutputFormat::AgentJson,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliSeverity {
    Hint,
    Suggestion,
    Warning,
    Error,
}

impl From<CliSeverity> for Severity {
    fn from(value: CliSeverity) -> Self {
        match value {
            CliSeverity::Hint => Severity::Hint,
            CliSeverity::Suggestion => Severity::Suggestion,
            CliSeverity::Warning => Severity::Warning,
            CliSeverity::Error => Severity::Error,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliConfidence {
    Low,
    Medium,
    High,
}

impl From<CliConfidence> for Confidence {
    fn from(value: CliConfidence) -> Self {
        match value {
            CliConfidence::Low => Confidence::Low,
            CliConfidence::Medium => Confidence::Medium,
            CliConfidence::High => Confidence::High,
        }
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn load_baseline(path: &std::path::Path) -> Option<staticlens::model::Baseline> {
    let bytes = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&bytes) {
        Ok(baseline) => Some(baseline),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring malformed baseline, treating as absent");
            None
        }
    }
}

/// Colorizes a `render_human` block by its leading `SEVERITY [...]` line,
/// since the renderer itself stays terminal-agnostic.
fn paint_human(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    for line in rendered.lines() {
        if let Some(rest) = line.strip_prefix("ERROR ") {
            out.push_str(&style(format!("ERROR {rest}")).red().bold().to_string());
        } else if let Some(rest) = line.strip_prefix("WARNING ") {
            out.push_str(&style(format!("WARNING {rest}")).yellow().to_string());
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match EngineSettings::load() {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("{}: {error}", style("configuration error").red().bold());
            return ExitCode::from(2);
        }
    };
    logging::init_with_config(&settings.logging);

    let engine = Engine::new(cli.root.clone(), settings, Profile::default(), OverrideTree::default());

    match cli.command {
        Commands::Check { format, min_severity } => match engine.check(format.into(), min_severity.into(), None, &now_iso8601()) {
            Ok(report) => {
                let rendered = if matches!(format, CliFormat::Human) { paint_human(&report.rendered) } else { report.rendered };
                print!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(error) => fatal(&error),
        },

        Commands::Ci { baseline, fail_on, format } => {
            let baseline = baseline.as_deref().and_then(load_baseline);
            match engine.ci(baseline.as_ref(), fail_on.into(), format.into(), &now_iso8601()) {
                Ok(outcome) => {
                    let rendered = if matches!(format, CliFormat::Human) { paint_human(&outcome.report.rendered) } else { outcome.report.rendered };
                    print!("{rendered}");
                    ExitCode::from(outcome.exit_code as u8)
                }
                Err(error) => fatal(&error),
            }
        }

        Commands::Baseline { out, expires } => match engine.baseline(&out, &now_iso8601(), expires) {
            Ok(baseline) => {
                println!("{}", style(format!("wrote {} entries to {}", baseline.violations.len(), out.display())).green());
                ExitCode::SUCCESS
            }
            Err(error) => fatal(&error),
        },

        Commands::Fix { confidence, dry_run } => match engine.fix(confidence.into(), dry_run) {
            Ok(report) => {
                let verb = if report.dry_run { "would apply" } else { "applied" };
                println!("{verb} {} edit(s), skipped {} conflicting file(s)", report.applied, report.skipped_conflicts);
                ExitCode::SUCCESS
            }
            Err(error) => fatal(&error),
        },

        Commands::Explain { rule_id } => match engine.explain(&rule_id) {
            Some(meta) => {
                println!("{}", style(meta.id).bold());
                println!("  name: {}", meta.name);
                println!("  category: {}", meta.category);
                println!("  default severity: {:?}", meta.default_severity);
                println!("  enabled by default: {}", meta.enabled_by_default);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("no such rule: {rule_id}");
                ExitCode::from(4)
            }
        },
    }
}

fn fatal(error: &staticlens::EngineError) -> ExitCode {
    eprintln!("{}: {error}", style("error").red().bold());
    ExitCode::from(error.exit_code() as u8)
}
