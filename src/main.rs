mod render;

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use churnmap_core::{ChurnmapConfig, ChurnmapError, OutputFormat};
use churnmap_gitpulse::filter::CommitFilter;
use churnmap_gitpulse::mining::{discover_workdir, mine_history, MiningOptions};

use crate::render::Section;

const CONFIG_FILE: &str = ".churnmap.toml";

#[derive(Parser)]
#[command(
    name = "churnmap",
    version,
    about = "Risk metrics from git history",
    long_about = "churnmap mines a repository's commit history and reports where risk concentrates.\n\n\
                   It ranks churn hotspots, per-author ownership, files that change together,\n\
                   Clojure function complexity, a composite risk score, stale files and files\n\
                   whose primary owner has gone quiet.\n\n\
                   Examples:\n  \
                     churnmap analyze                          Analyze the current repository\n  \
                     churnmap analyze --since 2024-01-01       Only commits from 2024 on\n  \
                     churnmap analyze --section risk --limit 5 Top five risky files\n  \
                     churnmap --format json analyze > m.json   Full machine-readable report\n  \
                     churnmap init                             Write a default .churnmap.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .churnmap.toml at the repository root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables (default)\n  \
                         json      Machine-readable JSON with every row\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compute hotspot, ownership, coupling, complexity and risk tables
    #[command(long_about = "Compute hotspot, ownership, coupling, complexity and risk tables.\n\n\
        Walks history with git2, applies the [filters] rules from the config file, then\n\
        runs every analysis. Flags override the matching config values.\n\n\
        Examples:\n  churnmap analyze --path ../service\n  \
        churnmap analyze --min-cochange 2 --top-k 50 --section coupling\n  \
        churnmap analyze --until 2024-06-30 --section staleness --section knowledge-loss")]
    Analyze {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// First day to include (YYYY-MM-DD, inclusive)
        #[arg(long)]
        since: Option<String>,

        /// Last day to include and reference day for ages (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,

        /// Branch to analyze (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Include merge commits, diffed against their first parent
        #[arg(long)]
        include_merges: bool,

        /// Minimum shared commits for a coupled pair
        #[arg(long)]
        min_cochange: Option<u32>,

        /// Number of hottest files considered for coupling
        #[arg(long)]
        top_k: Option<usize>,

        /// Maximum coupled pairs to report
        #[arg(long)]
        top_n: Option<usize>,

        /// Directory segments kept by the directory rollup
        #[arg(long)]
        depth: Option<usize>,

        /// Rows per table in text and markdown output
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Only show these sections (repeatable; default: all)
        #[arg(long, value_enum)]
        section: Vec<Section>,
    },
    /// Create a default .churnmap.toml configuration file
    #[command(long_about = "Create a default .churnmap.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .churnmap.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# churnmap configuration
# Every key is optional; command-line flags take precedence.

[history]
# since = "2024-01-01"
# until = "2024-12-31"
# branch = "main"
# include_merges = false

[coupling]
# min_cochange = 3
# top_k = 25
# top_n = 100

[risk]
# w_churn = 0.45
# w_cc = 0.35
# w_ownership = 0.20

[rollup]
# depth = 2

[filters]
# exclude_paths = ["vendor/**", "*.lock"]
# exclude_commits = ["0a1b2c3"]

# [filters.author_aliases]
# "jdoe@old-company.com" = "Jane Doe"
"#;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load `explicit` if given, otherwise `.churnmap.toml` under `repo_root`
/// when it exists, otherwise defaults.
fn load_config(explicit: Option<&Path>, repo_root: &Path) -> Result<ChurnmapConfig> {
    let config = match explicit {
        Some(path) if !path.exists() => {
            return Err(ChurnmapError::FileNotFound(path.to_path_buf()).into());
        }
        Some(path) => ChurnmapConfig::from_file(path)?,
        None => {
            let default_path = repo_root.join(CONFIG_FILE);
            if default_path.exists() {
                ChurnmapConfig::from_file(&default_path)?
            } else {
                ChurnmapConfig::default()
            }
        }
    };
    Ok(config)
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("churnmap v{version} - risk metrics from git history\n");
    println!("Quick start:");
    println!("  churnmap init                 Create a .churnmap.toml config file");
    println!("  churnmap analyze              Analyze the repository in the current directory");
    println!("  churnmap analyze --help       List sections and tuning flags\n");
    println!("Run 'churnmap <command> --help' for details.");
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => print_welcome(),
        Some(Command::Analyze {
            path,
            since,
            until,
            branch,
            include_merges,
            min_cochange,
            top_k,
            top_n,
            depth,
            limit,
            section,
        }) => {
            let root = discover_workdir(&path).map_err(|e| {
                miette::miette!(
                    help = "Run churnmap from inside a git repository, or pass --path",
                    "{e}: {}",
                    path.display()
                )
            })?;
            let mut config = load_config(cli.config.as_deref(), &root)?;
            tracing::debug!(root = %root.display(), format = %cli.format, "configuration loaded");

            if since.is_some() {
                config.history.since = since;
            }
            if until.is_some() {
                config.history.until = until;
            }
            if branch.is_some() {
                config.history.branch = branch;
            }
            config.history.include_merges |= include_merges;
            if let Some(v) = min_cochange {
                config.coupling.min_cochange = v;
            }
            if let Some(v) = top_k {
                config.coupling.top_k = v;
            }
            if let Some(v) = top_n {
                config.coupling.top_n = v;
            }
            if let Some(v) = depth {
                config.rollup.depth = v;
            }
            config.validate()?;

            let options = MiningOptions::from_config(&config.history)?;

            let spinner = if std::io::stderr().is_terminal() {
                let pb = indicatif::ProgressBar::new_spinner();
                if let Ok(style) =
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                {
                    pb.set_style(style);
                }
                pb.set_message(format!("Mining git history at {}...", root.display()));
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let mined = mine_history(&root, &options).inspect_err(|_e| {
                if let Some(pb) = &spinner {
                    pb.finish_with_message("Failed");
                }
            })?;
            let (commits, stats) = CommitFilter::from_config(&config.filters).apply(mined);
            tracing::debug!(?stats, "applied commit filters");

            if let Some(pb) = &spinner {
                pb.set_message(format!("Analyzing {} commits...", commits.len()));
            }
            let report = churnmap_score::run_pipeline(
                &commits,
                &root,
                &config,
                config.history.until.as_deref(),
            );
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            let sections = render::selected(&section);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            match cli.format {
                OutputFormat::Json => {
                    let json = render::render_json(&report, &sections).into_diagnostic()?;
                    writeln!(out, "{json}").into_diagnostic()?;
                }
                OutputFormat::Markdown => {
                    render::render_markdown(&mut out, &report, &sections, limit)
                        .into_diagnostic()?;
                }
                OutputFormat::Text => {
                    render::render_text(&mut out, &report, &sections, limit).into_diagnostic()?;
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!(miette::miette!(
                    help = "Edit the existing file, or remove it and run init again",
                    "{CONFIG_FILE} already exists"
                ));
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "churnmap", &mut std::io::stdout());
        }
    }

    Ok(())
}
