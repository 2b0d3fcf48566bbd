//! Exportgraph CLI - which functions, classes and methods a JavaScript module exports

use clap::{Parser, Subcommand, ValueEnum};
use exportgraph::adapter::{self, AdapterRegistry};
use exportgraph::config::{self, ExportgraphConfig};
use exportgraph::diagnostics::CollectingSink;
use exportgraph::ignore::collect_sources;
use exportgraph::output::is_quiet;
use exportgraph::report::ExportReport;
use exportgraph::ui::{self, CandidateTable, Icons};
use exportgraph::{Ast, analyzer};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "exportgraph")]
#[command(version)]
#[command(about = "Static export-reachability analysis for JavaScript modules")]
#[command(long_about = r#"
Exportgraph binds a module into a symbol graph and reports which functions,
classes, methods and object literals are reachable from its exports:
  • CommonJS: anything reachable from module.exports
  • ESM: anything reachable from an `export` declaration

Example usage:
  exportgraph exports src/
  exportgraph exports lib/index.js --all --format json
  exportgraph explain lib/index.js
"#)]
struct Cli {
    /// Enable verbose logging (-vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the config file (defaults to ./exportgraph.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ignore `export` declarations
    #[arg(long, global = true)]
    no_esm: bool,

    /// Ignore module.exports / exports
    #[arg(long, global = true)]
    no_commonjs: bool,

    /// Do not alias `window` to the global scope
    #[arg(long, global = true)]
    no_window: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List exported candidates of files or directories
    Exports {
        /// Files or directories to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Show internal candidates too
        #[arg(short, long)]
        all: bool,
    },

    /// Show symbol graph statistics for a file
    Stats {
        file: PathBuf,
    },

    /// List constructs the binder skipped in a file
    Explain {
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a default exportgraph.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?
        .unwrap_or_default()
        .with_overrides(cli.no_esm, cli.no_commonjs, cli.no_window);
    let registry = adapter::default_registry();

    match cli.command {
        Commands::Exports { paths, format, all } => {
            run_exports(&registry, &config, &paths, format, all)?;
        }

        Commands::Stats { file } => {
            let ast = load_ast(&registry, &file)?;
            let analysis = analyzer::parse(&ast, &config.analysis);
            let stats = analysis.stats();

            if !is_quiet() {
                ui::header(&format!("Symbol graph for {}", file.display()));
            }
            let rows = [
                ("Syntax nodes", ast.len().to_string()),
                ("Candidates", ast.candidates().len().to_string()),
                ("Symbols", stats.symbols.to_string()),
                ("Objects", stats.objects.to_string()),
                ("Literals", stats.literals.to_string()),
                ("Placeholders", stats.placeholders.to_string()),
                ("Property edges", stats.edges.to_string()),
                ("Globals", stats.globals.to_string()),
                ("Exported symbols", stats.exported.to_string()),
            ];
            println!("{}", ui::stats_table(&rows));
        }

        Commands::Explain { file, format } => {
            let ast = load_ast(&registry, &file)?;
            let mut sink = CollectingSink::new();
            analyzer::parse_with_sink(&ast, &config.analysis, &mut sink);
            let diagnostics = sink.into_inner();

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
                return Ok(());
            }

            if diagnostics.is_empty() {
                ui::success("Every supported construct was bound.");
            } else {
                for diagnostic in &diagnostics {
                    let line = ast.span(diagnostic.node()).start_line;
                    println!("  {} {}", ui::dim(&format!("line {:>4}", line)), diagnostic);
                }
                if !is_quiet() {
                    ui::summary_row("Skipped:", &diagnostics.len().to_string());
                }
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &ExportgraphConfig::default(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

fn run_exports(
    registry: &AdapterRegistry,
    config: &ExportgraphConfig,
    paths: &[PathBuf],
    format: OutputFormat,
    all: bool,
) -> anyhow::Result<()> {
    let text = format == OutputFormat::Text;
    if text && !is_quiet() {
        ui::header("Analyzing exports");
    }

    let mut reports = Vec::new();
    let mut failures = 0;
    for root in paths {
        let files = collect_sources(root, registry, Some(config.exclude.as_slice()));
        if files.is_empty() {
            ui::warn(&format!("No analyzable files under {}", root.display()));
        }

        for file in files {
            let ast = match load_ast(registry, &file) {
                Ok(ast) => ast,
                Err(e) => {
                    ui::error(&format!("{}: {}", file.display(), e));
                    failures += 1;
                    continue;
                }
            };
            let analysis = analyzer::parse(&ast, &config.analysis);
            let report = ExportReport::build(&file.to_string_lossy(), &ast, &analysis, &config.analysis);
            tracing::debug!(
                path = %file.display(),
                candidates = report.candidates.len(),
                exported = report.exported_count(),
                "analyzed"
            );
            reports.push(if all { report } else { report.retain_exported() });
        }
    }

    if !text {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        if report.candidates.is_empty() && !all {
            continue;
        }
        ui::section(&format!(" {} {} ", Icons::FILE, report.path));
        if all {
            let mut table = CandidateTable::new();
            for status in &report.candidates {
                table.add(status);
            }
            println!("{}", table.build());
        } else {
            for status in report.exported() {
                println!(
                    "  {} {} {}",
                    Icons::EXPORTED,
                    status.name,
                    ui::muted(&format!("({}, line {})", status.kind, status.line))
                );
            }
        }
    }

    if !is_quiet() {
        let exported: usize = reports.iter().map(ExportReport::exported_count).sum();
        println!();
        ui::summary_row("Files:", &reports.len().to_string());
        ui::summary_row("Exported:", &exported.to_string());
        if failures > 0 {
            ui::summary_row("Failed:", &failures.to_string());
        }
    }
    Ok(())
}

fn load_ast(registry: &AdapterRegistry, path: &Path) -> anyhow::Result<Ast> {
    let content = std::fs::read_to_string(path)?;
    match registry.parse_file(path, &content)? {
        Some(ast) => Ok(ast),
        None => anyhow::bail!("no syntax adapter for {}", path.display()),
    }
}
