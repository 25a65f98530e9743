use apidocs_check::config;
use apidocs_check::docset::{CheckOptions, DocSet};
use apidocs_check::output;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "apidocs-check")]
#[command(about = "Semantic validation for Markdown REST API documentation")]
#[command(long_about = "\
Semantic validation for Markdown REST API documentation

Pages are plain Markdown. JSON annotations in HTML comments mark the code
blocks that define resources, requests and responses; tables are classified
by the heading above them.

Documentation structure:

  docs/
  ├── apidocs.toml                 # Checker config (optional)
  ├── index.md                     # Table-of-contents root, never orphaned
  ├── resources/
  │   └── driveitem.md             # <!-- { \"blockType\": \"resource\", \"@odata.type\": \"foo.driveItem\" } -->
  └── api/
      └── driveitem-get.md         # <!-- { \"blockType\": \"request\", \"name\": \"get-item\" } -->

What is checked:
  Per page:   annotations, request/response pairing, tables vs. JSON examples,
              header outline against the page type's template
  Whole set:  base-type order and cycles, type references, links (--links),
              orphaned pages (full scans only)

Exit status is 1 when any error was recorded. Warnings never fail a run.

Run 'apidocs-check gen-config' to generate a documented apidocs.toml.")]
#[command(version)]
struct Cli {
    /// Documentation root
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Config file (defaults to apidocs.toml in the documentation root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Flags for the check command.
#[derive(clap::Args, Clone)]
struct CheckArgs {
    /// Validate links, bookmarks and orphaned pages
    #[arg(long)]
    links: bool,

    /// Skip header outline validation
    #[arg(long)]
    no_outline: bool,

    /// Only report issues for this page (relative to the root, repeatable)
    #[arg(long = "page", value_name = "PATH")]
    pages: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Also list clean pages, notes and the resource order
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the documentation set
    Check(CheckArgs),
    /// Print a stock apidocs.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => {
            let schema = match &cli.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(&cli.source)?,
            };
            init_thread_pool(&schema.processing);

            let options = CheckOptions {
                validate_links: args.links,
                validate_outline: !args.no_outline,
                pages: args.pages,
            };
            let set = DocSet::check(&cli.source, &schema, &options)?;
            let report = set.report();
            if args.json {
                println!("{}", report.to_json()?);
            } else {
                output::print_check_output(&report, args.verbose);
            }
            if !report.passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
