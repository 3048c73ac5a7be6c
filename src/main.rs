use clap::{Parser, Subcommand};
use prepo::repo::PhotoRepo;
use prepo::output;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prepo")]
#[command(about = "Filtered, linked views of a photo collection")]
#[command(long_about = "\
Filtered, linked views of a photo collection

Tags live in file and directory names, between underscores. A leading
ISO date in a file name is its capture date; otherwise the file's creation
date is used.

  /photos/
  ├── 2020 _noah_/                         # tags: noah
  │   ├── _beach_/                         # tags: noah, beach
  │   │   └── 2020-07-01 09.12.00_sunset_.jpg  # + sunset, dated 2020-07-01
  │   └── 100_1213 _baby nipples_.JPG      # + baby nipples
  └── IMAG0042.jpg                         # no tags

The output directory holds the state (.prepo_cache.json) and the links
photo_0.jpg, photo_1.JPG, ... for every photo passing the filter.

Filter expressions combine tags with & (and), | (or), ! (not) and
parentheses, e.g. \"noah & (beach | park) & !blurry\".")]
#[command(version)]
struct Cli {
    /// Output directory (must exist)
    #[arg(long, default_value = ".", global = true)]
    output: PathBuf,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Overwrite a cache document that failed to load
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register directories to scan for photos
    AddDir {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Stop scanning directories
    RemoveDir {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
    },
    /// Add constraints to the filter
    Filter {
        /// Tag every photo must carry (repeatable)
        #[arg(long = "require", value_name = "TAG")]
        required: Vec<String>,
        /// Tag no photo may carry (repeatable)
        #[arg(long = "disallow", value_name = "TAG")]
        disallowed: Vec<String>,
        /// Boolean tag expression that must hold (repeatable)
        #[arg(long = "expr", value_name = "EXPR")]
        exprs: Vec<String>,
    },
    /// Replace the required tags
    SetRequired { tags: Vec<String> },
    /// Replace the disallowed tags
    SetDisallowed { tags: Vec<String> },
    /// Replace the boolean tag expressions
    SetExpr { exprs: Vec<String> },
    /// Set link order: any, random
    Order { value: String },
    /// Set link type: h|hard, s|symbolic, t|test, none
    LinkType { value: String },
    /// Rescan all directories and rebuild the links
    Update,
    /// Show directories, filter and settings
    Status,
    /// List photos passing the filter
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut repo = PhotoRepo::open(&cli.output)?;
    if cli.force {
        repo.dismiss_load_error();
    }

    match cli.command {
        Command::AddDir { dirs } => {
            for dir in &dirs {
                repo.add_ingest_dir(dir)?;
            }
            persist(&repo)?;
        }
        Command::RemoveDir { dirs } => {
            for dir in &dirs {
                if !repo.remove_ingest_dir(dir) {
                    println!("Not registered: {}", dir.display());
                }
            }
            persist(&repo)?;
        }
        Command::Filter {
            required,
            disallowed,
            exprs,
        } => {
            repo.add_filter(&required, &disallowed, &exprs)?;
            persist(&repo)?;
        }
        Command::SetRequired { tags } => {
            repo.set_required(&tags);
            persist(&repo)?;
        }
        Command::SetDisallowed { tags } => {
            repo.set_disallowed(&tags);
            persist(&repo)?;
        }
        Command::SetExpr { exprs } => {
            repo.set_bool_expr(&exprs)?;
            persist(&repo)?;
        }
        Command::Order { value } => {
            repo.set_order(&value)?;
            persist(&repo)?;
        }
        Command::LinkType { value } => {
            repo.set_link_type(&value)?;
            persist(&repo)?;
        }
        Command::Update => {
            let summary = repo.update()?;
            output::print_update_output(&summary, repo.links(), repo.state().link_type);
        }
        Command::Status => {
            output::print_status(repo.state());
            if let Some(e) = repo.load_error() {
                println!("Cache error: {e}");
            }
        }
        Command::List => {
            output::print_photo_list(&repo.ordered_photos());
        }
    }

    Ok(())
}

/// Save after a settings change, telling the user when the save was refused.
fn persist(repo: &PhotoRepo) -> Result<(), Box<dyn std::error::Error>> {
    if !repo.save()? {
        println!("Settings not saved: the existing cache failed to load. Rerun with --force to overwrite it.");
    }
    Ok(())
}
