use clap::{Parser, Subcommand};
use quill_cli::commands::{self, OutputFormat};
use quill_cli::{CliContext, logging, readline};
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), String> {
    logging::init();

    let cli = Cli::parse();
    let ctx = CliContext::new(cli.config.as_deref(), cli.catalog.clone())?;

    // One-shot mode when a subcommand was given, interactive otherwise
    if let Some(command) = &cli.command {
        run(command, &ctx)?;
        return Ok(());
    }

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "Scribing recipe detection for combat logs")]
struct Cli {
    /// Catalog TOML replacing the bundled catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Config TOML to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect one ability for one player
    Detect {
        #[arg(short, long)]
        events: PathBuf,
        #[arg(short, long)]
        player: i64,
        #[arg(short, long)]
        ability: i64,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Detect every scribing ability of every player in a fight
    Batch {
        #[arg(short, long)]
        events: PathBuf,
        /// Override the fight id from the dump
        #[arg(long)]
        fight: Option<i64>,
        /// Restrict to these players (repeatable)
        #[arg(short, long)]
        player: Vec<i64>,
        #[arg(long)]
        parallel: bool,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show what the catalog knows about an ability id
    Lookup { ability: i64 },
    /// Summarize the loaded catalog
    Catalog,
    Exit,
}

fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "quill".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(command) => run(command, ctx),
        None => Ok(false),
    }
}

/// Returns true when the REPL should quit
fn run(command: &Commands, ctx: &CliContext) -> Result<bool, String> {
    match command {
        Commands::Detect {
            events,
            player,
            ability,
            format,
        } => commands::detect(ctx, events, *player, *ability, *format)?,
        Commands::Batch {
            events,
            fight,
            player,
            parallel,
            format,
        } => commands::batch(ctx, events, *fight, player, *parallel, *format)?,
        Commands::Lookup { ability } => commands::lookup(ctx, *ability)?,
        Commands::Catalog => commands::show_catalog(ctx)?,
        Commands::Exit => {
            commands::exit();
            return Ok(true);
        }
    }
    Ok(false)
}
