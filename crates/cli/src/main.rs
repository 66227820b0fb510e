//! tfusers command-line tool.
//!
//! Converts a user-directory CSV export into a Terraform variables file.
//! Running `tfusers` with no subcommand performs the conversion; the other
//! subcommands inspect generated files and manage the configuration file.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tfusers_core::config::AppConfig;
use tfusers_core::converter::Converter;
use tfusers_core::directory::FieldName;
use tfusers_core::tfvars;

/// Configuration file picked up from the working directory when `--config`
/// is not given.
const DEFAULT_CONFIG: &str = "tfusers.toml";

/// Columns shown by `tfusers check`.
const CHECK_COLUMNS: [FieldName; 5] = [
    FieldName::Login,
    FieldName::DisplayName,
    FieldName::Email,
    FieldName::Department,
    FieldName::StartDate,
];

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Convert a user-directory CSV export into a Terraform variables file.
#[derive(Parser, Debug)]
#[command(
    name = "tfusers",
    version,
    about = "Generate Terraform user variables from a directory CSV export"
)]
struct Cli {
    /// Path to the TOML configuration file (default: ./tfusers.toml if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for the `[convert]` section of the configuration.
#[derive(Args, Debug, Default, Clone, PartialEq)]
struct ConvertArgs {
    /// CSV export to read.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Variables file to write.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Terraform variable name to assign the mapping to.
    #[arg(long)]
    variable: Option<String>,

    /// Field delimiter of the CSV export.
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Print the generated file to stdout instead of writing it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert the CSV export into a variables file (the default).
    Convert(ConvertArgs),

    /// Parse an existing variables file and list its users.
    Check {
        /// Variables file to inspect (default: the configured output).
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Variable name to expect (default: the configured variable).
        #[arg(long)]
        variable: Option<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./tfusers.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.command {
        Some(Commands::Init { .. }) | Some(Commands::Validate) => Ok(AppConfig::default()),
        _ => load_config(cli.config.as_deref()),
    };

    let level = config.as_ref().ok().map(|c| c.log.level.as_str());
    init_logging(cli.verbose, level);

    match config.and_then(|config| run(cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, level: Option<&str>) {
    let default_level = if verbose {
        "debug"
    } else {
        level.unwrap_or("warn")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, config: AppConfig) -> Result<()> {
    // Top-level conversion flags only apply to the bare invocation.
    if cli.command.is_some() && cli.convert != ConvertArgs::default() {
        anyhow::bail!(
            "conversion options must follow the subcommand, e.g. `tfusers convert --input users.csv`"
        );
    }

    match cli.command {
        None => cmd_convert(&config, cli.convert),
        Some(Commands::Convert(args)) => cmd_convert(&config, args),
        Some(Commands::Check { file, variable }) => cmd_check(&config, file, variable),
        Some(Commands::Init { output }) => cmd_init(&output),
        Some(Commands::Validate) => cmd_validate(cli.config.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(AppConfig::default()),
    };

    AppConfig::load_and_validate(path).context("failed to load configuration file")
}

/// Apply command-line overrides on top of the configured conversion settings.
fn merge_args(config: &AppConfig, args: ConvertArgs) -> AppConfig {
    let mut merged = config.clone();
    if let Some(input) = args.input {
        merged.convert.input = input;
    }
    if let Some(output) = args.output {
        merged.convert.output = output;
    }
    if let Some(variable) = args.variable {
        merged.convert.variable = variable;
    }
    if let Some(delimiter) = args.delimiter {
        merged.convert.delimiter = delimiter.to_string();
    }
    merged
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_convert(config: &AppConfig, args: ConvertArgs) -> Result<()> {
    let dry_run = args.dry_run;
    let config = merge_args(config, args);
    config.validate().context("invalid conversion settings")?;

    let options = config.convert.to_options()?;
    debug!(
        input = %options.input.display(),
        output = %options.output.display(),
        variable = %options.variable,
        "resolved conversion settings"
    );
    let converter = Converter::new(options);

    if dry_run {
        let text = converter.preview().context("conversion failed")?;
        print!("{}", text);
        return Ok(());
    }

    let summary = converter.run().context("conversion failed")?;

    println!("{}", style::success("HCL file generated successfully."));
    println!(
        "  {}",
        style::dim(&format!(
            "{} -> {} ({} rows, {} users)",
            summary.input.display(),
            summary.output.display(),
            summary.rows,
            summary.users
        ))
    );

    if !summary.duplicates.is_empty() {
        println!(
            "  {}",
            style::warn(&format!(
                "{} duplicate login(s) overwritten: {}",
                summary.duplicates.len(),
                summary.duplicates.join(", ")
            ))
        );
    }
    if !summary.ignored_columns.is_empty() {
        println!(
            "  {}",
            style::dim(&format!(
                "ignored columns: {}",
                summary.ignored_columns.join(", ")
            ))
        );
    }
    if !summary.missing_fields.is_empty() {
        let names: Vec<String> = summary.missing_fields.iter().map(ToString::to_string).collect();
        println!(
            "  {}",
            style::dim(&format!("columns not in export (left empty): {}", names.join(", ")))
        );
    }

    Ok(())
}

fn cmd_check(config: &AppConfig, file: Option<PathBuf>, variable: Option<String>) -> Result<()> {
    let path = file.unwrap_or_else(|| config.convert.output.clone());
    let variable = variable.unwrap_or_else(|| config.convert.variable.clone());

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let users = tfvars::parse(&text, &variable)
        .with_context(|| format!("{} is not a valid '{}' variables file", path.display(), variable))?;

    println!();
    println!(
        "{}",
        style::header(&format!("{} ({} users)", path.display(), users.len()))
    );
    println!();

    if users.is_empty() {
        println!("{}", style::warn("No users defined"));
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(CHECK_COLUMNS.iter().map(|field| Cell::new(field)));

    for user in users.values() {
        table.add_row(CHECK_COLUMNS.iter().map(|&field| Cell::new(user.get(field))));
    }

    println!("{}", table);
    println!();

    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, AppConfig::default_toml()).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Point [convert].input at your directory export");
    println!(
        "  2. Validate with: tfusers validate --config {}",
        output.display()
    );
    println!("  3. Generate variables: tfusers --config {}", output.display());

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    if let Err(e) = config.validate() {
        println!("  {}", style::error(&format!("Validation error: {}", e)));
        anyhow::bail!("configuration validation failed");
    }
    println!("  {}", style::success("All fields are valid"));

    println!();
    println!("Configuration summary:");
    println!("  Input     : {}", config.convert.input.display());
    println!("  Output    : {}", config.convert.output.display());
    println!("  Variable  : {}", config.convert.variable);
    println!("  Delimiter : {:?}", config.convert.delimiter);
    println!("  Log level : {}", config.log.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}
