//! club CLI
//!
//! Runs the page validation, phone and rate logic against JSON fixtures.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use club_client::config::AppConfig;
use club_client::rates::{format_cop, FileRateSource};
use club_client::{FeeDisplay, PackageType};
use club_forms::dom::Document;
use club_forms::phone::{format_phone_grouped, format_phone_link, normalize_phone, validate_phone};
use club_forms::{FormGuard, FormValidator, GuardOutcome};

/// Form validation and fee tools for the PAQUETES EL CLUB pages.
#[derive(Parser)]
#[command(name = "club")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Application configuration file (JSON).
    #[arg(short, long, env = "CLUB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a form of a page fixture.
    Validate {
        /// Page fixture (JSON).
        fixture: PathBuf,

        /// Id of the form to validate (every form with an id if omitted).
        #[arg(short, long)]
        form: Option<String>,

        /// Print the errors as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the submit guard on a form and print the panel.
    Guard {
        /// Page fixture (JSON).
        fixture: PathBuf,

        /// Id of the form to check.
        #[arg(short, long)]
        form: String,
    },

    /// Normalize and check a Colombian phone number.
    Phone {
        /// Phone number as typed.
        number: String,
    },

    /// Show the delivery fee for a package type.
    Rate {
        /// Package type (`normal` or `extra_dimensioned`).
        package_type: PackageType,

        /// Rates envelope (JSON) standing in for the rate endpoint.
        #[arg(short, long)]
        rates_file: Option<PathBuf>,
    },

    /// Print a configuration value by dotted path.
    Config {
        /// Dotted path, e.g. `api.timeout`.
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Validate { fixture, form, json } => {
            let doc = load_page(&fixture).await?;
            let form_ids: Vec<String> = match form {
                Some(id) => vec![id],
                None => doc.forms.iter().filter_map(|f| f.id.clone()).collect(),
            };
            if form_ids.is_empty() {
                anyhow::bail!("no form with an id in {}", fixture.display());
            }

            let mut all_valid = true;
            for form in &form_ids {
                let mut validator = FormValidator::new(form).options(config.validator_options());
                let result = validator.validate_in(&doc)?;
                all_valid &= result.is_valid();

                if json {
                    println!("{}", serde_json::to_string_pretty(result.errors())?);
                } else if result.is_valid() {
                    println!("Form '{form}' is valid.");
                } else {
                    println!("Form '{form}' has errors:");
                    for (field, messages) in result.errors().iter() {
                        for message in messages {
                            println!("  {field}: {message}");
                        }
                    }
                }
            }

            if !all_valid {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Guard { fixture, form } => {
            let mut doc = load_page(&fixture).await?;
            let mut guard = FormGuard::default().with_config(config.guard_config());

            match guard.check_form_by_id(&mut doc, &form, Instant::now()) {
                GuardOutcome::Valid { .. } => println!("Form '{form}' may be submitted."),
                GuardOutcome::Invalid { message, .. } => {
                    warn!("Submission blocked: {message}");
                    println!("{}", guard.panel().render());
                    return Ok(ExitCode::FAILURE);
                }
                GuardOutcome::NoForm => anyhow::bail!("form '{form}' not found"),
                GuardOutcome::Ignored | GuardOutcome::Dismissed => {}
            }
        }

        Commands::Phone { number } => {
            let normalized = normalize_phone(&number);
            let valid = validate_phone(&number);
            println!("Normalized: {normalized}");
            println!("Valid:      {}", if valid { "yes" } else { "no" });
            if valid {
                println!("Link:       {}", format_phone_link(&number));
                println!("Display:    {}", format_phone_grouped(&number));
            } else {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Rate {
            package_type,
            rates_file,
        } => {
            let mut book = config.rate_book();
            let display = match rates_file {
                Some(path) => {
                    let source = FileRateSource::new(path);
                    book.fee_display(package_type, &source).await
                }
                None => {
                    info!("No rates file, using page and default rates");
                    FeeDisplay {
                        package_type,
                        base_fee: book.rate_for(package_type),
                        description: package_type.description().to_string(),
                        storage_per_day: book.storage_per_day(),
                    }
                }
            };

            println!("{}: {}", display.description, format_cop(display.base_fee));
            println!("Storage: {}/day", format_cop(display.storage_per_day));
        }

        Commands::Config { key } => match config.get(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => anyhow::bail!("no configuration value at '{key}'"),
        },
    }

    Ok(ExitCode::SUCCESS)
}

async fn load_page(path: &Path) -> anyhow::Result<Document> {
    info!("Reading page fixture {}", path.display());
    let json = tokio::fs::read_to_string(path).await?;
    Ok(Document::from_json_str(&json)?)
}
