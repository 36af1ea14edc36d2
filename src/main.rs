use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::collections::BTreeSet;
use std::path::PathBuf;

use cyclefem::calendar;
use cyclefem::config::AppConfig;
use cyclefem::dates::parse_date;
use cyclefem::error::CycleFemError;
use cyclefem::export::{self, text, ExportFormat};
use cyclefem::import::ImportManager;
use cyclefem::logging::{init_logging, LogLevel};
use cyclefem::{classify, CycleUpdate, Flow, NewCycle, PredictionEngine, StatisticsEngine, UserRecords};

/// CycleFem - Cycle tracking and prediction CLI
///
/// Records menstrual cycles and activities, forecasts the next period,
/// ovulation and fertile window, and summarizes cycle history.
#[derive(Parser)]
#[command(name = "cyclefem")]
#[command(version)]
#[command(about = "Cycle tracking and prediction CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Records file to use instead of the configured one
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cycle records
    Cycle {
        #[command(subcommand)]
        action: CycleAction,
    },

    /// Manage activity records
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    /// Show the forecast for the next cycle
    Predict,

    /// Show statistics over the whole history
    Stats,

    /// Classify conception risk for a date without recording anything
    Risk {
        /// Date to classify (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date_arg)]
        date: NaiveDate,
    },

    /// Show per-day markers for a month
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Import cycles from a CSV or JSON file
    Import {
        /// Input file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export a report or the cycle history
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (json, text, csv)
        #[arg(short = 'f', long, default_value = "json")]
        format: String,

        /// Export the activity log instead of the cycle report
        #[arg(short, long)]
        activities: bool,
    },

    /// Show or update the user profile
    Profile {
        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Declared cycle length for new cycles (21-35)
        #[arg(long)]
        cycle_length: Option<i64>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },
}

#[derive(Subcommand)]
enum CycleAction {
    /// Record a new cycle
    Add(CycleFields),

    /// Update fields of an existing cycle
    Update {
        /// Cycle id
        id: String,

        #[command(flatten)]
        fields: CycleFields,

        /// Clear the end date (cycle ongoing)
        #[arg(long, conflicts_with = "end")]
        clear_end: bool,
    },

    /// Remove a cycle
    Remove {
        /// Cycle id
        id: String,
    },

    /// List all cycles
    List,
}

#[derive(Args)]
struct CycleFields {
    /// First day of the period (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date_arg)]
    start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date_arg)]
    end: Option<NaiveDate>,

    /// Flow intensity (spotting, light, medium, heavy)
    #[arg(short, long)]
    flow: Option<Flow>,

    /// Symptoms, comma separated
    #[arg(long, value_delimiter = ',')]
    symptoms: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum ActivityAction {
    /// Record an activity; its risk is classified now and kept as-is
    Add {
        /// Date of the activity (YYYY-MM-DD)
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Protection was used
        #[arg(short, long)]
        protected: bool,
    },

    /// Remove an activity
    Remove {
        /// Activity id
        id: String,
    },

    /// List all activities, most recent first
    List,
}

fn parse_date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn parse_month(value: &str) -> Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month (expected YYYY-MM): {}", value))?;
    Ok((first.year(), first.month()))
}

fn symptom_set(symptoms: Option<Vec<String>>) -> Option<BTreeSet<String>> {
    symptoms.map(|list| {
        list.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn print_predictions(records: &UserRecords) {
    println!("{}", "Predictions".cyan().bold());
    print!("{}", text::predictions_summary(records.predictions().as_ref()));
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CycleFemError>() {
            Some(app_err) => {
                if app_err.severity().to_tracing_level() == tracing::Level::ERROR {
                    tracing::error!(error = %app_err, "Command failed");
                } else {
                    tracing::warn!(error = %app_err, "Command failed");
                }
                eprintln!("{} {}", "✗".red(), app_err.user_message());
            }
            None => eprintln!("{} {:#}", "✗".red(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(&config_path);

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&log_config)?;

    let data_file = cli.data.unwrap_or_else(|| config.settings.data_file.clone());
    let mut records = UserRecords::load(&data_file)
        .with_context(|| format!("Failed to load records from {}", data_file.display()))?
        .with_engines(
            PredictionEngine::with_config(config.prediction.clone()),
            StatisticsEngine::with_config(config.statistics.clone()),
        );

    match cli.command {
        Commands::Cycle { action } => {
            match action {
                CycleAction::Add(fields) => {
                    let new_cycle = NewCycle {
                        start_date: fields.start,
                        end_date: fields.end,
                        flow: fields.flow,
                        symptoms: symptom_set(fields.symptoms).unwrap_or_default(),
                    };
                    let (cycle, _) = records.append_cycle(new_cycle)?;
                    println!("{} Cycle recorded ({})", "✓".green(), cycle.id);
                }
                CycleAction::Update { id, fields, clear_end } => {
                    let update = CycleUpdate {
                        start_date: fields.start,
                        end_date: if clear_end { Some(None) } else { fields.end.map(Some) },
                        flow: fields.flow,
                        symptoms: symptom_set(fields.symptoms),
                    };
                    records.update_cycle(&id, update)?;
                    println!("{} Cycle updated", "✓".green());
                }
                CycleAction::Remove { id } => {
                    records.remove_cycle(&id)?;
                    println!("{} Cycle removed", "✓".green());
                }
                CycleAction::List => {
                    println!("{}", text::cycles_table(records.cycles()));
                    return Ok(());
                }
            }
            records.save(&data_file)?;
            print_predictions(&records);
        }

        Commands::Activity { action } => match action {
            ActivityAction::Add { date, protected } => {
                let activity = records.append_activity(date, protected);
                records.save(&data_file)?;
                println!(
                    "{} Activity recorded ({}), risk: {}",
                    "✓".green(),
                    activity.id,
                    activity.pregnancy_risk.to_string().bold()
                );
            }
            ActivityAction::Remove { id } => {
                records.remove_activity(&id)?;
                records.save(&data_file)?;
                println!("{} Activity removed", "✓".green());
            }
            ActivityAction::List => {
                println!("{}", text::activities_table(records.activities()));
            }
        },

        Commands::Predict => print_predictions(&records),

        Commands::Stats => {
            println!("{}", "Statistics".magenta().bold());
            print!("{}", text::statistics_summary(&records.statistics()));
        }

        Commands::Risk { date } => {
            let risk = classify(date, records.predictions().as_ref());
            println!("Risk on {}: {}", date.format("%Y-%m-%d"), risk.to_string().bold());
        }

        Commands::Calendar { month } => {
            let (year, month) = match month {
                Some(value) => parse_month(&value)?,
                None => {
                    let today = Utc::now().date_naive();
                    (today.year(), today.month())
                }
            };

            let predictions = records.predictions();
            let markers = calendar::month_markers(
                year,
                month,
                records.cycles(),
                predictions.as_ref(),
                records.activities(),
            )?;

            println!("{}", format!("{}-{:02}", year, month).bold());
            for day in markers.iter().filter(|day| !day.is_empty()) {
                println!("  {}  {}", day.date.format("%Y-%m-%d"), day.labels().join(", "));
            }
        }

        Commands::Import { file } => {
            let cycles = ImportManager::new().import_file(&file)?;
            let count = records.extend_cycles(cycles)?;
            records.save(&data_file)?;
            println!("{} Imported {} cycles from {}", "✓".green(), count, file.display());
            print_predictions(&records);
        }

        Commands::Export { output, format, activities } => {
            let format: ExportFormat = format.parse()?;
            if activities {
                export::export_activity_log(&records, format, &output)?;
            } else {
                export::export_records(&records, format, &output)?;
            }
            println!("{} Exported to {}", "✓".green(), output.display());
        }

        Commands::Profile { name, cycle_length } => {
            let changed = name.is_some() || cycle_length.is_some();
            if let Some(name) = name {
                records.profile_mut().name = name;
            }
            if let Some(days) = cycle_length {
                if !records.profile_mut().set_cycle_length(days) {
                    println!("{} Cycle length must be between 21 and 35 days; keeping {}",
                        "!".yellow(),
                        records.profile().cycle_length
                    );
                }
            }
            if changed {
                records.save(&data_file)?;
            }

            let profile = records.profile();
            println!("Name:         {}", profile.name);
            println!("Cycle length: {} days", profile.cycle_length);
        }

        Commands::Config { list, set, get } => {
            if list {
                println!("{}", toml::to_string_pretty(&config)?);
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .context("Expected key=value")?;
                config.set(key.trim(), value.trim())?;
                config.save_to_file(&config_path)?;
                println!("{} {} = {}", "✓".green(), key.trim(), value.trim());
            } else if let Some(key) = get {
                println!("{}", config.get(&key)?);
            }
        }
    }

    Ok(())
}
