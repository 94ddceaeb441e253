//! Meetprep CLI - meeting intelligence reports
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use meetprep::chat::{self, ChatContext};
use meetprep::report::value_text;
use meetprep::search::{SearchDepth, TavilyClient};
use meetprep::{agent, Config, EventDetails, Report, ReportError, ReportService};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "meetprep")]
#[command(author, version, about = "Meeting intelligence reports from calendar events", long_about = None)]
struct Cli {
    /// Path to meetprep.toml (defaults to ./meetprep.toml, then ~/.config/meetprep/)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the report for an event, generating it if needed
    Prepare {
        /// Calendar event id
        #[arg(long)]
        event_id: String,
        /// Owner of the report
        #[arg(long)]
        user: String,
        /// Event title
        #[arg(long)]
        title: String,
        /// Event description, e.g. "Jane Doe - Acme Corp"
        #[arg(long)]
        description: String,
        /// Start time (RFC 3339)
        #[arg(long)]
        start: String,
        /// End time (RFC 3339)
        #[arg(long)]
        end: String,
        /// Attendee email, repeatable
        #[arg(long = "attendee")]
        attendees: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a user's reports, newest first
    List {
        #[arg(long)]
        user: String,
        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one of a user's reports
    Delete {
        #[arg(long)]
        user: String,
        /// Report id
        report_id: Uuid,
    },
    /// Delete all of a user's reports
    Clear {
        #[arg(long)]
        user: String,
    },
    /// Show the person and company found in a description
    Extract {
        /// Event description
        text: String,
    },
    /// Ask a follow-up question about a meeting
    Ask {
        /// The question
        question: String,
        #[arg(long)]
        person: Option<String>,
        #[arg(long)]
        company: Option<String>,
        /// Meeting title
        #[arg(long)]
        event: Option<String>,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Prepare {
            event_id,
            user,
            title,
            description,
            start,
            end,
            attendees,
            json,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let service = ReportService::from_config(&config)?;
            let event = EventDetails {
                title,
                description,
                start_time: parse_time(&start)?,
                end_time: parse_time(&end)?,
                attendees,
            };

            match service.get_or_generate(&event_id, &user, event).await {
                Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
                Ok(report) => print_report(&report),
                Err(e @ ReportError::Unresolvable { .. }) => {
                    eprintln!("{}", "Describe the meeting as \"Person Name - Company Name\".".yellow());
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::List { user, json } => {
            let config = load_config(cli.config.as_ref())?;
            let service = ReportService::from_config(&config)?;
            let reports = service.list_by_user(&user)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else if reports.is_empty() {
                println!("No stored reports found.");
            } else {
                println!("Stored reports ({}):\n", reports.len());
                for report in reports {
                    println!(
                        "📄 {} ({})",
                        report.event_details.title.bold(),
                        report.created_at.format("%Y-%m-%d %H:%M")
                    );
                    println!(
                        "   {} - {}",
                        report.extracted_info.person_name, report.extracted_info.company_name
                    );
                    println!("   id {}  event {}\n", report.id, report.event_id);
                }
            }
        }
        Commands::Delete { user, report_id } => {
            let config = load_config(cli.config.as_ref())?;
            let service = ReportService::from_config(&config)?;
            if service.delete_one(report_id, &user)? {
                println!("Report {} deleted.", report_id);
            } else {
                println!("No report {} owned by {}.", report_id, user);
            }
        }
        Commands::Clear { user } => {
            let config = load_config(cli.config.as_ref())?;
            let service = ReportService::from_config(&config)?;
            let removed = service.clear_all(&user)?;
            println!("Cache cleared: {} report(s) deleted.", removed);
        }
        Commands::Extract { text } => match meetprep::extract_entities(&text) {
            Some(entities) => {
                println!("Person:  {}", entities.person_name.bold());
                println!("Company: {}", entities.company_name.bold());
            }
            None => println!("{}", "No \"Person Name - Company\" pair found.".yellow()),
        },
        Commands::Ask {
            question,
            person,
            company,
            event,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let completer = agent::build_completer(&config)?;
            let search = TavilyClient::new(
                config.search_api_key()?,
                SearchDepth::from_config(&config.search.depth),
            )?;
            let context = ChatContext {
                person_name: person,
                company_name: company,
                event_summary: event,
            };

            let answer = chat::ask(&search, completer.as_ref(), &question, &context).await?;
            println!("{}\n", answer.message);
            for hit in &answer.search_results {
                println!("🔗 {}", hit.title.dimmed());
                if !hit.url.is_empty() {
                    println!("   {}", hit.url.dimmed());
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "meetprep", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.context("failed to load meetprep.toml")
}

fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 time: {}", value))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Logs go to stderr so report output on stdout stays pipeable
fn init_tracing(verbose: u8, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "meetprep=info",
        1 => "meetprep=debug",
        _ => "meetprep=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn print_report(report: &Report) {
    let person = &report.person_intelligence;
    let company = &report.company_intelligence;

    println!("=== {} ===\n", report.event_details.title.bold());
    println!(
        "🗓  {} → {}",
        report.event_details.start_time.format("%Y-%m-%d %H:%M"),
        report.event_details.end_time.format("%H:%M")
    );
    if !report.event_details.attendees.is_empty() {
        println!("   {}", report.event_details.attendees.join(", "));
    }

    println!("\n💡 Summary:");
    println!("  {}\n", report.generated_summary);

    println!(
        "👤 {} - {}",
        report.extracted_info.person_name.bold(),
        person.job_title
    );
    let background = value_text(&person.background);
    if !background.is_empty() {
        println!("  {}", background);
    }
    if !person.linked_in_profile.is_empty() {
        println!("  {}", person.linked_in_profile.dimmed());
    }
    for news in &person.recent_news {
        println!("  • {}", news);
    }
    println!("  {}\n", format!("source: {}", person.source).dimmed());

    println!(
        "🏢 {} - {}",
        report.extracted_info.company_name.bold(),
        company.industry
    );
    println!("  {}", company.description);
    let size = value_text(&company.size);
    if !size.is_empty() {
        println!("  Size: {}", size);
    }
    if !company.website.is_empty() {
        println!("  {}", company.website.dimmed());
    }
    for news in &company.recent_news {
        println!("  • {}", news);
    }
    println!("  {}\n", format!("source: {}", company.source).dimmed());

    println!("✅ Preparation Tips:");
    for tip in &report.preparation_tips {
        println!("  • {}", tip);
    }
}
