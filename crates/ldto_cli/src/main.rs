//! Command-line entry point for site maintenance tasks.
//!
//! # Responsibility
//! - Probe core linkage (`ping`, `version`).
//! - Export calendars and inspect events against a site database.

use clap::{Parser, Subcommand};
use ldto_core::model::record::Record;
use ldto_core::{
    init_logging, open_db, AppConfig, Conference, ConferenceTrait, Event, RequestContext,
    SiteApi, StaticAuthorizer,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ldto", version, about = "Linux Day Torino site backend tools")]
struct Cli {
    /// SQLite database path (overrides LDTO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (overrides LDTO_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Print the core version
    Version,
    /// Print the iCal export of a conference or one of its events
    Ical {
        #[arg(long)]
        conference: String,
        #[arg(long)]
        event: Option<String>,
    },
    /// Dump the normalized attributes of an event as JSON
    Event {
        #[arg(long)]
        conference: String,
        #[arg(long)]
        event: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match &cli.command {
        Commands::Ping => {
            println!("ldto_core ping={}", ldto_core::ping());
            return Ok(());
        }
        Commands::Version => {
            println!("ldto_core version={}", ldto_core::core_version());
            return Ok(());
        }
        Commands::Ical { .. } | Commands::Event { .. } => {}
    }

    let mut config = AppConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_logging(&config.log_level, &config.log_dir)?;
    let mut conn = open_db(&config.db_path)?;

    match cli.command {
        Commands::Ical { conference, event } => {
            let authorizer = StaticAuthorizer::anonymous();
            let mut ctx = RequestContext::new(&authorizer)
                .with_query("conference", conference)
                .with_query("debug", "1");
            if let Some(event) = event {
                ctx = ctx.with_query("event", event);
            }
            let response = SiteApi::try_new(&mut conn, config.site_url.as_str())?.tropical(&ctx);
            if response.status != ldto_core::api::STATUS_OK {
                return Err(response.body.into());
            }
            print!("{}", response.body);
        }
        Commands::Event { conference, event } => {
            let conference = Conference::factory_from_uid(&conn, &conference)
                .query_row()?
                .ok_or("Conference not found")?;
            let event =
                Event::factory_from_conference_and_uid(&conn, conference.conference_id()?, &event)
                    .query_row()?
                    .ok_or("Event not found")?;
            println!("{}", serde_json::to_string_pretty(event.attributes())?);
        }
        Commands::Ping | Commands::Version => {}
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}
