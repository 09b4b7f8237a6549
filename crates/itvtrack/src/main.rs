//! `itvtrack` - CLI for the vehicle inspection tracker
//!
//! This binary manages the local inspection collection and prints due dates
//! and calendar links.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{anyhow, Context};
use clap::Parser;

use itvtrack::cli::{Cli, Command, ConfigCommand, ListCommand, OutputFormat};
use itvtrack::record::DATE_FORMAT;
use itvtrack::{
    init_logging, CalendarLinks, Config, Error, ImageLinks, InspectionForm, InspectionRecord,
    LocalStore, LocalTracker, RecordId, SqliteStore,
};

type Tracker = LocalTracker<SqliteStore>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging first: persistence failures are only reported through it
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Add(cmd) => {
            let record = open_tracker(&config)?.submit(&cmd.record.to_form(), None)?;
            println!("Added {} ({})", record.display_name(), record.id);
        }
        Command::Edit(cmd) => {
            let mut tracker = open_tracker(&config)?;
            let id = RecordId::from(cmd.id);
            let form = cmd
                .record
                .apply_to(InspectionForm::from_record(find_record(&tracker, &id)?));
            let record = tracker.submit(&form, Some(&id))?;
            println!("Updated {} ({})", record.display_name(), record.id);
        }
        Command::Remove(cmd) => {
            let id = RecordId::from(cmd.id);
            if !open_tracker(&config)?.remove(&id) {
                return Err(Error::record_not_found(id.as_str()).into());
            }
            println!("Removed {id}");
        }
        Command::List(ListCommand { format }) => {
            let tracker = open_tracker(&config)?;
            let records: Vec<_> = tracker.inspections().iter().collect();
            print_records(&records, format)?;
        }
        Command::Upcoming(ListCommand { format }) => {
            print_records(&open_tracker(&config)?.upcoming(), format)?;
        }
        Command::Show(cmd) => {
            let tracker = open_tracker(&config)?;
            let record = find_record(&tracker, &RecordId::from(cmd.id))?;
            show_record(&config, record, cmd.json)?;
        }
        Command::Calendar(cmd) => {
            let tracker = open_tracker(&config)?;
            let id = RecordId::from(cmd.id);
            let record = find_record(&tracker, &id)?;
            let link = CalendarLinks::new(&config.calendar)?
                .link_for(record)
                .ok_or_else(|| anyhow!("record {id} has no ITV date"))?;
            println!("{link}");
        }
        Command::Stats(cmd) => handle_stats(&open_tracker(&config)?, cmd.json)?,
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
    }
    Ok(())
}

fn open_tracker(config: &Config) -> anyhow::Result<Tracker> {
    let db_path = config.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    Ok(LocalTracker::open(LocalStore::new(
        store,
        &config.storage.storage_key,
    )))
}

fn find_record<'a>(tracker: &'a Tracker, id: &RecordId) -> itvtrack::Result<&'a InspectionRecord> {
    tracker
        .inspections()
        .get(id)
        .ok_or_else(|| Error::record_not_found(id.as_str()))
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format(DATE_FORMAT).to_string())
}

fn print_records(records: &[&InspectionRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Plain => {
            for record in records {
                println!(
                    "{}  {}  {}  next ITV {}",
                    record.id,
                    record.display_name(),
                    record.vehicle_license,
                    format_date(record.next_due_date())
                );
            }
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No inspection records.");
                return Ok(());
            }
            println!(
                "{:<36}  {:<24}  {:<10}  {:<10}  {:<10}",
                "ID", "VEHICLE", "LICENSE", "LAST ITV", "NEXT ITV"
            );
            for record in records {
                println!(
                    "{:<36}  {:<24}  {:<10}  {:<10}  {:<10}",
                    record.id.as_str(),
                    record.display_name(),
                    record.vehicle_license,
                    format_date(record.itv_date),
                    format_date(record.next_due_date())
                );
            }
        }
    }
    Ok(())
}

fn show_record(config: &Config, record: &InspectionRecord, json: bool) -> anyhow::Result<()> {
    let image = ImageLinks::new(&config.images)?.url_for(&record.vehicle_model);
    let calendar = CalendarLinks::new(&config.calendar)?.link_for(record);

    if json {
        let details = serde_json::json!({
            "record": record,
            "nextDueDate": record.next_due_date().map(|d| d.format(DATE_FORMAT).to_string()),
            "vehicleAge": record.vehicle_age(),
            "imageUrl": image.as_str(),
            "calendarLink": calendar.as_ref().map(url::Url::as_str),
        });
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    println!("{}", record.display_name());
    println!("{}", "=".repeat(record.display_name().len()));
    println!("  ID:               {}", record.id);
    println!("  License:          {}", record.vehicle_license);
    println!(
        "  Registered:       {}",
        record
            .registration_year
            .map_or_else(|| "-".to_string(), |y| y.to_string())
    );
    if let Some(age) = record.vehicle_age() {
        println!("  Age:              {age} years");
    }
    println!("  Inspection date:  {}", format_date(record.inspection_date));
    println!("  Last ITV:         {}", format_date(record.itv_date));
    println!("  Next ITV:         {}", format_date(record.next_due_date()));
    if let Some(notes) = &record.notes {
        println!("  Notes:            {notes}");
    }
    println!("  Image:            {image}");
    if let Some(link) = calendar {
        println!("  Calendar:         {link}");
    }
    Ok(())
}

fn handle_stats(tracker: &Tracker, json: bool) -> anyhow::Result<()> {
    let backend = tracker.store().backend();
    let stats = backend.stats()?;
    let records = tracker.inspections().len();
    let upcoming = tracker.upcoming().len();

    if json {
        let status = serde_json::json!({
            "database_path": backend.path(),
            "storage_key": tracker.store().key(),
            "records": records,
            "upcoming": upcoming,
            "total_keys": stats.total_keys,
            "last_write": stats.last_write.map(|t| t.to_rfc3339()),
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("itvtrack stats");
        println!("--------------");
        println!("Database:      {}", backend.path().display());
        println!("Storage key:   {}", tracker.store().key());
        println!("Records:       {records}");
        println!("With ITV date: {upcoming}");
        println!(
            "Last write:    {}",
            stats
                .last_write
                .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
        );
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Storage key:        {}", config.storage.storage_key);
                println!();
                println!("[Calendar]");
                println!("  Base URL:           {}", config.calendar.base_url);
                println!("  Event location:     {}", config.calendar.event_location);
                println!();
                println!("[Images]");
                println!("  Base URL:           {}", config.images.base_url);
                println!(
                    "  Size:               {}x{}",
                    config.images.width, config.images.height
                );
                println!();
                println!("[Sync]");
                println!("  App id:             {}", config.sync.app_id);
                println!(
                    "  Auth token:         {}",
                    if config.sync.auth_token.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
