//! softplay - find soft-play and indoor playground venues across the UK
//!
//! Searches the hosted venue directory, falling back to a bundled sample of
//! venues when the directory cannot be reached.

use chrono::{Datelike, Local};
use clap::Parser;
use serde::Serialize;

use softplay::cli::{Cli, Command, Settings};
use softplay::directory::DirectoryResponse;
use softplay::logging;
use softplay::render::{self, FALLBACK_BANNER};

/// Prints the fallback banner to stderr when sample data is shown
fn print_banner<T>(response: &DirectoryResponse<T>) {
    if response.showing_fallback {
        eprintln!("note: {}", FALLBACK_BANNER);
    }
}

fn print_json<T: Serialize>(response: &DirectoryResponse<T>) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let settings = Settings::from_cli(&cli);
    let directory = settings.build_directory();

    match &cli.command {
        Command::Search(args) => {
            let descriptor = match args.to_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(2);
                }
            };

            let today = Local::now().weekday();
            let results = directory.search(&descriptor, today).await;

            if cli.json {
                return Ok(print_json(&results)?);
            }
            print_banner(&results);
            if results.data.is_empty() {
                println!("No venues match your search.");
            }
            for venue in &results.data {
                println!("{}", render::format_venue_line(venue));
            }
        }
        Command::Venue { id } => {
            let detail = directory.venue_by_id(*id).await;

            if cli.json {
                return Ok(print_json(&detail)?);
            }
            print_banner(&detail);
            match &detail.data {
                Some(venue) => print!("{}", render::format_venue_detail(venue)),
                None => {
                    eprintln!("error: no venue with id {}", id);
                    std::process::exit(1);
                }
            }
        }
        Command::Locations => {
            let counts = directory.location_counts().await;

            if cli.json {
                return Ok(print_json(&counts)?);
            }
            print_banner(&counts);
            println!("{}", render::format_location_counts(&counts.data));
        }
        Command::Featured { limit } => {
            let featured = directory.featured(*limit).await;

            if cli.json {
                return Ok(print_json(&featured)?);
            }
            print_banner(&featured);
            for venue in &featured.data {
                println!("{}", render::format_venue_line(venue));
            }
        }
    }

    Ok(())
}
