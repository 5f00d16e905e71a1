//! Command-line interface parsing for the soft-play finder
//!
//! This module handles parsing of CLI arguments using clap, turning the search
//! flags into a `QueryDescriptor` and the connection flags into `Settings`.
//! Connection settings can also come from the environment (or a `.env` file).

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::cache::{CacheManager, DEFAULT_TTL_MS};
use crate::data::{SupabaseClient, SupabaseConfig};
use crate::directory::VenueDirectory;
use crate::fetch::DEFAULT_TIMEOUT_MS;
use crate::filter::{Category, QueryDescriptor};
use crate::logging::LogFormat;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified category name is not recognized
    #[error("Invalid category: '{0}'. Valid categories: toddler, party, cafe, parking, late")]
    InvalidCategory(String),

    /// A minimum rating outside 0-5
    #[error("Invalid rating: {0}. Ratings must be between 0 and 5")]
    InvalidRating(f64),
}

/// Find soft-play and indoor playground venues across the UK
#[derive(Parser, Debug)]
#[command(name = "softplay")]
#[command(about = "Find soft-play and indoor playground venues across the UK")]
#[command(version)]
pub struct Cli {
    /// Supabase project URL; without it only bundled sample venues are shown
    #[arg(long, env = "SUPABASE_URL", global = true)]
    pub supabase_url: Option<String>,

    /// Supabase anonymous API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true, global = true)]
    pub supabase_key: Option<String>,

    /// Timeout for each remote query, in milliseconds
    #[arg(long, env = "SOFTPLAY_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// How long fetched data stays fresh, in milliseconds
    #[arg(long, env = "SOFTPLAY_CACHE_TTL_MS", default_value_t = DEFAULT_TTL_MS, global = true)]
    pub cache_ttl_ms: i64,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search venues
    Search(SearchArgs),
    /// Show one venue in full
    Venue {
        /// Venue identifier
        id: i64,
    },
    /// List towns and cities with their venue counts
    Locations,
    /// Show the highest-rated venues
    Featured {
        /// Number of venues to show
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
}

/// Search criteria
///
/// Examples:
///   softplay search --location leeds --category party
///   softplay search --feature parking --feature cafe --rating 4
///   softplay search --category late --open-today
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Text to find in venue names and descriptions
    #[arg(long, short)]
    pub keyword: Option<String>,

    /// Town, city or postcode fragment
    #[arg(long, short)]
    pub location: Option<String>,

    /// One of: toddler, party, cafe, parking, late
    #[arg(long, short)]
    pub category: Option<String>,

    /// Required feature (repeatable; all must match)
    #[arg(long = "feature", short = 'f', value_name = "FEATURE")]
    pub features: Vec<String>,

    /// Minimum rating (repeatable; the lowest applies)
    #[arg(long = "rating", short = 'r', value_name = "RATING")]
    pub ratings: Vec<f64>,

    /// Only venues open today
    #[arg(long)]
    pub open_today: bool,
}

/// Parses a category string argument into a Category enum.
///
/// # Returns
/// * `Ok(Category)` if the string matches a valid category
/// * `Err(CliError::InvalidCategory)` if the string doesn't match
pub fn parse_category_arg(s: &str) -> Result<Category, CliError> {
    Category::from_str(s).ok_or_else(|| CliError::InvalidCategory(s.to_string()))
}

impl SearchArgs {
    /// Builds the query descriptor for this search
    ///
    /// # Returns
    /// * `Ok(QueryDescriptor)` with every flag applied
    /// * `Err(CliError)` if a category or rating is invalid
    pub fn to_descriptor(&self) -> Result<QueryDescriptor, CliError> {
        let category = self
            .category
            .as_deref()
            .map(parse_category_arg)
            .transpose()?;

        if let Some(bad) = self
            .ratings
            .iter()
            .copied()
            .find(|r| !(0.0..=5.0).contains(r))
        {
            return Err(CliError::InvalidRating(bad));
        }

        Ok(QueryDescriptor {
            keyword: self.keyword.clone(),
            location: self.location.clone(),
            category,
            features: self.features.clone(),
            ratings: self.ratings.clone(),
            open_today: self.open_today,
        })
    }
}

/// Runtime configuration derived from CLI arguments and environment
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Remote store, when both URL and key are configured
    pub supabase: Option<SupabaseConfig>,
    /// Bound on each remote query
    pub timeout: Duration,
    /// Cache freshness window
    pub cache_ttl: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cache_ttl: chrono::Duration::milliseconds(DEFAULT_TTL_MS),
        }
    }
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Settings {
            supabase: SupabaseConfig::from_parts(
                cli.supabase_url.as_deref(),
                cli.supabase_key.as_deref(),
            ),
            timeout: Duration::from_millis(cli.timeout_ms),
            cache_ttl: chrono::Duration::milliseconds(cli.cache_ttl_ms.max(0)),
        }
    }

    /// Builds the venue directory these settings describe
    pub fn build_directory(&self) -> VenueDirectory {
        let cache = CacheManager::new().with_default_ttl(self.cache_ttl);
        match &self.supabase {
            Some(config) => {
                tracing::debug!(url = %config.url, "using remote venue source");
                VenueDirectory::new(Arc::new(SupabaseClient::new(config.clone())), cache)
                    .with_timeout(self.timeout)
            }
            None => {
                tracing::info!("no Supabase credentials configured, serving bundled venues");
                VenueDirectory::offline(cache).with_timeout(self.timeout)
            }
        }
    }
}
