//! Core data models for the soft-play directory
//!
//! This module contains the venue record served by the remote data source and
//! the bundled mock dataset, plus the per-city venue counts shown on the
//! locations page.

pub mod mock;
pub mod query;
pub mod supabase;

pub use mock::{mock_location_counts, mock_venues};
pub use query::{QueryError, QueryResponse, SourceError, VenueQuery, VenueSource};
pub use supabase::{SupabaseClient, SupabaseConfig};

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A soft-play or indoor playground listing
///
/// Records are read-only projections of the remote table (or of the mock
/// dataset) and are never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Unique identifier for the venue
    pub id: i64,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
    /// Town or city
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    /// UK postcode
    #[serde(default, deserialize_with = "null_as_default")]
    pub postcode: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Average review score, non-negative when present
    #[serde(default)]
    pub rating: Option<f64>,
    /// Number of reviews behind `rating`
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Free-text feature tags, matched case-insensitively
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    /// Weekday name (e.g. "Friday") to an "HH:MM-HH:MM" range
    #[serde(default, deserialize_with = "null_as_default")]
    pub opening_hours: BTreeMap<String, String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Number of listed venues in one city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCount {
    pub city: String,
    pub count: u32,
}

/// Treats an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tallies venues per city
///
/// Blank cities are skipped. The result is ordered by count descending, then
/// by city name.
pub fn count_by_city<'a, I>(cities: I) -> Vec<LocationCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tally: BTreeMap<&str, u32> = BTreeMap::new();
    for city in cities.into_iter().map(str::trim).filter(|c| !c.is_empty()) {
        *tally.entry(city).or_default() += 1;
    }

    let mut counts: Vec<LocationCount> = tally
        .into_iter()
        .map(|(city, count)| LocationCount {
            city: city.to_string(),
            count,
        })
        .collect();
    sort_location_counts(&mut counts);
    counts
}

/// Orders location counts by count descending, then city name
pub fn sort_location_counts(counts: &mut [LocationCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
}
