//! Search criteria and the in-memory filter pipeline
//!
//! A `QueryDescriptor` is a snapshot of the active search criteria.
//! `apply_filters` narrows an already fetched venue collection with it. The
//! live and fallback data paths both go through `apply_filters`, so they
//! always apply the same logic.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::data::Venue;

/// Closing hour (24h clock) from which a venue counts as open late
const LATE_CLOSING_HOUR: u32 = 18;

/// Single-select search categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Suitable for toddlers and babies
    Toddler,
    /// Hosts parties
    Party,
    /// Has a café on site
    Cafe,
    /// Has parking
    Parking,
    /// Closes at 18:00 or later on at least one day
    Late,
}

impl Category {
    /// Returns a slice containing all category variants.
    pub fn all() -> &'static [Category] {
        &[
            Category::Toddler,
            Category::Party,
            Category::Cafe,
            Category::Parking,
            Category::Late,
        ]
    }

    /// Returns a human-readable display label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Toddler => "Toddler friendly",
            Category::Party => "Party venues",
            Category::Cafe => "On-site café",
            Category::Parking => "Parking",
            Category::Late => "Open late",
        }
    }

    /// Parses user input into a Category.
    ///
    /// Matching is case-insensitive and supports aliases:
    /// - "toddler" | "toddlers" | "toddler-friendly" -> Toddler
    /// - "party" | "parties" | "party-capable" -> Party
    /// - "cafe" | "café" | "has-cafe" -> Cafe
    /// - "parking" | "has-parking" -> Parking
    /// - "late" | "open-late" -> Late
    ///
    /// Returns `None` if the input doesn't match any category.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Category> {
        match s.to_lowercase().trim() {
            "toddler" | "toddlers" | "toddler-friendly" => Some(Category::Toddler),
            "party" | "parties" | "party-capable" => Some(Category::Party),
            "cafe" | "café" | "has-cafe" => Some(Category::Cafe),
            "parking" | "has-parking" => Some(Category::Parking),
            "late" | "open-late" => Some(Category::Late),
            _ => None,
        }
    }

    /// Lowercase fragments a feature tag must contain to fit the category
    ///
    /// `Late` is decided from opening hours and has none.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Toddler => &["toddler", "baby", "under 5", "sensory"],
            Category::Party => &["party", "parties"],
            Category::Cafe => &["café", "cafe", "coffee"],
            Category::Parking => &["parking", "car park"],
            Category::Late => &[],
        }
    }

    /// Whether `venue` belongs in this category
    pub fn matches(&self, venue: &Venue) -> bool {
        match self {
            Category::Late => venue
                .opening_hours
                .values()
                .filter_map(|range| closing_hour(range))
                .any(|hour| hour >= LATE_CLOSING_HOUR),
            _ => venue.features.iter().any(|feature| {
                let feature = feature.to_lowercase();
                self.keywords().iter().any(|kw| feature.contains(kw))
            }),
        }
    }
}

/// Snapshot of the active search criteria
///
/// Empty strings and empty lists mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Matched against name and description
    pub keyword: Option<String>,
    /// Matched against city and postcode
    pub location: Option<String>,
    pub category: Option<Category>,
    /// Every entry must match at least one feature tag
    pub features: Vec<String>,
    /// Selected minimum ratings; the lowest one applies
    pub ratings: Vec<f64>,
    /// Only venues with hours for the current weekday
    pub open_today: bool,
}

impl QueryDescriptor {
    /// The effective rating floor: the smallest selected rating
    pub fn min_rating(&self) -> Option<f64> {
        self.ratings.iter().copied().reduce(f64::min)
    }

    /// Whether no criterion is active
    pub fn is_empty(&self) -> bool {
        active_term(&self.keyword).is_none()
            && active_term(&self.location).is_none()
            && self.category.is_none()
            && self.features.is_empty()
            && self.ratings.is_empty()
            && !self.open_today
    }
}

/// Lowercased search term, or `None` when empty
///
/// Whitespace is significant: " park" does not match "Carpark".
fn active_term(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Extracts the hour from the closing half of an "HH:MM-HH:MM" range
///
/// Returns `None` for blank or malformed ranges.
pub fn closing_hour(range: &str) -> Option<u32> {
    let (_, close) = range.split_once('-')?;
    close.trim().split(':').next()?.trim().parse().ok()
}

/// English weekday name as used for opening-hours keys
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Whether `venue` lists non-empty hours for `day`
pub fn is_open_on(venue: &Venue, day: Weekday) -> bool {
    let name = weekday_name(day);
    venue
        .opening_hours
        .iter()
        .any(|(key, range)| key.trim().eq_ignore_ascii_case(name) && !range.trim().is_empty())
}

/// Narrows `venues` to those satisfying every active criterion
///
/// Criteria apply in a fixed order: keyword, location, category, features,
/// rating, open today. `today` is the weekday used by the open-today check.
/// Input order is preserved.
pub fn apply_filters(venues: &[Venue], query: &QueryDescriptor, today: Weekday) -> Vec<Venue> {
    let keyword = active_term(&query.keyword);
    let location = active_term(&query.location);
    let features: Vec<String> = query.features.iter().map(|f| f.to_lowercase()).collect();
    let min_rating = query.min_rating();

    venues
        .iter()
        .filter(|v| match &keyword {
            Some(kw) => {
                contains_ignore_case(&v.name, kw)
                    || v.description.as_deref().is_some_and(|d| contains_ignore_case(d, kw))
            }
            None => true,
        })
        .filter(|v| match &location {
            Some(loc) => {
                contains_ignore_case(&v.city, loc) || contains_ignore_case(&v.postcode, loc)
            }
            None => true,
        })
        .filter(|v| query.category.map_or(true, |c| c.matches(v)))
        .filter(|v| {
            features
                .iter()
                .all(|wanted| v.features.iter().any(|tag| contains_ignore_case(tag, wanted)))
        })
        .filter(|v| match min_rating {
            Some(floor) => v.rating.is_some_and(|r| r >= floor),
            None => true,
        })
        .filter(|v| !query.open_today || is_open_on(v, today))
        .cloned()
        .collect()
}
