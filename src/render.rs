//! Plain-text rendering of directory results

use crate::data::{LocationCount, Venue};
use crate::filter::weekday_name;

/// Shown above results that come from the bundled dataset
pub const FALLBACK_BANNER: &str =
    "Live venue data is unavailable right now. Showing sample venues instead.";

const WEEK: [chrono::Weekday; 7] = [
    chrono::Weekday::Mon,
    chrono::Weekday::Tue,
    chrono::Weekday::Wed,
    chrono::Weekday::Thu,
    chrono::Weekday::Fri,
    chrono::Weekday::Sat,
    chrono::Weekday::Sun,
];

/// Formats a rating as "4.5 (212 reviews)", or "unrated"
pub fn format_rating(venue: &Venue) -> String {
    match (venue.rating, venue.review_count) {
        (Some(rating), Some(reviews)) => format!("{:.1} ({} reviews)", rating, reviews),
        (Some(rating), None) => format!("{:.1}", rating),
        (None, _) => "unrated".to_string(),
    }
}

/// One-line summary used in result lists
pub fn format_venue_line(venue: &Venue) -> String {
    let mut place = venue.city.clone();
    if !venue.postcode.is_empty() {
        if !place.is_empty() {
            place.push_str(", ");
        }
        place.push_str(&venue.postcode);
    }
    format!("#{:<4} {} - {} - {}", venue.id, venue.name, place, format_rating(venue))
}

/// Full listing for the venue detail view
pub fn format_venue_detail(venue: &Venue) -> String {
    let mut lines = vec![
        venue.name.clone(),
        "=".repeat(venue.name.chars().count()),
    ];

    if let Some(description) = &venue.description {
        lines.push(description.clone());
        lines.push(String::new());
    }

    let address: Vec<&str> = [
        venue.address.as_deref(),
        Some(venue.city.as_str()),
        Some(venue.postcode.as_str()),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect();
    if !address.is_empty() {
        lines.push(format!("Address:  {}", address.join(", ")));
    }
    for (label, value) in [
        ("Phone:", &venue.phone),
        ("Email:", &venue.email),
        ("Website:", &venue.website),
    ] {
        if let Some(value) = value {
            lines.push(format!("{:<9} {}", label, value));
        }
    }
    lines.push(format!("Rating:   {}", format_rating(venue)));

    if !venue.features.is_empty() {
        lines.push(format!("Features: {}", venue.features.join(", ")));
    }

    if !venue.opening_hours.is_empty() {
        lines.push("Opening hours:".to_string());
        lines.extend(WEEK.into_iter().map(|day| {
            let name = weekday_name(day);
            let hours = venue
                .opening_hours
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, range)| range.trim())
                .filter(|range| !range.is_empty())
                .unwrap_or("Closed");
            format!("  {:<10} {}", name, hours)
        }));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Location list, one "City (n)" per line
pub fn format_location_counts(counts: &[LocationCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{} ({})", c.city, c.count))
        .collect::<Vec<_>>()
        .join("\n")
}
