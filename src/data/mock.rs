//! Bundled fallback data
//!
//! A fixed set of venues and per-city counts served when the remote source is
//! unreachable or returns an error.

use std::collections::BTreeMap;

use super::{sort_location_counts, LocationCount, Venue};

fn hours(days: &[(&str, &str)]) -> BTreeMap<String, String> {
    days.iter()
        .map(|(day, range)| (day.to_string(), range.to_string()))
        .collect()
}

fn tags(features: &[&str]) -> Vec<String> {
    features.iter().map(|f| f.to_string()).collect()
}

/// The three venues shown when live data is unavailable
pub fn mock_venues() -> Vec<Venue> {
    vec![
        Venue {
            id: 1,
            name: "Jungle Jim's Play Centre".to_string(),
            description: Some(
                "Three-storey jungle frame with a toddler zone and themed party rooms."
                    .to_string(),
            ),
            address: Some("12 Deansgate".to_string()),
            city: "Manchester".to_string(),
            postcode: "M3 2BW".to_string(),
            phone: Some("0161 555 0134".to_string()),
            email: Some("hello@junglejims.example".to_string()),
            website: Some("https://junglejims.example".to_string()),
            rating: Some(4.5),
            review_count: Some(212),
            latitude: Some(53.4794),
            longitude: Some(-2.2453),
            features: tags(&["Toddler area", "Party rooms", "Café", "Free parking"]),
            opening_hours: hours(&[
                ("Monday", "9:30-18:30"),
                ("Tuesday", "9:30-18:30"),
                ("Wednesday", "9:30-18:30"),
                ("Thursday", "9:30-18:30"),
                ("Friday", "9:30-18:30"),
                ("Saturday", "9:00-19:00"),
                ("Sunday", "10:00-17:00"),
            ]),
            image_url: Some("https://images.example/jungle-jims.jpg".to_string()),
        },
        Venue {
            id: 2,
            name: "Little Explorers Soft Play".to_string(),
            description: Some(
                "Calm soft play for under 5s with a sensory room and baby area.".to_string(),
            ),
            address: Some("48 Clapham High Street".to_string()),
            city: "London".to_string(),
            postcode: "SW4 7UR".to_string(),
            phone: Some("020 7946 0321".to_string()),
            email: None,
            website: Some("https://littleexplorers.example".to_string()),
            rating: Some(4.2),
            review_count: Some(96),
            latitude: Some(51.4627),
            longitude: Some(-0.1376),
            features: tags(&["Baby zone", "Sensory room", "Coffee shop"]),
            opening_hours: hours(&[
                ("Monday", "9:00-17:00"),
                ("Tuesday", "9:00-17:00"),
                ("Wednesday", "9:00-17:00"),
                ("Thursday", "9:00-17:00"),
                ("Friday", "9:00-17:00"),
                ("Saturday", "10:00-16:00"),
                ("Sunday", ""),
            ]),
            image_url: Some("https://images.example/little-explorers.jpg".to_string()),
        },
        Venue {
            id: 3,
            name: "Bounce Kingdom".to_string(),
            description: Some(
                "Trampoline park and adventure play with late sessions on Fridays.".to_string(),
            ),
            address: Some("Unit 4, Fort Parkway".to_string()),
            city: "Birmingham".to_string(),
            postcode: "B24 9FD".to_string(),
            phone: Some("0121 496 0777".to_string()),
            email: Some("bookings@bouncekingdom.example".to_string()),
            website: None,
            rating: Some(3.8),
            review_count: Some(154),
            latitude: Some(52.5139),
            longitude: Some(-1.8231),
            features: tags(&["Trampolines", "Birthday parties", "Car park"]),
            opening_hours: hours(&[
                ("Wednesday", "10:00-17:30"),
                ("Thursday", "10:00-17:30"),
                ("Friday", "10:00-20:00"),
                ("Saturday", "9:00-18:00"),
                ("Sunday", "9:00-17:00"),
            ]),
            image_url: None,
        },
    ]
}

/// Per-city venue counts shown when live data is unavailable
pub fn mock_location_counts() -> Vec<LocationCount> {
    let mut counts: Vec<LocationCount> = [
        ("London", 24),
        ("Manchester", 15),
        ("Birmingham", 12),
        ("Leeds", 9),
        ("Glasgow", 8),
        ("Bristol", 7),
        ("Liverpool", 6),
        ("Cardiff", 4),
    ]
    .into_iter()
    .map(|(city, count)| LocationCount {
        city: city.to_string(),
        count,
    })
    .collect();
    sort_location_counts(&mut counts);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_venues_has_3_entries() {
        assert_eq!(mock_venues().len(), 3);
    }

    #[test]
    fn test_mock_venues_have_unique_ids() {
        let mut ids: Vec<i64> = mock_venues().iter().map(|v| v.id).collect();
        let original_len = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), original_len, "Venue IDs are not unique");
    }

    #[test]
    fn test_mock_venues_have_valid_uk_coordinates() {
        for venue in mock_venues() {
            let lat = venue.latitude.expect("mock venues carry coordinates");
            let lon = venue.longitude.expect("mock venues carry coordinates");
            assert!(
                (49.8..=60.9).contains(&lat),
                "Venue {} has invalid latitude: {}",
                venue.name,
                lat
            );
            assert!(
                (-8.7..=1.8).contains(&lon),
                "Venue {} has invalid longitude: {}",
                venue.name,
                lon
            );
        }
    }

    #[test]
    fn test_mock_ratings_are_non_negative() {
        for venue in mock_venues() {
            assert!(
                venue.rating.unwrap_or(0.0) >= 0.0,
                "Venue {} has a negative rating",
                venue.name
            );
        }
    }

    #[test]
    fn test_mock_location_counts_are_sorted() {
        let counts = mock_location_counts();
        assert_eq!(counts.first().map(|c| c.city.as_str()), Some("London"));
        assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
    }
}
