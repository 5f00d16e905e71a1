//! Venue directory: the data layer behind search, listing and location pages
//!
//! Each lookup goes cache → timeout-bounded remote query → bundled mock data,
//! in that order of preference. Results that come from the mock dataset are
//! flagged with `showing_fallback` so the front end can show a banner.

use std::sync::Arc;
use std::time::Duration;

use chrono::Weekday;
use serde::Serialize;

use crate::cache::CacheManager;
use crate::data::{mock_location_counts, mock_venues, LocationCount, Venue, VenueQuery, VenueSource};
use crate::fetch::{safe_query_with_timeout, FetchFailure, DEFAULT_TIMEOUT_MS};
use crate::filter::{apply_filters, QueryDescriptor};

/// Cache key for the full venue list
pub const ALL_VENUES_KEY: &str = "venues:all";

/// Cache key for per-city venue counts
pub const LOCATION_COUNTS_KEY: &str = "locations:counts";

/// Cache key for a single venue
fn venue_key(id: i64) -> String {
    format!("venue:{}", id)
}

/// Data served by the directory, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryResponse<T> {
    pub data: T,
    /// True when the bundled mock dataset stands in for live data
    pub showing_fallback: bool,
}

impl<T> DirectoryResponse<T> {
    fn live(data: T) -> Self {
        Self {
            data,
            showing_fallback: false,
        }
    }

    fn fallback(data: T) -> Self {
        Self {
            data,
            showing_fallback: true,
        }
    }
}

/// Looks up venues with caching and mock-data fallback
///
/// Without a remote source every lookup is answered from the mock dataset.
#[derive(Clone)]
pub struct VenueDirectory {
    source: Option<Arc<dyn VenueSource>>,
    cache: CacheManager,
    timeout: Duration,
}

impl VenueDirectory {
    /// Creates a directory over `source`, sharing `cache`
    pub fn new(source: Arc<dyn VenueSource>, cache: CacheManager) -> Self {
        Self {
            source: Some(source),
            cache,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Creates a directory that only serves the mock dataset
    pub fn offline(cache: CacheManager) -> Self {
        Self {
            source: None,
            cache,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Overrides the bound on each remote query
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn is_offline(&self) -> bool {
        self.source.is_none()
    }

    /// Runs `query` against the remote source under the timeout
    async fn query_venues(&self, query: VenueQuery) -> Result<Vec<Venue>, FetchFailure> {
        let source = self.source.clone().ok_or(FetchFailure::NoSource)?;
        safe_query_with_timeout(source.select_venues(&query), self.timeout, None)
            .await
            .into_result()
    }

    /// Every venue, from cache or the remote source
    async fn load_venues(&self) -> Result<Vec<Venue>, FetchFailure> {
        self.cache
            .fetch_with_cache(ALL_VENUES_KEY, move || {
                self.query_venues(VenueQuery::new().order("name", true))
            })
            .await
    }

    /// All venues, or the mock dataset when they cannot be loaded
    pub async fn all_venues(&self) -> DirectoryResponse<Vec<Venue>> {
        match self.load_venues().await {
            Ok(venues) => DirectoryResponse::live(venues),
            Err(reason) => {
                tracing::warn!(reason = %reason, "showing bundled venues");
                DirectoryResponse::fallback(mock_venues())
            }
        }
    }

    /// Runs a search, filtering in memory
    ///
    /// The full venue list is fetched (or served from cache) once and narrowed
    /// with `apply_filters`. When live data is unavailable the mock dataset is
    /// filtered the same way. `today` drives the open-today criterion.
    pub async fn search(
        &self,
        query: &QueryDescriptor,
        today: Weekday,
    ) -> DirectoryResponse<Vec<Venue>> {
        let all = self.all_venues().await;
        let venues = apply_filters(&all.data, query, today);
        tracing::debug!(
            matched = venues.len(),
            total = all.data.len(),
            showing_fallback = all.showing_fallback,
            "search complete"
        );
        DirectoryResponse {
            data: venues,
            showing_fallback: all.showing_fallback,
        }
    }

    /// Looks up one venue for its detail page
    pub async fn venue_by_id(&self, id: i64) -> DirectoryResponse<Option<Venue>> {
        let result = self
            .cache
            .fetch_with_cache(&venue_key(id), move || async move {
                let rows = self.query_venues(VenueQuery::new().eq("id", id).limit(1)).await?;
                Ok::<_, FetchFailure>(rows.into_iter().find(|v| v.id == id))
            })
            .await;

        match result {
            Ok(venue) => DirectoryResponse::live(venue),
            Err(reason) => {
                tracing::warn!(id, reason = %reason, "showing bundled venue");
                DirectoryResponse::fallback(mock_venues().into_iter().find(|v| v.id == id))
            }
        }
    }

    /// Venue counts per city, busiest first
    pub async fn location_counts(&self) -> DirectoryResponse<Vec<LocationCount>> {
        let result = self
            .cache
            .fetch_with_cache(LOCATION_COUNTS_KEY, move || async move {
                let source = self.source.clone().ok_or(FetchFailure::NoSource)?;
                safe_query_with_timeout(source.location_counts(), self.timeout, None)
                    .await
                    .into_result()
            })
            .await;

        match result {
            Ok(mut counts) => {
                crate::data::sort_location_counts(&mut counts);
                DirectoryResponse::live(counts)
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "showing bundled location counts");
                DirectoryResponse::fallback(mock_location_counts())
            }
        }
    }

    /// The `limit` highest-rated venues
    ///
    /// Unrated venues sort last; ties keep list order.
    pub async fn featured(&self, limit: usize) -> DirectoryResponse<Vec<Venue>> {
        let mut all = self.all_venues().await;
        all.data.sort_by(|a, b| {
            let a = a.rating.unwrap_or(f64::NEG_INFINITY);
            let b = b.rating.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        all.data.truncate(limit);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::data::{QueryError, QueryResponse, SourceError};
    use crate::filter::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Remote source double with switchable failure modes
    #[derive(Default)]
    struct FakeSource {
        venues: Vec<Venue>,
        calls: AtomicUsize,
        fail: AtomicBool,
        embedded_error: bool,
        delay: Option<Duration>,
    }

    impl FakeSource {
        fn with_venues(venues: Vec<Venue>) -> Self {
            Self {
                venues,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VenueSource for FakeSource {
        async fn select_venues(
            &self,
            _query: &VenueQuery,
        ) -> Result<QueryResponse<Vec<Venue>>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
                return Err(SourceError::Unavailable("rejected".to_string()));
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("connection refused".to_string()));
            }
            if self.embedded_error {
                return Ok(QueryResponse::err(QueryError::new("permission denied")));
            }
            Ok(QueryResponse::ok(self.venues.clone()))
        }

        async fn location_counts(&self) -> Result<QueryResponse<Vec<LocationCount>>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SourceError::Unavailable("connection refused".to_string()));
            }
            Ok(QueryResponse::ok(vec![
                LocationCount { city: "York".to_string(), count: 1 },
                LocationCount { city: "Leeds".to_string(), count: 5 },
            ]))
        }
    }

    /// A single live venue distinct from the mock data
    fn live_venue() -> Venue {
        let mut venue = mock_venues().remove(0);
        venue.id = 100;
        venue.name = "Live Play Warehouse".to_string();
        venue
    }

    fn directory(source: Arc<FakeSource>) -> (VenueDirectory, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = CacheManager::with_clock(clock.clone());
        (VenueDirectory::new(source, cache), clock)
    }

    #[tokio::test]
    async fn test_search_serves_live_data() {
        let source = Arc::new(FakeSource::with_venues(vec![live_venue()]));
        let (directory, _clock) = directory(source.clone());

        let results = directory.search(&QueryDescriptor::default(), Weekday::Mon).await;

        assert!(!results.showing_fallback);
        assert_eq!(results.data.len(), 1);
        assert_eq!(results.data[0].id, 100);
    }

    #[tokio::test]
    async fn test_repeated_searches_hit_remote_once() {
        let source = Arc::new(FakeSource::with_venues(vec![live_venue()]));
        let (directory, _clock) = directory(source.clone());

        let late = QueryDescriptor {
            category: Some(Category::Late),
            ..Default::default()
        };
        directory.search(&QueryDescriptor::default(), Weekday::Mon).await;
        directory.search(&late, Weekday::Mon).await;

        assert_eq!(source.calls(), 1, "filters must not re-query the source");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_rejection_without_cache_shows_mock_data() {
        let source = Arc::new(FakeSource {
            delay: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let (directory, _clock) = directory(source.clone());

        let results = directory.search(&QueryDescriptor::default(), Weekday::Mon).await;

        assert!(results.showing_fallback);
        assert_eq!(results.data, mock_venues());
        assert_eq!(results.data.len(), 3);
    }

    #[tokio::test]
    async fn test_embedded_error_shows_mock_data() {
        let source = Arc::new(FakeSource {
            embedded_error: true,
            ..Default::default()
        });
        let (directory, _clock) = directory(source);

        let results = directory.all_venues().await;

        assert!(results.showing_fallback);
        assert_eq!(results.data.len(), 3);
    }

    #[tokio::test]
    async fn test_fallback_data_goes_through_same_filters() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let (directory, _clock) = directory(source);
        let query = QueryDescriptor {
            category: Some(Category::Late),
            ..Default::default()
        };

        let results = directory.search(&query, Weekday::Mon).await;

        assert!(results.showing_fallback);
        assert_eq!(results.data, apply_filters(&mock_venues(), &query, Weekday::Mon));
    }

    #[tokio::test]
    async fn test_failed_refresh_prefers_stale_cache_over_mock() {
        let source = Arc::new(FakeSource::with_venues(vec![live_venue()]));
        let (directory, clock) = directory(source.clone());

        directory.all_venues().await;
        clock.advance(chrono::Duration::minutes(5));
        source.fail.store(true, Ordering::SeqCst);

        let results = directory.all_venues().await;

        assert_eq!(source.calls(), 2);
        assert!(!results.showing_fallback);
        assert_eq!(results.data[0].id, 100);
    }

    #[tokio::test]
    async fn test_offline_directory_serves_mock_data() {
        let directory = VenueDirectory::offline(CacheManager::new());

        let results = directory.all_venues().await;

        assert!(directory.is_offline());
        assert!(results.showing_fallback);
        assert_eq!(results.data.len(), 3);
        assert!(directory.cache().is_empty());
    }

    #[tokio::test]
    async fn test_venue_by_id_live_and_missing() {
        let source = Arc::new(FakeSource::with_venues(vec![live_venue()]));
        let (directory, _clock) = directory(source);

        let found = directory.venue_by_id(100).await;
        assert!(!found.showing_fallback);
        assert_eq!(found.data.map(|v| v.name), Some("Live Play Warehouse".to_string()));

        let missing = directory.venue_by_id(999).await;
        assert!(!missing.showing_fallback);
        assert!(missing.data.is_none());
    }

    #[tokio::test]
    async fn test_venue_by_id_falls_back_to_mock() {
        let directory = VenueDirectory::offline(CacheManager::new());

        let detail = directory.venue_by_id(2).await;

        assert!(detail.showing_fallback);
        assert_eq!(detail.data.map(|v| v.name), Some("Little Explorers Soft Play".to_string()));
    }

    #[tokio::test]
    async fn test_location_counts_are_sorted_and_cached() {
        let source = Arc::new(FakeSource::default());
        let (directory, _clock) = directory(source.clone());

        let first = directory.location_counts().await;
        let second = directory.location_counts().await;

        assert!(!first.showing_fallback);
        assert_eq!(first.data[0].city, "Leeds");
        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_location_counts_fall_back_to_mock() {
        let source = Arc::new(FakeSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let (directory, _clock) = directory(source);

        let counts = directory.location_counts().await;

        assert!(counts.showing_fallback);
        assert_eq!(counts.data, mock_location_counts());
    }

    #[tokio::test]
    async fn test_featured_orders_by_rating() {
        let directory = VenueDirectory::offline(CacheManager::new());

        let featured = directory.featured(2).await;

        let ids: Vec<i64> = featured.data.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(featured.showing_fallback);
    }

    #[tokio::test]
    async fn test_clearing_cache_forces_refetch() {
        let source = Arc::new(FakeSource::with_venues(vec![live_venue()]));
        let (directory, _clock) = directory(source.clone());

        directory.all_venues().await;
        directory.cache().clear(ALL_VENUES_KEY);
        directory.all_venues().await;

        assert_eq!(source.calls(), 2);
    }
}
