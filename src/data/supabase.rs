//! Supabase (PostgREST) venue source
//!
//! Reads the `venues` table of a hosted Supabase project over its REST API.
//! Non-2xx responses are decoded into the embedded `error` of a
//! `QueryResponse`; only transport failures surface as `SourceError`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    count_by_city, LocationCount, QueryError, QueryResponse, SourceError, Venue, VenueQuery,
    VenueSource,
};

/// Table holding the venue listings
const VENUES_TABLE: &str = "venues";

/// Connection details for a Supabase project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    /// Anonymous (public) API key
    pub api_key: String,
}

impl SupabaseConfig {
    /// Builds a config when both values are present and non-blank
    pub fn from_parts(url: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Row shape of the city-only projection used for location counts
#[derive(Debug, Deserialize)]
struct CityRow {
    #[serde(default)]
    city: Option<String>,
}

/// Client for the hosted venue table
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http_client: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Creates a new client with a default HTTP client
    pub fn new(config: SupabaseConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a new client with a custom HTTP client
    pub fn with_client(http_client: Client, config: SupabaseConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    /// Runs a query against `table` and decodes the rows as `T`
    async fn run<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &VenueQuery,
    ) -> Result<QueryResponse<T>, SourceError> {
        let response = self
            .http_client
            .get(self.table_url(table))
            .query(&query.to_params())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }
}

/// Turns a status and body into a `QueryResponse`
///
/// A successful status with an undecodable body is a `ParseError`. A failed
/// status becomes an embedded `QueryError`, using the PostgREST error body
/// when it parses and the status line otherwise.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<QueryResponse<T>, SourceError> {
    if status.is_success() {
        return Ok(QueryResponse::ok(serde_json::from_str(body)?));
    }

    let error = serde_json::from_str::<QueryError>(body).unwrap_or_else(|_| {
        QueryError::new(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        ))
    });
    Ok(QueryResponse::err(error))
}

#[async_trait]
impl VenueSource for SupabaseClient {
    async fn select_venues(
        &self,
        query: &VenueQuery,
    ) -> Result<QueryResponse<Vec<Venue>>, SourceError> {
        self.run(VENUES_TABLE, query).await
    }

    async fn location_counts(&self) -> Result<QueryResponse<Vec<LocationCount>>, SourceError> {
        let query = VenueQuery::new().select("city");
        let response: QueryResponse<Vec<CityRow>> = self.run(VENUES_TABLE, &query).await?;

        Ok(QueryResponse {
            data: response
                .data
                .map(|rows| count_by_city(rows.iter().filter_map(|r| r.city.as_deref()))),
            error: response.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_requires_url_and_key() {
        assert!(SupabaseConfig::from_parts(None, Some("key")).is_none());
        assert!(SupabaseConfig::from_parts(Some("https://x.supabase.co"), None).is_none());
        assert!(SupabaseConfig::from_parts(Some("  "), Some("key")).is_none());
    }

    #[test]
    fn test_config_strips_trailing_slash() {
        let config =
            SupabaseConfig::from_parts(Some("https://x.supabase.co/"), Some("anon")).unwrap();
        assert_eq!(config.url, "https://x.supabase.co");
        assert_eq!(config.api_key, "anon");
    }

    #[test]
    fn test_table_url() {
        let client = SupabaseClient::new(SupabaseConfig {
            url: "https://x.supabase.co".to_string(),
            api_key: "anon".to_string(),
        });
        assert_eq!(client.table_url("venues"), "https://x.supabase.co/rest/v1/venues");
    }

    #[test]
    fn test_decode_success_body() {
        let body = r#"[{"id": 1, "name": "Play Barn", "city": "York"}]"#;

        let response: QueryResponse<Vec<Venue>> = decode_response(StatusCode::OK, body).unwrap();

        let venues = response.into_result().unwrap();
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].name, "Play Barn");
    }

    #[test]
    fn test_decode_malformed_success_body_is_parse_error() {
        let result: Result<QueryResponse<Vec<Venue>>, SourceError> =
            decode_response(StatusCode::OK, "<html>gateway</html>");

        assert!(matches!(result, Err(SourceError::ParseError(_))));
    }

    #[test]
    fn test_decode_error_body_is_embedded() {
        let body = r#"{"code":"PGRST301","message":"JWT expired","details":null,"hint":null}"#;

        let response: QueryResponse<Vec<Venue>> =
            decode_response(StatusCode::UNAUTHORIZED, body).unwrap();

        assert!(response.data.is_none());
        let error = response.error.expect("error should be embedded");
        assert_eq!(error.message, "JWT expired");
        assert_eq!(error.code.as_deref(), Some("PGRST301"));
    }

    #[test]
    fn test_decode_error_without_body_uses_status() {
        let response: QueryResponse<Vec<Venue>> =
            decode_response(StatusCode::SERVICE_UNAVAILABLE, "").unwrap();

        assert_eq!(response.error.unwrap().message, "503 Service Unavailable");
    }
}
