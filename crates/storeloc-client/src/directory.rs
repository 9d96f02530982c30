//! Backend store directory access.
//!
//! [`StoreDirectory`] is the seam the engine fetches through. Two
//! implementations ship here: [`GraphqlDirectory`] for the storefront backend
//! and [`crate::FixtureDirectory`] for offline YAML data.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use storeloc_core::{StorePage, StoreQuery};

use crate::error::DirectoryError;

/// Source of paginated store listings.
pub trait StoreDirectory: Send + Sync + 'static {
    /// Fetch one page of stores matching `query`.
    fn fetch_stores(
        &self,
        query: &StoreQuery,
    ) -> impl Future<Output = Result<StorePage, DirectoryError>> + Send;
}

pub(crate) const STORES_QUERY: &str = r"query Stores(
  $pageNo: Int
  $pageSize: Int
  $city: String
  $query: String
  $latitude: Float
  $longitude: Float
  $range: Int
) {
  stores(
    pageNo: $pageNo
    pageSize: $pageSize
    city: $city
    query: $query
    latitude: $latitude
    longitude: $longitude
    range: $range
  ) {
    items {
      uid
      store_code
      name
      address {
        address
        address1
        address2
        landmark
        city
        state
        pincode
        country
        lat_long { type coordinates }
      }
      contact_numbers { country_code number }
      store_type
      tags
      timing {
        weekday
        open
        opening { hour minute }
        closing { hour minute }
      }
      manager {
        name
        email
        mobile_no { country_code number }
      }
    }
    page { current size item_total has_next }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    data: Option<StoresData>,
    #[serde(default)]
    errors: Vec<GraphqlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct StoresData {
    stores: Option<StorePage>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

/// Client for the storefront GraphQL `stores` query.
pub struct GraphqlDirectory {
    client: Client,
    endpoint: Url,
    application_token: Option<String>,
}

impl GraphqlDirectory {
    /// Creates a directory client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectoryError::InvalidEndpoint`] if
    /// `endpoint` is not a valid URL.
    pub fn new(
        endpoint: &str,
        application_token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let endpoint = Url::parse(endpoint).map_err(|e| DirectoryError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint,
            application_token: application_token.map(str::to_owned),
        })
    }

    /// Request body for `query`: the `stores` document plus variables with
    /// unset filters omitted.
    fn request_body(query: &StoreQuery) -> serde_json::Value {
        serde_json::json!({
            "operationName": "Stores",
            "query": STORES_QUERY,
            "variables": query.to_variables(),
        })
    }

    /// Turns a decoded envelope into a page or a GraphQL error.
    fn unwrap_envelope(envelope: GraphqlEnvelope) -> Result<StorePage, DirectoryError> {
        if !envelope.errors.is_empty() {
            let message = envelope
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DirectoryError::Graphql(message));
        }
        envelope
            .data
            .and_then(|d| d.stores)
            .ok_or_else(|| DirectoryError::Graphql("response carried no stores field".to_string()))
    }
}

impl StoreDirectory for GraphqlDirectory {
    async fn fetch_stores(&self, query: &StoreQuery) -> Result<StorePage, DirectoryError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&Self::request_body(query));
        if let Some(token) = &self.application_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: GraphqlEnvelope =
            serde_json::from_str(&body).map_err(|e| DirectoryError::Deserialize {
                context: format!("stores(pageNo={}) from {}", query.page_no, self.endpoint),
                source: e,
            })?;

        let page = Self::unwrap_envelope(envelope)?;
        tracing::debug!(
            count = page.items.len(),
            page_no = query.page_no,
            city = query.city.as_deref(),
            "fetched store page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_omits_unset_filters() {
        let mut query = StoreQuery::unfiltered(20);
        query.city = Some("Pune".to_string());
        let body = GraphqlDirectory::request_body(&query);
        assert_eq!(body["operationName"], "Stores");
        assert_eq!(body["variables"]["city"], "Pune");
        assert_eq!(body["variables"]["pageSize"], 20);
        assert!(body["variables"].get("query").is_none());
        assert!(body["variables"].get("latitude").is_none());
    }

    #[test]
    fn query_selects_every_address_field() {
        let start = STORES_QUERY.find("address {").expect("address selection");
        let end = start + STORES_QUERY[start..].find('}').expect("closing brace");
        let fields: Vec<&str> = STORES_QUERY[start..end]
            .lines()
            .skip(1)
            .map(str::trim)
            .collect();
        for field in ["address", "address1", "address2", "landmark", "city", "pincode"] {
            assert!(fields.contains(&field), "missing {field}: {fields:?}");
        }
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let result = GraphqlDirectory::new("not a url", None, 5, "storeloc-test/0.1");
        assert!(matches!(
            result,
            Err(DirectoryError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn envelope_errors_are_joined() {
        let envelope = GraphqlEnvelope {
            data: None,
            errors: vec![
                GraphqlErrorItem {
                    message: "bad city".to_string(),
                },
                GraphqlErrorItem {
                    message: "bad range".to_string(),
                },
            ],
        };
        let err = GraphqlDirectory::unwrap_envelope(envelope).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL error: bad city; bad range");
    }

    #[test]
    fn envelope_without_stores_is_an_error() {
        let envelope = GraphqlEnvelope {
            data: Some(StoresData { stores: None }),
            errors: vec![],
        };
        assert!(matches!(
            GraphqlDirectory::unwrap_envelope(envelope),
            Err(DirectoryError::Graphql(_))
        ));
    }
}
