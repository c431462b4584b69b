use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// A source of USD spot prices keyed by lowercase coin id ("solana", "bitcoin").
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// `Ok(None)` when the source answered but knows no price for the id.
    async fn usd_price(&self, coin_id: &str) -> Result<Option<f64>>;
}

/// CoinGecko's keyless `simple/price` endpoint.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn usd_price(&self, coin_id: &str) -> Result<Option<f64>> {
        let url = format!("{}/simple/price", self.base_url);

        // Error statuses are not special-cased: CoinGecko answers rate limits
        // with a JSON body, which simply has no price in it.
        let response = self
            .client
            .get(&url)
            .query(&[("ids", coin_id), ("vs_currencies", "usd")])
            .send()
            .await?;

        let status = response.status();
        let data: Value = response.json().await?;
        debug!(%status, coin_id, "price lookup answered");

        Ok(usd_from_simple_price(&data, coin_id))
    }
}

/// Pull `data[coin_id].usd` out of a `simple/price` body.
pub fn usd_from_simple_price(data: &Value, coin_id: &str) -> Option<f64> {
    data.get(coin_id)
        .and_then(|entry| entry.get("usd"))
        .and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_usd_from_simple_price() {
        let data = json!({"solana": {"usd": 142.5}});
        assert_eq!(usd_from_simple_price(&data, "solana"), Some(142.5));
        assert_eq!(usd_from_simple_price(&data, "bitcoin"), None);
        assert_eq!(usd_from_simple_price(&json!({"solana": {}}), "solana"), None);
        assert_eq!(usd_from_simple_price(&json!({}), "solana"), None);
    }

    #[tokio::test]
    async fn test_usd_price_queries_simple_price() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param("ids", "solana"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"solana":{"usd":142.5}}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CoinGeckoClient::new(&format!("{}/api/v3/", mock_server.uri()));
        let price = client.usd_price("solana").await.unwrap();

        assert_eq!(price, Some(142.5));
    }

    #[tokio::test]
    async fn test_usd_price_unknown_coin_is_not_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let client = CoinGeckoClient::new(&mock_server.uri());
        assert_eq!(client.usd_price("notacoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_usd_price_non_json_body_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = CoinGeckoClient::new(&mock_server.uri());
        assert!(client.usd_price("solana").await.is_err());
    }
}
