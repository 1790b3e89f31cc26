use std::time::Duration;

use reqwest::{
    header::{
        HeaderValue,
        AUTHORIZATION,
        USER_AGENT,
    },
    Client,
    Method,
    RequestBuilder,
    Response,
};
use serde_json::Value;
use tracing::debug;

use super::{
    Filter,
    Gateway,
    Table,
    ORDER_COLUMN,
};
use crate::{
    config::GatewayConfig,
    core::errors::{
        DokkaiError,
        Result,
    },
};

const PREFER: &str = "Prefer";

/// Client for a PostgREST-style HTTP endpoint (`<url>/rest/v1/<table>`).
pub struct RestGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DokkaiError::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: Table) -> Result<RequestBuilder> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| DokkaiError::Config(format!("Invalid API key: {e}")))?;
        let url = self.table_url(table);
        debug!(%method, %url, "gateway request");

        Ok(self
            .client
            .request(method, url)
            .header(USER_AGENT, "dokkai/0.1 (+reqwest)")
            .header("apikey", self.api_key.as_str())
            .header(AUTHORIZATION, bearer))
    }
}

fn filter_query(filter: &Filter) -> [(&'static str, String); 1] {
    [(filter.column, format!("eq.{}", filter.value))]
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DokkaiError::Http { status: status.as_u16(), body });
    }
    Ok(response)
}

impl Gateway for RestGateway {
    async fn select(&self, table: Table) -> Result<Vec<Value>> {
        let order = format!("{}.asc", ORDER_COLUMN);
        let response = self
            .request(Method::GET, table)?
            .query(&[("select", "*"), ("order", order.as_str())])
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let response = self
            .request(Method::POST, table)?
            .header(PREFER, "return=representation")
            .json(&row)
            .send()
            .await?;

        // PostgREST answers with the array of inserted rows
        let rows: Vec<Value> = ensure_success(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DokkaiError::Remote(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: Table, filter: Filter, patch: Value) -> Result<()> {
        let response = self
            .request(Method::PATCH, table)?
            .query(&filter_query(&filter))
            .json(&patch)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<()> {
        let response =
            self.request(Method::DELETE, table)?.query(&filter_query(&filter)).send().await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .request(Method::POST, table)?
            .header(PREFER, "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}
