//! Persona store over a PostgREST-style HTTP API.
//!
//! Organizations are keyed by `subdomain` (the catalog id), personas by
//! `persona_key` (the composite key).

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::core::catalog::Organization;
use crate::core::persona::{PersonaRecord, PersonaRow};
use crate::io::config::StoreConfig;
use crate::io::store::PersonaStore;

const REST_PREFIX: &str = "rest/v1";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

#[derive(Debug, Serialize)]
struct OrganizationRow<'a> {
    id: String,
    name: &'a str,
    subdomain: &'a str,
}

#[derive(Debug)]
pub struct RestPersonaStore {
    base_url: String,
    api_key: Option<String>,
    http_client: Client,
}

impl RestPersonaStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(anyhow!("persona store url must not be empty"));
        }
        let http_client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("build persona store http client")?;
        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    /// Store described by the config, or `None` when no URL is configured.
    pub fn from_config(cfg: &StoreConfig) -> Result<Option<Self>> {
        let Some(url) = cfg.resolved_url() else {
            return Ok(None);
        };
        let store = Self::new(url, cfg.api_key(), Duration::from_secs(cfg.timeout_secs))?;
        Ok(Some(store))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PREFIX}/{table}", self.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    fn select_ids(&self, table: &str, column: &str, value: &str) -> Result<Vec<IdRow>> {
        let request = self
            .http_client
            .get(self.table_url(table))
            .query(&[("select", "id".to_string()), (column, eq_filter(value))]);
        let response = self
            .authorize(request)
            .send()
            .with_context(|| format!("query {table} by {column}"))?;
        read_rows(response, table)
    }

    fn insert<T: Serialize>(&self, table: &str, row: &T) -> Result<Vec<IdRow>> {
        let request = self
            .http_client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(row);
        let response = self
            .authorize(request)
            .send()
            .with_context(|| format!("insert into {table}"))?;
        read_rows(response, table)
    }
}

impl PersonaStore for RestPersonaStore {
    fn is_connected(&self) -> bool {
        true
    }

    #[instrument(skip(self))]
    fn find_organization(&self, id: &str) -> Result<Option<String>> {
        let rows = self.select_ids("organizations", "subdomain", id)?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    #[instrument(skip_all, fields(org = %org.id))]
    fn create_organization(&self, org: &Organization) -> Result<String> {
        let row = OrganizationRow {
            id: Uuid::new_v4().to_string(),
            name: &org.name,
            subdomain: &org.id,
        };
        let rows = self.insert("organizations", &row)?;
        let id = rows.into_iter().next().map_or(row.id, |stored| stored.id);
        debug!(store_id = %id, "organization inserted");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn persona_exists(&self, key: &str) -> Result<bool> {
        Ok(!self.select_ids("personas", "persona_key", key)?.is_empty())
    }

    #[instrument(skip_all, fields(key = %record.id))]
    fn create_persona(
        &self,
        record: &PersonaRecord,
        owner_tag: &str,
        organization_id: &str,
    ) -> Result<String> {
        let row = PersonaRow::from_record(record, owner_tag, organization_id);
        let rows = self.insert("personas", &row)?;
        rows.into_iter()
            .next()
            .map(|stored| stored.id)
            .ok_or_else(|| anyhow!("persona insert for {} returned no rows", record.id))
    }
}

/// PostgREST equality filter value.
fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

fn read_rows(response: Response, table: &str) -> Result<Vec<IdRow>> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .unwrap_or_else(|_| "unable to read response body".to_string());
        return Err(anyhow!("{table} request failed ({}): {}", status.as_u16(), message));
    }
    response
        .json()
        .with_context(|| format!("decode {table} response"))
}
