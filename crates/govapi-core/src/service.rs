//! `ExemptionService`, the retrieval-and-classification pipeline.
//!
//! Each call is one stateless request/response cycle against the management
//! API: parameters are validated first, then the token is checked, then at
//! most two outbound calls are made in sequence. Nothing is retried and
//! nothing is cached.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::endpoint::ManagementEndpoint;
use crate::errors::ExemptionError;
use crate::filter::{FilterMode, parse_within_days};
use crate::grouping::{GroupedExemptions, group_by_assignment};
use crate::http::{AccessToken, HttpClient, HttpResponse};
use crate::projection::project;
use crate::record::{ExemptionRecord, IdScope};

/// Caller options for [`ExemptionService::list_exemptions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Return every field instead of the reduced view.
    pub show_all_properties: bool,
    /// Keep only records with an expiry date.
    pub with_expiry_date: bool,
    /// Raw "within N days" value; validated by the service.
    pub within_days: Option<String>,
}

/// Policy exemption operations over an injected HTTP capability.
#[derive(Clone)]
pub struct ExemptionService {
    http: Arc<dyn HttpClient>,
    endpoint: ManagementEndpoint,
    clock: Arc<dyn Clock>,
}

impl ExemptionService {
    /// Create a service.
    pub fn new(
        http: Arc<dyn HttpClient>,
        endpoint: ManagementEndpoint,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            endpoint,
            clock,
        }
    }

    /// List a subscription's exemptions, filtered, projected and grouped by assignment.
    ///
    /// Returns `Ok(None)` when the provider response carries no `value` array.
    #[tracing::instrument(skip_all, fields(subscription_id = %subscription_id))]
    pub async fn list_exemptions(
        &self,
        token: Option<&AccessToken>,
        subscription_id: &str,
        options: &ListOptions,
    ) -> Result<Option<GroupedExemptions>, ExemptionError> {
        let within_days = parse_within_days(options.within_days.as_deref())?;
        let mode = FilterMode::resolve(options.with_expiry_date, within_days);
        let url = self.endpoint.exemptions_url(subscription_id)?;
        let token = require_token(token)?;

        let resp = self.http.get(&url, token).await?;
        if !resp.is_success() {
            log_upstream_failure("Failed to fetch policy exemptions", &resp);
            return Err(ExemptionError::Upstream {
                status: resp.status,
                body: resp.body,
            });
        }

        let Some(items) = take_value_array(resp.json()?) else {
            info!("provider response has no value array");
            return Ok(None);
        };

        let raw = items
            .into_iter()
            .map(listed_record)
            .collect::<Result<Vec<_>, _>>()?;

        let today = self.clock.today();
        let mut projected = Vec::with_capacity(raw.len());
        for record in &raw {
            if record.id_scope()? == IdScope::Foreign {
                continue;
            }
            if !mode.includes(record.expires_on(), today) {
                continue;
            }
            projected.push(project(record, options.show_all_properties, mode));
        }

        let grouped = group_by_assignment(projected, &raw);
        debug!(
            ?mode,
            raw = raw.len(),
            groups = grouped.len(),
            "policy exemptions classified"
        );
        Ok(Some(grouped))
    }

    /// Fetch one exemption by name, as returned by the provider.
    #[tracing::instrument(skip_all, fields(subscription_id = %subscription_id, exemption_name = %exemption_name))]
    pub async fn get_exemption(
        &self,
        token: Option<&AccessToken>,
        subscription_id: &str,
        exemption_name: &str,
    ) -> Result<ExemptionRecord, ExemptionError> {
        let url = self.endpoint.exemption_url(subscription_id, exemption_name)?;
        let token = require_token(token)?;
        self.fetch_exemption(token, &url, exemption_name).await
    }

    /// Set `properties.expiresOn` on an exemption (read-modify-write).
    ///
    /// The current record is fetched, copied with the new expiry and PUT back
    /// whole. There is no ETag precondition: concurrent writers race and the
    /// last write wins.
    #[tracing::instrument(skip_all, fields(subscription_id = %subscription_id, exemption_name = %exemption_name))]
    pub async fn update_expiry(
        &self,
        token: Option<&AccessToken>,
        subscription_id: &str,
        exemption_name: &str,
        expires_on: &str,
    ) -> Result<ExemptionRecord, ExemptionError> {
        if expires_on.trim().is_empty() {
            return Err(ExemptionError::invalid_argument(
                "expiresOn value must be provided as a query parameter.",
            ));
        }
        let url = self.endpoint.exemption_url(subscription_id, exemption_name)?;
        let token = require_token(token)?;

        let current = self.fetch_exemption(token, &url, exemption_name).await?;
        let updated = current.with_expires_on(expires_on);

        let resp = self.http.put_json(&url, token, &updated.into_value()).await?;
        if !resp.is_success() {
            log_upstream_failure("Failed to update policy exemption", &resp);
            return Err(ExemptionError::UpdateFailed {
                status: resp.status,
                body: resp.body,
            });
        }

        info!(expires_on, "policy exemption expiry updated");
        ExemptionRecord::try_from(resp.json()?)
    }

    async fn fetch_exemption(
        &self,
        token: &AccessToken,
        url: &str,
        exemption_name: &str,
    ) -> Result<ExemptionRecord, ExemptionError> {
        let resp = self.http.get(url, token).await?;
        if resp.status == 404 {
            return Err(ExemptionError::NotFound {
                name: exemption_name.to_owned(),
            });
        }
        if !resp.is_success() {
            log_upstream_failure("Failed to fetch policy exemption details", &resp);
            return Err(ExemptionError::Upstream {
                status: resp.status,
                body: resp.body,
            });
        }
        ExemptionRecord::try_from(resp.json()?)
    }
}

fn require_token(token: Option<&AccessToken>) -> Result<&AccessToken, ExemptionError> {
    match token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => {
            error!("no access token available for the management API");
            Err(ExemptionError::Unauthorized)
        }
    }
}

fn log_upstream_failure(message: &str, resp: &HttpResponse) {
    error!(status = resp.status, body = %resp.body, "{message}");
}

fn take_value_array(mut root: Value) -> Option<Vec<Value>> {
    match root.get_mut("value").map(Value::take) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// A listed item must be an object; anything else has no `id` at all.
fn listed_record(item: Value) -> Result<ExemptionRecord, ExemptionError> {
    match item {
        Value::Object(fields) => Ok(ExemptionRecord::new(fields)),
        _ => Err(ExemptionError::Malformed(
            "policy exemption item is not an object".into(),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
