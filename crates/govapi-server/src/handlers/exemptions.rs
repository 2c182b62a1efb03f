//! `/policyexemptions` handlers.
//!
//! Thin adapters: decode path and query, read the [`RequestToken`], call the
//! [`ExemptionService`](govapi_core::ExemptionService), encode the result.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use govapi_core::{ExemptionRecord, GroupedExemptions, ListOptions};
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::RequestToken;
use crate::query::flag;
use crate::server::AppState;

/// Query for the listing route. Values are kept raw and validated here or in
/// the pipeline.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Return full records.
    pub show_all_properties: Option<String>,
    /// Only records with an expiry date.
    pub with_expiry_date: Option<String>,
    /// Only records expiring within this many days (0..=365).
    pub with_expiry_date_within_days: Option<String>,
}

impl ListQuery {
    fn into_options(self) -> Result<ListOptions, ApiError> {
        Ok(ListOptions {
            show_all_properties: flag("showAllProperties", self.show_all_properties.as_deref())?,
            with_expiry_date: flag("withExpiryDate", self.with_expiry_date.as_deref())?,
            within_days: self.with_expiry_date_within_days,
        })
    }
}

/// Query for the expiry update route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiresOnQuery {
    /// New expiry timestamp, passed through to the provider unchanged.
    pub expires_on_iso8601: Option<String>,
}

/// GET /policyexemptions/{subscriptionId}
///
/// Responds `null` when the provider listing has no `value` array.
pub async fn list_exemptions(
    State(state): State<AppState>,
    Extension(token): Extension<RequestToken>,
    Path(subscription_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Option<GroupedExemptions>>, ApiError> {
    let options = query.into_options()?;
    let grouped = state
        .service
        .list_exemptions(token.get(), &subscription_id, &options)
        .await?;
    Ok(Json(grouped))
}

/// GET /policyexemptions/{subscriptionId}/{exemptionName}
pub async fn get_exemption(
    State(state): State<AppState>,
    Extension(token): Extension<RequestToken>,
    Path((subscription_id, exemption_name)): Path<(String, String)>,
) -> Result<Json<ExemptionRecord>, ApiError> {
    let record = state
        .service
        .get_exemption(token.get(), &subscription_id, &exemption_name)
        .await?;
    Ok(Json(record))
}

/// PUT /policyexemptions/{subscriptionId}/{exemptionName}/expiresOn
pub async fn update_expiry(
    State(state): State<AppState>,
    Extension(token): Extension<RequestToken>,
    Path((subscription_id, exemption_name)): Path<(String, String)>,
    Query(query): Query<ExpiresOnQuery>,
) -> Result<Json<ExemptionRecord>, ApiError> {
    let expires_on = query.expires_on_iso8601.unwrap_or_default();
    let record = state
        .service
        .update_expiry(token.get(), &subscription_id, &exemption_name, &expires_on)
        .await?;
    Ok(Json(record))
}
