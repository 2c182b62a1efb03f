//! Management API URL construction.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::constants::{DEFAULT_MANAGEMENT_ENDPOINT, EXEMPTIONS_API_VERSION};
use crate::errors::ExemptionError;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Where policy exemption resources live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagementEndpoint {
    base_url: String,
    api_version: String,
}

impl ManagementEndpoint {
    /// Endpoint rooted at `base_url` (trailing slashes are trimmed).
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            api_version: api_version.into(),
        }
    }

    /// Collection URL for a subscription's exemptions.
    pub fn exemptions_url(&self, subscription_id: &str) -> Result<String, ExemptionError> {
        Ok(format!(
            "{}?api-version={}",
            self.collection_path(subscription_id)?,
            self.api_version
        ))
    }

    /// Resource URL for one named exemption.
    pub fn exemption_url(
        &self,
        subscription_id: &str,
        exemption_name: &str,
    ) -> Result<String, ExemptionError> {
        Ok(format!(
            "{}/{}?api-version={}",
            self.collection_path(subscription_id)?,
            encode_segment("exemption name", exemption_name)?,
            self.api_version
        ))
    }

    fn collection_path(&self, subscription_id: &str) -> Result<String, ExemptionError> {
        Ok(format!(
            "{}/subscriptions/{}/providers/Microsoft.Authorization/policyExemptions",
            self.base_url,
            encode_segment("subscription id", subscription_id)?
        ))
    }
}

impl Default for ManagementEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_MANAGEMENT_ENDPOINT, EXEMPTIONS_API_VERSION)
    }
}

/// Percent-encode one path segment.
///
/// Empty and dot segments are rejected: URL parsers collapse them even when
/// encoded, which would retarget the request.
fn encode_segment(what: &str, raw: &str) -> Result<String, ExemptionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(ExemptionError::invalid_argument(format!(
            "{what} '{raw}' is not a valid resource name."
        )));
    }
    Ok(utf8_percent_encode(raw, SEGMENT).to_string())
}
