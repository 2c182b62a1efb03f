//! Package-level constants.

/// Current version of the API (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "govapi";

/// Management API version used for every policy exemption call.
pub const EXEMPTIONS_API_VERSION: &str = "2022-07-01-preview";

/// Default management API base URL.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Token scope for the management API.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Largest accepted "within N days" window.
pub const MAX_WITHIN_DAYS: u32 = 365;
