//! # govapi-settings
//!
//! Configuration for the policy exemption API.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`GovapiSettings::default()`]
//! 2. **Settings file**: `./govapi.json` or `$GOVAPI_CONFIG` (deep-merged over defaults)
//! 3. **Environment variables**: `GOVAPI_*`, `API_KEY`, `AZURE_*`, `UAMI_CLIENT_ID`
//!
//! The loaded value is validated before it is returned.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path, load_with, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
