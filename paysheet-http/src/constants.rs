//! Constants for the HTTP layer.

/// Environment variable holding the callable procedures' base URL.
pub const BASE_URL_ENV: &str = "PAYSHEET_BASE_URL";

/// Environment variable overriding the pinned Stripe API version.
pub const API_VERSION_ENV: &str = "PAYSHEET_STRIPE_API_VERSION";

/// Longest body preview written to traces, in bytes.
pub const BODY_PREVIEW_LIMIT: usize = 512;

/// Fields whose values are replaced in trace previews, in camelCase form.
pub const REDACTED_KEYS: [&str; 3] = ["secret", "clientSecret", "ephemeralKeySecret"];
