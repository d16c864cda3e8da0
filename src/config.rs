//! # Dispatch Configuration
//!
//! Per-endpoint dispatch settings with environment-variable defaults.
//! Every [`EndpointBuilder`](crate::EndpointBuilder) starts from
//! [`DispatchConfig::from_env`]; its setters override individual values.
//!
//! ## Environment Variables
//!
//! ### `HANDLR_MAX_BODY_BYTES`
//!
//! Largest request body the body stage accepts before answering
//! `413 Payload Too Large`. Accepts decimal (`1048576`) or hexadecimal
//! (`0x100000`). `0` disables the limit. Default: 1 MiB.
//!
//! ### `HANDLR_BIND_POLICY`
//!
//! `lenient` (default) or `strict`. Decides whether a path or query value that
//! fails to coerce becomes the field's default or a `400 Bad Request`.
//!
//! ## Usage
//!
//! ```rust
//! use handlr::config::DispatchConfig;
//!
//! let config = DispatchConfig::from_env();
//! println!("body limit: {} bytes", config.max_body_bytes);
//! ```

use crate::params::BindPolicy;
use std::env;

/// Settings shared by every invocation of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Body size limit in bytes; `0` means unlimited.
    pub max_body_bytes: usize,
    /// Coercion failure policy for path and query parameters.
    pub bind_policy: BindPolicy,
}

impl DispatchConfig {
    pub const DEFAULT_MAX_BODY_BYTES: usize = 0x10_0000;

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let max_body_bytes = env::var("HANDLR_MAX_BODY_BYTES")
            .ok()
            .and_then(|v| parse_size(&v))
            .unwrap_or(Self::DEFAULT_MAX_BODY_BYTES);
        let bind_policy = env::var("HANDLR_BIND_POLICY")
            .map(|v| BindPolicy::parse(&v))
            .unwrap_or_default();
        DispatchConfig {
            max_body_bytes,
            bind_policy,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
            bind_policy: BindPolicy::Lenient,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_decimal_and_hex() {
        assert_eq!(parse_size("1024"), Some(1024));
        assert_eq!(parse_size("0x400"), Some(1024));
        assert_eq!(parse_size(" 0 "), Some(0));
        assert_eq!(parse_size("lots"), None);
    }

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.bind_policy, BindPolicy::Lenient);
    }
}
