//! Device category reported by visitor tracking.
//!
//! The tracking table stores the category as free text so any value seen
//! becomes a tally key; this enum only covers what the storefront itself
//! derives from a `User-Agent` header.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Coarse device category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceType {
    /// Classify a `User-Agent` string.
    ///
    /// Tablets are checked first because iPad and Android tablet agents also
    /// contain "Mobile" in some browsers.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("ipad") || ua.contains("tablet") {
            Self::Tablet
        } else if ua.contains("iphone") || ua.contains("android") || ua.contains("mobile") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// The stored text value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_user_agent() {
        assert_eq!(
            DeviceType::from_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)"),
            DeviceType::Mobile
        );
        assert_eq!(
            DeviceType::from_user_agent("Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) Mobile"),
            DeviceType::Tablet
        );
        assert_eq!(
            DeviceType::from_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0"),
            DeviceType::Desktop
        );
    }

    #[test]
    fn test_as_str() {
        assert_eq!(DeviceType::Tablet.to_string(), "tablet");
    }
}
