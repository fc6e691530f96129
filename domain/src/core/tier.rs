//! Tier value object selecting a quality/cost preset

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Named quality/cost preset selecting which provider set the extension
/// queries (Value Object)
///
/// The bridge does not interpret tiers beyond the well-known names; any
/// other string is carried through opaquely so the extension can grow
/// new presets without a server change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tier {
    Fast,
    Normal,
    Deep,
    Custom(String),
}

impl Tier {
    /// Get the string identifier for this tier
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Fast => "fast",
            Tier::Normal => "normal",
            Tier::Deep => "deep",
            Tier::Custom(s) => s,
        }
    }

    /// Parse a tier name, mapping unknown names to `Custom`
    pub fn parse(s: &str) -> Self {
        match s {
            "fast" => Tier::Fast,
            "normal" => Tier::Normal,
            "deep" => Tier::Deep,
            other => Tier::Custom(other.to_string()),
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Normal
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Tier::parse(s))
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Tier::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse_known_names() {
        assert_eq!(Tier::parse("fast"), Tier::Fast);
        assert_eq!(Tier::parse("normal"), Tier::Normal);
        assert_eq!(Tier::parse("deep"), Tier::Deep);
    }

    #[test]
    fn test_tier_parse_unknown_is_custom() {
        let tier = Tier::parse("experimental");
        assert_eq!(tier, Tier::Custom("experimental".to_string()));
        assert_eq!(tier.as_str(), "experimental");
    }

    #[test]
    fn test_tier_default() {
        assert_eq!(Tier::default(), Tier::Normal);
    }

    #[test]
    fn test_tier_serde_as_string() {
        assert_eq!(serde_json::to_string(&Tier::Deep).unwrap(), "\"deep\"");
        let tier: Tier = serde_json::from_str("\"fast\"").unwrap();
        assert_eq!(tier, Tier::Fast);
    }
}
