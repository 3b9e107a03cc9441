use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a generation request produces. Each kind has its own endpoint and
/// its own `done` payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    CustomerProfile,
    BrandIdentity,
    Worksheet,
    SocialContent,
}

impl GenerationKind {
    pub const ALL: [GenerationKind; 4] = [
        Self::CustomerProfile,
        Self::BrandIdentity,
        Self::Worksheet,
        Self::SocialContent,
    ];

    /// Endpoint path relative to the agent service base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::CustomerProfile => "generate-customer-profile",
            Self::BrandIdentity => "generate-brand-identity",
            Self::Worksheet => "generate-worksheet",
            Self::SocialContent => "generate-social-content",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerProfile => "customer_profile",
            Self::BrandIdentity => "brand_identity",
            Self::Worksheet => "worksheet",
            Self::SocialContent => "social_content",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown generation kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for GenerationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "customer_profile" | "persona" => Ok(Self::CustomerProfile),
            "brand_identity" | "brand" => Ok(Self::BrandIdentity),
            "worksheet" => Ok(Self::Worksheet),
            "social_content" | "content" => Ok(Self::SocialContent),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}
