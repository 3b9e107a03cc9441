use serde::{Deserialize, Serialize};

use crate::kind::GenerationKind;

pub const DEFAULT_LANGUAGE: &str = "English";

/// A required generation parameter was not supplied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing required parameter: {0}")]
pub struct MissingParameter(pub &'static str);

/// Parameters for one generation kind.
///
/// `validate` is the guard for starting a stream: when it fails no request
/// is issued.
pub trait GenerationRequest: Serialize + Send + Sync {
    fn kind(&self) -> GenerationKind;

    fn validate(&self) -> Result<(), MissingParameter>;

    /// Id of the record the generation is derived from
    fn source_id(&self) -> &str;
}

fn require(value: &str, name: &'static str) -> Result<(), MissingParameter> {
    if value.trim().is_empty() {
        Err(MissingParameter(name))
    } else {
        Ok(())
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileRequest {
    pub brand_identity_id: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl CustomerProfileRequest {
    pub fn new(brand_identity_id: impl Into<String>) -> Self {
        Self {
            brand_identity_id: brand_identity_id.into(),
            language: default_language(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl GenerationRequest for CustomerProfileRequest {
    fn kind(&self) -> GenerationKind {
        GenerationKind::CustomerProfile
    }

    fn validate(&self) -> Result<(), MissingParameter> {
        require(&self.brand_identity_id, "brandIdentityId")
    }

    fn source_id(&self) -> &str {
        &self.brand_identity_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandIdentityRequest {
    pub workspace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl BrandIdentityRequest {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            brand_name: None,
            description: None,
            language: default_language(),
        }
    }

    pub fn with_brand_name(mut self, name: impl Into<String>) -> Self {
        self.brand_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl GenerationRequest for BrandIdentityRequest {
    fn kind(&self) -> GenerationKind {
        GenerationKind::BrandIdentity
    }

    fn validate(&self) -> Result<(), MissingParameter> {
        require(&self.workspace_id, "workspaceId")
    }

    fn source_id(&self) -> &str {
        &self.workspace_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRequest {
    pub brand_identity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_profile_id: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

impl WorksheetRequest {
    pub fn new(brand_identity_id: impl Into<String>) -> Self {
        Self {
            brand_identity_id: brand_identity_id.into(),
            customer_profile_id: None,
            language: default_language(),
        }
    }

    pub fn with_customer_profile(mut self, id: impl Into<String>) -> Self {
        self.customer_profile_id = Some(id.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl GenerationRequest for WorksheetRequest {
    fn kind(&self) -> GenerationKind {
        GenerationKind::Worksheet
    }

    fn validate(&self) -> Result<(), MissingParameter> {
        require(&self.brand_identity_id, "brandIdentityId")
    }

    fn source_id(&self) -> &str {
        &self.brand_identity_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialContentRequest {
    pub worksheet_id: String,
    pub platforms: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl SocialContentRequest {
    pub fn new(worksheet_id: impl Into<String>) -> Self {
        Self {
            worksheet_id: worksheet_id.into(),
            platforms: Vec::new(),
            language: default_language(),
            topic: None,
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    pub fn platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.extend(platforms.into_iter().map(Into::into));
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

impl GenerationRequest for SocialContentRequest {
    fn kind(&self) -> GenerationKind {
        GenerationKind::SocialContent
    }

    fn validate(&self) -> Result<(), MissingParameter> {
        require(&self.worksheet_id, "worksheetId")?;
        if self.platforms.iter().all(|p| p.trim().is_empty()) {
            return Err(MissingParameter("platforms"));
        }
        Ok(())
    }

    fn source_id(&self) -> &str {
        &self.worksheet_id
    }
}
