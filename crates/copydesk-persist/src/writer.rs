use std::sync::Arc;

use serde_json::{Map, Value};

use copydesk_reconcile::{GenerationResult, NormalizedMetadata, SocialContentForm};
use copydesk_types::GenerationKind;

use crate::error::Result;
use crate::models::{ListQuery, Page, Record};
use crate::store::RecordStore;

pub const CUSTOMER_PROFILES: &str = "customer_profiles";
pub const BRAND_IDENTITIES: &str = "brand_identities";
pub const WORKSHEETS: &str = "worksheets";
pub const MASTER_CONTENTS: &str = "master_contents";
pub const PLATFORM_VARIANTS: &str = "platform_variants";

/// Field linking a platform variant to its master content
pub const MASTER_CONTENT_LINK: &str = "master_content";

/// Records written for one result
#[derive(Debug, Clone, PartialEq)]
pub struct SavedResult {
    pub record: Record,
    /// Platform variants, only for social content
    pub variants: Vec<Record>,
}

/// Persists reconciled results into their collections
#[derive(Clone)]
pub struct ResultWriter {
    store: Arc<dyn RecordStore>,
}

impl ResultWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Collection a result of `kind` is written to
    pub fn collection(kind: GenerationKind) -> &'static str {
        match kind {
            GenerationKind::CustomerProfile => CUSTOMER_PROFILES,
            GenerationKind::BrandIdentity => BRAND_IDENTITIES,
            GenerationKind::Worksheet => WORKSHEETS,
            GenerationKind::SocialContent => MASTER_CONTENTS,
        }
    }

    /// Field holding the id of the record the generation started from
    pub fn source_field(kind: GenerationKind) -> &'static str {
        match kind {
            GenerationKind::CustomerProfile => "brand_identity",
            GenerationKind::BrandIdentity => "workspace",
            GenerationKind::Worksheet => "brand_identity",
            GenerationKind::SocialContent => "worksheet",
        }
    }

    /// Write a result, linked to `source_id`.
    ///
    /// Social content becomes one master record plus one record per
    /// variant. If a variant fails to save, the records already written
    /// for this result are removed again.
    pub async fn save(&self, result: &GenerationResult, source_id: &str) -> Result<SavedResult> {
        let kind = result.kind();
        let collection = Self::collection(kind);

        let mut fields = match result {
            GenerationResult::CustomerProfile(map) | GenerationResult::BrandIdentity(map) => map.clone(),
            GenerationResult::Worksheet(content) => {
                let mut map = Map::new();
                map.insert("content".into(), Value::String(content.clone()));
                map
            }
            GenerationResult::SocialContent(form) => master_fields(form),
        };
        fields.insert(Self::source_field(kind).into(), Value::String(source_id.to_string()));

        let record = self.store.create(collection, fields).await?;
        tracing::info!(kind = %kind, collection = %collection, id = %record.id, "Saved generation result");

        let variants = match result {
            GenerationResult::SocialContent(form) => self.save_variants(&record, form).await?,
            _ => Vec::new(),
        };

        Ok(SavedResult { record, variants })
    }

    /// Variants linked to a master content record
    pub async fn variants_of(&self, master_id: &str) -> Result<Page<Record>> {
        self.store
            .list(
                PLATFORM_VARIANTS,
                &ListQuery::new().eq(MASTER_CONTENT_LINK, master_id),
            )
            .await
    }

    async fn save_variants(&self, master: &Record, form: &SocialContentForm) -> Result<Vec<Record>> {
        let mut saved = Vec::with_capacity(form.variants.len());

        for variant in &form.variants {
            let mut fields = metadata_fields(&variant.metadata);
            fields.insert(MASTER_CONTENT_LINK.into(), Value::String(master.id.clone()));
            fields.insert("platform".into(), Value::String(variant.platform.clone()));
            fields.insert("content".into(), Value::String(variant.content.clone()));

            match self.store.create(PLATFORM_VARIANTS, fields).await {
                Ok(record) => saved.push(record),
                Err(e) => {
                    tracing::error!(master_id = %master.id, platform = %variant.platform, error = %e, "Failed to save variant, rolling back");
                    self.roll_back(master, &saved).await;
                    return Err(e);
                }
            }
        }

        Ok(saved)
    }

    async fn roll_back(&self, master: &Record, variants: &[Record]) {
        for variant in variants {
            if let Err(e) = self.store.remove(PLATFORM_VARIANTS, &variant.id).await {
                tracing::warn!(id = %variant.id, error = %e, "Rollback failed for variant");
            }
        }
        if let Err(e) = self.store.remove(MASTER_CONTENTS, &master.id).await {
            tracing::warn!(id = %master.id, error = %e, "Rollback failed for master content");
        }
    }
}

fn master_fields(form: &SocialContentForm) -> Map<String, Value> {
    let mut fields = metadata_fields(&form.metadata);
    fields.insert("core_message".into(), Value::String(form.core_message.clone()));
    fields
}

fn metadata_fields(metadata: &NormalizedMetadata) -> Map<String, Value> {
    metadata.to_payload()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::InMemoryRecordStore;
    use copydesk_reconcile::VariantForm;
    use serde_json::json;

    fn social_form() -> SocialContentForm {
        SocialContentForm {
            core_message: "Spring roast".into(),
            metadata: NormalizedMetadata {
                hashtags: "#spring #coffee".into(),
                ..Default::default()
            },
            variants: vec![
                VariantForm {
                    platform: "instagram".into(),
                    content: "IG copy".into(),
                    metadata: NormalizedMetadata::default(),
                },
                VariantForm {
                    platform: "linkedin".into(),
                    content: "LI copy".into(),
                    metadata: NormalizedMetadata {
                        seo_keywords: "coffee, roast".into(),
                        ..Default::default()
                    },
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_save_profile_links_brand() {
        let store = Arc::new(InMemoryRecordStore::new());
        let writer = ResultWriter::new(store.clone());

        let profile = json!({"personaName": "Test"}).as_object().cloned().unwrap();
        let saved = writer
            .save(&GenerationResult::CustomerProfile(profile), "bi_1")
            .await
            .unwrap();

        assert_eq!(saved.record.collection_name, CUSTOMER_PROFILES);
        assert_eq!(saved.record.get_str("personaName"), Some("Test"));
        assert_eq!(saved.record.get_str("brand_identity"), Some("bi_1"));
        assert!(saved.variants.is_empty());
    }

    #[tokio::test]
    async fn test_save_worksheet() {
        let store = Arc::new(InMemoryRecordStore::new());
        let writer = ResultWriter::new(store.clone());

        let saved = writer
            .save(&GenerationResult::Worksheet("# Plan".into()), "bi_9")
            .await
            .unwrap();
        assert_eq!(saved.record.get_str("content"), Some("# Plan"));
        assert_eq!(store.count(WORKSHEETS).await, 1);
    }

    #[tokio::test]
    async fn test_save_social_content_with_variants() {
        let store = Arc::new(InMemoryRecordStore::new());
        let writer = ResultWriter::new(store.clone());

        let saved = writer
            .save(&GenerationResult::SocialContent(social_form()), "ws_1")
            .await
            .unwrap();

        assert_eq!(saved.record.collection_name, MASTER_CONTENTS);
        assert_eq!(saved.record.get_str("core_message"), Some("Spring roast"));
        assert_eq!(saved.record.get_str("hashtags"), Some("#spring #coffee"));
        assert_eq!(saved.record.get_str("worksheet"), Some("ws_1"));
        assert_eq!(saved.variants.len(), 2);

        let linked = writer.variants_of(&saved.record.id).await.unwrap();
        assert_eq!(linked.total_items, 2);
        assert_eq!(linked.items[1].get_str("seo_keywords"), Some("coffee, roast"));
    }
}
