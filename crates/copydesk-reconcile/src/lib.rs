pub mod error;
pub mod fields;
pub mod metadata;
pub mod result;

pub use error::{ReconcileError, Result};
pub use fields::{
    list_field, number_field, text_field, HASHTAG_SEPARATOR, KEYWORD_SEPARATOR,
};
pub use metadata::{reconcile_metadata, NormalizedMetadata};
pub use result::{GenerationResult, SocialContentForm, VariantForm};
