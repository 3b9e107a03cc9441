pub mod error;
pub mod models;
pub mod store;
pub mod stores;
pub mod writer;

pub use error::{PersistError, Result};
pub use models::{Filter, ListQuery, Page, Record};
pub use store::RecordStore;
pub use stores::{HttpRecordStore, HttpRecordStoreBuilder, InMemoryRecordStore};
pub use writer::{
    ResultWriter, SavedResult, BRAND_IDENTITIES, CUSTOMER_PROFILES, MASTER_CONTENTS,
    PLATFORM_VARIANTS, WORKSHEETS,
};
