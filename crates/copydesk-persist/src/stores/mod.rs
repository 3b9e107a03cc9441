mod http;
mod memory;

pub use http::{HttpRecordStore, HttpRecordStoreBuilder};
pub use memory::InMemoryRecordStore;
