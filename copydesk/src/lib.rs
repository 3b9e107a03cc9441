//! # Copydesk - streaming AI content generation
//!
//! Copydesk drives the generation workflow of a marketing-content workspace:
//! - **Streaming client** for the agent service (`text/event-stream` over POST)
//! - **Session state machine** (`config → streaming → done | error`, cancel
//!   back to `config`)
//! - **Result reconciliation** into flat, editable fields
//! - **Persistence** of reconciled results into a record store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use copydesk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let studio = StudioBuilder::new()
//!         .base_url("http://localhost:8000")
//!         .token(std::env::var("COPYDESK_TOKEN")?)
//!         .store_url("http://localhost:8090")
//!         .build()?;
//!
//!     let request = SocialContentRequest::new("ws_42").platform("instagram");
//!     let outcome = studio
//!         .generate(&request, |session| {
//!             if let Some(status) = session.status_message() {
//!                 eprintln!("{}", status);
//!             }
//!         })
//!         .await?;
//!
//!     if let GenerationOutcome::Completed { result, .. } = outcome {
//!         studio.save(&result, request.source_id()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **copydesk-types**: events, statuses, requests, credentials
//! - **copydesk-stream**: SSE framing and the cancellable stream client
//! - **copydesk-session**: session state machine and runner
//! - **copydesk-reconcile**: field normalizers and per-kind results
//! - **copydesk-persist**: record store trait, stores and the result writer

pub use copydesk_persist as persist;
pub use copydesk_reconcile as reconcile;
pub use copydesk_session as session;
pub use copydesk_stream as stream;
pub use copydesk_types as types;

pub use copydesk_persist::{RecordStore, ResultWriter};
pub use copydesk_reconcile::{GenerationResult, NormalizedMetadata, SocialContentForm};
pub use copydesk_session::{GenerationRunner, GenerationSession, Phase};
pub use copydesk_stream::{CancellationToken, GenerationClient, StreamError};
pub use copydesk_types::{GenerationEvent, GenerationKind};

/// High-level builder for running generations
pub mod builder;

pub use builder::{GenerationOutcome, Studio, StudioBuilder};

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::{GenerationOutcome, Studio, StudioBuilder};
    pub use crate::reconcile::GenerationResult;
    pub use crate::session::{GenerationSession, Phase};
    pub use crate::types::{
        BrandIdentityRequest, CustomerProfileRequest, GenerationEvent, GenerationKind,
        GenerationRequest, SocialContentRequest, WorksheetRequest,
    };
    pub use anyhow::Result;
}
