pub mod credentials;
pub mod events;
pub mod kind;
pub mod request;
pub mod status;

pub use credentials::{
    CredentialError, CredentialProvider, FileCredentials, SharedCredentials, StaticCredentials,
};
pub use events::GenerationEvent;
pub use kind::{GenerationKind, UnknownKind};
pub use request::{
    BrandIdentityRequest, CustomerProfileRequest, GenerationRequest, MissingParameter,
    SocialContentRequest, WorksheetRequest, DEFAULT_LANGUAGE,
};
pub use status::AgentStatus;
