pub mod error;
pub mod runner;
pub mod session;

pub use error::{Result, SessionError};
pub use runner::{GenerationRunner, SessionHandle};
pub use session::{GenerationSession, Phase, STREAM_ENDED_EARLY};
