use copydesk_types::GenerationKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("No usable {kind} result in the done payload or the streamed text")]
    NoResult { kind: GenerationKind },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
