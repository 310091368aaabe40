//! Error types for the orchestration layer.

use thiserror::Error;
use trato_gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend call behind an operation failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The operation needs the root deal to be loaded first. A failed
    /// root fetch is terminal: nothing below it will fetch.
    #[error("deal not loaded")]
    RootNotLoaded,

    /// The operation is reserved for the deal owner.
    #[error("only the deal owner may do this")]
    NotOwner,

    /// The owner tried a thread operation without selecting a
    /// conversation first.
    #[error("no conversation selected")]
    NoPeerSelected,

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    SignedOut,
}

pub type ClientResult<T> = Result<T, ClientError>;
