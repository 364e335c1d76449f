//! Command dispatch for the image bot: caption parsing, media-group
//! buffering, per-chat roles, and the orchestrator and workers that drive
//! them against the collaborator ports.

pub mod command;
pub mod error;
pub mod handlers;
pub mod local;
pub mod orchestrator;
pub mod ports;
pub mod prediction;
pub mod role;
pub mod session;
pub mod worker;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod testing;

pub use {
    command::{Action, Command, ConcatSpec, parse_caption},
    error::{Error, ErrorKind, Result},
    handlers::{RoleHandler, Services, Settings},
    orchestrator::Orchestrator,
    ports::{ImageStorage, QueueMessage, RemoteFile, ResultLookup, TextMessage, Transport, WorkQueue},
    prediction::{PredictionRecord, ResultEnvelope},
    role::{Role, RoleDispatcher, RoleState},
    session::SessionBuffer,
};
