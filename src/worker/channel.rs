use std::sync::mpsc::SyncSender;

use tokio::sync::oneshot;

use crate::results::QueryResult;
use crate::types::QueryRequest;

pub(super) enum Command {
    Execute {
        request: QueryRequest,
        respond_to: Responder,
    },
    Shutdown,
}

/// Reply path back to the caller, blocking or async depending on how it called.
pub(super) enum Responder {
    Blocking(SyncSender<QueryResult>),
    Async(oneshot::Sender<QueryResult>),
}

impl Responder {
    /// Returns false when the caller has stopped waiting (timed out or dropped its future).
    pub(super) fn send(self, result: QueryResult) -> bool {
        match self {
            Self::Blocking(tx) => tx.send(result).is_ok(),
            Self::Async(tx) => tx.send(result).is_ok(),
        }
    }
}
