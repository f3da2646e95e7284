//! Background thread hosting the solving engine.
//!
//! Requests and replies cross the thread boundary as JSON text, the same
//! encoding an out-of-process engine would receive.
use std::{
    sync::{Arc, mpsc},
    thread,
};

use pencilmark_core::{
    SolvingEngine,
    wire::{EngineReply, EngineRequest},
};

use super::WorkError;

const THREAD_NAME: &str = "pencilmark-solver";

/// Channel endpoints of a running worker thread.
pub(crate) struct Worker {
    request_tx: mpsc::Sender<String>,
    reply_rx: mpsc::Receiver<String>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").finish()
    }
}

impl Worker {
    /// Starts a worker thread serving `engine`.
    ///
    /// The thread exits once the worker is dropped and any request in
    /// progress has been handled.
    pub(crate) fn spawn(engine: Arc<dyn SolvingEngine + Sync>) -> Result<Self, WorkError> {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel::<String>();
        thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || {
                while let Ok(message) = request_rx.recv() {
                    let request = match serde_json::from_str::<EngineRequest>(&message) {
                        Ok(request) => request,
                        Err(err) => {
                            log::error!("worker dropped an unreadable request: {err}");
                            continue;
                        }
                    };
                    let reply = engine.handle(request);
                    match serde_json::to_string(&reply) {
                        Ok(message) => {
                            if reply_tx.send(message).is_err() {
                                break;
                            }
                        }
                        Err(err) => log::error!("worker failed to encode reply {}: {err}", reply.id),
                    }
                }
                log::debug!("worker thread exiting");
            })
            .map_err(|err| {
                log::error!("failed to spawn worker thread: {err}");
                WorkError::WorkerInitFailed
            })?;
        log::debug!("worker thread started");
        Ok(Self {
            request_tx,
            reply_rx,
        })
    }

    /// Enqueues a request on the worker thread.
    pub(crate) fn send(&self, request: &EngineRequest) -> Result<(), WorkError> {
        let message =
            serde_json::to_string(request).map_err(|_| WorkError::SerializationFailed)?;
        self.request_tx
            .send(message)
            .map_err(|_| WorkError::WorkerDisconnected)
    }

    /// Attempts to receive one completed reply without blocking.
    pub(crate) fn poll(&self) -> Result<Option<EngineReply>, WorkError> {
        use mpsc::TryRecvError;

        match self.reply_rx.try_recv() {
            Ok(message) => serde_json::from_str(&message)
                .map(Some)
                .map_err(|_| WorkError::DeserializationFailed),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkError::WorkerDisconnected),
        }
    }
}
