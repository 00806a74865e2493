mod handle;
mod state;
mod worker;

pub use handle::TurnSessionHandle;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::orchestrator::config::TurnSessionConfig;
use crate::orchestrator::traits::{CompletionClient, FeedClient, LogClient};
use crate::orchestrator::types::SessionUpdate;
use crate::speech::{SpeechInput, SpeechOutput};

use self::worker::TurnWorker;

pub(crate) fn spawn_session(
    config: TurnSessionConfig,
    completion: Arc<dyn CompletionClient>,
    log: Arc<dyn LogClient>,
    feed: Arc<dyn FeedClient>,
    speech_input: SpeechInput,
    speech_output: Arc<SpeechOutput>,
) -> (TurnSessionHandle, mpsc::Receiver<SessionUpdate>) {
    let (updates_tx, updates_rx) = mpsc::channel(config.buffer_capacity);
    let (command_tx, command_rx) = mpsc::channel(config.buffer_capacity);
    let (event_tx, event_rx) = mpsc::channel(config.buffer_capacity);

    let worker = TurnWorker::new(
        config,
        command_rx,
        event_rx,
        event_tx,
        updates_tx,
        completion,
        log,
        feed,
        speech_input,
        speech_output,
    );
    let worker_handle = worker.spawn();
    let handle = TurnSessionHandle::new(command_tx, worker_handle);

    (handle, updates_rx)
}
