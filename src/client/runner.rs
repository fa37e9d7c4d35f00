//! Conversation client orchestrating a single Claude CLI run.
//!
//! This module connects the prompt renderer, process runner, line decoder,
//! block tracker and publisher. One run reads the process output
//! sequentially on the calling task and publishes each decoded message as
//! soon as it is produced.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::cli::{
    exit_code, ClaudeProcess, ClaudeProcessBuilder, CliLine, ContentEvent, OutputLines,
};
use crate::client::{RunError, RunState, RunStateMachine, RunStats};
use crate::config::ClientConfig;
use crate::prompt::{Conversation, PromptRenderer, TranscriptRenderer};
use crate::stream::{
    subscription_channel, BlockTracker, OutgoingMessage, RunOutcome, StreamPublisher,
    SubscriberSink, Subscription,
};

/// What the read loop should do with one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Nothing to publish (blank, unrecognized, or no payload).
    Ignore,
    /// A recoverable problem; the line was dropped.
    Skipped(String),
    /// Publish this message.
    Emit(OutgoingMessage),
}

/// Classify, decode and track one raw line.
///
/// # Errors
///
/// Returns `RunError::Upstream` for an `error` line. Malformed or
/// undecodable lines are not errors; they yield [`LineAction::Skipped`].
pub fn decode_line(tracker: &mut BlockTracker, line: &str) -> Result<LineAction, RunError> {
    let classified = match CliLine::classify(line) {
        Ok(classified) => classified,
        Err(e) => return Ok(LineAction::Skipped(e.to_string())),
    };

    match classified {
        CliLine::Blank | CliLine::Unrecognized | CliLine::StreamEvent { event: None } => {
            Ok(LineAction::Ignore)
        }
        CliLine::StreamEvent { event: Some(event) } => match ContentEvent::decode(&event) {
            Ok(event) => Ok(tracker
                .apply(&event)
                .map_or(LineAction::Ignore, LineAction::Emit)),
            Err(e) => Ok(LineAction::Skipped(e.to_string())),
        },
        CliLine::Error { message } => Err(RunError::Upstream(message)),
    }
}

/// How the read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    EndOfStream,
    Cancelled,
}

/// Streams Claude CLI responses for a conversation to subscribers.
///
/// Subscribers register with [`ConversationClient::subscribe`] before a run
/// and are attached to the next run only. Runs take `&mut self`, so one
/// client drives at most one run at a time.
///
/// Delivery waits for subscribers to make room, but never indefinitely:
/// cancellation interrupts it, and a subscriber whose buffer stays full for
/// `stall_timeout_ms` is dropped with a `Failed` terminal signal.
pub struct ConversationClient {
    config: ClientConfig,
    renderer: Arc<dyn PromptRenderer>,
    pending: Mutex<Vec<SubscriberSink>>,
    cancel: CancellationToken,
    state: RunStateMachine,
    tracker: BlockTracker,
}

impl std::fmt::Debug for ConversationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationClient")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ConversationClient {
    /// Create a client rendering prompts with the configured system prompt.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let renderer = Arc::new(TranscriptRenderer::new(config.system_prompt.clone()));
        Self {
            config,
            renderer,
            pending: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            state: RunStateMachine::new(),
            tracker: BlockTracker::new(),
        }
    }

    /// Use a custom prompt renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set the cancellation source for subsequent runs.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the cancellation source for subsequent runs.
    pub fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    /// The current cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Register a subscriber for the next run.
    pub fn subscribe(&self) -> Subscription {
        let (sink, subscription) = subscription_channel(self.config.channel_buffer);
        self.lock_pending().push(sink);
        subscription
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    /// Get statistics for the current or most recent run.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.state.stats()
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<SubscriberSink>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the conversation to completion.
    ///
    /// Every subscriber registered beforehand receives the decoded messages
    /// in order followed by exactly one terminal signal, which is also
    /// returned here. Errors never escape this call; they become
    /// [`RunOutcome::Failed`].
    pub async fn run(&mut self, conversation: &Conversation) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        self.run_inner(conversation).instrument(span).await
    }

    async fn run_inner(&mut self, conversation: &Conversation) -> RunOutcome {
        let subscribers = std::mem::take(&mut *self.lock_pending());
        let mut publisher = StreamPublisher::new(subscribers)
            .with_stall_timeout(Duration::from_millis(self.config.stall_timeout_ms));

        self.tracker.reset();
        self.state.start();

        let prompt = self.renderer.render(conversation);
        let model = self.config.model_name().to_string();
        tracing::debug!(%model, prompt_len = prompt.len(), "Rendered prompt");

        let result = self.execute(&prompt, &model, &mut publisher).await;

        let outcome = match result {
            Err(e) if e.is_upstream() => {
                tracing::warn!(error = %e, "Claude CLI reported an error");
                RunOutcome::Failed {
                    cause: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Claude CLI run failed");
                RunOutcome::Failed {
                    cause: e.to_string(),
                }
            }
            Ok(()) if self.is_cancelled() => RunOutcome::Cancelled,
            Ok(()) => RunOutcome::Completed,
        };

        let stats = self.state.stats();
        tracing::info!(
            outcome = ?outcome,
            lines = stats.lines,
            skipped = stats.skipped,
            messages = stats.messages,
            "Run finished"
        );
        self.state.finish(&outcome);
        publisher.close(outcome.clone());
        outcome
    }

    /// Launch the process and guarantee it is reaped on every exit path.
    async fn execute(
        &mut self,
        prompt: &str,
        model: &str,
        publisher: &mut StreamPublisher,
    ) -> Result<(), RunError> {
        let mut builder = ClaudeProcessBuilder::new(prompt, model).binary(&self.config.binary);
        if let Some(ref dir) = self.config.working_dir {
            builder = builder.working_dir(dir);
        }

        let mut process = ClaudeProcess::spawn(&builder)?;
        let result = self.drive(&mut process, publisher).await;

        match process.terminate().await {
            Ok(true) => tracing::debug!("Claude process killed during cleanup"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to terminate Claude process"),
        }
        result
    }

    async fn drive(
        &mut self,
        process: &mut ClaudeProcess,
        publisher: &mut StreamPublisher,
    ) -> Result<(), RunError> {
        let mut lines = process.take_output().ok_or(RunError::NoOutput)?;

        if self.read_loop(&mut lines, publisher).await? == LoopEnd::Cancelled {
            tracing::info!("Run cancelled, terminating Claude process");
            Self::terminate_quietly(process).await;
            return Ok(());
        }

        let cancel = self.cancel.clone();
        let status = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                tracing::info!("Run cancelled while waiting for exit");
                Self::terminate_quietly(process).await;
                return Ok(());
            }
            status = process.wait() => status?,
        };

        let code = exit_code(status);
        tracing::debug!(code, "Claude process exited");
        if code != 0 && !self.is_cancelled() {
            return Err(RunError::NonZeroExit(code));
        }
        Ok(())
    }

    async fn terminate_quietly(process: &mut ClaudeProcess) {
        if let Err(e) = process.terminate().await {
            tracing::warn!(error = %e, "Failed to terminate Claude process");
        }
    }

    async fn read_loop(
        &mut self,
        lines: &mut OutputLines,
        publisher: &mut StreamPublisher,
    ) -> Result<LoopEnd, RunError> {
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                return Ok(LoopEnd::Cancelled);
            }

            let next = tokio::select! {
                biased;

                () = cancel.cancelled() => return Ok(LoopEnd::Cancelled),
                next = lines.next_line() => next,
            };

            let Some(line) = next else {
                return Ok(LoopEnd::EndOfStream);
            };
            let line = line?;
            self.state.record_line();

            match decode_line(&mut self.tracker, &line)? {
                LineAction::Ignore => {}
                LineAction::Skipped(reason) => {
                    self.state.record_skipped();
                    tracing::warn!(%reason, %line, "Skipping unreadable CLI line");
                }
                LineAction::Emit(message) => {
                    self.state.record_message();
                    tracing::trace!(kind = ?message.kind, len = message.payload.len(), "Publishing message");
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => return Ok(LoopEnd::Cancelled),
                        _ = publisher.submit(message) => {}
                    }
                }
            }
        }
    }
}
