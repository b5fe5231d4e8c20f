//! Engine loop: listen, resolve, execute, speak.
//!
//! Runs on one dedicated worker task. The UI talks to it only through the
//! handle (stop flag + command channel) and the status/log callbacks; guard
//! and context state are never touched from another thread. Cancellation is
//! cooperative: the stop flag is checked between plan steps, so an in-flight
//! multi-step plan aborts early instead of being preempted.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_common::plan::{ActionStep, Decision};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::SentinelCore;
use crate::resolver::IntentResolver;

/// Executes one plan step against the real desktop. Implementations own all
/// automation details; the engine only sees the outcome line.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, step: &ActionStep) -> Result<String>;
}

/// Speech in and out. `transcribe` blocks until an utterance or its own
/// timeout; `Ok(None)` means nothing usable was heard.
#[async_trait]
pub trait SpeechPort: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
    async fn transcribe(&self) -> Result<Option<String>>;
}

/// Engine lifecycle states surfaced through the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Listening,
    Processing,
    Executing,
    Ready,
    Stopped,
    Error,
}

impl EngineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EngineStatus::Listening => "Listening...",
            EngineStatus::Processing => "Processing...",
            EngineStatus::Executing => "Executing...",
            EngineStatus::Ready => "Ready",
            EngineStatus::Stopped => "Stopped",
            EngineStatus::Error => "Error",
        }
    }
}

pub type StatusCallback = Box<dyn Fn(&str) + Send + Sync>;
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// UI-facing callbacks. Both default to no-ops.
pub struct EngineCallbacks {
    pub on_status: StatusCallback,
    pub on_log: LogCallback,
}

impl Default for EngineCallbacks {
    fn default() -> Self {
        Self {
            on_status: Box::new(|_| {}),
            on_log: Box::new(|_| {}),
        }
    }
}

/// Audit record for one executed step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub request_id: Uuid,
    pub step: ActionStep,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
    pub outcome: String,
}

/// Cross-thread handle: the only way the UI reaches a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    stop: Arc<AtomicBool>,
    commands: mpsc::Sender<String>,
}

impl EngineHandle {
    /// Request a cooperative stop. Observed between plan steps and before
    /// the next listen.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Inject a text command (UI quick action). It is queued onto the
    /// worker task; state is never mutated from the caller's thread.
    pub fn inject(&self, text: impl Into<String>) -> bool {
        self.commands.try_send(text.into()).is_ok()
    }
}

/// The worker: owns the core and drives the loop.
pub struct Engine<R: IntentResolver, E: ActionExecutor, S: SpeechPort> {
    core: SentinelCore<R>,
    executor: E,
    speech: S,
    callbacks: EngineCallbacks,
    stop: Arc<AtomicBool>,
    commands: mpsc::Receiver<String>,
    // Keeps the channel open even if every external handle is dropped.
    _commands_tx: mpsc::Sender<String>,
}

impl<R: IntentResolver, E: ActionExecutor, S: SpeechPort> Engine<R, E, S> {
    pub fn new(
        core: SentinelCore<R>,
        executor: E,
        speech: S,
        callbacks: EngineCallbacks,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(16);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = EngineHandle {
            stop: Arc::clone(&stop),
            commands: tx.clone(),
        };
        let engine = Self {
            core,
            executor,
            speech,
            callbacks,
            stop,
            commands: rx,
            _commands_tx: tx,
        };
        (engine, handle)
    }

    fn set_status(&self, status: EngineStatus) {
        (self.callbacks.on_status)(status.label());
    }

    fn log(&self, message: &str) {
        (self.callbacks.on_log)(message);
    }

    /// Main loop. Listens for speech and injected commands until stopped.
    pub async fn run(mut self) {
        info!("Engine v{} starting", sentinel_common::VERSION);
        self.log("Engine online.");

        while !self.stop.load(Ordering::SeqCst) {
            self.set_status(EngineStatus::Listening);

            let input = tokio::select! {
                cmd = self.commands.recv() => cmd,
                heard = self.speech.transcribe() => match heard {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Transcription failed: {}", e);
                        self.log(&format!("[ERROR] {}", e));
                        self.set_status(EngineStatus::Error);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                },
            };

            let Some(text) = input else { continue };
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            self.handle_text(&text).await;
            self.set_status(EngineStatus::Ready);
        }

        self.set_status(EngineStatus::Stopped);
        info!("Engine stopped");
    }

    /// Process one utterance end to end. Also the entry point for injected
    /// quick actions.
    pub async fn handle_text(&mut self, text: &str) -> Vec<StepRecord> {
        let request_id = Uuid::new_v4();
        self.set_status(EngineStatus::Processing);
        self.log(&format!("Heard: \"{}\"", text));

        let decision = self.core.process(text).await;
        info!(
            "Request {}: {:?}, {} step(s), blocked={}",
            request_id,
            decision.intent,
            decision.plan.steps.len(),
            decision.blocked
        );
        self.log(&format!(
            "Plan: {} step(s){}",
            decision.plan.steps.len(),
            if decision.blocked { " (blocked)" } else { "" }
        ));

        self.execute_decision(request_id, decision).await
    }

    async fn execute_decision(&mut self, request_id: Uuid, decision: Decision) -> Vec<StepRecord> {
        // A decision without speech steps still gets its response spoken:
        // blocked or empty decisions answer the user too.
        let plan_speaks = decision.plan.steps.iter().any(ActionStep::is_speech);
        if !plan_speaks {
            if let Some(response) = &decision.response {
                if let Err(e) = self.speech.speak(response).await {
                    warn!("Speech failed: {}", e);
                }
                self.log(&format!("Said: {}", response));
            }
        }

        if decision.plan.is_empty() {
            return Vec::new();
        }

        self.set_status(EngineStatus::Executing);
        let mut records = Vec::with_capacity(decision.plan.steps.len());

        for step in decision.plan.steps {
            if self.stop.load(Ordering::SeqCst) {
                warn!("Request {}: plan aborted by stop signal", request_id);
                self.log("Plan aborted.");
                break;
            }

            let record = if let Some(text) = step.spoken_text() {
                let outcome = self.speech.speak(text).await;
                self.log(&format!("Said: {}", text));
                StepRecord {
                    request_id,
                    executed_at: Utc::now(),
                    success: outcome.is_ok(),
                    outcome: text.to_string(),
                    step: step.clone(),
                }
            } else {
                match self.executor.execute(&step).await {
                    Ok(outcome) => {
                        self.log(&format!("[OK] {}", outcome));
                        StepRecord {
                            request_id,
                            executed_at: Utc::now(),
                            success: true,
                            outcome,
                            step: step.clone(),
                        }
                    }
                    Err(e) => {
                        // One failed step does not abort the rest.
                        error!("Step {} failed: {}", step.kind(), e);
                        self.log(&format!("[ERROR] {}", e));
                        StepRecord {
                            request_id,
                            executed_at: Utc::now(),
                            success: false,
                            outcome: e.to_string(),
                            step: step.clone(),
                        }
                    }
                }
            };
            records.push(record);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::plan::Plan;
    use sentinel_common::SentinelConfig;
    use std::sync::Mutex;

    struct EchoResolver;

    #[async_trait]
    impl IntentResolver for EchoResolver {
        async fn resolve(&self, _text: &str) -> Plan {
            Plan::chat("From the resolver.")
        }
    }

    /// Records every executed step; can trip the stop flag mid-plan.
    struct RecordingExecutor {
        executed: Mutex<Vec<ActionStep>>,
        stop_after_first: Option<EngineHandle>,
    }

    #[async_trait]
    impl ActionExecutor for RecordingExecutor {
        async fn execute(&self, step: &ActionStep) -> Result<String> {
            self.executed.lock().unwrap().push(step.clone());
            if let Some(handle) = &self.stop_after_first {
                handle.stop();
            }
            Ok(format!("executed {}", step.kind()))
        }
    }

    struct SilentSpeech {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechPort for SilentSpeech {
        async fn speak(&self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn transcribe(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn engine_parts() -> (
        Engine<EchoResolver, RecordingExecutor, SilentSpeech>,
        EngineHandle,
    ) {
        let core = SentinelCore::new(&SentinelConfig::default(), EchoResolver);
        Engine::new(
            core,
            RecordingExecutor {
                executed: Mutex::new(Vec::new()),
                stop_after_first: None,
            },
            SilentSpeech {
                spoken: Mutex::new(Vec::new()),
            },
            EngineCallbacks::default(),
        )
    }

    #[tokio::test]
    async fn open_site_executes_and_confirms() {
        let (mut engine, _handle) = engine_parts();
        let records = engine.handle_text("open youtube").await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.success));

        let executed = engine.executor.executed.lock().unwrap();
        assert_eq!(executed.len(), 1, "only the side-effecting step hits the executor");
        let spoken = engine.speech.spoken.lock().unwrap();
        assert_eq!(spoken.as_slice(), ["Opening youtube."]);
    }

    #[tokio::test]
    async fn blocked_decision_is_spoken_not_executed() {
        let (mut engine, _handle) = engine_parts();
        let _ = engine.handle_text("open youtube").await;
        let records = engine.handle_text("open youtube").await;

        assert!(records.is_empty());
        let executed = engine.executor.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        let spoken = engine.speech.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 2, "the refusal is still spoken");
    }

    #[tokio::test]
    async fn stop_flag_aborts_mid_plan() {
        let core = SentinelCore::new(&SentinelConfig::default(), EchoResolver);
        let (engine, handle) = Engine::new(
            core,
            RecordingExecutor {
                executed: Mutex::new(Vec::new()),
                stop_after_first: None,
            },
            SilentSpeech {
                spoken: Mutex::new(Vec::new()),
            },
            EngineCallbacks::default(),
        );
        let mut engine = engine;
        engine.executor.stop_after_first = Some(handle);

        // Two-step plan: the executor trips the stop flag on step one, so
        // the confirmation speech step never runs.
        let records = engine.handle_text("take a screenshot").await;
        assert_eq!(records.len(), 1);
        let spoken = engine.speech.spoken.lock().unwrap();
        assert!(spoken.is_empty());
    }

    #[tokio::test]
    async fn callbacks_see_lifecycle_labels() {
        let statuses: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&statuses);

        let core = SentinelCore::new(&SentinelConfig::default(), EchoResolver);
        let (mut engine, _handle) = Engine::new(
            core,
            RecordingExecutor {
                executed: Mutex::new(Vec::new()),
                stop_after_first: None,
            },
            SilentSpeech {
                spoken: Mutex::new(Vec::new()),
            },
            EngineCallbacks {
                on_status: Box::new(move |label| seen.lock().unwrap().push(label.to_string())),
                on_log: Box::new(|_| {}),
            },
        );

        let _ = engine.handle_text("open github").await;
        let statuses = statuses.lock().unwrap();
        assert!(statuses.contains(&"Processing...".to_string()));
        assert!(statuses.contains(&"Executing...".to_string()));
    }
}
