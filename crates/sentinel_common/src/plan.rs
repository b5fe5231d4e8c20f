//! Action plan data model.
//!
//! The plan is the unit of work exchanged between the decision core, the
//! remote resolver and the dispatcher: an ordered list of typed steps.
//! Steps serialize as `{"action": "OPEN_URL", "payload": "..."}` which is
//! also the wire shape the resolver is prompted to produce.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified purpose of an utterance. Exactly one per input; classification
/// is total and defaults to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Conversational,
    OpenWebsite,
    OpenApp,
    SearchQuery,
    PlayMedia,
    BrowserControl,
    SystemControl,
    FileOperation,
    TypeText,
    Screenshot,
    MultiStep,
    StopCommand,
    Unknown,
}

/// File operation requested through a FILE_OP step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileOpKind {
    Create,
    Delete,
}

/// Structured payload for FILE_OP steps. Paths are kept verbatim; the
/// executor collaborator owns path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOp {
    pub operation: FileOpKind,
    pub path: String,
}

/// A single step in an action plan.
///
/// Payloads are strings except FILE_OP, which carries a structured value so
/// malformed resolver output is caught at the parse boundary instead of at
/// execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStep {
    LaunchApp(String),
    OpenUrl(String),
    PlayMedia(String),
    TypeText(String),
    PressKeys(String),
    Screenshot(String),
    SystemCheck(String),
    FileOp(FileOp),
    Shortcut(String),
    DownloadWeb(String),
    Speak(String),
    Chat(String),
}

/// Fieldless kind tag for a step. Used as the guard ledger key and for
/// exhaustive dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    LaunchApp,
    OpenUrl,
    PlayMedia,
    TypeText,
    PressKeys,
    Screenshot,
    SystemCheck,
    FileOp,
    Shortcut,
    DownloadWeb,
    Speak,
    Chat,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::LaunchApp => "LAUNCH_APP",
            ActionKind::OpenUrl => "OPEN_URL",
            ActionKind::PlayMedia => "PLAY_MEDIA",
            ActionKind::TypeText => "TYPE_TEXT",
            ActionKind::PressKeys => "PRESS_KEYS",
            ActionKind::Screenshot => "SCREENSHOT",
            ActionKind::SystemCheck => "SYSTEM_CHECK",
            ActionKind::FileOp => "FILE_OP",
            ActionKind::Shortcut => "SHORTCUT",
            ActionKind::DownloadWeb => "DOWNLOAD_WEB",
            ActionKind::Speak => "SPEAK",
            ActionKind::Chat => "CHAT",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl ActionStep {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionStep::LaunchApp(_) => ActionKind::LaunchApp,
            ActionStep::OpenUrl(_) => ActionKind::OpenUrl,
            ActionStep::PlayMedia(_) => ActionKind::PlayMedia,
            ActionStep::TypeText(_) => ActionKind::TypeText,
            ActionStep::PressKeys(_) => ActionKind::PressKeys,
            ActionStep::Screenshot(_) => ActionKind::Screenshot,
            ActionStep::SystemCheck(_) => ActionKind::SystemCheck,
            ActionStep::FileOp(_) => ActionKind::FileOp,
            ActionStep::Shortcut(_) => ActionKind::Shortcut,
            ActionStep::DownloadWeb(_) => ActionKind::DownloadWeb,
            ActionStep::Speak(_) => ActionKind::Speak,
            ActionStep::Chat(_) => ActionKind::Chat,
        }
    }

    /// True for steps that only produce speech and have no OS side effect.
    pub fn is_speech(&self) -> bool {
        matches!(self, ActionStep::Speak(_) | ActionStep::Chat(_))
    }

    /// Spoken text carried by a speech step, if any.
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            ActionStep::Speak(text) | ActionStep::Chat(text) => Some(text),
            _ => None,
        }
    }
}

/// Upper bound on steps accepted from the resolver. Anything longer is
/// treated as malformed output.
pub const MAX_PLAN_STEPS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan has no steps")]
    Empty,
    #[error("plan has {0} steps, limit is {MAX_PLAN_STEPS}")]
    TooLong(usize),
    #[error("step {index} ({kind}) has an empty payload")]
    EmptyPayload { index: usize, kind: ActionKind },
}

/// Ordered sequence of action steps. Order is execution order; a plan with
/// zero steps means nothing is left to execute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<ActionStep>,
}

impl Plan {
    pub fn new(steps: Vec<ActionStep>) -> Self {
        Self { steps }
    }

    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Single-step plan that only speaks.
    pub fn speak(text: impl Into<String>) -> Self {
        Self::new(vec![ActionStep::Speak(text.into())])
    }

    /// Single-step plan deferring wording to the resolver tier.
    pub fn chat(text: impl Into<String>) -> Self {
        Self::new(vec![ActionStep::Chat(text.into())])
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when every step is speech-only.
    pub fn speech_only(&self) -> bool {
        self.steps.iter().all(ActionStep::is_speech)
    }

    /// Drop every side-effecting step, keeping speech. Returns how many
    /// steps were removed.
    pub fn retain_speech(&mut self) -> usize {
        let before = self.steps.len();
        self.steps.retain(ActionStep::is_speech);
        before - self.steps.len()
    }

    /// Validate shape constraints on a plan received from the resolver.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }
        if self.steps.len() > MAX_PLAN_STEPS {
            return Err(PlanError::TooLong(self.steps.len()));
        }
        for (index, step) in self.steps.iter().enumerate() {
            let payload_empty = match step {
                ActionStep::LaunchApp(p)
                | ActionStep::OpenUrl(p)
                | ActionStep::PlayMedia(p)
                | ActionStep::TypeText(p)
                | ActionStep::PressKeys(p)
                | ActionStep::Shortcut(p)
                | ActionStep::DownloadWeb(p)
                | ActionStep::Speak(p)
                | ActionStep::Chat(p) => p.trim().is_empty(),
                ActionStep::FileOp(op) => op.path.trim().is_empty(),
                // Screenshot and SYSTEM_CHECK legitimately run with an
                // empty payload.
                ActionStep::Screenshot(_) | ActionStep::SystemCheck(_) => false,
            };
            if payload_empty {
                return Err(PlanError::EmptyPayload {
                    index,
                    kind: step.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Machine-readable reason codes carried on blocked decisions.
pub mod reason {
    pub const DUPLICATE_ACTION: &str = "duplicate_action";
    pub const ALREADY_OPEN: &str = "already_open";
    pub const UNKNOWN_DOMAIN: &str = "unknown_domain";
    pub const NEEDS_CONFIRMATION: &str = "needs_confirmation";
    pub const MISSING_MEDIA: &str = "missing_media";
    pub const UNCLEAR_INTENT: &str = "unclear_intent";
    pub const SYSTEM_PAUSED: &str = "system_paused";
}

/// The total output of `process()`: what was understood, what will run, and
/// what gets said. Every branch of the core resolves to one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub intent: Intent,
    pub plan: Plan,
    pub response: Option<String>,
    pub blocked: bool,
    pub reason: String,
}

impl Decision {
    /// An allowed decision carrying a plan and its spoken confirmation.
    pub fn allowed(intent: Intent, plan: Plan, response: impl Into<String>) -> Self {
        Self {
            intent,
            plan,
            response: Some(response.into()),
            blocked: false,
            reason: String::new(),
        }
    }

    /// A refusal: no steps, a spoken explanation, and a machine reason.
    pub fn blocked(intent: Intent, response: impl Into<String>, reason: &str) -> Self {
        Self {
            intent,
            plan: Plan::empty(),
            response: Some(response.into()),
            blocked: true,
            reason: reason.to_string(),
        }
    }
}
