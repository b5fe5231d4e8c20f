//! Sentinel core: the single decision point for user input.
//!
//! Composes the classifier, guard, session context, fast path and remote
//! resolver into `process(text) -> Decision`. Total for every string input:
//! each branch ends in a well-formed decision, and the only fallible I/O
//! (the resolver) is already total at its own boundary.

use sentinel_common::personality::{self, ResponseCategory};
use sentinel_common::plan::{reason, ActionStep, Decision, Intent, Plan};
use sentinel_common::{domains, ActionKind, SentinelConfig};
use tracing::{debug, info};

use crate::classifier;
use crate::context::SessionContext;
use crate::fastpath;
use crate::guard::ActionGuard;
use crate::resolver::{self, IntentResolver};

/// System commands that need an explicit "confirm <command>" phrase before
/// anything runs. Risk, not repetition, is the concern here, so this gate
/// sits outside the guard.
const RISKY_COMMANDS: &[&str] = &["shutdown", "restart", "delete", "remove", "format"];

/// The orchestrator. Owns the guard and session context; one instance per
/// session, never shared across sessions.
pub struct SentinelCore<R: IntentResolver> {
    guard: ActionGuard,
    context: SessionContext,
    resolver: R,
}

impl<R: IntentResolver> SentinelCore<R> {
    pub fn new(config: &SentinelConfig, resolver: R) -> Self {
        info!("Sentinel core initialized; safety systems online");
        Self {
            guard: ActionGuard::new(config.guard.clone()),
            context: SessionContext::new(),
            resolver,
        }
    }

    /// Process one utterance. Never panics, never returns an error: every
    /// input resolves to a decision with a response and/or a plan.
    pub async fn process(&mut self, text: &str) -> Decision {
        let text = text.trim();
        if text.is_empty() {
            return Decision {
                intent: Intent::Conversational,
                plan: Plan::empty(),
                response: Some("I didn't catch that.".to_string()),
                blocked: false,
                reason: String::new(),
            };
        }

        let (intent, target) = classifier::classify(text);
        debug!("Classified '{}' as {:?} (target {:?})", text, intent, target);

        match intent {
            Intent::StopCommand => self.handle_stop(),
            Intent::Conversational => self.handle_conversation(text).await,
            Intent::OpenWebsite => self.handle_open_website(target.unwrap_or_default()),
            Intent::OpenApp => self.handle_open_app(target.unwrap_or_default()),
            Intent::PlayMedia => self.handle_play_media(target.unwrap_or_default()),
            Intent::Screenshot => self.handle_screenshot(),
            Intent::SystemControl => self.handle_system_control(target.unwrap_or_default()),
            Intent::BrowserControl => self.handle_browser_control(target.unwrap_or_default()),
            Intent::TypeText => self.handle_type_text(target.unwrap_or_default()),
            Intent::Unknown => Decision::blocked(
                Intent::Unknown,
                "Not sure what you mean. Can you be more specific?",
                reason::UNCLEAR_INTENT,
            ),
            // Everything else (file operations, multi-step, search) goes to
            // the fast path and, failing that, the resolver.
            residual => self.resolve_with_fallback(residual, text).await,
        }
    }

    /// External close signal: forget an open target.
    pub fn mark_closed(&mut self, target: &str, kind: ActionKind) {
        self.context.mark_closed(target, kind);
    }

    fn handle_stop(&mut self) -> Decision {
        self.guard.clear();
        info!("Stop command: guard cleared");
        Decision {
            intent: Intent::StopCommand,
            plan: Plan::empty(),
            response: Some("Stopped. All clear.".to_string()),
            blocked: false,
            reason: String::new(),
        }
    }

    async fn handle_conversation(&mut self, text: &str) -> Decision {
        self.context.conversation_count += 1;

        if let Some(category) = canned_category(text) {
            let phrase = personality::respond(category);
            return Decision {
                intent: Intent::Conversational,
                plan: Plan::new(vec![ActionStep::Speak(phrase.clone())]),
                response: Some(phrase),
                blocked: false,
                reason: String::new(),
            };
        }

        // No canned category: the resolver tier supplies the wording, and
        // only the wording — sanitize() keeps action steps out.
        self.resolve_with_fallback(Intent::Conversational, text).await
    }

    fn handle_open_website(&mut self, target: String) -> Decision {
        let url = match domains::canonical_url(&target) {
            Some(url) => url.to_string(),
            None if domains::looks_like_domain(&target) => format!("https://{}", target),
            None => {
                // Unknown domain: ask, don't guess.
                return Decision::blocked(
                    Intent::OpenWebsite,
                    personality::respond(ResponseCategory::UnknownSite),
                    reason::UNKNOWN_DOMAIN,
                );
            }
        };

        // The friendlier "already open" answer comes before the guard's
        // generic duplicate refusal.
        if self.context.is_already_open(&target, ActionKind::OpenUrl) {
            return Decision::blocked(
                Intent::OpenWebsite,
                personality::respond(ResponseCategory::Already),
                reason::ALREADY_OPEN,
            );
        }
        if let Err(refusal) = self.guard.can_execute(ActionKind::OpenUrl, &target) {
            return Decision::blocked(Intent::OpenWebsite, refusal.to_string(), refusal.reason());
        }

        self.guard.record(ActionKind::OpenUrl, &target);
        self.context
            .update(&format!("open {}", target), ActionKind::OpenUrl, &target);

        let response = format!("Opening {}.", target);
        Decision::allowed(
            Intent::OpenWebsite,
            Plan::new(vec![
                ActionStep::OpenUrl(url),
                ActionStep::Speak(response.clone()),
            ]),
            response,
        )
    }

    fn handle_open_app(&mut self, target: String) -> Decision {
        let launch = domains::app_launch_target(&target)
            .map(str::to_string)
            .unwrap_or_else(|| target.clone());

        if self.context.is_already_open(&target, ActionKind::LaunchApp) {
            return Decision::blocked(
                Intent::OpenApp,
                personality::respond(ResponseCategory::Already),
                reason::ALREADY_OPEN,
            );
        }
        if let Err(refusal) = self.guard.can_execute(ActionKind::LaunchApp, &target) {
            return Decision::blocked(Intent::OpenApp, refusal.to_string(), refusal.reason());
        }

        self.guard.record(ActionKind::LaunchApp, &target);
        self.context
            .update(&format!("open {}", target), ActionKind::LaunchApp, &target);

        let response = format!("Launching {}.", target);
        Decision::allowed(
            Intent::OpenApp,
            Plan::new(vec![
                ActionStep::LaunchApp(launch),
                ActionStep::Speak(response.clone()),
            ]),
            response,
        )
    }

    fn handle_play_media(&mut self, subject: String) -> Decision {
        if subject.len() < 2 {
            return Decision::blocked(
                Intent::PlayMedia,
                "What should I play?",
                reason::MISSING_MEDIA,
            );
        }
        if let Err(refusal) = self.guard.can_execute(ActionKind::PlayMedia, &subject) {
            return Decision::blocked(Intent::PlayMedia, refusal.to_string(), refusal.reason());
        }

        self.guard.record(ActionKind::PlayMedia, &subject);

        let response = format!("Playing {}.", subject);
        Decision::allowed(
            Intent::PlayMedia,
            Plan::new(vec![
                ActionStep::PlayMedia(subject),
                ActionStep::Speak(response.clone()),
            ]),
            response,
        )
    }

    fn handle_screenshot(&mut self) -> Decision {
        if let Err(refusal) = self.guard.can_execute(ActionKind::Screenshot, "screen") {
            return Decision::blocked(Intent::Screenshot, refusal.to_string(), refusal.reason());
        }
        self.guard.record(ActionKind::Screenshot, "screen");

        Decision::allowed(
            Intent::Screenshot,
            Plan::new(vec![
                ActionStep::Screenshot("capture".to_string()),
                ActionStep::Speak("Screenshot taken.".to_string()),
            ]),
            "Screenshot taken.",
        )
    }

    fn handle_system_control(&mut self, command: String) -> Decision {
        // "confirm <command>" executes a previously refused risky command
        // and lifts any repeat block the refusals accumulated.
        if let Some(confirmed) = command.strip_prefix("confirm ") {
            let confirmed = confirmed.trim().to_string();
            self.guard.force_unblock();
            info!("Risky command confirmed: {}", confirmed);
            return Decision::allowed(
                Intent::SystemControl,
                Plan::new(vec![
                    ActionStep::Shortcut(confirmed),
                    ActionStep::Speak("Confirmed and executed.".to_string()),
                ]),
                "Confirmed and executed.",
            );
        }

        if RISKY_COMMANDS.iter().any(|risky| command.contains(risky)) {
            return Decision::blocked(
                Intent::SystemControl,
                format!("That's a risky action. Say 'confirm {}' to proceed.", command),
                reason::NEEDS_CONFIRMATION,
            );
        }

        Decision::allowed(
            Intent::SystemControl,
            Plan::new(vec![
                ActionStep::Shortcut(command),
                ActionStep::Speak("Done.".to_string()),
            ]),
            "Done.",
        )
    }

    fn handle_browser_control(&mut self, command: String) -> Decision {
        Decision::allowed(
            Intent::BrowserControl,
            Plan::new(vec![
                ActionStep::Shortcut(command),
                ActionStep::Speak("Done.".to_string()),
            ]),
            "Done.",
        )
    }

    fn handle_type_text(&mut self, content: String) -> Decision {
        Decision::allowed(
            Intent::TypeText,
            Plan::new(vec![
                ActionStep::TypeText(content),
                ActionStep::Speak("Typed.".to_string()),
            ]),
            "Typed.",
        )
    }

    /// Tier 2 and 3: local fast path, then the remote resolver. The
    /// conversational safety filter applies to both tiers: question-shaped
    /// input only ever accepts speech-only plans.
    async fn resolve_with_fallback(&mut self, intent: Intent, text: &str) -> Decision {
        if let Some(plan) = fastpath::try_match(text) {
            if plan.speech_only() || !classifier::is_conversational(text) {
                let response = last_spoken(&plan);
                return Decision {
                    intent,
                    plan,
                    response,
                    blocked: false,
                    reason: String::new(),
                };
            }
            debug!("Fast path proposed actions for conversational text; deferring to resolver");
        }

        let plan = self.resolver.resolve(text).await;
        let plan = resolver::sanitize(text, plan);
        let response = last_spoken(&plan);
        Decision {
            intent,
            plan,
            response,
            blocked: false,
            reason: String::new(),
        }
    }
}

/// The last speech step's text, used as the decision's response line.
fn last_spoken(plan: &Plan) -> Option<String> {
    plan.steps
        .iter()
        .rev()
        .find_map(|step| step.spoken_text().map(str::to_string))
}

/// Canned conversational category for an utterance, if any.
fn canned_category(text: &str) -> Option<ResponseCategory> {
    let text = text.trim().to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();

    const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "yo", "howdy"];
    if words.iter().any(|w| GREETING_WORDS.contains(w)) || text.starts_with("good morning")
        || text.starts_with("good afternoon") || text.starts_with("good evening")
    {
        return Some(ResponseCategory::Greeting);
    }
    if text.contains("bye") || text.contains("see ya") {
        return Some(ResponseCategory::Goodbye);
    }
    if text.contains("thank") {
        return Some(ResponseCategory::Thanks);
    }
    if text.contains("what can you do") || text.contains("capabilities") {
        return Some(ResponseCategory::Capabilities);
    }
    if text.contains("who are you") || text.contains("what are you") {
        return Some(ResponseCategory::Identity);
    }
    if text.contains("how are you") {
        return Some(ResponseCategory::Status);
    }
    None
}
