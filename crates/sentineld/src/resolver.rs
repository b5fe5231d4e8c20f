//! Remote intent resolver.
//!
//! Fallback tier for text the fast path cannot handle: the utterance goes to
//! a hosted language model with a fixed operator instruction and comes back
//! as a structured plan. The trait is total — transport and parse failures
//! degrade to a single apologetic chat step, never an error to the caller.
//!
//! Whatever the model returns is re-checked here: a conversational utterance
//! must never come back with side-effecting steps, model compliance or not.

use async_trait::async_trait;
use sentinel_common::plan::Plan;
use sentinel_common::LlmConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier;

/// Operator instruction sent with every resolver request. Describes the
/// step vocabulary and the rules the model must follow.
const SYSTEM_PROMPT: &str = r#"You are Sentinel, a precise desktop operator.
You do not guess. You translate the user's request into a JSON plan of actions.

Respond with exactly one JSON object: {"plan": [{"action": "...", "payload": "..."}, ...]}

Actions:
- "LAUNCH_APP": launch a native app. Payload: the launch target ("calc", "notepad", "explorer").
- "OPEN_URL": open a website. Payload: the full URL. Never invent a URL; if unsure, ask via CHAT.
- "PLAY_MEDIA": play music or video. Payload: the exact title only, with "play"/"on youtube" removed. If the title is unclear or shorter than 2 characters, respond with CHAT asking for the title instead.
- "TYPE_TEXT": type text into the active window. Payload: the exact text, verbatim.
- "PRESS_KEYS": press a key or combination. Payload: "enter", "ctrl+c", "win".
- "SCREENSHOT": capture the screen. Payload: a filename hint, may be empty.
- "SYSTEM_CHECK": report hardware status. Payload: empty string.
- "FILE_OP": create or delete a file/folder. Payload: {"operation": "CREATE"|"DELETE", "path": "..."}.
- "SHORTCUT": a named desktop shortcut ("show desktop", "lock", "new tab").
- "DOWNLOAD_WEB": download an app installer via the browser. Payload: the app name.
- "SPEAK": say something to the user. Payload: the sentence.
- "CHAT": a conversational reply or clarification question. Payload: the sentence.

Rules:
- Keep plans short. Most requests need one action plus one SPEAK confirmation.
- If the request is a question or chit-chat, the plan must contain only SPEAK or CHAT steps.
- If anything is ambiguous, ask via CHAT instead of acting.
JSON only."#;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Resolver is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Malformed resolver output: {0}")]
    Malformed(String),
}

/// The remote fallback: turns unmatched text into a structured plan.
/// Implementations must be total — on any failure they return a plan that
/// apologizes rather than raising.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    async fn resolve(&self, text: &str) -> Plan;
}

/// Plan that apologizes for a resolver failure.
pub fn apology_plan() -> Plan {
    Plan::chat("I hit a snag working that one out. Say it again?")
}

/// Plan substituted when safety filtering empties a resolver plan.
fn clarification_plan() -> Plan {
    Plan::chat("I'm not sure what you're after. Can you rephrase?")
}

/// Post-validation applied to every resolver plan, independent of model
/// compliance: conversational input keeps only speech steps. If nothing
/// survives, a clarification is substituted.
pub fn sanitize(original_text: &str, mut plan: Plan) -> Plan {
    if !classifier::is_conversational(original_text) {
        return plan;
    }
    let removed = plan.retain_speech();
    if removed > 0 {
        warn!(
            "Resolver proposed {} side-effecting step(s) for conversational input; discarded",
            removed
        );
    }
    if plan.is_empty() {
        return clarification_plan();
    }
    plan
}

/// OpenAI-style chat-completions resolver.
pub struct HttpResolver {
    config: LlmConfig,
    client: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanEnvelope {
    plan: Vec<sentinel_common::plan::ActionStep>,
}

impl HttpResolver {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!("{} not set; resolver requests will be unauthenticated", config.api_key_env);
        }
        Ok(Self { config, client, api_key })
    }

    async fn request_plan(&self, text: &str) -> Result<Plan, ResolverError> {
        if !self.config.enabled {
            return Err(ResolverError::Disabled);
        }

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": text},
            ],
            "temperature": 0.0,
            "response_format": {"type": "json_object"},
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolverError::Timeout(self.config.timeout_secs)
                } else {
                    ResolverError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ResolverError::Http(format!(
                "resolver returned {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ResolverError::Http(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ResolverError::Malformed("missing message content".to_string()))?;

        parse_plan(content)
    }
}

/// Parse the model's JSON text into a validated plan. Strict: one unknown
/// action or empty payload rejects the whole plan.
fn parse_plan(content: &str) -> Result<Plan, ResolverError> {
    let envelope: PlanEnvelope =
        serde_json::from_str(content).map_err(|e| ResolverError::Malformed(e.to_string()))?;
    let plan = Plan::new(envelope.plan);
    plan.validate()
        .map_err(|e| ResolverError::Malformed(e.to_string()))?;
    debug!("Resolver produced {} step(s)", plan.steps.len());
    Ok(plan)
}

#[async_trait]
impl IntentResolver for HttpResolver {
    async fn resolve(&self, text: &str) -> Plan {
        // Hard bound on the round trip on top of the client timeout; the
        // worker loop must never hang on this call.
        let bound = Duration::from_secs(self.config.timeout_secs.saturating_add(2));
        let outcome = tokio::time::timeout(bound, self.request_plan(text)).await;

        match outcome {
            Ok(Ok(plan)) => plan,
            Ok(Err(e)) => {
                warn!("Resolver failed: {}", e);
                apology_plan()
            }
            Err(_) => {
                warn!("Resolver exceeded {}s bound", bound.as_secs());
                apology_plan()
            }
        }
    }
}

/// Resolver used when the remote tier is switched off: always answers with
/// the same clarification, never with actions.
pub struct OfflineResolver;

#[async_trait]
impl IntentResolver for OfflineResolver {
    async fn resolve(&self, _text: &str) -> Plan {
        info!("Resolver disabled; returning canned clarification");
        clarification_plan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::plan::{ActionKind, ActionStep};

    #[test]
    fn parse_plan_accepts_the_wire_shape() {
        let content = r#"{"plan": [
            {"action": "LAUNCH_APP", "payload": "notepad"},
            {"action": "SPEAK", "payload": "Launching notepad."}
        ]}"#;
        let plan = parse_plan(content).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0], ActionStep::LaunchApp("notepad".to_string()));
    }

    #[test]
    fn parse_plan_rejects_unknown_actions() {
        let content = r#"{"plan": [{"action": "DELETE_EVERYTHING", "payload": "/"}]}"#;
        assert!(matches!(parse_plan(content), Err(ResolverError::Malformed(_))));
    }

    #[test]
    fn parse_plan_rejects_empty_plans_and_garbage() {
        assert!(parse_plan(r#"{"plan": []}"#).is_err());
        assert!(parse_plan("not json at all").is_err());
    }

    #[test]
    fn sanitize_strips_side_effects_for_questions() {
        let plan = Plan::new(vec![
            ActionStep::LaunchApp("notepad".to_string()),
            ActionStep::Chat("Opening notepad for you!".to_string()),
        ]);
        let cleaned = sanitize("what happens if i open notepad", plan);
        assert!(cleaned.speech_only());
        assert_eq!(cleaned.steps.len(), 1);
        assert_eq!(cleaned.steps[0].kind(), ActionKind::Chat);
    }

    #[test]
    fn sanitize_substitutes_clarification_when_nothing_survives() {
        let plan = Plan::new(vec![ActionStep::LaunchApp("notepad".to_string())]);
        let cleaned = sanitize("can you do things", plan);
        assert!(!cleaned.is_empty());
        assert!(cleaned.speech_only());
    }

    #[test]
    fn sanitize_leaves_action_requests_alone() {
        let plan = Plan::new(vec![ActionStep::LaunchApp("notepad".to_string())]);
        let cleaned = sanitize("open notepad", plan.clone());
        assert_eq!(cleaned, plan);
    }

    #[tokio::test]
    async fn offline_resolver_never_acts() {
        let plan = OfflineResolver.resolve("open youtube and then play jazz").await;
        assert!(plan.speech_only());
        assert!(!plan.is_empty());
    }
}
