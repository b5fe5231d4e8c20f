//! End-to-end properties of the decision pipeline.
//!
//! Drives `SentinelCore::process` with a scripted resolver standing in for
//! the remote tier. The resolver here is deliberately hostile: it proposes
//! side-effecting steps for everything, so these tests also prove the
//! post-validation filter holds.

use async_trait::async_trait;
use sentinel_common::plan::{reason, ActionKind, ActionStep, Intent, Plan};
use sentinel_common::{personality, SentinelConfig};
use sentineld::core::SentinelCore;
use sentineld::guard::ActionGuard;
use sentineld::resolver::IntentResolver;
use std::time::{Duration, Instant};

/// A misbehaving resolver: answers every request with an action plan, even
/// chit-chat. The sanitize layer must keep it honest.
struct HostileResolver;

#[async_trait]
impl IntentResolver for HostileResolver {
    async fn resolve(&self, _text: &str) -> Plan {
        Plan::new(vec![
            ActionStep::LaunchApp("notepad".to_string()),
            ActionStep::Chat("Doing it now!".to_string()),
        ])
    }
}

fn core() -> SentinelCore<HostileResolver> {
    SentinelCore::new(&SentinelConfig::default(), HostileResolver)
}

// Totality: every input produces a well-formed decision, none panics.
#[tokio::test]
async fn totality_over_arbitrary_inputs() {
    let mut core = core();
    let inputs = [
        "".to_string(),
        "   ".to_string(),
        "!!!???...".to_string(),
        "a".repeat(100_000),
        "open ".repeat(500),
        "\u{202e}dlrow olleh".to_string(),
        "play\nnewline\ttitle".to_string(),
    ];

    for input in inputs {
        let decision = core.process(&input).await;
        // A response, a plan, or both. Never a silent no-op.
        assert!(
            decision.response.is_some() || !decision.plan.is_empty(),
            "silent decision for {:?}",
            &input[..input.len().min(40)]
        );
    }
}

// Question-safety: question-shaped input never yields side-effecting steps,
// even when the resolver proposes them.
#[tokio::test]
async fn questions_never_execute_actions() {
    let mut core = core();
    let questions = [
        "what happens if i open notepad",
        "can you open the browser",
        "how do i take a screenshot",
        "should i restart my computer",
        "explain what shutdown does",
    ];

    for question in questions {
        let decision = core.process(question).await;
        assert!(
            decision.plan.speech_only(),
            "side-effecting step for question {:?}: {:?}",
            question,
            decision.plan
        );
    }
}

// No-guess: unknown open targets produce an empty plan and a request for
// the exact address.
#[tokio::test]
async fn unknown_sites_are_asked_about_never_guessed() {
    let mut core = core();
    let decision = core.process("open qwxzzkj").await;

    assert_eq!(decision.intent, Intent::OpenWebsite);
    assert!(decision.blocked);
    assert_eq!(decision.reason, reason::UNKNOWN_DOMAIN);
    assert!(decision.plan.is_empty());
    let response = decision.response.unwrap();
    assert!(
        personality::options(personality::ResponseCategory::UnknownSite)
            .contains(&response.as_str())
    );
}

// Duplicate suppression, both flavors: session context catches repeated
// website opens, the guard catches context-free repeats and escalates to a
// global block.
#[tokio::test]
async fn duplicate_suppression_and_global_block() {
    let mut core = core();

    let first = core.process("open youtube").await;
    assert!(!first.blocked);
    let second = core.process("open youtube").await;
    assert!(second.blocked);
    assert_eq!(second.reason, reason::ALREADY_OPEN);

    // Screenshot has no session-context entry, so the guard does the work.
    let shot = core.process("take a screenshot").await;
    assert!(!shot.blocked);
    let repeat = core.process("take a screenshot").await;
    assert!(repeat.blocked);
    assert_eq!(repeat.reason, reason::DUPLICATE_ACTION);

    // Second near-duplicate breaches max_repeats and trips the block.
    let breach = core.process("take a screenshot").await;
    assert!(breach.blocked);
    assert_eq!(breach.reason, reason::DUPLICATE_ACTION);

    // Now everything is refused, unrelated actions included.
    let unrelated = core.process("play some jazz").await;
    assert!(unrelated.blocked);
    assert_eq!(unrelated.reason, reason::SYSTEM_PAUSED);
}

// Guard decay: once the cooldown passes the key is allowed again and its
// repeat counter has come back down.
#[test]
fn guard_counter_decays_after_cooldown() {
    let mut guard = ActionGuard::new(SentinelConfig::default().guard);
    let t0 = Instant::now();

    guard.record_at(t0, ActionKind::OpenUrl, "youtube");
    assert!(guard
        .can_execute_at(t0 + Duration::from_secs(2), ActionKind::OpenUrl, "youtube")
        .is_err());
    assert_eq!(guard.repeat_count(ActionKind::OpenUrl, "youtube"), 1);

    let later = t0 + Duration::from_secs(6);
    assert!(guard
        .can_execute_at(later, ActionKind::OpenUrl, "youtube")
        .is_ok());
    guard.record_at(later, ActionKind::OpenUrl, "youtube");
    assert_eq!(guard.repeat_count(ActionKind::OpenUrl, "youtube"), 0);
}

// Stop resets everything: ledger, counters and block.
#[tokio::test]
async fn stop_clears_blocks_and_allows_again() {
    let mut core = core();

    // Trip the global block with repeated screenshots.
    let _ = core.process("take a screenshot").await;
    let _ = core.process("take a screenshot").await;
    let _ = core.process("take a screenshot").await;
    let paused = core.process("play some jazz").await;
    assert_eq!(paused.reason, reason::SYSTEM_PAUSED);

    let stop = core.process("stop").await;
    assert_eq!(stop.intent, Intent::StopCommand);
    assert!(!stop.blocked);
    assert!(stop.response.unwrap().contains("Stopped"));

    let after = core.process("open youtube").await;
    assert!(!after.blocked, "stop must clear the guard");
    assert_eq!(after.plan.steps[0].kind(), ActionKind::OpenUrl);
}

// Risky confirmation gate: destructive commands never reach the plan
// without an explicit confirm phrase.
#[tokio::test]
async fn risky_commands_require_confirmation() {
    let mut core = core();

    for command in ["shutdown", "restart now"] {
        let decision = core.process(command).await;
        assert!(decision.blocked);
        assert_eq!(decision.reason, reason::NEEDS_CONFIRMATION);
        assert!(decision.plan.is_empty());
        assert!(decision
            .response
            .unwrap()
            .contains(&format!("confirm {}", command)));
    }

    // Bare "delete" is not a recognized command either; it must come back
    // blocked, whatever the reason.
    let decision = core.process("delete").await;
    assert!(decision.blocked);
    assert!(decision.plan.is_empty());

    // The confirm phrase executes exactly the named command.
    let confirmed = core.process("confirm shutdown").await;
    assert!(!confirmed.blocked);
    assert_eq!(
        confirmed.plan.steps[0],
        ActionStep::Shortcut("shutdown".to_string())
    );
}

// Scenario: a greeting gets a canned phrase and a speech-only plan.
#[tokio::test]
async fn scenario_greeting() {
    let mut core = core();
    let decision = core.process("hello").await;

    assert_eq!(decision.intent, Intent::Conversational);
    assert!(!decision.blocked);
    assert_eq!(decision.plan.steps.len(), 1);
    assert!(decision.plan.speech_only());
    let response = decision.response.unwrap();
    assert!(
        personality::options(personality::ResponseCategory::Greeting).contains(&response.as_str())
    );
}

// Scenario: a known site opens with its canonical URL and a confirmation;
// the immediate repeat is refused as already open.
#[tokio::test]
async fn scenario_known_site_roundtrip() {
    let mut core = core();
    let decision = core.process("open olx").await;

    assert_eq!(decision.intent, Intent::OpenWebsite);
    assert!(!decision.blocked);
    assert_eq!(
        decision.plan.steps[0],
        ActionStep::OpenUrl("https://www.olx.com.pk".to_string())
    );
    assert_eq!(
        decision.plan.steps[1],
        ActionStep::Speak("Opening olx.".to_string())
    );

    let again = core.process("open olx").await;
    assert!(again.blocked);
    assert_eq!(again.reason, reason::ALREADY_OPEN);
}

// Scenario: "play" with no title never reaches the media action.
#[tokio::test]
async fn scenario_play_without_a_song() {
    let mut core = core();
    let decision = core.process("play").await;

    assert!(decision.blocked);
    assert!(decision.plan.is_empty());
    assert!(decision.response.is_some());
}

// Scenario: multi-step text goes through the resolver tier, and its plan is
// kept because the input is a genuine action request.
#[tokio::test]
async fn multi_step_requests_reach_the_resolver() {
    let mut core = core();
    let decision = core.process("dim the lights and then cue the music").await;

    assert_eq!(decision.intent, Intent::MultiStep);
    assert!(!decision.blocked);
    // HostileResolver's plan survives untouched for non-conversational text.
    assert_eq!(decision.plan.steps.len(), 2);
    assert_eq!(decision.plan.steps[0].kind(), ActionKind::LaunchApp);
}
