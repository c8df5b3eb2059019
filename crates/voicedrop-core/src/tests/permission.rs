#![allow(clippy::unwrap_used)]

use crate::{
    ConsentGate, PermissionGate, PermissionState, tests::support::CountingPrompt,
};

use std::{sync::Arc, time::Duration};

/// WHAT: A fresh gate reports Unknown without prompting
/// WHY: query() must be free of side effects
#[test]
fn given_fresh_gate_when_querying_then_unknown_and_no_prompt() {
    // Given: A gate with no decision
    let prompt = Arc::new(CountingPrompt::answering(true));
    let gate = ConsentGate::new(prompt.clone());

    // When: Querying
    let state = gate.query();

    // Then: Unknown, prompt never shown
    assert_eq!(state, PermissionState::Unknown);
    assert_eq!(prompt.asked(), 0);
}

/// WHAT: A granted decision is never re-prompted
/// WHY: The consent dialog must appear at most once
#[tokio::test]
async fn given_granted_when_requesting_twice_then_prompted_once() {
    // Given: A gate whose user allows recording
    let prompt = Arc::new(CountingPrompt::answering(true));
    let gate = ConsentGate::new(prompt.clone());

    // When: Requesting twice
    let first = gate.request().await;
    let second = gate.request().await;

    // Then: Both Granted, one prompt
    assert_eq!(first, PermissionState::Granted);
    assert_eq!(second, PermissionState::Granted);
    assert_eq!(prompt.asked(), 1);
    assert_eq!(gate.query(), PermissionState::Granted);
}

/// WHAT: A refusal is terminal
/// WHY: Denied can only be changed outside the app
#[tokio::test]
async fn given_refusal_when_requesting_again_then_denied_without_prompt() {
    // Given: A user who refuses
    let prompt = Arc::new(CountingPrompt::answering(false));
    let gate = ConsentGate::new(prompt.clone());
    assert_eq!(gate.request().await, PermissionState::Denied);

    // When: Requesting again
    let again = gate.request().await;

    // Then: Still Denied, no second prompt
    assert_eq!(again, PermissionState::Denied);
    assert_eq!(prompt.asked(), 1);
}

/// WHAT: A persisted decision short-circuits request()
/// WHY: Restarting the app must not ask again
#[tokio::test]
async fn given_persisted_denial_when_requesting_then_no_prompt() {
    // Given: A gate seeded with Denied
    let prompt = Arc::new(CountingPrompt::answering(true));
    let gate = ConsentGate::with_decision(prompt.clone(), PermissionState::Denied);

    // When: Requesting
    let state = gate.request().await;

    // Then: Denied returned immediately
    assert_eq!(state, PermissionState::Denied);
    assert_eq!(prompt.asked(), 0);
}

/// WHAT: Concurrent requests share a single prompt
/// WHY: Two startup paths racing must not show two dialogs
#[tokio::test]
async fn given_unknown_when_requesting_concurrently_then_prompted_once() {
    // Given: A slow user and an undecided gate
    let prompt = Arc::new(CountingPrompt::slow(true, Duration::from_millis(50)));
    let gate = ConsentGate::new(prompt.clone());

    // When: Two requests race
    let (a, b) = tokio::join!(gate.request(), gate.request());

    // Then: Both see the same answer from one prompt
    assert_eq!(a, PermissionState::Granted);
    assert_eq!(b, PermissionState::Granted);
    assert_eq!(prompt.asked(), 1);
}
