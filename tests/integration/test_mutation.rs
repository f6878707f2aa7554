//! Choose-then-apply flows through the resolution engine.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use almanac::{
    ApplyOutcome, CalendarEntry, ChooseOutcome, Config, EventIntent, EventResolver, EventStore,
    MemoryEventStore, ResolutionSession, ResolveOutcome, SessionState,
};

fn reference() -> DateTime<Utc> {
    crate::init_tracing();
    Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
}

fn utc(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap()
}

fn entry(id: &str, title: &str, day: u32, hour: u32) -> CalendarEntry {
    CalendarEntry::with_id(id, title, utc(day, hour), utc(day, hour + 1))
}

async fn choose_first(
    resolver: &EventResolver,
    session: &mut ResolutionSession,
    utterance: &str,
    intent: &EventIntent,
) -> almanac::Candidate {
    let outcome = resolver
        .resolve(session, utterance, Some(intent))
        .await
        .unwrap();
    assert!(matches!(outcome, ResolveOutcome::Presented(_)));

    match resolver
        .choose(session, utterance, 1, Some(intent))
        .await
        .unwrap()
    {
        ChooseOutcome::Selected(candidate) => *candidate,
        other => panic!("expected selection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_choose_then_apply_update() {
    let store = Arc::new(MemoryEventStore::with_entries(vec![
        entry("sync", "Project Sync", 11, 14),
        entry("review", "Design Review", 11, 16),
    ]));
    let resolver =
        EventResolver::with_reference(store.clone(), None, Config::default(), reference());

    let intent = EventIntent::from_json(
        r#"{
            "action": "UPDATE",
            "locators": { "title_hints": ["sync"] },
            "changes": { "location": "Room 12" }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let utterance = "move tomorrow's sync to room 12";
    let candidate = choose_first(&resolver, &mut session, utterance, &intent).await;
    assert_eq!(candidate.entry.id, "sync");

    let outcome = resolver
        .apply(&mut session, &intent, &candidate)
        .await
        .unwrap();
    match outcome {
        ApplyOutcome::Applied(result) => assert_eq!(result.id, "sync"),
        other => panic!("expected applied mutation, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Applied);

    let stored = store.get_by_id("sync").await.unwrap().unwrap();
    assert_eq!(stored.location.as_deref(), Some("Room 12"));
    // Untouched fields survive the update.
    assert_eq!(stored.start, utc(11, 14));
}

#[tokio::test]
async fn test_update_without_changes_fails_cleanly() {
    let store = Arc::new(MemoryEventStore::with_entries(vec![entry(
        "sync",
        "Project Sync",
        11,
        14,
    )]));
    let resolver =
        EventResolver::with_reference(store.clone(), None, Config::default(), reference());

    let intent = EventIntent::from_json(
        r#"{
            "action": "UPDATE",
            "locators": { "title_hints": ["sync"] }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let utterance = "change tomorrow's sync";
    let candidate = choose_first(&resolver, &mut session, utterance, &intent).await;

    let outcome = resolver
        .apply(&mut session, &intent, &candidate)
        .await
        .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Failed(_)));
    assert_eq!(session.state(), SessionState::ApplyFailed);

    // The store is untouched.
    let stored = store.get_by_id("sync").await.unwrap().unwrap();
    assert_eq!(stored.start, utc(11, 14));
}

#[tokio::test]
async fn test_repeated_delete_apply_stays_successful() {
    let store = Arc::new(MemoryEventStore::with_entries(vec![entry(
        "sync",
        "Project Sync",
        11,
        14,
    )]));
    let resolver =
        EventResolver::with_reference(store.clone(), None, Config::default(), reference());

    let intent = EventIntent::from_json(
        r#"{
            "action": "DELETE",
            "locators": { "title_hints": ["sync"] }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let utterance = "cancel tomorrow's sync";
    let candidate = choose_first(&resolver, &mut session, utterance, &intent).await;

    let first = resolver
        .apply(&mut session, &intent, &candidate)
        .await
        .unwrap();
    assert!(matches!(first, ApplyOutcome::Applied(_)));
    assert!(store.is_empty().await);

    // A retried confirmation replays the cached success.
    let second = resolver
        .apply(&mut session, &intent, &candidate)
        .await
        .unwrap();
    match second {
        ApplyOutcome::Applied(result) => assert_eq!(result.id, "sync"),
        other => panic!("expected cached delete success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_scope_delete_removes_one_occurrence() {
    let store = Arc::new(MemoryEventStore::with_entries(vec![
        entry("standup", "Team Standup", 11, 9),
        entry("standup", "Team Standup", 12, 9),
        entry("standup", "Team Standup", 13, 9),
    ]));
    let resolver =
        EventResolver::with_reference(store.clone(), None, Config::default(), reference());

    let intent = EventIntent::from_json(
        r#"{
            "action": "DELETE",
            "locators": {
                "title_hints": ["standup"],
                "scope_hint": "single"
            }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let utterance = "skip tomorrow's standup";
    let candidate = choose_first(&resolver, &mut session, utterance, &intent).await;
    assert_eq!(candidate.entry.start, utc(11, 9));

    let outcome = resolver
        .apply(&mut session, &intent, &candidate)
        .await
        .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Applied(_)));

    // The rest of the series survives.
    assert_eq!(store.len().await, 2);
    assert!(store.get_by_id("standup").await.unwrap().is_some());
}
