//! End-to-end resolution tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use almanac::{
    CalendarEntry, ChooseOutcome, Config, EventIntent, EventResolver, EventStore,
    MemoryEventStore, ResolutionSession, ResolveOutcome, SessionState,
};

/// Tuesday 2026-03-10, 08:00 UTC.
fn reference() -> DateTime<Utc> {
    crate::init_tracing();
    Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
}

fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn entry(id: &str, title: &str, day: u32, hour: u32) -> CalendarEntry {
    CalendarEntry::with_id(id, title, utc(day, hour, 0), utc(day, hour + 1, 0))
}

fn resolver(entries: Vec<CalendarEntry>) -> EventResolver {
    let store = Arc::new(MemoryEventStore::with_entries(entries));
    EventResolver::with_reference(store, None, Config::default(), reference())
}

#[tokio::test]
async fn test_tomorrow_afternoon_meeting_ranks_project_sync_first() {
    let resolver = resolver(vec![
        entry("sync", "Project Sync", 11, 14),
        entry("dentist", "Dentist", 13, 9),
    ]);

    let intent = EventIntent::from_json(
        r#"{
            "action": "DELETE",
            "locators": {
                "time_window": {
                    "start": "2026-03-11T13:00:00Z",
                    "end": "2026-03-11T18:00:00Z"
                },
                "title_hints": ["meeting"]
            }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(
            &mut session,
            "tomorrow afternoon's meeting, move it to 3pm",
            Some(&intent),
        )
        .await
        .unwrap();

    match outcome {
        ResolveOutcome::Presented(cards) => {
            assert_eq!(cards[0].title, "Project Sync");
            assert_eq!(cards[0].no, 1);
        }
        other => panic!("expected presented candidates, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_auto_applies_single_definite_candidate() {
    let store = Arc::new(MemoryEventStore::with_entries(vec![
        entry("sync", "Project Sync", 11, 14),
        entry("dentist", "Dentist", 13, 9),
    ]));
    let resolver =
        EventResolver::with_reference(store.clone(), None, Config::default(), reference());

    let intent = EventIntent::from_json(
        r#"{
            "action": "UPDATE",
            "locators": {
                "time_window": {
                    "start": "2026-03-11T13:00:00Z",
                    "end": "2026-03-11T18:00:00Z"
                },
                "title_hints": ["meeting"]
            },
            "changes": { "start": "2026-03-11T15:00:00Z" }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(
            &mut session,
            "tomorrow afternoon's meeting, move it to 3pm",
            Some(&intent),
        )
        .await
        .unwrap();

    match outcome {
        ResolveOutcome::AutoApplied(result) => {
            assert_eq!(result.id, "sync");
            assert_eq!(result.start, utc(11, 15, 0));
            // Original one-hour duration preserved.
            assert_eq!(result.end, utc(11, 16, 0));
        }
        other => panic!("expected auto-applied update, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Applied);

    let stored = store.get_by_id("sync").await.unwrap().unwrap();
    assert_eq!(stored.start, utc(11, 15, 0));
}

#[tokio::test]
async fn test_delete_never_auto_applies() {
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
            "locators": { "title_hints": ["meeting"] }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(&mut session, "get rid of tomorrow's sync", Some(&intent))
        .await
        .unwrap();

    // Even a single definite candidate is only presented for confirmation.
    assert!(matches!(outcome, ResolveOutcome::Presented(_)));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_numeric_choice_resolves_against_presented_list() {
    let resolver = resolver(vec![
        entry("standup", "Team Standup", 11, 9),
        entry("retro", "Team Retro", 11, 15),
    ]);

    let mut session = ResolutionSession::new();
    let utterance = "cancel tomorrow's team thing";
    let outcome = resolver
        .resolve(&mut session, utterance, None)
        .await
        .unwrap();
    let cards = match outcome {
        ResolveOutcome::Presented(cards) => cards,
        other => panic!("expected presented candidates, got {other:?}"),
    };
    assert_eq!(cards.len(), 2);

    let chosen = resolver
        .choose(&mut session, utterance, 2, None)
        .await
        .unwrap();
    match chosen {
        ChooseOutcome::Selected(candidate) => {
            assert_eq!(candidate.entry.title, cards[1].title);
        }
        other => panic!("expected selection, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::SelectionMade);
}

#[tokio::test]
async fn test_out_of_range_choice_presents_fresh_list() {
    let resolver = resolver(vec![entry("standup", "Team Standup", 11, 9)]);

    let mut session = ResolutionSession::new();
    let utterance = "cancel tomorrow's standup";
    resolver
        .resolve(&mut session, utterance, None)
        .await
        .unwrap();

    let chosen = resolver
        .choose(&mut session, utterance, 9, None)
        .await
        .unwrap();
    match chosen {
        ChooseOutcome::Presented(cards) => assert_eq!(cards.len(), 1),
        other => panic!("expected fresh presentation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_new_turn_invalidates_cached_choice() {
    let resolver = resolver(vec![
        entry("standup", "Team Standup", 11, 9),
        entry("retro", "Team Retro", 11, 15),
    ]);

    let mut session = ResolutionSession::new();
    resolver
        .resolve(&mut session, "cancel tomorrow's team thing", None)
        .await
        .unwrap();

    // The next turn resolves a different utterance; the old cache must not
    // leak into it.
    resolver
        .resolve(&mut session, "move tomorrow's retro", None)
        .await
        .unwrap();
    assert!(session.recall("cancel tomorrow's team thing").is_none());
}

#[tokio::test]
async fn test_empty_pool_reports_no_match() {
    let resolver = resolver(vec![]);

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(&mut session, "delete tomorrow's review", None)
        .await
        .unwrap();

    assert!(matches!(outcome, ResolveOutcome::NoMatch));
    assert_eq!(session.state(), SessionState::NoMatch);
}

#[tokio::test]
async fn test_presented_list_bounded_by_top_k() {
    let entries: Vec<CalendarEntry> = (0..20)
        .map(|i| entry(&format!("m{i}"), "Planning Meeting", 11, 9 + (i % 8) as u32))
        .collect();
    let resolver = resolver(entries);

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(&mut session, "tomorrow's planning meeting", None)
        .await
        .unwrap();

    match outcome {
        ResolveOutcome::Presented(cards) => {
            assert_eq!(cards.len(), 3);
            let numbers: Vec<usize> = cards.iter().map(|c| c.no).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
        }
        other => panic!("expected presented candidates, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_locators_fall_back_to_utterance_path() {
    let resolver = resolver(vec![entry("sync", "Project Sync", 11, 14)]);

    // Window and instant are both garbage; the utterance still pins the
    // right day and period.
    let intent = EventIntent::from_json(
        r#"{
            "action": "DELETE",
            "locators": {
                "time_window": {"start": "??", "end": "??"},
                "time_iso": 12345
            }
        }"#,
    )
    .unwrap();

    let mut session = ResolutionSession::new();
    let outcome = resolver
        .resolve(
            &mut session,
            "tomorrow afternoon's sync",
            Some(&intent),
        )
        .await
        .unwrap();

    match outcome {
        ResolveOutcome::Presented(cards) => assert_eq!(cards[0].title, "Project Sync"),
        other => panic!("expected presented candidates, got {other:?}"),
    }
}
