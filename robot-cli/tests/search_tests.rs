//! Streaming search executor tests
//!
//! Covers:
//! - Empty result sets succeed without visiting
//! - Malformed text fails before the store is contacted
//! - A visitor stop ends the stream and becomes the result
//! - Comparing a field the domain lacks fails instead of matching nothing

use robot_cli::search::{run_search, search};
use robot_cli::{MemoryStore, Visit};
use robot_common::models::{Domain, Package, Track};
use robot_common::{compile_query, Error, Query};

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[tokio::test]
async fn test_empty_dataset_succeeds_with_zero_visits() {
    let store = MemoryStore::new();
    let mut visits = 0;
    search::<Package, _>(&store, &Query::all(), |_| {
        visits += 1;
        Visit::Continue
    })
    .await
    .unwrap();
    assert_eq!(visits, 0);
}

#[tokio::test]
async fn test_malformed_query_issues_no_rpc() {
    let store = MemoryStore::new();
    let mut out = Vec::new();

    let err = run_search(&store, Domain::Track, &words("name == == x"), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedQuery { .. }));
    assert_eq!(store.search_calls(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_visitor_stop_ends_stream() {
    let store = MemoryStore::new();
    for i in 0..5 {
        store.insert_track(Track {
            id: format!("t{}", i),
            name: "dup".to_string(),
            ..Default::default()
        });
    }

    let mut visits = 0;
    let err = search::<Track, _>(&store, &compile_query("name == \"dup\"").unwrap(), |_| {
        visits += 1;
        if visits == 2 {
            Visit::Stop(Error::Ambiguous("dup".to_string()))
        } else {
            Visit::Continue
        }
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Ambiguous(_)));
    assert_eq!(visits, 2);
}

#[tokio::test]
async fn test_visits_follow_store_order() {
    let store = MemoryStore::new();
    for id in ["t3", "t1", "t2"] {
        store.insert_track(Track {
            id: id.to_string(),
            ..Default::default()
        });
    }

    let mut seen = Vec::new();
    search::<Track, _>(&store, &Query::all(), |t| {
        seen.push(t.id);
        Visit::Continue
    })
    .await
    .unwrap();
    assert_eq!(seen, vec!["t3", "t1", "t2"]);
}

#[tokio::test]
async fn test_whitespace_query_matches_everything() {
    let store = MemoryStore::new();
    store.insert_track(Track {
        id: "t1".to_string(),
        ..Default::default()
    });

    let mut out = Vec::new();
    let count = run_search(&store, Domain::Track, &["  ".to_string()], &mut out)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(String::from_utf8(out).unwrap(), "id: \"t1\"\n");
}

#[tokio::test]
async fn test_unknown_field_fails_search() {
    let store = MemoryStore::new();
    store.insert_track(Track {
        id: "t1".to_string(),
        name: "alpha".to_string(),
        ..Default::default()
    });

    let mut out = Vec::new();
    let err = run_search(&store, Domain::Track, &words("Length > 3"), &mut out)
        .await
        .unwrap_err();

    match err {
        Error::Remote(message) => assert!(message.contains("Length"), "unexpected message {}", message),
        other => panic!("expected remote error, got {:?}", other),
    }
    assert!(out.is_empty());
}
