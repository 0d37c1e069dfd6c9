//! Integration tests for pagination types
//!
//! Chains decoded pages through their forward cursors the way a caller
//! walks a list endpoint.

use std::collections::HashMap;

use adreach_domain::{GraphEnvelope, PageResult};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct AdSet {
    id: String,
    name: String,
}

/// Canned responses keyed by the `after` token that requests them ("" for the first)
fn pages() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            "",
            json!({
                "data": [{"id": "1", "name": "a"}, {"id": "2", "name": "b"}],
                "paging": {"cursors": {"before": "c0", "after": "c1"}, "next": "n1"}
            }),
        ),
        (
            "c1",
            json!({
                "data": [{"id": "3", "name": "c"}, {"id": "4", "name": "d"}],
                "paging": {
                    "cursors": {"before": "c1b", "after": "c2"},
                    "next": "n2",
                    "previous": "p1"
                }
            }),
        ),
        (
            "c2",
            json!({
                "data": [{"id": "5", "name": "e"}],
                "paging": {"cursors": {"before": "c2b", "after": "c3"}, "previous": "p2"}
            }),
        ),
    ])
}

#[test]
fn test_forward_cursor_chain_visits_every_record_once() {
    let responses = pages();
    let mut token: Option<String> = None;
    let mut seen = Vec::new();
    let mut fetched = 0;

    loop {
        let body = responses[token.as_deref().unwrap_or("")].clone();
        let page: PageResult<AdSet> =
            serde_json::from_value::<GraphEnvelope<AdSet>>(body).unwrap().into();
        fetched += 1;

        let next = page.next_cursor();
        seen.extend(page.into_data().into_iter().map(|a| a.id));

        match next {
            Some(cursor) => {
                let (name, value) = cursor.query_param();
                assert_eq!(name, "after");
                token = Some(value.to_string());
            }
            None => break,
        }
    }

    assert_eq!(fetched, 3);
    assert_eq!(seen, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_first_page_cannot_go_back() {
    let body = pages()[""].clone();
    let page: PageResult<AdSet> =
        serde_json::from_value::<GraphEnvelope<AdSet>>(body).unwrap().into();

    assert!(!page.has_prev);
    assert!(page.prev_cursor().is_none());
    assert_eq!(page.data[0].name, "a");
}
