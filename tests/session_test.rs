//! End-to-end session tests
//!
//! Drives the full stack (Navigator -> SessionStore -> HttpGateway) against
//! a wiremock backend, covering the canonical explore-then-refine scenario
//! and failure recovery.

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use hopscotch::config::{GatewayConfig, RequestConfig};
use hopscotch::gateway::{Feedback, HttpGateway};
use hopscotch::session::HopKind;
use hopscotch::{Navigator, ScrollTo, SessionStore, SummaryView};

fn result_json(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "image_url": format!("https://images.example/{title}.jpg"),
        "url": format!("https://example.com/{title}"),
    })
}

fn build_stack(base_url: &str) -> (Arc<SessionStore>, Navigator) {
    let config = GatewayConfig {
        base_url: base_url.to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 0,
        retry_delay_ms: 100,
    };
    let gateway = HttpGateway::new(&config, request_config).expect("Failed to create gateway");
    let store = Arc::new(SessionStore::new(Arc::new(gateway)));
    let navigator = Navigator::new(Arc::clone(&store));
    (store, navigator)
}

#[tokio::test]
async fn explore_then_refine_scenario() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(body_partial_json(json!({ "query": "shoes" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [result_json("r0"), result_json("r1"), result_json("r2")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/refine"))
        .and(body_partial_json(json!({
            "feedback": "similar",
            "clickedResult": result_json("r0"),
            "resultIndex": 0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [result_json("x"), result_json("y")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (store, navigator) = build_stack(&mock_server.uri());

    // Box 1 is the seeded input box; submitting against it fills it in place.
    navigator.submit_query("shoes", 1).await.unwrap();
    {
        let state = store.snapshot();
        let hop = state.hop(1).unwrap();
        assert_eq!(hop.kind, HopKind::Results);
        assert_eq!(hop.result_slice().len(), 3);
        assert_eq!(state.current(), 1);
    }

    // Similar feedback on index 0 appends box 2: r0 kept, the other two
    // slots replaced by the refine results in order.
    let scroll = navigator
        .give_feedback(Feedback::Similar, 1, 0)
        .await
        .unwrap();
    assert_eq!(scroll, Some(ScrollTo { hop_id: 2 }));

    let state = store.snapshot();
    assert_eq!(state.current(), 2);
    let refined = state.hop(2).unwrap();
    assert_eq!(refined.query.as_deref(), Some("shoes"));
    let titles: Vec<&str> = refined
        .result_slice()
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(titles, vec!["r0", "x", "y"]);

    // The similar click also became a reference point.
    assert_eq!(state.reference_points().len(), 1);
    assert_eq!(state.reference_points()[0].result.title, "r0");

    // And the session is now shareable.
    let view = SummaryView::project(&state);
    assert!(view.share_path().is_some());
    assert_eq!(view.selected().map(|h| h.id), Some(2));
}

#[tokio::test]
async fn backend_down_is_recoverable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [result_json("a"), result_json("b"), result_json("c")]
        })))
        .mount(&mock_server)
        .await;

    let (store, navigator) = build_stack(&mock_server.uri());
    let before = store.snapshot();

    // First attempt fails; the box sequence is untouched and the latch is
    // released.
    let err = navigator.submit_query("shoes", 1).await;
    assert!(err.is_err());
    let after = store.snapshot();
    assert_eq!(after.hops(), before.hops());
    assert!(!after.is_pending(1));

    // Retrying the same action succeeds.
    navigator.submit_query("shoes", 1).await.unwrap();
    assert_eq!(store.hop(1).unwrap().kind, HopKind::Results);
}

#[tokio::test]
async fn jump_back_then_new_query_appends_at_next_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [result_json("a"), result_json("b"), result_json("c")]
        })))
        .mount(&mock_server)
        .await;

    let (store, navigator) = build_stack(&mock_server.uri());

    navigator.submit_query("cats", 1).await.unwrap();
    navigator.submit_query("dogs", 2).await.unwrap();
    navigator.jump_to(1).unwrap();

    // History is preserved: a new query from box 1 lands on box 3.
    navigator.submit_query("ferrets", 3).await.unwrap();

    let state = store.snapshot();
    let ids: Vec<u32> = state.hops().iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(state.hop(2).unwrap().query.as_deref(), Some("dogs"));
    assert_eq!(state.current(), 3);
}
