mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use common::{HangingTransport, Recording, StubTransport, runtime_with};
use dreamweb_ir::{HandlerId, Node, Tag};
use dreamweb_scene::{ApiClient, FetchOptions, FetchOutcome, Notification, ResponseData};
use serde_json::json;

const WAIT: Duration = Duration::from_secs(5);

type Log = Rc<RefCell<Vec<String>>>;

fn logged(api_options: FetchOptions, log: &Log) -> FetchOptions {
    let (a, b, c) = (log.clone(), log.clone(), log.clone());
    api_options
        .on_loading(move |loading| a.borrow_mut().push(format!("loading:{loading}")))
        .on_success(move |data| b.borrow_mut().push(format!("success:{data:?}")))
        .on_error(move |err| c.borrow_mut().push(format!("error:{}", err.message)))
}

#[test]
fn not_found_reports_status_after_loading_ends() {
    let transport = StubTransport::new(404, "Not Found", "text/html", "<h1>missing</h1>");
    let mut api = ApiClient::new(transport, None);
    let log: Log = Rc::default();

    api.fetch(logged(FetchOptions::new("http://127.0.0.1:8000/missing"), &log));
    assert_eq!(log.borrow().as_slice(), ["loading:true"]);

    let outcomes = api.wait(WAIT);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].is_success());

    let log = log.borrow();
    assert_eq!(log.len(), 3);
    assert_eq!(log[1], "loading:false");
    assert!(log[2].starts_with("error:"));
    assert!(log[2].contains("404"));
}

#[test]
fn get_never_carries_a_body() {
    let transport = StubTransport::ok_json(r#"{"items":[]}"#);
    let mut api = ApiClient::new(transport.clone(), None);

    api.fetch(FetchOptions::new("http://127.0.0.1:8000/items").body(json!({"ignored": true})));
    let outcomes = api.wait(WAIT);

    let requests = transport.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].body, None);
    assert!(outcomes[0].is_success());
}

#[test]
fn post_sends_json_body_and_delivers_parsed_json() {
    let transport = StubTransport::ok_json(r#"{"id":7}"#);
    let mut api = ApiClient::new(transport.clone(), None);
    let log: Log = Rc::default();

    api.post(
        "http://127.0.0.1:8000/items",
        json!({"name": "x"}),
        logged(FetchOptions::new(""), &log),
    );
    api.wait(WAIT);

    let requests = transport.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"name":"x"}"#));
    assert_eq!(
        requests[0].header("content-type"),
        Some("application/json")
    );
    assert_eq!(
        log.borrow().last().map(String::as_str),
        Some(format!("success:{:?}", ResponseData::Json(json!({"id": 7}))).as_str())
    );
}

#[test]
fn cancelled_call_settles_with_abort_error() {
    let mut api = ApiClient::new(Arc::new(HangingTransport), None);
    let log: Log = Rc::default();

    let id = api.fetch(logged(FetchOptions::new("http://127.0.0.1:8000/slow"), &log));
    assert!(api.is_in_flight(id));
    assert!(api.cancel(id));
    assert!(!api.is_in_flight(id));
    assert!(!api.cancel(id));

    let outcomes = api.poll();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].request_id(), id);
    assert_eq!(
        log.borrow().as_slice(),
        ["loading:true", "loading:false", "error:The operation was aborted."]
    );

    // Nothing arrives later for the aborted call.
    assert!(api.wait(Duration::from_millis(100)).is_empty());
    assert!(!api.has_pending());
}

#[test]
fn cancel_all_aborts_every_call_in_flight() {
    let mut api = ApiClient::new(Arc::new(HangingTransport), None);
    let first_log: Log = Rc::default();
    let second_log: Log = Rc::default();

    let first = api.fetch(logged(FetchOptions::new("http://127.0.0.1:8000/a"), &first_log));
    let second = api.fetch(logged(FetchOptions::new("http://127.0.0.1:8000/b"), &second_log));
    assert_eq!(api.in_flight_count(), 2);

    api.cancel_all();
    assert_eq!(api.in_flight_count(), 0);

    let outcomes = api.poll();
    let ids: Vec<_> = outcomes.iter().map(|o| o.request_id()).collect();
    assert_eq!(ids, vec![first, second]);
    for outcome in &outcomes {
        match outcome {
            FetchOutcome::Failure { error, .. } => assert_eq!(error.name, "AbortError"),
            other => panic!("expected an abort, got {other:?}"),
        }
    }
    for log in [&first_log, &second_log] {
        assert_eq!(
            log.borrow().as_slice(),
            ["loading:true", "loading:false", "error:The operation was aborted."]
        );
    }

    assert!(!api.has_pending());
    assert!(api.wait(Duration::from_millis(100)).is_empty());
}

#[test]
fn put_and_patch_send_their_method_and_body() {
    let transport = StubTransport::ok_json("{}");
    let mut api = ApiClient::new(transport.clone(), None);

    api.put("http://127.0.0.1:8000/items/1", json!({"name": "y"}), FetchOptions::new(""));
    api.patch("http://127.0.0.1:8000/items/1", json!("raw text"), FetchOptions::new(""));
    let outcomes = api.wait(WAIT);
    assert_eq!(outcomes.len(), 2);

    let mut requests = transport.requests();
    requests.sort_by(|a, b| a.method.cmp(&b.method));
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].body.as_deref(), Some("raw text"));
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].body.as_deref(), Some(r#"{"name":"y"}"#));
    assert!(requests.iter().all(|r| r.url == "http://127.0.0.1:8000/items/1"));
}

#[test]
fn request_ids_increase_per_client() {
    let transport = StubTransport::ok_json("{}");
    let mut api = ApiClient::new(transport, None);
    let first = api.get("http://127.0.0.1:8000/a", FetchOptions::new(""));
    let second = api.delete("http://127.0.0.1:8000/b", FetchOptions::new(""));
    assert_eq!((first, second), (1, 2));
    api.wait(WAIT);
}

#[test]
fn widget_node_publishes_tagged_notifications() -> Result<()> {
    let transport = StubTransport::ok_json(r#"{"count":3}"#);
    let mut runtime = runtime_with(transport.clone(), Recording::open());

    let mut node = Node::new(Tag::ApiRequest)
        .with_prop("url", "http://127.0.0.1:8000/api/counter")
        .with_prop("method", "post")
        .with_prop("headers", json!({"X-Token": "abc"}))
        .with_prop("body", json!({"step": 1}));
    node.callbacks.on_success = Some(HandlerId::from(11u64));
    node.callbacks.on_loading = Some(HandlerId::from("loading_12"));

    let top = runtime.render(node)?;
    let doc = runtime.document();
    assert_eq!(doc.style(top, "display"), Some("none"));
    assert_eq!(doc.attribute(top, "data-widget-type"), Some("ApiRequest"));
    assert_eq!(doc.attribute(top, "data-url"), Some("http://127.0.0.1:8000/api/counter"));

    let completed = runtime.api_mut().wait(WAIT);
    assert_eq!(completed.len(), 1);

    let notifications = runtime.notifications();
    assert_eq!(notifications.len(), 3);
    assert!(matches!(
        &notifications[0],
        Notification::ApiLoading { is_loading: true, callback_id, .. } if *callback_id == HandlerId::from("loading_12")
    ));
    assert!(matches!(&notifications[1], Notification::ApiLoading { is_loading: false, .. }));
    match &notifications[2] {
        Notification::ApiSuccess { url, callback_id, data } => {
            assert_eq!(url, "http://127.0.0.1:8000/api/counter");
            assert_eq!(*callback_id, HandlerId::from(11u64));
            assert_eq!(*data, ResponseData::Json(json!({"count": 3})));
        }
        other => panic!("unexpected notification {other:?}"),
    }

    let requests = transport.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].header("x-token"), Some("abc"));
    assert_eq!(requests[0].body.as_deref(), Some(r#"{"step":1}"#));
    Ok(())
}

#[test]
fn widget_without_auto_fetch_stays_idle() -> Result<()> {
    let transport = StubTransport::ok_json("{}");
    let mut runtime = runtime_with(transport.clone(), Recording::open());

    let node = Node::new(Tag::FetchData)
        .with_prop("url", "http://127.0.0.1:8000/x")
        .with_prop("auto_fetch", false);
    runtime.render(node)?;

    let report = runtime.pump(Instant::now())?;
    assert!(report.completed.is_empty());
    assert!(!runtime.api().has_pending());
    assert!(transport.requests().is_empty());
    assert!(runtime.notifications().is_empty());
    Ok(())
}

#[test]
fn widget_errors_reach_the_bus() -> Result<()> {
    let transport = StubTransport::new(500, "Internal Server Error", "text/plain", "boom");
    let mut runtime = runtime_with(transport, Recording::open());

    let mut node = Node::new(Tag::FetchData).with_prop("url", "http://127.0.0.1:8000/fail");
    node.callbacks.on_error = Some(HandlerId::from(5u64));
    runtime.render(node)?;
    runtime.api_mut().wait(WAIT);

    let notifications = runtime.notifications();
    assert_eq!(notifications.len(), 1);
    match &notifications[0] {
        Notification::ApiError { error, .. } => {
            assert_eq!(error.status, Some(500));
            assert_eq!(error.message, "HTTP 500: Internal Server Error");
        }
        other => panic!("unexpected notification {other:?}"),
    }
    Ok(())
}
