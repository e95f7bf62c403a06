//! End-to-end dispatch tests against real local servers.
//!
//! A small axum app stands in for the system under test; a raw TCP listener
//! covers the failure paths axum cannot produce (refused connections and
//! truncated bodies).

use std::{collections::HashSet, sync::Arc};

use axum::{
    Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use barrage::{
    Action, Dispatcher, ExtractionHandler, HttpResult, SelectionPolicy, Session, SimulationClock,
    TransportKind, VirtualUser,
    sink::{drain, result_channel},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

const ITEMS: &str = r#"{"items":["x","y","z"]}"#;
const FEED: &str = r#"<feed><entry id="10"><title>one</title></entry><entry id="20"><title>two</title></entry></feed>"#;
const STRATEGIES: [TransportKind; 2] = [TransportKind::Pooled, TransportKind::Standard];

async fn serve() -> String {
    let app = Router::new()
        .route("/items", get(|| async { ITEMS }))
        .route(
            "/feed.xml",
            get(|| async { ([(header::CONTENT_TYPE, "application/xml")], FEED) }),
        )
        .route(
            "/users/:name",
            get(|Path(name): Path<String>| async move { format!(r#"{{"name":"{name}","next":"{name}-2"}}"#) }),
        )
        .route("/echo", post(|body: String| async move { body }))
        .route(
            "/accept",
            get(|headers: HeaderMap| async move {
                headers
                    .get(header::ACCEPT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

/// Answers every request with a complete head and a body cut short.
async fn serve_truncated() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial")
                .await;
        }
    });
    format!("http://{addr}")
}

/// An address nothing listens on.
fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

fn items_action(base: &str, kind: TransportKind, policy: SelectionPolicy) -> Action {
    Action::builder()
        .title("Items")
        .url(format!("{base}/items"))
        .accept("application/json")
        .transport(kind)
        .extraction(
            ExtractionHandler::builder()
                .jsonpath("$.items[*]")
                .index(policy)
                .variable("item")
                .build(),
        )
        .build()
}

/// Dispatch once through a fresh sink and return the only record produced.
async fn dispatch_one(dispatcher: &Dispatcher, action: &Action, session: &mut Session) -> HttpResult {
    let (sink, rx) = result_channel(4);
    dispatcher.dispatch(action, session, &sink).await;
    drop(sink);

    let mut records = Vec::new();
    let total = drain(rx, 4, |batch: &[HttpResult]| records.extend_from_slice(batch)).await;
    assert_eq!(total, 1, "every dispatch emits exactly one record");
    records.remove(0)
}

#[tokio::test]
async fn success_records_true_length_and_status() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());

    for kind in STRATEGIES {
        let mut session = Session::new();
        let result = dispatch_one(
            &dispatcher,
            &items_action(&base, kind, SelectionPolicy::First),
            &mut session,
        )
        .await;

        assert_eq!(result.protocol(), "HTTP");
        assert_eq!(result.status(), 200, "{kind}");
        assert_eq!(result.content_length(), ITEMS.len(), "{kind}");
        assert_eq!(result.title(), "Items");
        assert!(result.elapsed_nanos() > 0);
        assert!(result.offset_nanos() >= result.elapsed_nanos());
        assert_eq!(session.get("item"), Some("x"), "{kind}");
    }
}

#[tokio::test]
async fn selection_policies_over_http() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());

    let mut session = Session::new();
    dispatch_one(
        &dispatcher,
        &items_action(&base, TransportKind::Pooled, SelectionPolicy::Last),
        &mut session,
    )
    .await;
    assert_eq!(session.get("item"), Some("z"));

    let random = items_action(&base, TransportKind::Pooled, SelectionPolicy::Random);
    let mut seen = HashSet::new();
    for _ in 0..200 {
        dispatch_one(&dispatcher, &random, &mut session).await;
        seen.insert(session.get("item").unwrap().to_string());
        if seen.len() == 3 {
            break;
        }
    }
    assert_eq!(seen.len(), 3, "every match is reachable, got {seen:?}");
}

#[tokio::test]
async fn refused_connection_yields_a_degraded_record_on_both_strategies() {
    let url = refused_url();
    let dispatcher = Dispatcher::new(SimulationClock::start());

    for kind in STRATEGIES {
        let mut session: Session = [("item", "orig")].into_iter().collect();
        let action = Action::builder()
            .title("Refused")
            .url(url.clone())
            .transport(kind)
            .extraction(
                ExtractionHandler::builder()
                    .jsonpath("$.items[*]")
                    .variable("item")
                    .build(),
            )
            .build();

        let result = dispatch_one(&dispatcher, &action, &mut session).await;

        assert_eq!(result.content_length(), 0, "{kind}");
        assert_eq!(result.status(), 0, "{kind}");
        assert_eq!(result.title(), "Refused");
        assert_eq!(session.get("item"), Some("orig"));
    }
}

#[tokio::test]
async fn truncated_body_keeps_the_real_status() {
    let base = serve_truncated().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());

    for kind in STRATEGIES {
        let action = Action::builder()
            .title("Truncated")
            .url(format!("{base}/"))
            .transport(kind)
            .build();

        let result = dispatch_one(&dispatcher, &action, &mut Session::new()).await;

        assert_eq!(result.status(), 200, "{kind}");
        assert_eq!(result.content_length(), 0, "{kind}");
    }
}

#[tokio::test]
async fn non_success_statuses_are_recorded_not_failed() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());
    let action = Action::builder().title("Down").url(format!("{base}/down")).build();

    let result = dispatch_one(&dispatcher, &action, &mut Session::new()).await;

    assert_eq!(result.status(), 503);
    assert_eq!(result.content_length(), "down".len());
}

#[tokio::test]
async fn standard_transport_sends_the_substituted_body() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());
    let mut session: Session = [("user", "alice")].into_iter().collect();
    let action = Action::builder()
        .method("POST")
        .title("Echo")
        .url(format!("{base}/echo"))
        .body(r#"{"user":"${user}","tags":["a","b"]}"#)
        .transport(TransportKind::Standard)
        .extraction(
            ExtractionHandler::builder()
                .jsonpath("$.user")
                .variable("echoed")
                .build(),
        )
        .build();

    let result = dispatch_one(&dispatcher, &action, &mut session).await;

    assert_eq!(result.status(), 200);
    assert_eq!(result.content_length(), r#"{"user":"alice","tags":["a","b"]}"#.len());
    assert_eq!(session.get("echoed"), Some("alice"));
}

#[tokio::test]
async fn pooled_transport_sends_no_body() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());
    let action = Action::builder()
        .method("POST")
        .title("Echo")
        .url(format!("{base}/echo"))
        .body("ignored")
        .transport(TransportKind::Pooled)
        .build();

    let result = dispatch_one(&dispatcher, &action, &mut Session::new()).await;

    assert_eq!(result.status(), 200);
    assert_eq!(result.content_length(), 0);
}

#[tokio::test]
async fn accept_header_reaches_the_server() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());

    for kind in STRATEGIES {
        let action = Action::builder()
            .title("Accept")
            .url(format!("{base}/accept"))
            .accept("application/vnd.test+json")
            .transport(kind)
            .build();

        let result = dispatch_one(&dispatcher, &action, &mut Session::new()).await;
        assert_eq!(result.content_length(), "application/vnd.test+json".len(), "{kind}");
    }
}

#[tokio::test]
async fn xml_extraction_over_http() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());
    let mut session = Session::new();
    let action = Action::builder()
        .title("Feed")
        .url(format!("{base}/feed.xml"))
        .accept("application/xml")
        .extraction(
            ExtractionHandler::builder()
                .xmlpath("//entry[title='two']/@id")
                .variable("entry")
                .build(),
        )
        .build();

    let result = dispatch_one(&dispatcher, &action, &mut session).await;

    assert_eq!(result.content_length(), FEED.len());
    assert_eq!(session.get("entry"), Some("20"));
}

#[tokio::test]
async fn malformed_body_for_the_query_is_skipped() {
    let base = serve().await;
    let dispatcher = Dispatcher::new(SimulationClock::start());
    let mut session: Session = [("item", "orig")].into_iter().collect();
    let action = Action::builder()
        .title("Feed as JSON")
        .url(format!("{base}/feed.xml"))
        .extraction(
            ExtractionHandler::builder()
                .jsonpath("$.items[*]")
                .variable("item")
                .build(),
        )
        .build();

    let result = dispatch_one(&dispatcher, &action, &mut session).await;

    assert_eq!(result.status(), 200);
    assert_eq!(result.content_length(), FEED.len());
    assert_eq!(session.get("item"), Some("orig"));
}

#[tokio::test]
async fn virtual_users_chain_extractions() {
    let base = serve().await;
    let dispatcher = Arc::new(Dispatcher::new(SimulationClock::start()));
    let (sink, rx) = result_channel(8);

    let extract_next = ExtractionHandler::builder()
        .jsonpath("$.next")
        .variable("name")
        .build();
    let actions: Arc<[Action]> = vec![
        Action::builder()
            .title("Lookup")
            .url(format!("{base}/users/${{name}}"))
            .transport(TransportKind::Pooled)
            .extraction(extract_next.clone())
            .build(),
        Action::builder()
            .title("Lookup again")
            .url(format!("{base}/users/${{name}}"))
            .extraction(extract_next)
            .build(),
    ]
    .into();

    let handles: Vec<_> = ["alice", "bob"]
        .into_iter()
        .enumerate()
        .map(|(id, name)| {
            VirtualUser::new(id, actions.clone())
                .with_session([("name", name)].into_iter().collect())
                .spawn(dispatcher.clone(), sink.clone(), 1)
        })
        .collect();
    drop(sink);

    let mut titles = Vec::new();
    let total = drain(rx, 8, |batch: &[HttpResult]| {
        titles.extend(batch.iter().map(|r| r.title().to_string()))
    })
    .await;

    let mut names = Vec::new();
    for handle in handles {
        names.push(handle.await.unwrap().into_session().get("name").map(str::to_owned));
    }

    assert_eq!(total, 4);
    assert_eq!(titles.iter().filter(|t| *t == "Lookup").count(), 2);
    assert_eq!(
        names,
        vec![Some("alice-2-2".to_string()), Some("bob-2-2".to_string())]
    );
}
