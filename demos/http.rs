use std::{sync::Arc, time::Duration};

use barrage::{
    Action, Dispatcher, HttpResult, Session, SimulationClock, VirtualUser,
    sink::{drain, result_channel},
    user::join_users,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    // Scripts are normally loaded from a file, serde makes that a one-liner
    let actions: Vec<Action> = serde_json::from_str(
        r#"[
            {
                "title": "List items",
                "url": "http://localhost:3000/items",
                "accept": "application/json",
                "client": "pooled",
                "response": { "jsonpath": "$.items[*].id", "index": "random", "variable": "item" }
            },
            {
                "title": "Get item",
                "url": "http://localhost:3000/items/${item}",
                "accept": "application/json"
            }
        ]"#,
    )
    .expect("demo script is valid");

    // The clock starts once, before any user is spawned
    let dispatcher = Arc::new(Dispatcher::new(SimulationClock::start()));
    let (sink, results) = result_channel(1024);
    let actions: Arc<[Action]> = actions.into();

    let consumer = tokio::spawn(async move {
        let mut errors = 0usize;
        let mut latency = Duration::ZERO;
        let total = drain(results, 256, |batch: &[HttpResult]| {
            errors += batch.iter().filter(|r| r.status() == 0 || r.status() >= 400).count();
            latency += batch.iter().map(HttpResult::elapsed).sum::<Duration>();
        })
        .await;
        (total, errors, latency)
    });

    let handles: Vec<_> = (0..20)
        .map(|id| {
            let session: Session = [("user", format!("user-{id}"))].into_iter().collect();
            VirtualUser::new(id, actions.clone())
                .with_session(session)
                .spawn(dispatcher.clone(), sink.clone(), 50)
        })
        .collect();
    // Every sender has to go away for the consumer to finish
    drop(sink);
    let users = join_users(handles).await;

    let (total, errors, latency) = consumer.await.expect("consumer task");
    tracing::info!(
        users = users.len(),
        total,
        wall = ?dispatcher.clock().offset(),
        errors,
        average = ?latency.checked_div(total as u32).unwrap_or_default(),
        "done"
    );
}
