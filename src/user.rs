use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::{Action, Dispatcher, ResultSink, Session};

/// One simulated user: an exclusively owned [`Session`] and the actions it
/// runs, strictly one after another.
///
/// Each user is driven by a single task, so its session needs no locking and
/// an action always observes what the previous one extracted.
#[derive(Debug)]
pub struct VirtualUser {
    id: usize,
    session: Session,
    actions: Arc<[Action]>,
}

impl VirtualUser {
    pub fn new(id: usize, actions: Arc<[Action]>) -> Self {
        Self {
            id,
            session: Session::new(),
            actions,
        }
    }

    /// Start from a pre-populated session (feeder data, credentials...).
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run every action `iterations` times, returning how many were dispatched.
    pub async fn run(&mut self, dispatcher: &Dispatcher, sink: &ResultSink, iterations: usize) -> usize {
        let mut dispatched = 0;
        for iteration in 0..iterations {
            tracing::debug!(user = self.id, iteration, "starting iteration");
            for action in self.actions.iter() {
                dispatcher.dispatch(action, &mut self.session, sink).await;
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Move the user onto its own task; the handle yields the user back.
    pub fn spawn(
        mut self,
        dispatcher: Arc<Dispatcher>,
        sink: ResultSink,
        iterations: usize,
    ) -> JoinHandle<VirtualUser> {
        tokio::spawn(async move {
            tracing::debug!(user = self.id, "user spawned");
            let dispatched = self.run(&dispatcher, &sink, iterations).await;
            tracing::debug!(user = self.id, dispatched, "user finished");
            self
        })
    }
}

/// Wait for spawned users and hand them back.
///
/// A user whose task panicked is logged and left out instead of taking the
/// others down with it.
pub async fn join_users(handles: Vec<JoinHandle<VirtualUser>>) -> Vec<VirtualUser> {
    join_all(handles)
        .await
        .into_iter()
        .filter_map(|res| match res {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!("User task failed: {e}");
                None
            }
        })
        .collect()
}
