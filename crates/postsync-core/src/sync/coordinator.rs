//! Sync coordinator implementation
//!
//! Owns the post store and serializes load, refresh and submit against a
//! `PostTransport`. The coordinator is a handle: clones share the same
//! state, so a UI can run an operation in a spawned task while it keeps
//! reading snapshots.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{Snapshot, SyncEvent, SyncPhase, SyncStatus};
use crate::error::{ErrorState, Operation, SyncError, SyncResult, TransportError};
use crate::models::{Draft, Post};
use crate::store::PostStore;
use crate::transport::PostTransport;

/// Mutable state guarded by the coordinator lock
#[derive(Debug)]
struct Inner {
    phase: SyncPhase,
    store: PostStore,
    error: Option<ErrorState>,
    last_synced: Option<chrono::DateTime<Utc>>,
    closed: bool,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            items: self.store.items().to_vec(),
            error: self.error.clone(),
            last_synced: self.last_synced,
        }
    }
}

/// Coordinates a client-held post list with the remote collection
pub struct SyncCoordinator<T: PostTransport> {
    transport: Arc<T>,
    inner: Arc<Mutex<Inner>>,
    /// Latest snapshot for presentation
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
    /// Event channel
    event_tx: mpsc::UnboundedSender<SyncEvent>,
    /// Event receiver, only held by the handle returned from `new`
    event_rx: Option<mpsc::UnboundedReceiver<SyncEvent>>,
}

impl<T: PostTransport> Clone for SyncCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            inner: Arc::clone(&self.inner),
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            event_tx: self.event_tx.clone(),
            event_rx: None,
        }
    }
}

impl<T: PostTransport> SyncCoordinator<T> {
    /// Create a coordinator with an empty store
    pub fn new(transport: Arc<T>) -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            transport,
            inner: Arc::new(Mutex::new(Inner {
                phase: SyncPhase::Uninitialized,
                store: PostStore::new(),
                error: None,
                last_synced: None,
                closed: false,
            })),
            snapshot_tx: Arc::new(snapshot_tx),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Get the current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Get the current phase
    pub fn phase(&self) -> SyncPhase {
        self.snapshot_tx.borrow().phase
    }

    /// Get the current status
    pub fn status(&self) -> SyncStatus {
        self.phase().status()
    }

    /// Get a copy of the posts, in display order
    pub fn items(&self) -> Vec<Post> {
        self.snapshot_tx.borrow().items.clone()
    }

    /// Get the last recorded error
    pub fn error(&self) -> Option<ErrorState> {
        self.snapshot_tx.borrow().error.clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SyncEvent>> {
        self.event_rx.take()
    }

    /// Fetch the first page of posts
    ///
    /// From `Uninitialized` or `LoadFailed` this is the first load: on
    /// failure the list stays empty and the phase becomes `LoadFailed`.
    /// Once the list is `Ready` it behaves like `refresh`.
    ///
    /// Returns the number of posts now held.
    pub async fn initialize(&self, limit: u32) -> SyncResult<usize> {
        self.fetch(Operation::Load, limit).await
    }

    /// Re-fetch the list, replacing it on success
    ///
    /// A failed refresh keeps the posts already shown and records the error.
    /// Before a successful first load this retries the load instead.
    pub async fn refresh(&self, limit: u32) -> SyncResult<usize> {
        self.fetch(Operation::Refresh, limit).await
    }

    /// Create a post and put it at the front of the list
    pub async fn submit_post(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> SyncResult<Post> {
        self.submit_draft(&Draft::new(title, body)).await
    }

    /// Create a post from a draft and put it at the front of the list
    ///
    /// On failure the list is unchanged and the draft is left with the
    /// caller, so nothing typed is lost.
    pub async fn submit_draft(&self, draft: &Draft) -> SyncResult<Post> {
        if draft.is_blank() {
            debug!("Rejecting blank draft");
            return Err(SyncError::Validation(
                "title and body are both empty".to_string(),
            ));
        }

        self.begin_submit().await?;

        let this = self.clone();
        let draft = draft.clone();
        join(tokio::spawn(async move {
            let result = this.transport.create(&draft).await;
            this.finish_submit(result).await
        }))
        .await
    }

    /// Stop applying results
    ///
    /// Requests already in flight finish, but their results are dropped and
    /// they return `SyncError::Closed`, as does every later operation.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.closed {
            inner.closed = true;
            info!("Coordinator shut down in phase {:?}", inner.phase);
        }
    }

    /// Check whether `shutdown` has been called
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    async fn fetch(&self, requested: Operation, limit: u32) -> SyncResult<usize> {
        if limit == 0 {
            return Err(SyncError::Validation(
                "limit must be greater than zero".to_string(),
            ));
        }

        let operation = self.begin_fetch(requested).await?;

        let this = self.clone();
        join(tokio::spawn(async move {
            let result = this.transport.list(limit).await;
            this.finish_fetch(operation, result).await
        }))
        .await
    }

    /// Enter `Loading` or `Refreshing`, returning which one
    async fn begin_fetch(&self, requested: Operation) -> SyncResult<Operation> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SyncError::Closed);
        }

        let (operation, phase) = match inner.phase {
            SyncPhase::Uninitialized | SyncPhase::LoadFailed => {
                (Operation::Load, SyncPhase::Loading)
            }
            SyncPhase::Ready => (Operation::Refresh, SyncPhase::Refreshing),
            busy => return Err(reject(requested, busy)),
        };

        self.transition(&mut inner, phase);
        Ok(operation)
    }

    async fn finish_fetch(
        &self,
        operation: Operation,
        result: Result<Vec<Post>, TransportError>,
    ) -> SyncResult<usize> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            debug!("Discarding {} result after shutdown", operation);
            return Err(SyncError::Closed);
        }

        match result {
            Ok(posts) => {
                let count = inner.store.replace_all(posts);
                inner.error = None;
                inner.last_synced = Some(Utc::now());
                info!("{} complete: {} posts", operation, count);
                self.emit(SyncEvent::ItemsReplaced(count));
                self.transition(&mut inner, SyncPhase::Ready);
                Ok(count)
            }
            Err(e) => {
                let err = SyncError::from(e);
                warn!("{} failed: {}", operation, err);

                let state = ErrorState::from_error(operation, &err);
                inner.error = Some(state.clone());
                self.emit(SyncEvent::Error(state));

                let phase = match operation {
                    Operation::Load => SyncPhase::LoadFailed,
                    _ => SyncPhase::Ready,
                };
                self.transition(&mut inner, phase);
                Err(err)
            }
        }
    }

    async fn begin_submit(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SyncError::Closed);
        }

        match inner.phase {
            SyncPhase::Ready => {
                self.transition(&mut inner, SyncPhase::Submitting);
                Ok(())
            }
            SyncPhase::Uninitialized | SyncPhase::LoadFailed => {
                debug!("Rejecting submit before first load");
                Err(SyncError::NotReady)
            }
            busy => Err(reject(Operation::Submit, busy)),
        }
    }

    async fn finish_submit(&self, result: Result<Post, TransportError>) -> SyncResult<Post> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            debug!("Discarding submit result after shutdown");
            return Err(SyncError::Closed);
        }

        match result {
            Ok(post) => {
                if !inner.store.prepend(post.clone()) {
                    debug!("Post {} already listed, replaced in place", post.id);
                }
                inner.error = None;
                info!("Post {} created", post.id);
                self.emit(SyncEvent::PostAdded(post.clone()));
                self.emit(SyncEvent::DraftAccepted);
                self.transition(&mut inner, SyncPhase::Ready);
                Ok(post)
            }
            Err(e) => {
                let err = SyncError::from(e);
                warn!("submit failed: {}", err);

                let state = ErrorState::from_error(Operation::Submit, &err);
                inner.error = Some(state.clone());
                self.emit(SyncEvent::Error(state));
                self.transition(&mut inner, SyncPhase::Ready);
                Err(err)
            }
        }
    }

    /// Set the phase and publish a fresh snapshot
    fn transition(&self, inner: &mut Inner, phase: SyncPhase) {
        inner.phase = phase;
        self.snapshot_tx.send_replace(inner.snapshot());
        self.emit(SyncEvent::PhaseChanged(phase));
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Wait for an operation task
///
/// The request and its completion run in their own task, so a caller that
/// stops waiting never leaves the coordinator stuck in a busy phase.
async fn join<R>(handle: JoinHandle<SyncResult<R>>) -> SyncResult<R> {
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(SyncError::Closed),
    }
}

/// Build the rejection for an operation requested while `busy` is in flight
fn reject(requested: Operation, busy: SyncPhase) -> SyncError {
    let running = busy.running().unwrap_or(requested);
    debug!("Rejecting {} while {} is in flight", requested, running);
    SyncError::AlreadyInProgress { requested, running }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct StubTransport {
        list_responses: StdMutex<VecDeque<Result<Vec<Post>, TransportError>>>,
        create_responses: StdMutex<VecDeque<Result<Post, TransportError>>>,
        list_calls: StdMutex<Vec<u32>>,
        create_calls: StdMutex<Vec<Draft>>,
        gate: StdMutex<Option<Arc<Notify>>>,
    }

    impl StubTransport {
        fn push_list(&self, response: Result<Vec<Post>, TransportError>) {
            self.list_responses.lock().unwrap().push_back(response);
        }

        fn push_create(&self, response: Result<Post, TransportError>) {
            self.create_responses.lock().unwrap().push_back(response);
        }

        /// Make later requests wait until the gate is notified
        fn set_gate(&self, gate: Arc<Notify>) {
            *self.gate.lock().unwrap() = Some(gate);
        }

        fn list_calls(&self) -> Vec<u32> {
            self.list_calls.lock().unwrap().clone()
        }

        fn create_calls(&self) -> Vec<Draft> {
            self.create_calls.lock().unwrap().clone()
        }

        async fn wait_gate(&self) {
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl PostTransport for StubTransport {
        async fn list(&self, limit: u32) -> Result<Vec<Post>, TransportError> {
            self.list_calls.lock().unwrap().push(limit);
            self.wait_gate().await;

            let response = self.list_responses.lock().unwrap().pop_front();
            match response {
                Some(Ok(mut posts)) => {
                    posts.truncate(limit as usize);
                    Ok(posts)
                }
                Some(Err(e)) => Err(e),
                None => Err(unavailable()),
            }
        }

        async fn create(&self, draft: &Draft) -> Result<Post, TransportError> {
            self.create_calls.lock().unwrap().push(draft.clone());
            self.wait_gate().await;

            let response = self.create_responses.lock().unwrap().pop_front();
            response.unwrap_or_else(|| Err(unavailable()))
        }
    }

    fn unavailable() -> TransportError {
        TransportError::Status {
            url: "http://stub/posts".to_string(),
            status: 503,
        }
    }

    fn malformed() -> TransportError {
        TransportError::Decode {
            url: "http://stub/posts".to_string(),
            details: "invalid type: map, expected a sequence".to_string(),
        }
    }

    fn posts(count: u64) -> Vec<Post> {
        (1..=count)
            .map(|id| Post::new(id, format!("title {}", id), format!("body {}", id)).with_user(1))
            .collect()
    }

    fn setup() -> (Arc<StubTransport>, SyncCoordinator<StubTransport>) {
        let stub = Arc::new(StubTransport::default());
        let coordinator = SyncCoordinator::new(Arc::clone(&stub));
        (stub, coordinator)
    }

    async fn ready_with(count: u64) -> (Arc<StubTransport>, SyncCoordinator<StubTransport>) {
        let (stub, coordinator) = setup();
        stub.push_list(Ok(posts(count)));
        coordinator.initialize(50).await.unwrap();
        (stub, coordinator)
    }

    #[tokio::test]
    async fn test_new_coordinator_is_uninitialized() {
        let (_stub, coordinator) = setup();

        assert_eq!(coordinator.phase(), SyncPhase::Uninitialized);
        assert_eq!(coordinator.status(), SyncStatus::Idle);
        assert!(coordinator.items().is_empty());
        assert!(coordinator.error().is_none());
    }

    #[tokio::test]
    async fn test_initialize_populates_store() {
        let (stub, coordinator) = setup();
        stub.push_list(Ok(posts(50)));

        let count = coordinator.initialize(50).await.unwrap();

        assert_eq!(count, 50);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
        assert_eq!(coordinator.items().len(), 50);
        assert!(coordinator.error().is_none());
        assert!(coordinator.snapshot().last_synced.is_some());
        assert_eq!(stub.list_calls(), vec![50]);
    }

    #[tokio::test]
    async fn test_initialize_length_is_min_of_limit_and_server_count() {
        let (stub, coordinator) = setup();
        stub.push_list(Ok(posts(100)));
        assert_eq!(coordinator.initialize(20).await.unwrap(), 20);

        let (stub, coordinator) = setup();
        stub.push_list(Ok(posts(3)));
        assert_eq!(coordinator.initialize(20).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_initialize_failure_sets_load_failed() {
        let (stub, coordinator) = setup();
        stub.push_list(Err(malformed()));

        let err = coordinator.initialize(50).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(coordinator.phase(), SyncPhase::LoadFailed);
        assert!(coordinator.items().is_empty());

        let state = coordinator.error().unwrap();
        assert_eq!(state.kind, ErrorKind::Decode);
        assert_eq!(state.operation, Operation::Load);
    }

    #[tokio::test]
    async fn test_refresh_after_load_failure_retries_load() {
        let (stub, coordinator) = setup();
        stub.push_list(Err(unavailable()));
        stub.push_list(Ok(posts(4)));

        assert!(coordinator.initialize(50).await.is_err());
        let count = coordinator.refresh(90).await.unwrap();

        assert_eq!(count, 4);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
        assert!(coordinator.error().is_none());
        assert_eq!(stub.list_calls(), vec![50, 90]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_items_and_clears_error() {
        let (stub, coordinator) = ready_with(3).await;
        stub.push_list(Err(unavailable()));
        stub.push_list(Ok(posts(5)));

        assert!(coordinator.refresh(90).await.is_err());
        assert!(coordinator.error().is_some());

        assert_eq!(coordinator.refresh(90).await.unwrap(), 5);
        assert_eq!(coordinator.items().len(), 5);
        assert!(coordinator.error().is_none());
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_existing_items() {
        let (stub, coordinator) = ready_with(10).await;
        let before = coordinator.items();
        stub.push_list(Err(unavailable()));

        let err = coordinator.refresh(90).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(coordinator.items(), before);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);

        let state = coordinator.error().unwrap();
        assert_eq!(state.operation, Operation::Refresh);
        assert_eq!(state.kind, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let (stub, coordinator) = setup();

        let err = coordinator.initialize(0).await.unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(coordinator.phase(), SyncPhase::Uninitialized);
        assert!(stub.list_calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_prepends_created_post() {
        let (stub, coordinator) = ready_with(50).await;
        stub.push_create(Ok(Post::new(101, "Hello", "World")));

        let post = coordinator.submit_post("Hello", "World").await.unwrap();

        assert_eq!(post.id, 101);
        let items = coordinator.items();
        assert_eq!(items.len(), 51);
        assert_eq!(items[0].id, 101);
        assert_eq!(items[0].title, "Hello");
        assert_eq!(items[0].body, "World");
        assert_eq!(items.iter().filter(|p| p.id == 101).count(), 1);
        assert_eq!(stub.create_calls(), vec![Draft::new("Hello", "World")]);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_submit_with_repeated_id_does_not_duplicate() {
        let (stub, coordinator) = ready_with(3).await;
        stub.push_create(Ok(Post::new(101, "first", "a")));
        stub.push_create(Ok(Post::new(101, "second", "b")));

        coordinator.submit_post("first", "a").await.unwrap();
        coordinator.submit_post("second", "b").await.unwrap();

        let items = coordinator.items();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].title, "second");
    }

    #[tokio::test]
    async fn test_blank_submit_is_rejected_without_request() {
        let (stub, coordinator) = ready_with(3).await;
        let before = coordinator.items();

        let err = coordinator.submit_post("", "").await.unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(coordinator.items(), before);
        assert!(stub.create_calls().is_empty());
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_submit_with_only_title_is_accepted() {
        let (stub, coordinator) = ready_with(1).await;
        stub.push_create(Ok(Post::new(101, "title only", "")));

        let post = coordinator.submit_post("title only", "").await.unwrap();
        assert_eq!(post.body, "");
    }

    #[tokio::test]
    async fn test_submit_before_load_is_not_ready() {
        let (stub, coordinator) = setup();

        let err = coordinator.submit_post("t", "b").await.unwrap_err();

        assert!(matches!(err, SyncError::NotReady));
        assert!(stub.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_store_and_sets_error() {
        let (stub, coordinator) = ready_with(3).await;
        let before = coordinator.items();
        stub.push_create(Err(unavailable()));

        let err = coordinator.submit_post("t", "b").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(coordinator.items(), before);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
        let state = coordinator.error().unwrap();
        assert_eq!(state.operation, Operation::Submit);
        assert!(state.message.starts_with("Failed to add post"));
    }

    #[tokio::test]
    async fn test_refresh_while_submitting_is_rejected() {
        let (stub, coordinator) = ready_with(3).await;
        let before = coordinator.items();
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_create(Ok(Post::new(101, "t", "b")));

        let mut rx = coordinator.subscribe();
        let submitter = coordinator.clone();
        let task = tokio::spawn(async move { submitter.submit_post("t", "b").await });

        rx.wait_for(|s| s.phase == SyncPhase::Submitting)
            .await
            .unwrap();
        assert_eq!(coordinator.status(), SyncStatus::Submitting);

        let err = coordinator.refresh(90).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::AlreadyInProgress {
                requested: Operation::Refresh,
                running: Operation::Submit,
            }
        ));
        assert_eq!(err.kind(), ErrorKind::AlreadyInProgress);
        assert_eq!(coordinator.items(), before);
        assert_eq!(stub.list_calls(), vec![50]);

        gate.notify_one();
        let post = task.await.unwrap().unwrap();
        assert_eq!(post.id, 101);
        assert_eq!(coordinator.items().len(), 4);
    }

    #[tokio::test]
    async fn test_second_submit_while_submitting_is_rejected() {
        let (stub, coordinator) = ready_with(1).await;
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_create(Ok(Post::new(101, "t", "b")));

        let mut rx = coordinator.subscribe();
        let submitter = coordinator.clone();
        let task = tokio::spawn(async move { submitter.submit_post("t", "b").await });
        rx.wait_for(|s| s.phase == SyncPhase::Submitting)
            .await
            .unwrap();

        let err = coordinator.submit_post("again", "x").await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadyInProgress { .. }));

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(stub.create_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_while_refreshing_is_rejected() {
        let (stub, coordinator) = ready_with(2).await;
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_list(Ok(posts(6)));

        let mut rx = coordinator.subscribe();
        let refresher = coordinator.clone();
        let task = tokio::spawn(async move { refresher.refresh(90).await });
        rx.wait_for(|s| s.phase == SyncPhase::Refreshing)
            .await
            .unwrap();

        // Previous list is still visible while refreshing
        assert_eq!(coordinator.items().len(), 2);

        let err = coordinator.submit_post("t", "b").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::AlreadyInProgress {
                requested: Operation::Submit,
                running: Operation::Refresh,
            }
        ));

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), 6);
        assert!(stub.create_calls().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_result() {
        let (stub, coordinator) = ready_with(2).await;
        let before = coordinator.items();
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_list(Ok(posts(9)));

        let mut rx = coordinator.subscribe();
        let refresher = coordinator.clone();
        let task = tokio::spawn(async move { refresher.refresh(90).await });
        rx.wait_for(|s| s.phase == SyncPhase::Refreshing)
            .await
            .unwrap();

        coordinator.shutdown().await;
        gate.notify_one();

        assert!(matches!(task.await.unwrap(), Err(SyncError::Closed)));
        assert_eq!(coordinator.items(), before);
        assert!(coordinator.is_closed().await);
        assert!(matches!(
            coordinator.refresh(90).await,
            Err(SyncError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_events_follow_transitions() {
        let (stub, mut coordinator) = setup();
        let mut events = coordinator.take_events().unwrap();
        assert!(coordinator.take_events().is_none());

        stub.push_list(Ok(posts(2)));
        stub.push_create(Ok(Post::new(101, "t", "b")));
        coordinator.initialize(50).await.unwrap();
        coordinator.submit_post("t", "b").await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }

        assert!(matches!(received[0], SyncEvent::PhaseChanged(SyncPhase::Loading)));
        assert!(matches!(received[1], SyncEvent::ItemsReplaced(2)));
        assert!(matches!(received[2], SyncEvent::PhaseChanged(SyncPhase::Ready)));
        assert!(matches!(received[3], SyncEvent::PhaseChanged(SyncPhase::Submitting)));
        assert!(matches!(&received[4], SyncEvent::PostAdded(p) if p.id == 101));
        assert!(matches!(received[5], SyncEvent::DraftAccepted));
        assert!(matches!(received[6], SyncEvent::PhaseChanged(SyncPhase::Ready)));
    }

    #[tokio::test]
    async fn test_failed_submit_does_not_accept_draft() {
        let (stub, mut coordinator) = setup();
        let mut events = coordinator.take_events().unwrap();
        stub.push_list(Ok(posts(1)));
        coordinator.initialize(50).await.unwrap();
        while events.try_recv().is_ok() {}

        stub.push_create(Err(malformed()));
        assert!(coordinator.submit_post("t", "b").await.is_err());

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        assert!(!received
            .iter()
            .any(|e| matches!(e, SyncEvent::DraftAccepted)));
        assert!(received
            .iter()
            .any(|e| matches!(e, SyncEvent::Error(s) if s.kind == ErrorKind::Decode)));
    }

    #[tokio::test]
    async fn test_calls_while_loading_are_rejected() {
        let (stub, coordinator) = setup();
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_list(Ok(posts(5)));

        let mut rx = coordinator.subscribe();
        let loader = coordinator.clone();
        let task = tokio::spawn(async move { loader.initialize(50).await });
        rx.wait_for(|s| s.phase == SyncPhase::Loading)
            .await
            .unwrap();

        assert!(matches!(
            coordinator.initialize(50).await,
            Err(SyncError::AlreadyInProgress {
                requested: Operation::Load,
                running: Operation::Load,
            })
        ));
        assert!(matches!(
            coordinator.refresh(90).await,
            Err(SyncError::AlreadyInProgress {
                requested: Operation::Refresh,
                running: Operation::Load,
            })
        ));
        assert!(matches!(
            coordinator.submit_post("t", "b").await,
            Err(SyncError::AlreadyInProgress {
                requested: Operation::Submit,
                running: Operation::Load,
            })
        ));

        assert_eq!(coordinator.phase(), SyncPhase::Loading);
        assert!(coordinator.items().is_empty());
        assert!(coordinator.error().is_none());
        assert_eq!(stub.list_calls(), vec![50]);
        assert!(stub.create_calls().is_empty());

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), 5);
        assert_eq!(coordinator.phase(), SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_refresh_while_refreshing_is_rejected() {
        let (stub, coordinator) = ready_with(2).await;
        let before = coordinator.items();
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_list(Ok(posts(7)));

        let mut rx = coordinator.subscribe();
        let refresher = coordinator.clone();
        let task = tokio::spawn(async move { refresher.refresh(90).await });
        rx.wait_for(|s| s.phase == SyncPhase::Refreshing)
            .await
            .unwrap();

        assert!(matches!(
            coordinator.refresh(90).await,
            Err(SyncError::AlreadyInProgress {
                requested: Operation::Refresh,
                running: Operation::Refresh,
            })
        ));
        assert!(matches!(
            coordinator.initialize(50).await,
            Err(SyncError::AlreadyInProgress {
                requested: Operation::Load,
                running: Operation::Refresh,
            })
        ));

        assert_eq!(coordinator.phase(), SyncPhase::Refreshing);
        assert_eq!(coordinator.items(), before);
        assert!(coordinator.error().is_none());
        assert_eq!(stub.list_calls(), vec![50, 90]);

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_abandoned_refresh_still_completes() {
        let (stub, coordinator) = ready_with(2).await;
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_list(Ok(posts(6)));

        let mut rx = coordinator.subscribe();
        let waited =
            tokio::time::timeout(Duration::from_millis(50), coordinator.refresh(90)).await;
        assert!(waited.is_err());

        gate.notify_one();
        rx.wait_for(|s| s.phase == SyncPhase::Ready).await.unwrap();
        assert_eq!(coordinator.items().len(), 6);

        // Coordinator accepts new work afterwards
        stub.push_list(Ok(posts(3)));
        gate.notify_one();
        assert_eq!(coordinator.refresh(90).await.unwrap(), 3);

        stub.push_create(Ok(Post::new(101, "t", "b")));
        gate.notify_one();
        assert_eq!(coordinator.submit_post("t", "b").await.unwrap().id, 101);
    }

    #[tokio::test]
    async fn test_aborted_submit_still_completes() {
        let (stub, coordinator) = ready_with(1).await;
        let gate = Arc::new(Notify::new());
        stub.set_gate(Arc::clone(&gate));
        stub.push_create(Ok(Post::new(101, "t", "b")));

        let mut rx = coordinator.subscribe();
        let submitter = coordinator.clone();
        let task = tokio::spawn(async move { submitter.submit_post("t", "b").await });
        rx.wait_for(|s| s.phase == SyncPhase::Submitting)
            .await
            .unwrap();

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        gate.notify_one();
        rx.wait_for(|s| s.phase == SyncPhase::Ready).await.unwrap();
        assert_eq!(coordinator.items()[0].id, 101);

        stub.push_list(Ok(posts(4)));
        gate.notify_one();
        assert_eq!(coordinator.refresh(90).await.unwrap(), 4);
    }
}
