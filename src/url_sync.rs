//! Debounced publication of the live filter tree to a shareable URL.
use crate::{codec::serialize, tree::FilterGroup};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

/// Quiet period after the last edit before the URL gets updated.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Receiver of the shareable representation of the tree.
pub trait UrlPublisher: Send + Sync + 'static {
    /// Expose `token` as the `filter` query parameter.
    fn publish(&self, token: &str);

    /// Remove the `filter` query parameter.
    fn clear(&self);
}

/// A cancellable, restartable publish of the latest tree.
///
/// Scheduling while a publish is pending cancels it and restarts the quiet period, so only the
/// last tree of a burst of edits is ever published. Dropping a `UrlSync` cancels any pending
/// publish. Scheduling needs a Tokio runtime.
#[derive(Debug)]
pub struct UrlSync<P> {
    publisher: Arc<P>,
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<P: UrlPublisher> UrlSync<P> {
    pub fn new(publisher: Arc<P>, window: Duration) -> Self {
        Self {
            publisher,
            window,
            pending: None,
        }
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Publish `tree` once the quiet period elapses without another call.
    pub fn schedule(&mut self, tree: FilterGroup) {
        self.cancel();
        let publisher = Arc::clone(&self.publisher);
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            publish_tree(publisher.as_ref(), &tree);
        }));
    }

    /// Cancel the pending publish, if any. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<P> Drop for UrlSync<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

fn publish_tree<P: UrlPublisher>(publisher: &P, tree: &FilterGroup) {
    if tree.is_empty() {
        debug!("filter is empty, clearing the shareable url");
        publisher.clear();
        return;
    }

    match serialize(tree) {
        Ok(token) => {
            debug!(nodes = tree.node_count(), "publishing filter to the shareable url");
            publisher.publish(&token);
        }
        Err(error) => warn!(%error, "failed to encode the filter, keeping the previous url"),
    }
}

/// A [`UrlPublisher`] keeping the current shareable URL in a watch channel.
///
/// The URL is `<base>?filter=<token>`, or just `<base>` when the filter is cleared.
#[derive(Debug)]
pub struct ShareLink {
    base: String,
    sender: watch::Sender<String>,
}

impl ShareLink {
    pub fn new(base: &str) -> Self {
        let (sender, _) = watch::channel(base.to_owned());
        Self {
            base: base.to_owned(),
            sender,
        }
    }

    /// The URL as of now.
    pub fn current(&self) -> String {
        self.sender.borrow().clone()
    }

    /// Follow URL changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.sender.subscribe()
    }
}

impl UrlPublisher for ShareLink {
    fn publish(&self, token: &str) {
        self.sender
            .send_replace(format!("{}?filter={token}", self.base));
    }

    fn clear(&self) {
        self.sender.send_replace(self.base.clone());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        codec::deserialize,
        test_utils::{condition, group},
    };
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Published {
        Token(String),
        Cleared,
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingPublisher {
        published: Mutex<Vec<Published>>,
    }

    impl RecordingPublisher {
        pub(crate) fn published(&self) -> Vec<Published> {
            self.published.lock().unwrap().clone()
        }
    }

    impl UrlPublisher for RecordingPublisher {
        fn publish(&self, token: &str) {
            self.published
                .lock()
                .unwrap()
                .push(Published::Token(token.to_owned()));
        }

        fn clear(&self) {
            self.published.lock().unwrap().push(Published::Cleared);
        }
    }

    fn a_tree(value: &str) -> FilterGroup {
        group!("root", And, [condition!("c1", "a1", "equals", value)])
    }

    const LESS_THAN_THE_WINDOW: Duration = Duration::from_millis(100);
    const MORE_THAN_THE_WINDOW: Duration = Duration::from_millis(350);

    #[tokio::test(start_paused = true)]
    async fn publishes_once_the_quiet_period_elapses() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);

        sync.schedule(a_tree("1"));
        tokio::time::sleep(LESS_THAN_THE_WINDOW).await;
        assert!(publisher.published().is_empty());
        assert!(sync.is_pending());

        tokio::time::sleep(MORE_THAN_THE_WINDOW).await;
        let published = publisher.published();
        assert_eq!(1, published.len());
        let Published::Token(token) = &published[0] else {
            panic!("expected a token, got {published:?}");
        };
        assert_eq!(a_tree("1"), deserialize(token).unwrap());
        assert!(!sync.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn a_burst_of_schedules_publishes_only_the_last_tree() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);

        sync.schedule(a_tree("1"));
        tokio::time::sleep(LESS_THAN_THE_WINDOW).await;
        sync.schedule(a_tree("2"));
        tokio::time::sleep(LESS_THAN_THE_WINDOW).await;
        sync.schedule(a_tree("3"));
        tokio::time::sleep(MORE_THAN_THE_WINDOW).await;

        let published = publisher.published();
        assert_eq!(1, published.len());
        let Published::Token(token) = &published[0] else {
            panic!("expected a token, got {published:?}");
        };
        assert_eq!(a_tree("3"), deserialize(token).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn an_empty_tree_clears_the_url() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);

        sync.schedule(FilterGroup::empty_root());
        tokio::time::sleep(MORE_THAN_THE_WINDOW).await;

        assert_eq!(vec![Published::Cleared], publisher.published());
    }

    #[tokio::test(start_paused = true)]
    async fn a_cancelled_publish_never_happens() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);

        sync.schedule(a_tree("1"));
        assert!(sync.cancel());
        tokio::time::sleep(MORE_THAN_THE_WINDOW).await;

        assert!(publisher.published().is_empty());
        assert!(!sync.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_sync_cancels_the_pending_publish() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);

        sync.schedule(a_tree("1"));
        drop(sync);
        tokio::time::sleep(MORE_THAN_THE_WINDOW).await;

        assert!(publisher.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn can_change_the_quiet_period() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut sync = UrlSync::new(Arc::clone(&publisher), DEFAULT_DEBOUNCE);
        sync.set_window(Duration::from_millis(50));

        sync.schedule(a_tree("1"));
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(Duration::from_millis(50), sync.window());
        assert_eq!(1, publisher.published().len());
    }

    #[test]
    fn a_share_link_starts_at_its_base_url() {
        let link = ShareLink::new("/builds");

        assert_eq!("/builds", link.current());
    }

    #[test]
    fn a_share_link_carries_the_token_in_the_filter_parameter() {
        let link = ShareLink::new("/builds");
        let receiver = link.subscribe();

        link.publish("abc_-1");
        assert_eq!("/builds?filter=abc_-1", *receiver.borrow());

        link.clear();
        assert_eq!("/builds", link.current());
    }
}
