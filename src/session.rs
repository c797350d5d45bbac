use crate::{
    codec::deserialize,
    error::FilterError,
    ids::{IdGenerator, UuidGenerator},
    mutation,
    template::{strip_ids, FilterTemplate},
    tree::{Field, FilterGroup, NodeId},
    url_sync::{UrlPublisher, UrlSync, DEFAULT_DEBOUNCE},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// The live filter of a browsing session.
///
/// The session owns the current tree and is the only place it changes. Every command computes
/// the next tree with the [`mutation`] functions, replaces the current one with it and
/// schedules a debounced publication of the new tree to the shareable URL.
///
/// Commands spawn the publication on the current Tokio runtime, so they must be called from
/// within one.
///
/// # Examples
///
/// ```rust
/// use build_filter::{Field, FilterSession, NodeId, ShareLink};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let link = Arc::new(ShareLink::new("/builds"));
/// let mut session = FilterSession::new(Arc::clone(&link));
///
/// session.add_condition(&NodeId::root());
/// let id = session.current().conditions[0].id().clone();
/// session.update_field(&id, Field::AttributeId, "attr-42");
///
/// assert_eq!(1, session.current().conditions.len());
/// # }
/// ```
#[derive(Debug)]
pub struct FilterSession<P: UrlPublisher, G: IdGenerator = UuidGenerator> {
    state: FilterGroup,
    ids: G,
    sync: UrlSync<P>,
    restore_error: Option<FilterError>,
}

impl<P: UrlPublisher> FilterSession<P, UuidGenerator> {
    /// Start a session on a fresh empty root.
    pub fn new(publisher: Arc<P>) -> Self {
        Self::with_ids(publisher, UuidGenerator)
    }
}

impl<P: UrlPublisher, G: IdGenerator> FilterSession<P, G> {
    pub fn with_ids(publisher: Arc<P>, ids: G) -> Self {
        Self {
            state: FilterGroup::empty_root(),
            ids,
            sync: UrlSync::new(publisher, DEFAULT_DEBOUNCE),
            restore_error: None,
        }
    }

    /// Change the quiet period of the URL publication.
    pub fn debounce(mut self, window: Duration) -> Self {
        self.sync.set_window(window);
        self
    }

    /// Start from the tree carried by an incoming URL token.
    ///
    /// The tree becomes exactly the decoded token. A token that cannot be decoded leaves a fresh
    /// empty root and is reported by [`FilterSession::restore_error`].
    pub fn restore(mut self, token: Option<&str>) -> Self {
        let Some(token) = token else {
            return self;
        };

        match deserialize(token) {
            Ok(tree) => {
                debug!(nodes = tree.node_count(), "restored filter from the url");
                self.state = tree;
                self.restore_error = None;
            }
            Err(error) => {
                warn!(%error, "ignoring the filter of the url, starting from an empty filter");
                self.state = FilterGroup::empty_root();
                self.restore_error = Some(error);
            }
        }
        self
    }

    /// Start from an incoming URL token, failing if it cannot be decoded.
    pub fn from_token(publisher: Arc<P>, ids: G, token: &str) -> Result<Self, FilterError> {
        let mut session = Self::with_ids(publisher, ids);
        session.state = deserialize(token)?;
        Ok(session)
    }

    /// Why the token given to [`FilterSession::restore`] was ignored, if it was.
    #[inline]
    pub fn restore_error(&self) -> Option<&FilterError> {
        self.restore_error.as_ref()
    }

    #[inline]
    pub fn current(&self) -> &FilterGroup {
        &self.state
    }

    /// Whether a URL publication is waiting for its quiet period to end.
    #[inline]
    pub fn is_publish_pending(&self) -> bool {
        self.sync.is_pending()
    }

    pub fn add_group(&mut self, parent: &NodeId) {
        debug!(%parent, "adding group");
        let next = mutation::add_group(&self.state, parent, &mut self.ids);
        self.commit(next);
    }

    pub fn add_condition(&mut self, parent: &NodeId) {
        debug!(%parent, "adding condition");
        let next = mutation::add_condition(&self.state, parent, &mut self.ids);
        self.commit(next);
    }

    pub fn delete_item(&mut self, item: &NodeId) {
        debug!(%item, "deleting item");
        let next = mutation::delete_item(&self.state, item);
        self.commit(next);
    }

    pub fn update_field(&mut self, item: &NodeId, field: Field, value: &str) {
        debug!(%item, ?field, value, "updating field");
        let next = mutation::update_field(&self.state, item, field, value);
        self.commit(next);
    }

    /// Replace the whole tree with a saved filter, minting fresh ids for every node.
    pub fn load_template(&mut self, template: &FilterTemplate) {
        debug!("loading saved filter");
        let next = template.instantiate(&mut self.ids);
        self.commit(next);
    }

    /// The current tree without its ids, as stored when saving it.
    pub fn snapshot(&self) -> FilterTemplate {
        strip_ids(&self.state)
    }

    fn commit(&mut self, next: FilterGroup) {
        self.state = next;
        self.sync.schedule(self.state.clone());
    }
}
