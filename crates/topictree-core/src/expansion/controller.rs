//! Expansion controller

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::layout::{self, Layout, LayoutMode, LayoutParams, Viewport};
use crate::search::ContentFetcher;
use crate::tree::{
    Generation, NavigationHistory, NodeId, NodeKey, StateKind, TopicNode, TreeModel,
    TreeSnapshot,
};

use super::tracker::FetchTracker;
use super::{Activation, SearchOutcome};

#[derive(Debug, Default)]
struct Session {
    model: Option<TreeModel>,
    history: NavigationHistory,
    /// Node the view is rendered from
    anchor: Option<NodeId>,
    /// Last generation handed out
    generation: Generation,
}

impl Session {
    fn model_mut(&mut self) -> Result<&mut TreeModel> {
        self.model
            .as_mut()
            .ok_or_else(|| Error::NodeNotFound("no search has been run".to_string()))
    }

    /// Attach fetched children if the fetch still refers to the live node.
    ///
    /// `key` is the instance the fetch was issued for; a node that took over
    /// the same id after a replacement does not match it.
    fn apply(
        &mut self,
        generation: Generation,
        id: &NodeId,
        key: NodeKey,
        fetched: TopicNode,
        require_unexpanded: bool,
    ) -> Result<Activation> {
        let Some(model) = self.model.as_mut() else {
            return Ok(Activation::Stale);
        };
        if model.generation() != generation || model.key(id).ok() != Some(key) {
            debug!(node = %id, %generation, current = %model.generation(), "Discarding stale result");
            return Ok(Activation::Stale);
        }
        if require_unexpanded && model.state(id)? != StateKind::Unexpanded {
            debug!(node = %id, "Node changed while loading, discarding result");
            return Ok(Activation::Stale);
        }

        let children: Vec<TopicNode> = fetched
            .children
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, child)| child.reidentify(&id.child(i + 1)))
            .collect();
        let ids = children.iter().map(|c| NodeId::new(c.id.clone())).collect();

        // entries below `id` point into the subtree about to be replaced
        let mut history = self.history.clone();
        history.retain(|entry| !model.is_descendant(entry, id));

        model.attach_children(id, children)?;

        history.push(id.clone());
        self.history = history;
        self.anchor = Some(model.root_id().clone());

        Ok(Activation::Expanded { children: ids })
    }
}

/// Mediates user interactions against the tree model.
///
/// All operations take `&self`; session state sits behind an async mutex
/// that is released while content is being fetched, so other interactions
/// stay responsive during a fetch.
pub struct ExpansionController {
    fetcher: Arc<dyn ContentFetcher>,
    session: Mutex<Session>,
    tracker: FetchTracker,
    /// Sequence number of the most recently issued top-level search
    latest_search: AtomicU64,
}

impl std::fmt::Debug for ExpansionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpansionController")
            .field("latest_search", &self.latest_search.load(Ordering::SeqCst))
            .field("loading", &self.tracker.is_busy())
            .finish()
    }
}

impl ExpansionController {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            session: Mutex::new(Session::default()),
            tracker: FetchTracker::default(),
            latest_search: AtomicU64::new(0),
        }
    }

    /// Run a top-level search and replace the whole tree with its result
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("search query must not be empty".to_string()));
        }

        let ticket = self.latest_search.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = self.tracker.begin();
        info!("Searching");

        let fetched = self.fetcher.fetch(query).await;

        let mut session = self.session.lock().await;
        if self.latest_search.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Search superseded, discarding result");
            return Ok(SearchOutcome::Superseded);
        }

        let fetched = fetched.inspect_err(|e| warn!(error = %e, "Search failed"))?;
        let root_id = NodeId::root();
        let generation = session.generation.next();
        let model = TreeModel::create_root(fetched.reidentify(&root_id), generation)?;

        info!(%generation, nodes = model.len(), "Installed search result");

        session.generation = generation;
        session.model = Some(model);
        session.history = NavigationHistory::starting_at(root_id.clone());
        session.anchor = Some(root_id.clone());

        Ok(SearchOutcome::Applied {
            generation,
            root: root_id,
        })
    }

    /// Click on a node: fetch when unexpanded, otherwise toggle visibility
    #[instrument(skip(self), fields(node = %id))]
    pub async fn activate(&self, id: &NodeId) -> Result<Activation> {
        let (generation, key, query, _guard) = {
            let mut session = self.session.lock().await;
            let model = session.model_mut()?;

            match model.state(id)? {
                StateKind::Expanded => {
                    let changed = model.collapse(id)?;
                    if changed {
                        let root = model.root_id().clone();
                        session.anchor = Some(root);
                        debug!("Collapsed");
                        return Ok(Activation::Collapsed);
                    }
                    return Ok(Activation::Unchanged);
                }
                StateKind::Collapsed => {
                    let changed = model.expand(id)?;
                    if changed {
                        let root = model.root_id().clone();
                        session.anchor = Some(root);
                        debug!("Re-expanded from cache");
                        return Ok(Activation::Reexpanded);
                    }
                    return Ok(Activation::Unchanged);
                }
                StateKind::Unexpanded => {
                    let generation = model.generation();
                    let key = model.key(id)?;
                    let query = model.name(id)?.to_string();
                    let Some(guard) = self.tracker.begin_node(generation, key) else {
                        debug!("Fetch already in flight");
                        return Ok(Activation::Pending);
                    };
                    (generation, key, query, guard)
                }
            }
        };

        info!(query = %query, "Expanding node");
        let fetched = self
            .fetcher
            .fetch(&query)
            .await
            .inspect_err(|e| warn!(error = %e, "Expansion failed, node left unexpanded"))?;

        self.session
            .lock()
            .await
            .apply(generation, id, key, fetched, true)
    }

    /// Ask a free-text question about a node and replace its children with the answer
    #[instrument(skip(self), fields(node = %id))]
    pub async fn ask(&self, id: &NodeId, query: &str) -> Result<Activation> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("question must not be empty".to_string()));
        }

        let (generation, key) = {
            let mut session = self.session.lock().await;
            let model = session.model_mut()?;
            (model.generation(), model.key(id)?)
        };

        let _guard = self.tracker.begin();
        info!(query, "Asking");
        let fetched = self
            .fetcher
            .fetch(query)
            .await
            .inspect_err(|e| warn!(error = %e, "Ask failed, tree unchanged"))?;

        self.session
            .lock()
            .await
            .apply(generation, id, key, fetched, false)
    }

    /// Step back one history entry; `None` when already at the first entry.
    ///
    /// Only the view anchor moves; fetched data is kept.
    pub async fn back(&self) -> Option<NodeId> {
        let mut session = self.session.lock().await;
        let anchor = session.history.back()?.clone();
        debug!(anchor = %anchor, "Navigated back");
        session.anchor = Some(anchor.clone());
        Some(anchor)
    }

    /// Snapshot rendered from the current anchor
    pub async fn view(&self) -> Option<TreeSnapshot> {
        let session = self.session.lock().await;
        let model = session.model.as_ref()?;
        let snapshot = session
            .anchor
            .as_ref()
            .and_then(|anchor| model.read_from(anchor).ok())
            .unwrap_or_else(|| model.read());
        Some(snapshot)
    }

    /// Snapshot of the whole tree regardless of the anchor
    pub async fn tree(&self) -> Option<TreeSnapshot> {
        let session = self.session.lock().await;
        session.model.as_ref().map(TreeModel::read)
    }

    /// Lay out the current view
    pub async fn layout(
        &self,
        mode: LayoutMode,
        viewport: Viewport,
        params: &LayoutParams,
    ) -> Result<Option<Layout>> {
        match self.view().await {
            Some(snapshot) => layout::compute(&snapshot, mode, viewport, params).map(Some),
            None => Ok(None),
        }
    }

    pub async fn state(&self, id: &NodeId) -> Result<StateKind> {
        let session = self.session.lock().await;
        match session.model.as_ref() {
            Some(model) => model.state(id),
            None => Err(Error::NodeNotFound(id.to_string())),
        }
    }

    pub async fn anchor(&self) -> Option<NodeId> {
        self.session.lock().await.anchor.clone()
    }

    pub async fn history(&self) -> Vec<NodeId> {
        self.session.lock().await.history.entries().to_vec()
    }

    /// Generation of the live tree, if a search has completed
    pub async fn generation(&self) -> Option<Generation> {
        let session = self.session.lock().await;
        session.model.as_ref().map(TreeModel::generation)
    }

    /// Whether any fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.tracker.is_busy()
    }

    /// Whether an activation fetch for `id` in the live tree is outstanding
    pub async fn is_pending(&self, id: &NodeId) -> bool {
        let session = self.session.lock().await;
        match session.model.as_ref().map(|model| model.key(id)) {
            Some(Ok(key)) => self.tracker.is_pending(session.generation, key),
            _ => false,
        }
    }
}
