//! Topictree Core Integration Tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, Semaphore};

use topictree_core::{
    Error, Result,
    expansion::{Activation, ExpansionController, SearchOutcome},
    layout::{LayoutMode, LayoutParams, Viewport},
    search::{ContentFetcher, MockContentFetcher},
    tree::{Category, Generation, NodeId, StateKind, TopicNode},
    visualization::{HierarchyTree, SvgRenderer},
};

/// Hands out prepared answers in order and records the queries
#[derive(Default)]
struct ScriptedFetcher {
    answers: Mutex<VecDeque<Result<TopicNode>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new(answers: Vec<Result<TopicNode>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            queries: Mutex::default(),
        })
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        self.queries.lock().await.push(query.to_string());
        self.answers
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(Error::FetchFailed("script exhausted".to_string())))
    }
}

/// Mock content, but one query blocks until the test opens the gate
struct GatedFetcher {
    gated_query: String,
    entered: Notify,
    gate: Semaphore,
    calls: AtomicUsize,
    gated_calls: AtomicUsize,
}

impl GatedFetcher {
    fn new(gated_query: &str) -> Arc<Self> {
        Arc::new(Self {
            gated_query: gated_query.to_string(),
            entered: Notify::new(),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            gated_calls: AtomicUsize::new(0),
        })
    }

    fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ContentFetcher for GatedFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query == self.gated_query {
            self.gated_calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| Error::Other(e.to_string()))?;
            permit.forget();
        }
        MockContentFetcher::new().fetch(query).await
    }
}

/// Children named after the query, answered after a per-query delay
struct EchoFetcher {
    delays: HashMap<String, Duration>,
}

#[async_trait]
impl ContentFetcher for EchoFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        let children = (1..=2)
            .map(|i| TopicNode::leaf("", format!("{} / {}", query, i), Category::Main))
            .collect();
        Ok(TopicNode::branch("", query, Category::Main, children))
    }
}

struct FailingFetcher;

#[async_trait]
impl ContentFetcher for FailingFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        if query == "volcanoes" {
            return MockContentFetcher::new().fetch(query).await;
        }
        Err(Error::QuotaExceeded)
    }
}

/// One leaf per answer, named after the query; one query waits for the gate
struct RelayFetcher {
    gated_query: String,
    entered: Notify,
    gate: Semaphore,
    queries: Mutex<Vec<String>>,
}

impl RelayFetcher {
    fn new(gated_query: &str) -> Arc<Self> {
        Arc::new(Self {
            gated_query: gated_query.to_string(),
            entered: Notify::new(),
            gate: Semaphore::new(0),
            queries: Mutex::default(),
        })
    }
}

#[async_trait]
impl ContentFetcher for RelayFetcher {
    async fn fetch(&self, query: &str) -> Result<TopicNode> {
        self.queries.lock().await.push(query.to_string());
        if query == self.gated_query {
            self.entered.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| Error::Other(e.to_string()))?;
            permit.forget();
        }
        let leaf = match query {
            "X" => "Old A".to_string(),
            "something else" => "New B".to_string(),
            other => format!("child of {}", other),
        };
        Ok(TopicNode::branch(
            "",
            query,
            Category::Main,
            vec![TopicNode::leaf("", leaf, Category::Main)],
        ))
    }
}

fn basic_concept() -> NodeId {
    NodeId::new("1.1.1")
}

#[tokio::test]
async fn test_example_scenario() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(TopicNode::leaf("1", "X", Category::Main)),
        Ok(TopicNode::branch(
            "1",
            "X",
            Category::Main,
            vec![
                TopicNode::leaf("1", "first", Category::Main),
                TopicNode::leaf("1", "second", Category::Science),
                TopicNode::leaf("7", "third", Category::History),
            ],
        )),
    ]);
    let controller = ExpansionController::new(fetcher.clone());

    controller.search("X").await.unwrap();
    let root = NodeId::root();
    assert_eq!(controller.state(&root).await.unwrap(), StateKind::Unexpanded);

    let Activation::Expanded { children } = controller.activate(&root).await.unwrap() else {
        panic!("root should have expanded");
    };
    assert_eq!(children.len(), 3);
    let unique: HashSet<&NodeId> = children.iter().collect();
    assert_eq!(unique.len(), 3);
    assert!(!children.contains(&root));

    assert_eq!(controller.state(&root).await.unwrap(), StateKind::Expanded);
    let tree = controller.tree().await.unwrap();
    let names: Vec<&str> = tree.root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);

    // the node's display name is the query
    assert_eq!(*fetcher.queries.lock().await, vec!["X", "X"]);
}

#[tokio::test]
async fn test_activation_leaves_other_nodes_alone() {
    let controller = ExpansionController::new(Arc::new(MockContentFetcher::new()));
    controller.search("volcanoes").await.unwrap();

    // collapse a section, then expand an unrelated leaf
    assert_eq!(
        controller.activate(&NodeId::new("1.2")).await.unwrap(),
        Activation::Collapsed
    );
    let before = controller.tree().await.unwrap();

    controller.activate(&basic_concept()).await.unwrap();
    let after = controller.tree().await.unwrap();

    for node in before.root.walk() {
        let now = after.find(&node.id).unwrap();
        if node.id == basic_concept() {
            assert_eq!(now.state, StateKind::Expanded);
        } else {
            assert_eq!(now.state, node.state, "state of {} changed", node.id);
        }
    }
    assert_eq!(after.find(&"1.2".into()).unwrap().hidden_children, 3);
}

#[tokio::test]
async fn test_collapse_then_expand_restores_tree() {
    let fetcher = Arc::new(MockContentFetcher::new());
    let controller = ExpansionController::new(fetcher.clone());
    controller.search("volcanoes").await.unwrap();
    controller.activate(&basic_concept()).await.unwrap();

    let expanded = controller.tree().await.unwrap();
    let section = NodeId::new("1.1");

    assert_eq!(controller.activate(&section).await.unwrap(), Activation::Collapsed);
    assert_ne!(controller.tree().await.unwrap(), expanded);
    assert_eq!(controller.activate(&section).await.unwrap(), Activation::Reexpanded);
    assert_eq!(controller.tree().await.unwrap(), expanded);
}

#[tokio::test]
async fn test_back_history_lengths() {
    let controller = ExpansionController::new(Arc::new(MockContentFetcher::new()));
    controller.search("volcanoes").await.unwrap();

    assert_eq!(controller.back().await, None);
    assert_eq!(controller.history().await.len(), 1);

    controller.activate(&basic_concept()).await.unwrap();
    controller.activate(&NodeId::new("1.2.1")).await.unwrap();
    controller.activate(&NodeId::new("1.3.2")).await.unwrap();
    assert_eq!(controller.history().await.len(), 4);

    for expected in (1..=3).rev() {
        assert!(controller.back().await.is_some());
        assert_eq!(controller.history().await.len(), expected);
    }
    assert_eq!(controller.back().await, None);
    assert_eq!(controller.history().await.len(), 1);

    // back never reverts fetched data
    assert_eq!(
        controller.state(&NodeId::new("1.3.2")).await.unwrap(),
        StateKind::Expanded
    );
}

#[tokio::test]
async fn test_repeated_asks_each_add_a_back_step() {
    let controller = ExpansionController::new(Arc::new(MockContentFetcher::new()));
    controller.search("volcanoes").await.unwrap();
    let section = NodeId::new("1.2");

    controller.ask(&section, "how hot is lava").await.unwrap();
    controller.ask(&section, "how fast does it flow").await.unwrap();
    assert_eq!(
        controller.history().await,
        vec![NodeId::root(), section.clone(), section.clone()]
    );

    assert_eq!(controller.back().await, Some(section.clone()));
    assert_eq!(controller.back().await, Some(NodeId::root()));
    assert_eq!(controller.back().await, None);
}

#[tokio::test]
async fn test_concurrent_activation_fetches_once() {
    let fetcher = GatedFetcher::new("Basic concept");
    let controller = ExpansionController::new(fetcher.clone());
    controller.search("volcanoes").await.unwrap();
    let node = basic_concept();

    let (first, second) = tokio::join!(controller.activate(&node), async {
        fetcher.entered.notified().await;
        assert!(controller.is_loading());
        assert!(controller.is_pending(&node).await);
        let second = controller.activate(&node).await;
        fetcher.open();
        second
    });

    let Activation::Expanded { children } = first.unwrap() else {
        panic!("first activation should expand");
    };
    assert_eq!(children.len(), 4);
    assert_eq!(second.unwrap(), Activation::Pending);
    assert_eq!(fetcher.gated_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    // exactly one set of children was attached
    let tree = controller.tree().await.unwrap();
    assert_eq!(tree.find(&node).unwrap().children.len(), 4);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_stale_result_does_not_touch_new_tree() {
    let fetcher = GatedFetcher::new("Basic concept");
    let controller = ExpansionController::new(fetcher.clone());
    controller.search("volcanoes").await.unwrap();
    let node = basic_concept();

    let (activation, search) = tokio::join!(controller.activate(&node), async {
        fetcher.entered.notified().await;
        let search = controller.search("tides").await;
        fetcher.open();
        search
    });

    assert_eq!(
        search.unwrap(),
        SearchOutcome::Applied {
            generation: Generation(2),
            root: NodeId::root()
        }
    );
    assert_eq!(activation.unwrap(), Activation::Stale);

    let tree = controller.tree().await.unwrap();
    assert_eq!(tree.generation, Generation(2));
    assert_eq!(tree.root.name, "tides");
    assert_eq!(tree.node_count(), 15);
    assert_eq!(controller.state(&node).await.unwrap(), StateKind::Unexpanded);
    assert_eq!(controller.history().await, vec![NodeId::root()]);
}

#[tokio::test]
async fn test_later_search_supersedes_earlier() {
    let fetcher = GatedFetcher::new("slow topic");
    let controller = ExpansionController::new(fetcher.clone());

    let (slow, fast) = tokio::join!(controller.search("slow topic"), async {
        fetcher.entered.notified().await;
        let fast = controller.search("fast topic").await;
        fetcher.open();
        fast
    });

    assert_eq!(slow.unwrap(), SearchOutcome::Superseded);
    assert!(fast.unwrap().is_applied());
    let view = controller.view().await.unwrap();
    assert_eq!(view.root.name, "fast topic");
    assert_eq!(controller.generation().await, Some(Generation(1)));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_results_land_on_their_own_nodes() {
    // the first child answers last
    let delays = HashMap::from([
        ("root / 1".to_string(), Duration::from_millis(300)),
        ("root / 2".to_string(), Duration::from_millis(50)),
    ]);
    let controller = ExpansionController::new(Arc::new(EchoFetcher { delays }));
    controller.search("root").await.unwrap();

    let first = NodeId::new("1.1");
    let second = NodeId::new("1.2");
    let (a, b) = tokio::join!(controller.activate(&first), controller.activate(&second));
    assert!(matches!(a.unwrap(), Activation::Expanded { .. }));
    assert!(matches!(b.unwrap(), Activation::Expanded { .. }));

    let tree = controller.tree().await.unwrap();
    let names = |id: &NodeId| -> Vec<String> {
        tree.find(id)
            .unwrap()
            .children
            .iter()
            .map(|c| c.name.clone())
            .collect()
    };
    assert_eq!(names(&first), vec!["root / 1 / 1", "root / 1 / 2"]);
    assert_eq!(names(&second), vec!["root / 2 / 1", "root / 2 / 2"]);
    assert_eq!(
        tree.find(&first).unwrap().children[0].id,
        NodeId::new("1.1.1")
    );
}

#[tokio::test]
async fn test_result_for_replaced_node_skips_its_successor() {
    let fetcher = RelayFetcher::new("Old A");
    let controller = ExpansionController::new(fetcher.clone());
    controller.search("X").await.unwrap();
    let node = NodeId::new("1.1");
    assert_eq!(controller.tree().await.unwrap().find(&node).unwrap().name, "Old A");

    let (old, (asked, successor)) = tokio::join!(controller.activate(&node), async {
        fetcher.entered.notified().await;
        let asked = controller.ask(&NodeId::root(), "something else").await;
        // 1.1 is now a different node, with nothing in flight
        assert!(!controller.is_pending(&node).await);
        let successor = controller.activate(&node).await;
        fetcher.gate.add_permits(1);
        (asked, successor)
    });

    assert_eq!(
        asked.unwrap(),
        Activation::Expanded {
            children: vec![node.clone()]
        }
    );
    assert_eq!(
        successor.unwrap(),
        Activation::Expanded {
            children: vec![NodeId::new("1.1.1")]
        }
    );
    assert_eq!(old.unwrap(), Activation::Stale);

    let tree = controller.tree().await.unwrap();
    let replaced = tree.find(&node).unwrap();
    assert_eq!(replaced.name, "New B");
    let names: Vec<&str> = replaced.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["child of New B"]);
    assert_eq!(
        *fetcher.queries.lock().await,
        vec!["X", "Old A", "something else", "New B"]
    );
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_ask_on_replaced_node_is_stale() {
    let fetcher = RelayFetcher::new("slow question");
    let controller = ExpansionController::new(fetcher.clone());
    controller.search("X").await.unwrap();
    let node = NodeId::new("1.1");

    let (late, replaced) = tokio::join!(controller.ask(&node, "slow question"), async {
        fetcher.entered.notified().await;
        let replaced = controller.ask(&NodeId::root(), "something else").await;
        fetcher.gate.add_permits(1);
        replaced
    });

    assert!(replaced.unwrap().is_mutation());
    assert_eq!(late.unwrap(), Activation::Stale);

    let tree = controller.tree().await.unwrap();
    assert_eq!(tree.find(&node).unwrap().name, "New B");
    assert_eq!(controller.state(&node).await.unwrap(), StateKind::Unexpanded);
}

#[tokio::test]
async fn test_failed_fetch_is_reported_and_model_unchanged() {
    let controller = ExpansionController::new(Arc::new(FailingFetcher));
    controller.search("volcanoes").await.unwrap();
    let before = controller.tree().await.unwrap();

    let err = controller.activate(&basic_concept()).await.unwrap_err();
    assert!(matches!(err, Error::QuotaExceeded));
    assert!(err.is_fetch_failure());

    let err = controller
        .ask(&NodeId::new("1.2"), "what else?")
        .await
        .unwrap_err();
    assert!(err.suggestion().is_some());

    assert_eq!(controller.tree().await.unwrap(), before);
    assert_eq!(
        controller.state(&basic_concept()).await.unwrap(),
        StateKind::Unexpanded
    );
    assert_eq!(controller.history().await.len(), 1);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_layout_and_render_pipeline() {
    let controller = ExpansionController::new(Arc::new(MockContentFetcher::new()));
    controller.search("who is Ada Lovelace").await.unwrap();

    let params = LayoutParams::default();
    let viewport = Viewport::new(1200.0, 800.0);
    for mode in [LayoutMode::Horizontal, LayoutMode::Radial] {
        let first = controller.layout(mode, viewport, &params).await.unwrap().unwrap();
        let second = controller.layout(mode, viewport, &params).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.nodes.len(), 18);
        assert_eq!(first.edges.len(), 17);

        let resized = controller
            .layout(mode, Viewport::new(600.0, 400.0), &params)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.nodes[1].position, resized.nodes[1].position);

        let svg = SvgRenderer::new().render(&first);
        assert_eq!(svg.matches("<circle").count(), 18);
    }

    let view = controller.view().await.unwrap();
    let text = HierarchyTree::new(&view).render();
    assert!(text.starts_with("▼ Ada Lovelace [1]"));
    assert!(text.contains("Institution: Stanford University [1.2.2]"));
}
