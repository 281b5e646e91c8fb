//! The service facade: assembles the full agent graph from configuration
//! and collaborators, submits turns, and cancels runs.

use std::sync::Arc;

use tracing::instrument;

use crate::app::App;
use crate::graphs::{GraphBuilder, GraphCompileError};
use crate::message::Message;
use crate::nodes::action::ActionNode;
use crate::nodes::select::{SelectSubgraphNode, route_branch};
use crate::providers::{ChatModel, ContentFetcher, Retriever, WebSearch};
use crate::runtimes::runner::{RunHandle, drive};
use crate::runtimes::{AgentConfig, RunRegistry};
use crate::state::AgentState;
use crate::streaming;
use crate::subgraph::{Subgraph, SubgraphRegistry};
use crate::subgraphs::clothing::{
    BRANCH_DONE, BRANCH_IN_DOMAIN, BRANCH_OUT_OF_DOMAIN, BRANCH_RETRY, ClothingFilterNode,
    ClothingParseNode, ClothingSearchNode, ExtractQueryNode, filter_branch, recheck_branch,
};
use crate::subgraphs::qa::QaTool;
use crate::subgraphs::rag::{GradeDocsNode, RetrieveNode, SummarizeNode};
use crate::types::NodeKind;
use crate::utils::id_generator::IdGenerator;

pub const NODE_SELECT: &str = "select_subgraph";
pub const NODE_RETRIEVE: &str = "retrieve";
pub const NODE_GRADE: &str = "grade_docs";
pub const NODE_SUMMARIZE: &str = "summarize";
pub const NODE_FILTER: &str = "clothing_filter";
pub const NODE_EXTRACT: &str = "clothing_extract";
pub const NODE_SEARCH: &str = "clothing_search";
pub const NODE_PARSE: &str = "clothing_parse";
pub const NODE_QA: &str = "qa";

/// The external capabilities a service instance is built over.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn ChatModel>,
    pub retriever: Arc<dyn Retriever>,
    pub search: Arc<dyn WebSearch>,
    pub fetcher: Arc<dyn ContentFetcher>,
}

/// One-process agent backend: a compiled graph shared across runs plus the
/// run registry.
pub struct AgentService {
    app: Arc<App>,
    config: Arc<AgentConfig>,
    runs: Arc<dyn RunRegistry>,
    ids: IdGenerator,
}

/// The default subgraph registry, in routing priority order.
pub fn default_subgraphs() -> SubgraphRegistry {
    SubgraphRegistry::new()
        .register(Subgraph::new(
            "rag_graph",
            "Answers questions about the most current fashion trends gathered from the \
             internet over the past year. Use for up-to-date advice and trends.",
            NODE_RETRIEVE,
        ))
        .register(Subgraph::new(
            "clothing_search_graph",
            "Searches the web for clothing items similar to the one the user is asking about.",
            NODE_FILTER,
        ))
        .register(Subgraph::new(
            "qa_graph",
            "Answers basic questions from general knowledge when no fresh data is needed.",
            NODE_QA,
        ))
}

/// Wire every pipeline behind the router and compile.
pub fn build_agent_graph(
    config: &AgentConfig,
    collaborators: &Collaborators,
    subgraphs: &SubgraphRegistry,
) -> Result<App, GraphCompileError> {
    let registry = Arc::new(subgraphs.clone());
    let model = &collaborators.model;

    let custom = |name: &str| NodeKind::Custom(name.to_string());

    GraphBuilder::new()
        .add_node(
            custom(NODE_SELECT),
            SelectSubgraphNode::new(Arc::clone(model), Arc::clone(&registry)),
        )
        // RAG pipeline
        .add_node(
            custom(NODE_RETRIEVE),
            RetrieveNode::new(Arc::clone(&collaborators.retriever)),
        )
        .add_node(custom(NODE_GRADE), GradeDocsNode::new(Arc::clone(model)))
        .add_node(custom(NODE_SUMMARIZE), SummarizeNode::new(Arc::clone(model)))
        // Clothing pipeline
        .add_node(custom(NODE_FILTER), ClothingFilterNode::new(Arc::clone(model)))
        .add_node(custom(NODE_EXTRACT), ExtractQueryNode)
        .add_node(
            custom(NODE_SEARCH),
            ClothingSearchNode::new(Arc::clone(&collaborators.search)),
        )
        .add_node(
            custom(NODE_PARSE),
            ClothingParseNode::new(Arc::clone(&collaborators.fetcher), Arc::clone(model)),
        )
        // QA pipeline
        .add_node(
            custom(NODE_QA),
            ActionNode::new(Arc::new(QaTool::new(Arc::clone(model)))),
        )
        .add_edge(NodeKind::Start, custom(NODE_SELECT))
        .add_conditional_edge(custom(NODE_SELECT), route_branch(), registry.branch_table())
        .add_edge(custom(NODE_RETRIEVE), custom(NODE_GRADE))
        .add_edge(custom(NODE_GRADE), custom(NODE_SUMMARIZE))
        .add_edge(custom(NODE_SUMMARIZE), NodeKind::End)
        .add_conditional_edge(
            custom(NODE_FILTER),
            filter_branch(),
            [
                (BRANCH_IN_DOMAIN.to_string(), custom(NODE_EXTRACT)),
                (BRANCH_OUT_OF_DOMAIN.to_string(), NodeKind::End),
            ],
        )
        .add_edge(custom(NODE_EXTRACT), custom(NODE_SEARCH))
        .add_edge(custom(NODE_SEARCH), custom(NODE_PARSE))
        .add_conditional_edge(
            custom(NODE_PARSE),
            recheck_branch(config.max_search_retries),
            [
                (BRANCH_RETRY.to_string(), custom(NODE_SEARCH)),
                (BRANCH_DONE.to_string(), NodeKind::End),
            ],
        )
        .add_edge(custom(NODE_QA), NodeKind::End)
        .compile()
}

impl AgentService {
    /// Build a service with the default subgraph registry.
    pub fn new(
        config: AgentConfig,
        collaborators: Collaborators,
        runs: Arc<dyn RunRegistry>,
    ) -> Result<Self, GraphCompileError> {
        let subgraphs = default_subgraphs();
        let app = build_agent_graph(&config, &collaborators, &subgraphs)?;
        Ok(Self {
            app: Arc::new(app),
            config: Arc::new(config),
            runs,
            ids: IdGenerator::new(),
        })
    }

    /// Build a service over an already-compiled graph. Useful when the
    /// caller wires a custom pipeline set.
    pub fn with_app(config: AgentConfig, app: App, runs: Arc<dyn RunRegistry>) -> Self {
        Self {
            app: Arc::new(app),
            config: Arc::new(config),
            runs,
            ids: IdGenerator::new(),
        }
    }

    #[must_use]
    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    /// Start one conversational turn.
    ///
    /// The run executes in a spawned task; the returned handle drains its
    /// event stream and yields the final state via
    /// [`join`](RunHandle::join). The stream ends after exactly one
    /// completion signal.
    #[instrument(skip(self, conversation))]
    pub async fn submit_turn(&self, conversation: Vec<Message>) -> RunHandle {
        let run_id = self.ids.generate_run_id();
        let state = AgentState::new_with_conversation(conversation);
        let (stream, drain) =
            streaming::bounded(self.config.channel_capacity, self.config.poll_interval);
        let stop = drain.stop_flag();

        self.runs.register(&run_id, stop.clone()).await;
        tracing::info!(%run_id, "run started");

        let join = tokio::spawn(drive(
            Arc::clone(&self.app),
            state,
            stream,
            stop.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.runs),
            run_id.clone(),
        ));

        RunHandle::new(run_id, drain, stop, join)
    }

    /// Cancel a run by deleting its registry entry. Idempotent; the
    /// consumer observes the stop within one poll interval.
    pub async fn cancel_run(&self, run_id: &str) {
        self.runs.cancel(run_id).await;
    }

    /// Whether the run's registry entry still exists.
    pub async fn is_running(&self, run_id: &str) -> bool {
        self.runs.is_running(run_id).await
    }
}
