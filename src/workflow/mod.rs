//! The recipe recommendation workflow.
//!
//! A turn moves through translate -> retrieve -> extract -> feedback and then
//! either loops back to translation (the user rejected every suggestion) or
//! ends. Every stage mutates the same [`ConversationState`].

pub mod checkpoint;
pub mod extractor;
pub mod feedback;
pub mod gate;
pub mod retriever;
pub mod state;
pub mod translator;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{ResultCache, TtlCache};
use crate::config::WorkflowConfig;
use crate::llm::{ChatModel, LlmError};
use crate::search::SearchProvider;
use checkpoint::MemoryCheckpointer;
use extractor::FeatureExtractor;
use feedback::{FeedbackInterpreter, FeedbackVerdict};
use gate::Route;
use retriever::RecipeRetriever;
use state::{ConversationState, Recipe, RecipeFeature};
use translator::QueryTranslator;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("failed to translate the request into a search query: {0}")]
    Translation(#[source] LlmError),

    #[error("the conversation has no messages to search for")]
    EmptyConversation,

    #[error("no conversation found for thread '{0}'")]
    UnknownThread(String),
}

/// What a caller hands to [`RecipeWorkflow::invoke`].
#[derive(Debug, Clone)]
pub enum TurnInput {
    /// Start a new conversation on the thread from a single user message.
    Message(String),
    /// Feedback on the suggestions last returned for the thread.
    Feedback(String),
    /// Run the full graph over an explicit state.
    #[cfg(test)]
    State(ConversationState),
}

/// Where a finished turn left the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Selected(usize),
    AwaitingFeedback,
    NoRecipes,
}

impl TurnStatus {
    pub fn of(state: &ConversationState) -> Self {
        match state.selected {
            Some(index) if state.is_valid_index(index) => TurnStatus::Selected(index),
            _ if state.features.is_empty() => TurnStatus::NoRecipes,
            _ => TurnStatus::AwaitingFeedback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Translate,
    Retrieve,
    Extract,
    Feedback,
}

pub struct RecipeWorkflow {
    translator: QueryTranslator,
    retriever: RecipeRetriever,
    extractor: FeatureExtractor,
    interpreter: FeedbackInterpreter,
    checkpointer: MemoryCheckpointer,
    max_feedback_loops: usize,
}

impl RecipeWorkflow {
    /// Build a workflow with in-memory caches expiring after `config.cache_ttl`.
    pub fn new(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchProvider>,
        config: &WorkflowConfig,
    ) -> Self {
        Self::with_caches(
            model,
            search,
            Arc::new(TtlCache::new(config.cache_ttl)),
            Arc::new(TtlCache::new(config.cache_ttl)),
            config,
        )
    }

    pub fn with_caches(
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchProvider>,
        search_cache: Arc<dyn ResultCache<Vec<Recipe>>>,
        feature_cache: Arc<dyn ResultCache<Vec<RecipeFeature>>>,
        config: &WorkflowConfig,
    ) -> Self {
        info!("Building recipe workflow on model {}", model.model_name());
        Self {
            translator: QueryTranslator::new(model.clone()),
            retriever: RecipeRetriever::new(search, search_cache, config.max_search_results),
            extractor: FeatureExtractor::new(model.clone(), feature_cache),
            interpreter: FeedbackInterpreter::new(model),
            checkpointer: MemoryCheckpointer::new(),
            max_feedback_loops: config.max_feedback_loops,
        }
    }

    /// Run one turn for `thread_id` and commit the result.
    ///
    /// Feedback resumes the thread at the feedback stage, where the previous
    /// turn stopped. On error the thread's stored state is left untouched.
    pub async fn invoke(
        &self,
        thread_id: &str,
        input: TurnInput,
    ) -> Result<ConversationState, WorkflowError> {
        let (state, start) = match input {
            TurnInput::Message(message) => {
                (ConversationState::from_message(message), Node::Translate)
            }
            TurnInput::Feedback(feedback) => {
                let mut state = self
                    .checkpointer
                    .load(thread_id)
                    .ok_or_else(|| WorkflowError::UnknownThread(thread_id.to_string()))?;
                state.set_feedback(feedback);
                let start = if state.features.is_empty() {
                    Node::Translate
                } else {
                    Node::Feedback
                };
                (state, start)
            }
            #[cfg(test)]
            TurnInput::State(state) => (state, Node::Translate),
        };

        info!("Running turn for thread {}", thread_id);
        let state = self.run(state, start).await?;
        debug!(
            "Turn for thread {} finished with selection {}",
            thread_id,
            state.selection_index()
        );
        self.checkpointer.save(thread_id, &state);
        Ok(state)
    }

    /// Last committed state of a thread.
    #[cfg(test)]
    pub fn thread_state(&self, thread_id: &str) -> Option<ConversationState> {
        self.checkpointer.load(thread_id)
    }

    pub fn forget_thread(&self, thread_id: &str) {
        self.checkpointer.remove(thread_id);
    }

    async fn run(
        &self,
        mut state: ConversationState,
        start: Node,
    ) -> Result<ConversationState, WorkflowError> {
        let mut node = start;
        let mut loops = 0;

        loop {
            debug!("Entering {:?}", node);
            node = match node {
                Node::Translate => {
                    self.translator.translate(&mut state).await?;
                    Node::Retrieve
                }
                Node::Retrieve => {
                    self.retriever.retrieve(&mut state).await;
                    Node::Extract
                }
                Node::Extract => {
                    self.extractor.extract(&mut state).await;
                    Node::Feedback
                }
                Node::Feedback => {
                    let verdict = self.interpreter.refine(&mut state).await;
                    let rejected = matches!(verdict, Some(FeedbackVerdict::Rejected(_)));

                    match gate::route(&state, rejected) {
                        Route::End => return Ok(state),
                        Route::Retranslate if loops >= self.max_feedback_loops => {
                            warn!(
                                "Reached the limit of {} feedback loops, ending turn",
                                self.max_feedback_loops
                            );
                            return Ok(state);
                        }
                        Route::Retranslate => {
                            loops += 1;
                            Node::Translate
                        }
                    }
                }
            };
        }
    }
}
