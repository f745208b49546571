//! Memory-augmented query processing
//!
//! A query is answered in four steps: pull the closest memories, render
//! them into the system prompt, ask the language model, then remember the
//! exchange so later queries can draw on it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::client::ChatClient;
use super::prompts::{PromptTemplate, QueryPrompt, DEFAULT_SYSTEM_PROMPT, QUERY_TEMPLATE};
use crate::config::Config;
use crate::core::{GenerationOptions, LlmProvider, Message, Metadata, ScoredMemory};
use crate::error::{Error, Result};
use crate::memory::MemoryStore;

/// Caller-supplied context for a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Voice the answer should take
    #[serde(default)]
    pub persona: Option<String>,
    /// Subject area the query belongs to
    #[serde(default)]
    pub domain: Option<String>,
    /// Caller's user identifier
    #[serde(default)]
    pub user_id: Option<String>,
    /// Free-form caller context
    #[serde(default)]
    pub metadata: Metadata,
}

/// Answer to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Generated answer
    pub text: String,
    /// Model that produced the answer
    pub model: String,
    /// Memories the answer was grounded on, closest first
    pub sources: Vec<ScoredMemory>,
    /// Generation details
    pub metadata: Metadata,
}

/// Retrieval-augmented agent over a memory store
pub struct Agent {
    memory: MemoryStore,
    llm: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    system_prompt: String,
    options: GenerationOptions,
}

impl Agent {
    /// Create an agent with the built-in system prompt
    pub fn new(memory: MemoryStore, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        Ok(Agent {
            memory,
            llm,
            template: PromptTemplate::new("query", QUERY_TEMPLATE)?,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: GenerationOptions::default(),
        })
    }

    /// Create an agent backed by the configured chat-completion endpoint
    pub fn from_config(config: &Config, memory: MemoryStore) -> Result<Self> {
        let client = ChatClient::new(config.provider.clone())?;
        let mut agent = Agent::new(memory, Arc::new(client))?;
        if let Some(ref prompt) = config.provider.system_prompt {
            agent = agent.with_system_prompt(prompt.clone());
        }
        Ok(agent)
    }

    /// Replace the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Memory store this agent reads and writes
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Answer `query`, grounding the answer in stored memories
    ///
    /// The exchange is stored as a new memory before returning; if that
    /// write fails the whole query fails.
    #[instrument(skip(self, query, context), fields(query_len = query.len()))]
    pub async fn process_query(
        &self,
        query: &str,
        context: Option<QueryContext>,
    ) -> Result<AgentResponse> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query text must not be empty".into()));
        }
        let context = context.unwrap_or_default();

        let sources = self.memory.retrieve_default(query).await?;
        debug!("Retrieved {} memories for query", sources.len());

        let system = self.template.render(&QueryPrompt::new(
            &self.system_prompt,
            context.persona.as_deref(),
            context.domain.as_deref(),
            &sources,
        ))?;
        let messages = vec![Message::system(system), Message::user(query)];

        let reply = self.llm.generate(&messages, &self.options).await?;

        let mut interaction = Metadata::new();
        interaction.insert("response".into(), Value::String(reply.content.clone()));
        interaction.insert("context".into(), serde_json::to_value(&context)?);
        self.memory.store(query, interaction).await?;

        let mut metadata = Metadata::new();
        metadata.insert("memories_used".into(), Value::from(sources.len()));
        if let Some(reason) = reply.finish_reason {
            metadata.insert("finish_reason".into(), Value::String(reason));
        }
        if let Some(usage) = reply.usage {
            metadata.insert("usage".into(), serde_json::to_value(usage)?);
        }

        info!(
            "Answered query with {} ({} sources)",
            reply.model,
            sources.len()
        );

        Ok(AgentResponse {
            text: reply.content,
            model: reply.model,
            sources,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;
    use crate::agent::types::Role;
    use crate::config::MemoryConfig;
    use crate::error::ErrorKind;
    use crate::memory::testing::{UnreachableIndex, WordHashEmbedder};
    use crate::memory::InMemoryIndex;

    const DIMS: usize = 256;

    async fn memory_store() -> MemoryStore {
        let config = MemoryConfig {
            dimensions: DIMS,
            default_k: 2,
            ..Default::default()
        };
        let store = MemoryStore::new(
            config,
            Arc::new(InMemoryIndex::new()),
            Arc::new(WordHashEmbedder::new(DIMS)),
        )
        .unwrap();
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_process_query_grounds_and_remembers() {
        let memory = memory_store().await;
        memory
            .store("patient adherence improved in march", Metadata::new())
            .await
            .unwrap();
        memory
            .store("quarterly revenue was flat", Metadata::new())
            .await
            .unwrap();

        let llm = Arc::new(ScriptedProvider::replying("Adherence is up."));
        let agent = Agent::new(memory.clone(), llm.clone()).unwrap();

        let context = QueryContext {
            persona: Some("clinical analyst".into()),
            domain: Some("healthcare".into()),
            ..Default::default()
        };
        let response = agent
            .process_query("how is patient adherence", Some(context.clone()))
            .await
            .unwrap();

        assert_eq!(response.text, "Adherence is up.");
        assert_eq!(response.model, "scripted-model");
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].text, "patient adherence improved in march");
        assert_eq!(response.metadata["memories_used"], 2);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let system = &requests[0][0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("clinical analyst"));
        assert!(system.content.contains("1. ["));
        assert_eq!(requests[0][1], Message::user("how is patient adherence"));

        // The exchange itself is now a memory
        assert_eq!(memory.count().await.unwrap(), 3);
        let stored = memory.retrieve("how is patient adherence", 1).await.unwrap();
        assert_eq!(stored[0].text, "how is patient adherence");
        assert_eq!(stored[0].metadata["response"], "Adherence is up.");
        assert_eq!(
            stored[0].metadata["context"],
            serde_json::to_value(&context).unwrap()
        );
    }

    #[tokio::test]
    async fn test_process_query_on_empty_memory() {
        let memory = memory_store().await;
        let llm = Arc::new(ScriptedProvider::replying("No data yet."));
        let agent = Agent::new(memory.clone(), llm.clone())
            .unwrap()
            .with_system_prompt("CUSTOM");

        let response = agent.process_query("anything?", None).await.unwrap();

        assert!(response.sources.is_empty());
        assert_eq!(llm.requests()[0][0].content.trim(), "CUSTOM");
        assert_eq!(memory.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_any_call() {
        let memory = memory_store().await;
        let llm = Arc::new(ScriptedProvider::replying("unused"));
        let agent = Agent::new(memory.clone(), llm.clone()).unwrap();

        let err = agent.process_query("   ", None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(llm.requests().is_empty());
        assert_eq!(memory.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_stores_nothing() {
        let memory = memory_store().await;
        let agent = Agent::new(memory.clone(), Arc::new(ScriptedProvider::failing())).unwrap();

        let err = agent.process_query("trends?", None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::LanguageModel);
        assert_eq!(memory.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let memory = MemoryStore::new(
            MemoryConfig {
                dimensions: DIMS,
                ..Default::default()
            },
            Arc::new(UnreachableIndex),
            Arc::new(WordHashEmbedder::new(DIMS)),
        )
        .unwrap();
        let llm = Arc::new(ScriptedProvider::replying("unused"));
        let agent = Agent::new(memory, llm.clone()).unwrap();

        let err = agent.process_query("trends?", None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(llm.requests().is_empty());
    }
}
