//! End-to-end integration tests for the Nexus template runtime.
//!
//! These tests wire the real pieces together: configuration, profiles loaded
//! from disk, provider-backed agents, the chat system facade, a SQLite
//! template registry and the template engine. Only the LLM endpoint is mocked.

use std::sync::{Arc, Mutex};

use nexus_agent::{AgentManager, ChatSystem, ProfileManager};
use nexus_config::AppConfig;
use nexus_core::error::{AgentError, ProviderError, StoreError};
use nexus_core::message::{Message, Role};
use nexus_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use nexus_core::{Agent, Nexus, Participant, TemplateStore};
use nexus_providers::ProviderRouter;
use nexus_store::{InMemoryTemplateStore, SqliteTemplateStore};
use nexus_templates::{Context, TemplateEngine, TemplateError};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and records
/// every request it receives.
struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn texts(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Ok(text_response(t))).collect())
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if requests.len() >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                requests.len(),
                responses.len()
            );
        }
        let resp = responses[requests.len()].clone();
        requests.push(request);
        resp
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    chat: Arc<ChatSystem>,
    engine: TemplateEngine,
    _dir: tempfile::TempDir,
}

/// Profiles on disk, two provider-backed agents, SQLite registry.
async fn harness(openai: Arc<ScriptedProvider>, groq: Arc<ScriptedProvider>) -> Harness {
    let dir = tempfile::tempdir().unwrap();

    let profiles_dir = dir.path().join("profiles");
    std::fs::create_dir_all(&profiles_dir).unwrap();
    std::fs::write(
        profiles_dir.join("adam.yaml"),
        "agentProfile:\n  name: Adam\n  persona: You are Adam, a concise editor.\n",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.profiles.directory = profiles_dir.to_string_lossy().into_owned();
    config.profiles.default_profile = Some("Adam".into());

    let profiles = ProfileManager::load_dir(&config.profiles_dir());
    let mut router = ProviderRouter::new("openai");
    router.register("openai", openai);
    router.register("groq", groq);

    let agents = AgentManager::from_config(&config, &router, &profiles);
    let chat = Arc::new(ChatSystem::new(agents, profiles));

    let db = dir.path().join("nexus.db");
    let store = SqliteTemplateStore::new(&db.to_string_lossy()).await.unwrap();
    let engine = TemplateEngine::from_config(&config.templates, Arc::new(store), chat.clone());

    Harness {
        chat,
        engine,
        _dir: dir,
    }
}

fn inputs(pairs: &[(&str, &str)]) -> Context {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ── Execution ────────────────────────────────────────────────────────────

#[tokio::test]
async fn prompt_phases_reach_the_provider_with_profile_persona() {
    let openai = ScriptedProvider::texts(&["A short poem.", "Un court poème."]);
    let h = harness(openai.clone(), ScriptedProvider::texts(&[])).await;

    let content = r#"
inputs:
  type: prompt
  topic:
    type: string
    default: the sea
  template: "Write a poem about {{topic}}."
outputs:
  type: prompt
  output:
    type: string
  template: "Translate to French: {{output}}"
"#;
    let agent = h.chat.get_agent("OpenAIAgent").unwrap();
    let execution = h
        .engine
        .execute_template(&agent, content, &Context::new())
        .await
        .unwrap();

    assert_eq!(execution.iprompt.as_deref(), Some("Write a poem about the sea."));
    assert_eq!(execution.iresult.as_deref(), Some("A short poem."));
    assert_eq!(execution.oprompt.as_deref(), Some("Translate to French: A short poem."));
    assert_eq!(execution.result(), Some("Un court poème."));

    let requests = openai.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "You are Adam, a concise editor.");
        assert_eq!(request.messages[1].role, Role::User);
    }
    assert_eq!(requests[0].model, "gpt-4o");
    assert_eq!(requests[1].messages[1].content, "Translate to French: A short poem.");
}

#[tokio::test]
async fn stored_partials_run_against_sqlite() {
    let h = harness(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[])).await;

    h.engine
        .add_template(
            "signature",
            "inputs:\n  name:\n    type: string\n  template: \"-- {{name}}\"\n",
        )
        .await
        .unwrap();
    h.engine
        .add_template(
            "letter",
            "inputs:\n  body:\n    type: string\n  name:\n    type: string\n  template: \"{{body}} {{>signature name}}\"\n",
        )
        .await
        .unwrap();

    let agent = h.chat.get_agent("OpenAIAgent").unwrap();
    let execution = h
        .engine
        .execute_named(&agent, "letter", &inputs(&[("body", "See you soon."), ("name", "Jo")]))
        .await
        .unwrap();
    assert_eq!(execution.result(), Some("See you soon. -- Jo"));

    let letter = h.engine.get_template("letter").await.unwrap().unwrap();
    assert_eq!(letter.inputs, vec!["body", "name"]);
}

#[tokio::test]
async fn helpers_use_the_chat_system() {
    let groq = ScriptedProvider::texts(&["Fine by me."]);
    let h = harness(ScriptedProvider::texts(&[]), groq.clone()).await;
    h.chat
        .add_participant(Participant::user("alice", "Alice"))
        .unwrap();

    let content = r#"
inputs:
  template: "{{#roster}} / {{#second_opinion draft}}"
helpers:
  roster: "def roster(): return str(nexus.get_participant_names())"
  second_opinion: |
    def second_opinion(text):
        other = nexus.get_agent("GroqAgent")
        return other.name + ": " + other.get_semantic_response("", text)
"#;
    let agent = h.chat.get_agent("OpenAIAgent").unwrap();
    let execution = h
        .engine
        .execute_template(&agent, content, &inputs(&[("draft", "Ship it?")]))
        .await
        .unwrap();

    assert_eq!(
        execution.iprompt.as_deref(),
        Some("GroqAgent, OpenAIAgent, Alice / GroqAgent: Fine by me.")
    );
    let requests = groq.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].messages[0].content, "Ship it?");
}

#[tokio::test]
async fn provider_timeout_surfaces_as_agent_timeout() {
    let openai = ScriptedProvider::new(vec![Err(ProviderError::Timeout("read timed out".into()))]);
    let h = harness(openai, ScriptedProvider::texts(&[])).await;

    let agent = h.chat.get_agent("OpenAIAgent").unwrap();
    let err = h
        .engine
        .execute_template(
            &agent,
            "inputs:\n  type: prompt\n  template: \"hello\"\n",
            &Context::new(),
        )
        .await
        .unwrap_err();

    match err {
        TemplateError::Agent(AgentError::Timeout { agent, .. }) => assert_eq!(agent, "OpenAIAgent"),
        other => panic!("expected agent timeout, got {other:?}"),
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn registry_rename_and_duplicate_rules() {
    let h = harness(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[])).await;

    h.engine.add_template("a", "inputs:\n  template: A\n").await.unwrap();
    h.engine.add_template("b", "inputs:\n  template: B\n").await.unwrap();

    let err = h.engine.add_template("a", "x").await.unwrap_err();
    assert!(matches!(err, TemplateError::Store(StoreError::Duplicate(_))));

    let err = h
        .engine
        .update_template("a", "b", "inputs:\n  template: A2\n")
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Store(StoreError::Duplicate(_))));

    h.engine
        .update_template("a", "c", "inputs:\n  x: 1\n  template: C\n")
        .await
        .unwrap();
    assert_eq!(h.engine.template_names().await.unwrap(), vec!["b", "c"]);
    assert_eq!(
        h.engine.get_template("c").await.unwrap().unwrap().inputs,
        vec!["x"]
    );

    assert_eq!(h.engine.delete_template("b").await.unwrap(), 1);
    assert_eq!(h.engine.delete_template("b").await.unwrap(), 0);
    assert_eq!(h.engine.template_names().await.unwrap(), vec!["c"]);
}

// ── Configuration ────────────────────────────────────────────────────────

#[tokio::test]
async fn configured_depth_limit_stops_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[templates]\nmax_depth = 2\nagent_timeout_secs = 5\n").unwrap();
    let config = AppConfig::load_from(&path).unwrap();

    let store = InMemoryTemplateStore::new();
    store
        .add(nexus_core::PromptTemplate::new(
            "loop",
            "inputs:\n  template: \"again {{>loop}}\"\n",
        ))
        .await
        .unwrap();

    let chat = Arc::new(ChatSystem::new(AgentManager::new(), ProfileManager::default()));
    let engine = TemplateEngine::from_config(&config.templates, Arc::new(store), chat);
    assert_eq!(engine.max_depth(), 2);
    assert_eq!(engine.agent_timeout().as_secs(), 5);

    struct Quiet;
    #[async_trait::async_trait]
    impl Agent for Quiet {
        fn name(&self) -> &str {
            "Quiet"
        }
        async fn get_semantic_response(&self, _: &str, _: &str) -> Result<String, AgentError> {
            Ok(String::new())
        }
    }
    let agent: Arc<dyn Agent> = Arc::new(Quiet);

    let err = engine
        .execute_named(&agent, "loop", &Context::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Recursion { ref name, max_depth: 2 } if name == "loop"
    ));
}

#[tokio::test]
async fn agents_join_the_roster_in_provider_order() {
    let h = harness(ScriptedProvider::texts(&[]), ScriptedProvider::texts(&[])).await;
    assert_eq!(h.chat.agent_names(), vec!["GroqAgent", "OpenAIAgent"]);
    assert_eq!(h.chat.profile_names(), vec!["Adam"]);
    assert!(
        h.chat
            .participants()
            .iter()
            .all(|p| !p.avatar.is_empty())
    );
}
