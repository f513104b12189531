//! Environment contract shared by the delivery adapter and the HTTP service.
//! Defines ToolCall, Observation, Snapshot, the async Environment trait and a
//! name-keyed factory registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Canonical tool call: tool name and JSON-serializable arguments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Json,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Json) -> Self {
        Self { tool: tool.into(), args }
    }
}

/// Observation contract. Enforces presence of terminated/truncated; additional fields live in `data`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub terminated: bool,
    pub truncated: bool,
    #[serde(default)]
    pub data: Json,
}

impl Observation {
    pub fn is_final(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Snapshot contract for checkpointing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub engine: String,
    pub data: Json,
}

/// Environment errors mapped to HTTP responses by services.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Core async environment trait.
#[async_trait]
pub trait Environment: Send + Sync {
    async fn initialize(&mut self) -> Result<Observation, EngineError>;
    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError>;
    async fn checkpoint(&self) -> Result<Snapshot, EngineError>;
    async fn terminate(&mut self) -> Result<Observation, EngineError>;
}

// ---------------------------------
// Environment factory + registry
// ---------------------------------

/// Config-aware factory for constructing environment instances.
pub type EnvConfigFactory = Arc<dyn Fn(Option<Json>) -> Result<Box<dyn Environment>, EngineError> + Send + Sync + 'static>;

static ENV_REGISTRY: OnceLock<Mutex<HashMap<String, EnvConfigFactory>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, EnvConfigFactory>> {
    ENV_REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register an environment factory that ignores config.
pub fn register_environment(name: &str, factory: Arc<dyn Fn() -> Box<dyn Environment> + Send + Sync + 'static>) {
    let f: EnvConfigFactory = Arc::new(move |_cfg: Option<Json>| Ok::<_, EngineError>(factory()));
    register_environment_with_config(name, f);
}

/// Register a config-aware environment factory under a unique name. Overwrites any existing entry.
pub fn register_environment_with_config(name: &str, factory: EnvConfigFactory) {
    let mut reg = match registry().lock() {
        Ok(reg) => reg,
        Err(poisoned) => poisoned.into_inner(),
    };
    reg.insert(name.to_string(), factory);
}

/// Instantiate a registered environment by name with optional JSON config.
pub fn create_environment_with_config(name: &str, config: Option<Json>) -> Result<Box<dyn Environment>, EngineError> {
    let f = {
        let reg = registry()
            .lock()
            .map_err(|_| EngineError::Internal("env registry poisoned".into()))?;
        reg.get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("unsupported environment: {name}")))?
    };
    f(config)
}

/// Instantiate a registered environment by name with no config.
pub fn create_environment(name: &str) -> Result<Box<dyn Environment>, EngineError> {
    create_environment_with_config(name, None)
}

/// List registered environment names, sorted.
pub fn list_environments() -> Vec<String> {
    let mut names: Vec<String> = registry()
        .lock()
        .map(|reg| reg.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

// -----------------------
// Reproducibility traits
// -----------------------

/// Engines whose state can be serialized into a snapshot.
pub trait ReproducibleEngine: Send + Sync {
    fn serialize_engine(&self) -> Result<Json, EngineError>;
    fn engine_name(&self) -> String;
}

/// Helper to build Snapshots from a ReproducibleEngine.
pub fn make_snapshot(engine: &dyn ReproducibleEngine, version: u32) -> Result<Snapshot, EngineError> {
    let data = engine.serialize_engine()?;
    Ok(Snapshot { version, engine: engine.engine_name(), data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NopEnv;
    #[async_trait]
    impl Environment for NopEnv {
        async fn initialize(&mut self) -> Result<Observation, EngineError> { Ok(Observation { terminated: false, truncated: false, data: Json::Null }) }
        async fn step(&mut self, _tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError> { Ok(Observation { terminated: false, truncated: false, data: Json::Null }) }
        async fn checkpoint(&self) -> Result<Snapshot, EngineError> { Ok(Snapshot { version: 1, engine: "nop".into(), data: Json::Null }) }
        async fn terminate(&mut self) -> Result<Observation, EngineError> { Ok(Observation { terminated: true, truncated: false, data: Json::Null }) }
    }

    struct CounterEngine(u32);
    impl ReproducibleEngine for CounterEngine {
        fn serialize_engine(&self) -> Result<Json, EngineError> { Ok(json!({"count": self.0})) }
        fn engine_name(&self) -> String { "counter".into() }
    }

    #[tokio::test]
    async fn env_registry_registers_and_creates() {
        register_environment("nop", Arc::new(|| Box::new(NopEnv) as Box<dyn Environment>));
        assert!(list_environments().contains(&"nop".to_string()));
        let mut env = create_environment("nop").unwrap();
        assert!(!env.initialize().await.unwrap().is_final());
        assert!(env.terminate().await.unwrap().is_final());
    }

    #[test]
    fn unknown_environment_is_not_found() {
        let err = create_environment("does-not-exist").err().unwrap();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn make_snapshot_wraps_engine_state() {
        let snap = make_snapshot(&CounterEngine(3), 2).unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.engine, "counter");
        assert_eq!(snap.data["count"], 3);
    }

    #[test]
    fn tool_call_args_default_to_null() {
        let call: ToolCall = serde_json::from_str(r#"{"tool":"reset"}"#).unwrap();
        assert_eq!(call, ToolCall::new("reset", Json::Null));
    }
}
