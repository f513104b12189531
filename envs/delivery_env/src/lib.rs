use async_trait::async_trait;
use delivery_rs::{Action, DeliveryConfig, DeliveryEnv, DeliveryError, StepInfo};
use env_core::{
    make_snapshot, register_environment_with_config, EngineError, Environment, Observation, ReproducibleEngine, Snapshot,
    ToolCall,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use std::sync::Arc;

pub const ENV_NAME: &str = "GridDelivery";

/// JSON-facing config; unset fields fall back to `DeliveryConfig::default()`.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub tell_carry_state: Option<bool>,
    pub random_start: Option<bool>,
    pub max_steps: Option<u32>,
    pub delivery_reward: Option<f64>,
    pub non_delivery_reward: Option<f64>,
    pub pick_up_reward: Option<f64>,
    pub done_on_delivery: Option<bool>,
    pub seed: Option<u64>,
}

impl Config {
    pub fn to_engine_config(&self) -> DeliveryConfig {
        let d = DeliveryConfig::default();
        DeliveryConfig {
            width: self.width.unwrap_or(d.width),
            height: self.height.unwrap_or(d.height),
            tell_carry_state: self.tell_carry_state.unwrap_or(d.tell_carry_state),
            random_start: self.random_start.unwrap_or(d.random_start),
            max_steps: self.max_steps.unwrap_or(d.max_steps),
            delivery_reward: self.delivery_reward.unwrap_or(d.delivery_reward),
            non_delivery_reward: self.non_delivery_reward.unwrap_or(d.non_delivery_reward),
            pick_up_reward: self.pick_up_reward.unwrap_or(d.pick_up_reward),
            done_on_delivery: self.done_on_delivery.unwrap_or(d.done_on_delivery),
            seed: self.seed.unwrap_or(d.seed),
        }
    }
}

fn map_delivery_err(err: DeliveryError) -> EngineError {
    EngineError::Validation(err.to_string())
}

fn action_arg(v: &Json) -> Result<i64, EngineError> {
    v.as_i64().ok_or_else(|| EngineError::Validation("actions entries must be integers".into()))
}

pub struct DeliveryEnvironment {
    env: DeliveryEnv,
    truncated: bool,
}

impl DeliveryEnvironment {
    pub fn new(cfg: Config) -> Result<Self, EngineError> {
        Ok(Self { env: DeliveryEnv::new(cfg.to_engine_config()), truncated: false })
    }

    pub fn engine(&self) -> &DeliveryEnv {
        &self.env
    }

    fn terminated(&self) -> bool {
        self.env.delivered_done()
    }

    fn truncated(&self) -> bool {
        self.truncated || (self.env.is_done() && !self.env.delivered_done())
    }

    fn snapshot_obs(&self, extra: Json) -> Observation {
        let obs = self.env.observation();
        let (x, y) = self.env.position();
        let carrying = if self.env.config().tell_carry_state { json!(self.env.carrying()) } else { Json::Null };
        let last_transition = self
            .env
            .last_transition()
            .map(|t| json!({"action": t.action.label(), "reward": t.reward, "carrying": t.carrying}))
            .unwrap_or(Json::Null);
        let terminated = self.terminated();
        let truncated = self.truncated();
        let public = json!({
            "observation": [obs.x, obs.y, obs.carry],
            "position": [x, y],
            "carrying": carrying,
            "step_count": self.env.step_count(),
            "max_steps": self.env.config().max_steps,
            "num_actions": self.env.num_actions(),
            "last_transition": last_transition,
            "terminated": terminated,
            "truncated": truncated,
            "extra": extra,
            "reward_last": self.env.reward_last(),
            "total_reward": self.env.total_reward(),
        });
        Observation { terminated, truncated, data: public }
    }

    fn apply(&mut self, action: i64) -> Result<StepInfo, EngineError> {
        let out = self.env.step(action).map_err(map_delivery_err)?;
        Ok(out.info)
    }

    fn interact(&mut self, args: &Json) -> Result<Observation, EngineError> {
        let mut infos = Vec::new();
        if let Some(a) = args.get("action").and_then(|v| v.as_i64()) {
            infos.push(self.apply(a)?);
        } else if let Some(arr) = args.get("actions").and_then(|v| v.as_array()) {
            // Validate the whole batch up front so a bad entry leaves state untouched.
            let actions = arr.iter().map(action_arg).collect::<Result<Vec<_>, _>>()?;
            if let Some(&bad) = actions.iter().find(|&&a| a < 0 || a as usize >= self.env.num_actions()) {
                return Err(map_delivery_err(DeliveryError::InvalidAction(bad)));
            }
            for a in actions {
                infos.push(self.apply(a)?);
                if self.env.is_done() {
                    break;
                }
            }
        } else if let Some(d) = args.get("direction").and_then(|v| v.as_str()) {
            let act = Action::from_label(d).ok_or_else(|| EngineError::Validation(format!("invalid direction '{d}'")))?;
            infos.push(self.apply(act as i64)?);
        } else {
            return Err(EngineError::Validation("missing 'action', 'actions' or 'direction'".into()));
        }
        let picked_up = infos.iter().any(|i| i.picked_up);
        let delivered = infos.iter().any(|i| i.delivered);
        Ok(self.snapshot_obs(json!({"steps_applied": infos.len(), "picked_up": picked_up, "delivered": delivered})))
    }
}

impl ReproducibleEngine for DeliveryEnvironment {
    fn serialize_engine(&self) -> Result<Json, EngineError> {
        let (x, y) = self.env.position();
        let config = serde_json::to_value(self.env.config()).map_err(|e| EngineError::Internal(e.to_string()))?;
        let last = serde_json::to_value(self.env.last_transition()).map_err(|e| EngineError::Internal(e.to_string()))?;
        Ok(json!({
            "config": config,
            "seed": self.env.current_seed(),
            "position": [x, y],
            "carrying": self.env.carrying(),
            "step_count": self.env.step_count(),
            "done": self.env.is_done(),
            "last_transition": last,
            "reward_last": self.env.reward_last(),
            "total_reward": self.env.total_reward(),
        }))
    }

    fn engine_name(&self) -> String {
        "grid_delivery".into()
    }
}

#[async_trait]
impl Environment for DeliveryEnvironment {
    async fn initialize(&mut self) -> Result<Observation, EngineError> {
        self.env.reset();
        self.truncated = false;
        Ok(self.snapshot_obs(json!({"event": "initialize"})))
    }

    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError> {
        let call = tool_calls
            .first()
            .ok_or_else(|| EngineError::Validation("no tool_calls provided".into()))?;
        match call.tool.as_str() {
            "interact" | "move" => self.interact(&call.args),
            "reset" => {
                self.env.reset();
                self.truncated = false;
                Ok(self.snapshot_obs(json!({"event": "reset"})))
            }
            "seed" => {
                let seed = call
                    .args
                    .get("seed")
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| EngineError::Validation("missing seed".into()))?;
                let seed = self.env.seed(seed);
                Ok(self.snapshot_obs(json!({"seed": seed})))
            }
            "render" => Ok(self.snapshot_obs(json!({"render": self.env.render_text(), "grid": self.env.grid()}))),
            _ => Err(EngineError::Validation(format!("unknown tool: {}", call.tool))),
        }
    }

    async fn checkpoint(&self) -> Result<Snapshot, EngineError> {
        make_snapshot(self, 1)
    }

    async fn terminate(&mut self) -> Result<Observation, EngineError> {
        self.truncated = !self.terminated();
        tracing::debug!(steps = self.env.step_count(), "delivery environment terminated");
        Ok(self.snapshot_obs(json!({"event": "terminate"})))
    }
}

// Registration helper for registry-based construction
pub fn register_default_env() {
    register_environment_with_config(
        ENV_NAME,
        Arc::new(|cfg: Option<Json>| -> Result<Box<dyn Environment>, EngineError> {
            let cfg: Config = match cfg {
                Some(v) => serde_json::from_value(v).map_err(|e| EngineError::Validation(format!("bad config: {e}")))?,
                None => Config::default(),
            };
            Ok(Box::new(DeliveryEnvironment::new(cfg)?))
        }),
    );
}
