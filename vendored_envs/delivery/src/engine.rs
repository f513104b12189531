use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use crate::types::{Action, GridObservation, StepInfo, StepResult, Transition};

#[derive(Debug, Clone)]
pub struct DeliveryEnv {
    config: DeliveryConfig,
    rng: StdRng,
    seed: u64,
    pos: (i32, i32),
    carrying: bool,
    step_count: u32,
    done: bool,
    delivered_done: bool,
    last_transition: Option<Transition>,
    reward_last: f64,
    total_reward: f64,
}

impl DeliveryEnv {
    pub fn new(config: DeliveryConfig) -> Self {
        let seed = config.seed;
        let mut env = Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            seed,
            pos: (0, 0),
            carrying: false,
            step_count: 0,
            done: false,
            delivered_done: false,
            last_transition: None,
            reward_last: 0.0,
            total_reward: 0.0,
        };
        env.reset();
        env
    }

    /// Start a new episode. The carry bit of the returned observation is always 0.
    pub fn reset(&mut self) -> GridObservation {
        self.carrying = false;
        self.step_count = 0;
        self.done = false;
        self.delivered_done = false;
        self.last_transition = None;
        self.reward_last = 0.0;
        self.total_reward = 0.0;
        self.pos = self.start_position();
        tracing::debug!(x = self.pos.0, y = self.pos.1, "episode reset");
        GridObservation { x: self.pos.0, y: self.pos.1, carry: 0 }
    }

    fn start_position(&mut self) -> (i32, i32) {
        let (w, h) = (self.config.width, self.config.height);
        if !self.config.random_start {
            return (w / 2, h / 2);
        }
        let x = if w > 1 { self.rng.gen_range(1..w) } else { 0 };
        let y = if h > 0 { self.rng.gen_range(0..h) } else { 0 };
        (x, y)
    }

    /// Reseed the owned RNG. Takes effect on the next randomized reset.
    pub fn seed(&mut self, seed: u64) -> u64 {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        seed
    }

    pub fn step(&mut self, action: i64) -> Result<StepResult, DeliveryError> {
        let act = self.parse_action(action)?;
        if self.done {
            return Ok(StepResult { observation: self.observation(), reward: 0.0, done: true, info: StepInfo::default() });
        }

        let (dx, dy) = act.delta();
        self.pos = (
            clamp_axis(self.pos.0 + dx, self.config.width),
            clamp_axis(self.pos.1 + dy, self.config.height),
        );
        self.step_count += 1;

        let mut done = self.step_count >= self.config.max_steps;
        let mut reward = -1.0;
        let mut info = StepInfo::default();

        if self.pos == self.config.dropoff_cell() {
            if self.carrying {
                reward += self.config.delivery_reward;
                self.carrying = false;
                info.delivered = true;
                if self.config.done_on_delivery {
                    done = true;
                    self.delivered_done = true;
                }
            } else {
                reward += self.config.non_delivery_reward;
            }
        }
        if self.pos == self.config.pickup_cell() && !self.carrying {
            reward += self.config.pick_up_reward;
            self.carrying = true;
            info.picked_up = true;
        }

        self.done = done;
        self.reward_last = reward;
        self.total_reward += reward;
        self.last_transition = Some(Transition { action: act, reward, carrying: self.carrying });
        tracing::trace!(action = act.label(), x = self.pos.0, y = self.pos.1, reward, carrying = self.carrying, "step");
        if done {
            tracing::debug!(steps = self.step_count, total_reward = self.total_reward, delivered = self.delivered_done, "episode finished");
        }

        Ok(StepResult { observation: self.observation(), reward, done, info })
    }

    fn parse_action(&self, action: i64) -> Result<Action, DeliveryError> {
        if action < 0 || action as usize >= self.config.num_actions() {
            return Err(DeliveryError::InvalidAction(action));
        }
        Action::try_from(action)
    }

    pub fn observation(&self) -> GridObservation {
        let carry = u8::from(self.carrying && self.config.tell_carry_state);
        GridObservation { x: self.pos.0, y: self.pos.1, carry }
    }

    /// Occupancy grid, `[y][x]`, with a single 1 at the agent.
    pub fn grid(&self) -> Vec<Vec<u8>> {
        let w = self.config.width.max(0) as usize;
        let h = self.config.height.max(0) as usize;
        let mut grid = vec![vec![0u8; w]; h];
        if let Some(cell) = grid.get_mut(self.pos.1 as usize).and_then(|row| row.get_mut(self.pos.0 as usize)) {
            *cell = 1;
        }
        grid
    }

    pub fn render_text(&self) -> String {
        let mut s = String::new();
        for row in self.grid() {
            s.push('[');
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            s.push_str(&cells.join(" "));
            s.push_str("]\n");
        }
        let last = match self.last_transition {
            Some(t) => format!("{}, {}, {}", t.action.label(), t.reward, t.carrying),
            None => "None".to_string(),
        };
        s.push_str(&format!("({last}, Step - {})", self.step_count));
        s
    }

    /// Print the grid with the last transition and return it.
    pub fn render(&self) -> Vec<Vec<u8>> {
        println!("{}\n", self.render_text());
        self.grid()
    }

    pub fn config(&self) -> &DeliveryConfig { &self.config }
    pub fn name(&self) -> &'static str { "GridDelivery" }
    pub fn num_actions(&self) -> usize { self.config.num_actions() }
    pub fn num_states(&self) -> usize { self.config.num_states() }
    pub fn position(&self) -> (i32, i32) { self.pos }
    pub fn carrying(&self) -> bool { self.carrying }
    pub fn step_count(&self) -> u32 { self.step_count }
    pub fn current_seed(&self) -> u64 { self.seed }
    pub fn is_done(&self) -> bool { self.done }
    /// Ended early by a delivery rather than by the step cap.
    pub fn delivered_done(&self) -> bool { self.delivered_done }
    pub fn last_transition(&self) -> Option<Transition> { self.last_transition }
    pub fn reward_last(&self) -> f64 { self.reward_last }
    pub fn total_reward(&self) -> f64 { self.total_reward }
}

fn clamp_axis(v: i32, len: i32) -> i32 {
    v.min(len - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_axis_pulls_to_nearest_edge() {
        assert_eq!(clamp_axis(-1, 3), 0);
        assert_eq!(clamp_axis(3, 3), 2);
        assert_eq!(clamp_axis(1, 3), 1);
        assert_eq!(clamp_axis(1, 1), 0);
    }

    #[test]
    fn render_text_marks_agent_and_last_step() {
        let mut env = DeliveryEnv::new(DeliveryConfig::default());
        assert_eq!(env.render_text(), "[0 1 0]\n(None, Step - 0)");
        env.step(0).unwrap();
        assert_eq!(env.render_text(), "[0 0 1]\n(Right, -1, true, Step - 1)");
    }

    #[test]
    fn grid_has_one_marker() {
        let env = DeliveryEnv::new(DeliveryConfig { width: 4, height: 3, ..Default::default() });
        let grid = env.render();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].len(), 4);
        assert_eq!(grid.iter().flatten().filter(|&&c| c == 1).count(), 1);
        assert_eq!(grid[1][2], 1);
    }
}
