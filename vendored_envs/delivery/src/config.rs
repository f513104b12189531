use serde::{Deserialize, Serialize};

/// Construction parameters. Values are trusted; nothing here is validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub width: i32,
    /// `1` gives a corridor with two actions, anything larger a grid with four.
    pub height: i32,
    /// Expose the carrying flag as the third observation component.
    pub tell_carry_state: bool,
    pub random_start: bool,
    pub max_steps: u32,
    pub delivery_reward: f64,
    pub non_delivery_reward: f64,
    pub pick_up_reward: f64,
    pub done_on_delivery: bool,
    pub seed: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            width: 3,
            height: 1,
            tell_carry_state: true,
            random_start: false,
            max_steps: 50,
            delivery_reward: 21.0,
            non_delivery_reward: 0.0,
            pick_up_reward: 0.0,
            done_on_delivery: false,
            seed: 10,
        }
    }
}

impl DeliveryConfig {
    pub fn num_actions(&self) -> usize {
        if self.height > 1 { 4 } else { 2 }
    }

    pub fn num_states(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Row shared by the pickup and drop-off cells.
    pub fn cargo_row(&self) -> i32 {
        self.height / 2
    }

    pub fn pickup_cell(&self) -> (i32, i32) {
        (self.width - 1, self.cargo_row())
    }

    pub fn dropoff_cell(&self) -> (i32, i32) {
        (0, self.cargo_row())
    }
}
