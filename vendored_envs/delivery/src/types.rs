use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Right = 0,
    Left = 1,
    Down = 2,
    Up = 3,
}

impl TryFrom<i64> for Action {
    type Error = DeliveryError;
    fn try_from(v: i64) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Action::Right,
            1 => Action::Left,
            2 => Action::Down,
            3 => Action::Up,
            _ => return Err(DeliveryError::InvalidAction(v)),
        })
    }
}

impl Action {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Right => (1, 0),
            Action::Left => (-1, 0),
            Action::Down => (0, 1),
            Action::Up => (0, -1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Right => "Right",
            Action::Left => "Left",
            Action::Down => "Down",
            Action::Up => "Up",
        }
    }

    pub fn from_label(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "right" => Some(Action::Right),
            "left" => Some(Action::Left),
            "down" => Some(Action::Down),
            "up" => Some(Action::Up),
            _ => None,
        }
    }
}

/// What the agent sees: position plus the carry bit (0 unless exposed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridObservation {
    pub x: i32,
    pub y: i32,
    pub carry: u8,
}

impl GridObservation {
    pub fn as_tuple(self) -> (i32, i32, u8) {
        (self.x, self.y, self.carry)
    }
}

/// Last step as recorded for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub action: Action,
    pub reward: f64,
    pub carrying: bool,
}

/// Auxiliary step details; nothing in the transition depends on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub picked_up: bool,
    pub delivered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: GridObservation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}
