use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Action index outside the configured discrete action space.
    #[error("unknown action {0}")]
    InvalidAction(i64),
}
