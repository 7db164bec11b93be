use std::time::{Duration, Instant};

use crate::config::ParsingConfig;

/// Size-proportional processing deadline for one extraction call.
///
/// Stages poll [`Budget::expired`] between segments; once it returns `true`
/// the remaining segments are treated as containing no mentions.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    /// Budget for an input of `len` bytes under `config`.
    pub fn for_input(len: usize, config: &ParsingConfig) -> Self {
        Self::with_limit(config.time_budget(len))
    }

    pub fn with_limit(limit: Option<Duration>) -> Self {
        Self {
            deadline: limit.map(|d| Instant::now() + d),
        }
    }

    pub fn unlimited() -> Self {
        Self { deadline: None }
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
