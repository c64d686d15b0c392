//! Epsilon-greedy exploration.
use deepq_core::error::DeepqError;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over the first
/// `final_step` environment steps and stays at `eps_final` afterwards.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at step 0.
    pub eps_start: f64,

    /// Epsilon after `final_step` steps.
    pub eps_final: f64,

    /// Number of environment steps of the decay.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.1,
            final_step: 1_000_000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new(eps_start: f64, eps_final: f64, final_step: usize) -> Self {
        Self {
            eps_start,
            eps_final,
            final_step,
        }
    }

    /// Returns epsilon at the given environment step.
    pub fn epsilon(&self, step: usize) -> f64 {
        if step >= self.final_step {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / self.final_step as f64;
        (self.eps_start - d * step as f64).max(self.eps_final)
    }

    /// Checks that epsilon decays within `[0, 1]`.
    pub fn validate(&self) -> Result<(), DeepqError> {
        if !(0.0..=1.0).contains(&self.eps_final) || !(0.0..=1.0).contains(&self.eps_start) {
            return Err(DeepqError::InvalidConfig(format!(
                "eps_start ({}) and eps_final ({}) must be in [0, 1]",
                self.eps_start, self.eps_final
            )));
        }
        if self.eps_start < self.eps_final {
            return Err(DeepqError::InvalidConfig(format!(
                "eps_start ({}) must not be less than eps_final ({})",
                self.eps_start, self.eps_final
            )));
        }
        Ok(())
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the number of steps of the decay.
    pub fn final_step(mut self, v: usize) -> Self {
        self.final_step = v;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsilon_schedule() {
        let explorer = EpsilonGreedy::new(1.0, 0.1, 1000);
        assert_eq!(explorer.epsilon(0), 1.0);
        assert!((explorer.epsilon(500) - 0.55).abs() < 1e-12);
        assert_eq!(explorer.epsilon(1000), 0.1);
        assert_eq!(explorer.epsilon(1001), 0.1);
        assert_eq!(explorer.epsilon(1_000_000), 0.1);

        let mut prev = explorer.epsilon(0);
        for step in 1..1200 {
            let eps = explorer.epsilon(step);
            assert!(eps <= prev);
            prev = eps;
        }
    }

    #[test]
    fn test_validate() {
        assert!(EpsilonGreedy::default().validate().is_ok());
        assert!(EpsilonGreedy::new(0.0, 0.0, 10).validate().is_ok());
        assert!(EpsilonGreedy::new(0.1, 1.0, 10).validate().is_err());
        assert!(EpsilonGreedy::new(1.5, 0.1, 10).validate().is_err());
        assert!(EpsilonGreedy::new(1.0, -0.1, 10).validate().is_err());
    }

    #[test]
    fn test_zero_decay_steps() {
        let explorer = EpsilonGreedy::new(1.0, 0.05, 0);
        assert_eq!(explorer.epsilon(0), 0.05);
    }
}
