//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EigenError, Result};
use crate::types::{DEFAULT_EIG_TOL, DEFAULT_MAX_LANCZOS_VECS, DEFAULT_NUM_EIGVALS};

/// Tolerances and subspace limits for the Lanczos solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenConfig {
    /// Maximum number of Lanczos vectors (Krylov subspace size).
    pub max_lanczos_vecs: usize,
    /// Number of eigenpairs nearest sigma that must converge.
    pub num_eigvals: usize,
    /// Relative residual tolerance ‖Ku − λBu‖ / ‖Ku‖.
    pub eig_tol: f64,
    /// Seed for the random start vector. `None` uses a fixed default.
    pub seed: Option<u64>,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self {
            max_lanczos_vecs: DEFAULT_MAX_LANCZOS_VECS,
            num_eigvals: DEFAULT_NUM_EIGVALS,
            eig_tol: DEFAULT_EIG_TOL,
            seed: None,
        }
    }
}

impl EigenConfig {
    pub fn new(max_lanczos_vecs: usize, num_eigvals: usize, eig_tol: f64) -> Self {
        Self {
            max_lanczos_vecs,
            num_eigvals,
            eig_tol,
            seed: None,
        }
    }

    pub fn with_max_lanczos_vecs(mut self, max_lanczos_vecs: usize) -> Self {
        self.max_lanczos_vecs = max_lanczos_vecs;
        self
    }

    pub fn with_num_eigvals(mut self, num_eigvals: usize) -> Self {
        self.num_eigvals = num_eigvals;
        self
    }

    pub fn with_eig_tol(mut self, eig_tol: f64) -> Self {
        self.eig_tol = eig_tol;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the limits are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_lanczos_vecs == 0 {
            return Err(EigenError::InvalidConfig(
                "max_lanczos_vecs must be at least 1".into(),
            ));
        }
        if self.num_eigvals == 0 {
            return Err(EigenError::InvalidConfig(
                "num_eigvals must be at least 1".into(),
            ));
        }
        if self.num_eigvals > self.max_lanczos_vecs {
            return Err(EigenError::InvalidConfig(format!(
                "num_eigvals ({}) exceeds max_lanczos_vecs ({})",
                self.num_eigvals, self.max_lanczos_vecs
            )));
        }
        if !(self.eig_tol.is_finite() && self.eig_tol > 0.0) {
            return Err(EigenError::InvalidConfig(format!(
                "eig_tol must be positive and finite, got {}",
                self.eig_tol
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EigenConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_more_eigenvalues_than_vectors() {
        let config = EigenConfig::new(3, 4, 1e-8);
        assert!(matches!(
            config.validate(),
            Err(EigenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        assert!(EigenConfig::new(10, 2, 0.0).validate().is_err());
        assert!(EigenConfig::new(10, 2, f64::NAN).validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = EigenConfig::from_json(r#"{"num_eigvals": 3, "seed": 7}"#).unwrap();
        assert_eq!(config.num_eigvals, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_lanczos_vecs, DEFAULT_MAX_LANCZOS_VECS);

        let back = EigenConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn json_rejects_invalid_values() {
        assert!(EigenConfig::from_json(r#"{"max_lanczos_vecs": 0}"#).is_err());
        assert!(EigenConfig::from_json("not json").is_err());
    }
}
