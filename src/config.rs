//! Configuration for script-consensus
//!
//! Resource ceilings for the interpreter, the default fork-rule set, and
//! whether a transaction's inputs are verified in parallel. Settings can be
//! built programmatically, parsed from JSON, or read from environment
//! variables. Defaults match Bitcoin consensus.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::fork::ForkRules;

/// Interpreter resource limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLimits {
    /// Maximum script length in bytes (consensus: 10,000)
    #[serde(default = "default_max_script_size")]
    pub max_script_size: usize,

    /// Maximum size of a pushed element (consensus: 520)
    #[serde(default = "default_max_element_size")]
    pub max_element_size: usize,

    /// Maximum non-push operations per script (consensus: 201)
    #[serde(default = "default_max_ops_per_script")]
    pub max_ops_per_script: usize,

    /// Maximum combined main + alt stack depth (consensus: 1,000)
    #[serde(default = "default_max_stack_size")]
    pub max_stack_size: usize,

    /// Maximum keys in a CHECKMULTISIG (consensus: 20)
    #[serde(default = "default_max_pubkeys_per_multisig")]
    pub max_pubkeys_per_multisig: usize,
}

fn default_max_script_size() -> usize {
    MAX_SCRIPT_SIZE
}

fn default_max_element_size() -> usize {
    MAX_SCRIPT_ELEMENT_SIZE
}

fn default_max_ops_per_script() -> usize {
    MAX_SCRIPT_OPS
}

fn default_max_stack_size() -> usize {
    MAX_STACK_SIZE
}

fn default_max_pubkeys_per_multisig() -> usize {
    MAX_PUBKEYS_PER_MULTISIG
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_script_size: MAX_SCRIPT_SIZE,
            max_element_size: MAX_SCRIPT_ELEMENT_SIZE,
            max_ops_per_script: MAX_SCRIPT_OPS,
            max_stack_size: MAX_STACK_SIZE,
            max_pubkeys_per_multisig: MAX_PUBKEYS_PER_MULTISIG,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub limits: ScriptLimits,

    /// Rules used when the caller does not pass its own
    #[serde(default = "default_rules")]
    pub default_rules: ForkRules,

    /// Verify the inputs of one transaction on the rayon thread pool
    #[serde(default)]
    pub parallel_verification: bool,
}

fn default_rules() -> ForkRules {
    ForkRules::ALL_RULES
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ScriptLimits::default(),
            default_rules: ForkRules::ALL_RULES,
            parallel_verification: false,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ConsensusError::Configuration(e.to_string().into()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConsensusError::Configuration(e.to_string().into()))
    }

    /// Load from `SCRIPT_CONSENSUS_*` environment variables over the defaults.
    ///
    /// Unparseable values are ignored; the resulting limits are validated.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup using the same variable names as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let usize_var = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(v) = usize_var("SCRIPT_CONSENSUS_MAX_SCRIPT_SIZE") {
            config.limits.max_script_size = v;
        }
        if let Some(v) = usize_var("SCRIPT_CONSENSUS_MAX_ELEMENT_SIZE") {
            config.limits.max_element_size = v;
        }
        if let Some(v) = usize_var("SCRIPT_CONSENSUS_MAX_OPS_PER_SCRIPT") {
            config.limits.max_ops_per_script = v;
        }
        if let Some(v) = usize_var("SCRIPT_CONSENSUS_MAX_STACK_SIZE") {
            config.limits.max_stack_size = v;
        }
        if let Some(v) = usize_var("SCRIPT_CONSENSUS_MAX_PUBKEYS_PER_MULTISIG") {
            config.limits.max_pubkeys_per_multisig = v;
        }

        // Comma separated rule names, e.g. "bip16,bip141,bip143"
        if let Some(names) = lookup("SCRIPT_CONSENSUS_RULES") {
            let parsed: Option<Vec<ForkRules>> =
                names.split(',').filter(|n| !n.trim().is_empty()).map(ForkRules::from_name).collect();
            if let Some(rules) = parsed {
                config.default_rules = rules
                    .into_iter()
                    .fold(ForkRules::NO_RULES, |acc, rule| acc | rule);
            }
        }

        if let Some(v) = lookup("SCRIPT_CONSENSUS_PARALLEL_VERIFICATION") {
            if let Ok(enabled) = v.trim().parse::<bool>() {
                config.parallel_verification = enabled;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make every script fail.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_script_size == 0
            || limits.max_element_size == 0
            || limits.max_stack_size == 0
        {
            return Err(ConsensusError::Configuration(
                "Script, element and stack limits must be non-zero".into(),
            ));
        }
        if limits.max_pubkeys_per_multisig > i32::MAX as usize {
            return Err(ConsensusError::Configuration(
                "Multisig key limit out of range".into(),
            ));
        }
        Ok(())
    }
}
