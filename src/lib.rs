//! # Script-Consensus
//!
//! Bitcoin script verification with the cryptography it depends on.
//!
//! This crate provides pure, synchronous functions for secp256k1 arithmetic,
//! ECDSA signatures and their DER encoding, the transaction wire format,
//! legacy and BIP143 signature hashing, and the script interpreter that ties
//! them together under a caller-chosen set of soft-fork rules.
//!
//! ## Architecture
//!
//! - `ec`, `signature`, `hash`: curve math, signatures, digests
//! - `types`, `serialization`, `transaction`, `segwit`: transaction model
//! - `sighash`: the digest a signature commits to
//! - `opcodes`, `script`, `stack`, `interpreter`: script execution
//! - `fork`, `config`: which rules apply and with what limits
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: No I/O, no global state; the secp256k1 context is an explicit value
//! 2. **Typed Failures**: Every rejected script carries a [`VerifyError`] saying why
//! 3. **Exact Version Pinning**: Consensus-critical dependencies are pinned to exact versions
//! 4. **Rules as Data**: Soft forks are bits in a [`ForkRules`] mask, never global flags
//!
//! ## Usage
//!
//! ```rust
//! use script_consensus::ScriptConsensus;
//! use script_consensus::fork::ForkRules;
//! use script_consensus::types::*;
//!
//! let consensus = ScriptConsensus::new();
//! let tx = Transaction {
//!     version: 1,
//!     inputs: vec![TransactionInput {
//!         prevout: OutPoint { hash: [1; 32], index: 0 },
//!         script_sig: vec![0x51], // OP_1
//!         witness: vec![],
//!         sequence: 0xffffffff,
//!     }],
//!     outputs: vec![TransactionOutput {
//!         value: 1000,
//!         script_pubkey: vec![0x51],
//!     }],
//!     lock_time: 0,
//! };
//! let prevout = Prevout { script_pubkey: vec![0x51, 0x87], value: 2000 }; // OP_1 OP_EQUAL
//! assert!(consensus.verify_input(&tx, 0, &prevout, ForkRules::ALL_RULES).is_ok());
//! ```

pub mod commitment;
pub mod config;
pub mod constants;
pub mod ec;
pub mod error;
pub mod fork;
pub mod hash;
pub mod interpreter;
pub mod opcodes;
pub mod script;
pub mod segwit;
pub mod serialization;
pub mod sighash;
pub mod signature;
pub mod stack;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use config::{EngineConfig, ScriptLimits};
pub use constants::*;
pub use ec::Curve;
pub use error::{ConsensusError, ResourceLimit, Result, VerifyError, VerifyResult};
pub use fork::ForkRules;
pub use interpreter::Interpreter;
pub use sighash::{ScriptVersion, SighashType};
pub use types::*;

use log::debug;
use rayon::prelude::*;

use crate::ec::EcSecret;

/// Script verification engine
///
/// Owns the secp256k1 context and the engine configuration. Both are
/// read-only after construction, so one instance can serve many threads.
///
/// # Examples
///
/// ```
/// use script_consensus::{EngineConfig, ScriptConsensus};
///
/// let consensus = ScriptConsensus::with_config(EngineConfig {
///     parallel_verification: true,
///     ..EngineConfig::default()
/// })
/// .unwrap();
/// assert!(consensus.config().parallel_verification);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptConsensus {
    curve: Curve,
    config: EngineConfig,
}

impl ScriptConsensus {
    /// Create an engine with consensus-default limits and all rules active
    ///
    /// # Examples
    ///
    /// ```
    /// use script_consensus::{ForkRules, ScriptConsensus};
    ///
    /// let consensus = ScriptConsensus::new();
    /// assert_eq!(consensus.rules(), ForkRules::ALL_RULES);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from `config`, rejecting limits that would fail every script
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            curve: Curve::new(),
            config,
        })
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rules configured as the engine default
    pub fn rules(&self) -> ForkRules {
        self.config.default_rules
    }

    /// Structural transaction checks (non-empty, value ranges, size)
    ///
    /// # Examples
    ///
    /// ```
    /// use script_consensus::ScriptConsensus;
    /// use script_consensus::types::*;
    ///
    /// let consensus = ScriptConsensus::new();
    /// let tx = Transaction {
    ///     version: 1,
    ///     inputs: vec![],
    ///     outputs: vec![TransactionOutput { value: 1000, script_pubkey: vec![0x51] }],
    ///     lock_time: 0,
    /// };
    /// let result = consensus.validate_transaction(&tx).unwrap();
    /// assert!(matches!(result, ValidationResult::Invalid(_)));
    /// ```
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<ValidationResult> {
        transaction::check_transaction(tx)
    }

    /// Verify input `index` of `tx` against the output it spends
    ///
    /// # Examples
    ///
    /// ```
    /// use script_consensus::{ForkRules, ScriptConsensus, VerifyError};
    /// use script_consensus::types::*;
    ///
    /// let consensus = ScriptConsensus::new();
    /// let tx = Transaction {
    ///     version: 1,
    ///     inputs: vec![TransactionInput {
    ///         prevout: OutPoint { hash: [1; 32], index: 0 },
    ///         script_sig: vec![0x00], // OP_0
    ///         witness: vec![],
    ///         sequence: 0xffffffff,
    ///     }],
    ///     outputs: vec![TransactionOutput { value: 1000, script_pubkey: vec![] }],
    ///     lock_time: 0,
    /// };
    /// let prevout = Prevout { script_pubkey: vec![], value: 1000 };
    /// assert_eq!(
    ///     consensus.verify_input(&tx, 0, &prevout, ForkRules::ALL_RULES),
    ///     Err(VerifyError::StackFalse)
    /// );
    /// ```
    pub fn verify_input(
        &self,
        tx: &Transaction,
        index: usize,
        prevout: &Prevout,
        rules: ForkRules,
    ) -> VerifyResult<()> {
        let interpreter = Interpreter::new(
            &self.curve,
            tx,
            index,
            prevout.value,
            rules,
            &self.config.limits,
        )?;
        interpreter.verify(&prevout.script_pubkey)
    }

    /// Verify every input of `tx`; `prevouts[i]` is the output spent by input `i`
    ///
    /// Returns the failure of the lowest-indexed failing input. With
    /// `parallel_verification` set, inputs are checked on the rayon thread pool.
    pub fn verify_transaction(
        &self,
        tx: &Transaction,
        prevouts: &[Prevout],
        rules: ForkRules,
    ) -> VerifyResult<()> {
        if prevouts.len() != tx.inputs.len() {
            return Err(
                ConsensusError::InvalidPrevoutsCount(tx.inputs.len(), prevouts.len()).into(),
            );
        }

        if !self.config.parallel_verification || prevouts.len() < 2 {
            for (index, prevout) in prevouts.iter().enumerate() {
                self.verify_input(tx, index, prevout, rules)?;
            }
            return Ok(());
        }

        debug!("verifying {} inputs in parallel", prevouts.len());
        let results: Vec<VerifyResult<()>> = prevouts
            .par_iter()
            .enumerate()
            .map(|(index, prevout)| self.verify_input(tx, index, prevout, rules))
            .collect();
        results.into_iter().collect()
    }

    /// Digest signed by input `index`
    ///
    /// # Examples
    ///
    /// ```
    /// use script_consensus::{ScriptConsensus, ScriptVersion, SighashType};
    /// use script_consensus::types::*;
    ///
    /// let consensus = ScriptConsensus::new();
    /// let tx = Transaction {
    ///     version: 1,
    ///     inputs: vec![TransactionInput {
    ///         prevout: OutPoint { hash: [1; 32], index: 0 },
    ///         script_sig: vec![],
    ///         witness: vec![],
    ///         sequence: 0xffffffff,
    ///     }],
    ///     outputs: vec![],
    ///     lock_time: 0,
    /// };
    /// // SIGHASH_SINGLE without a matching output signs the constant one-hash
    /// let hash = consensus
    ///     .signature_hash(&tx, 0, &[0x51], 0, SighashType::SINGLE, ScriptVersion::Unversioned)
    ///     .unwrap();
    /// assert_eq!(hash[0], 1);
    /// ```
    pub fn signature_hash(
        &self,
        tx: &Transaction,
        index: usize,
        script_code: &[u8],
        amount: u64,
        flag: SighashType,
        version: ScriptVersion,
    ) -> Result<Hash> {
        sighash::signature_hash(tx, index, script_code, amount, flag, version)
    }

    /// Sign input `index` and return DER signature ‖ flag
    #[allow(clippy::too_many_arguments)]
    pub fn create_endorsement(
        &self,
        secret: &EcSecret,
        tx: &Transaction,
        index: usize,
        script_code: &[u8],
        flag: SighashType,
        version: ScriptVersion,
        amount: u64,
    ) -> Result<ByteString> {
        sighash::create_endorsement(
            &self.curve,
            secret,
            tx,
            index,
            script_code,
            flag,
            version,
            amount,
        )
    }
}
