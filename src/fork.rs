//! Activatable consensus rules
//!
//! A [`ForkRules`] value is a read-only bit-set. A rule whose bit is clear is
//! evaluated with its pre-activation behavior.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct ForkRules(u32);

impl ForkRules {
    /// No rules active; scripts are evaluated as before any soft fork.
    pub const NO_RULES: ForkRules = ForkRules(0);

    /// Pay-to-script-hash evaluation.
    pub const BIP16: ForkRules = ForkRules(1 << 0);

    /// OP_CHECKLOCKTIMEVERIFY replaces OP_NOP2.
    pub const BIP65: ForkRules = ForkRules(1 << 1);

    /// Strict DER signature encoding.
    pub const BIP66: ForkRules = ForkRules(1 << 2);

    /// OP_CHECKSEQUENCEVERIFY replaces OP_NOP3.
    pub const BIP112: ForkRules = ForkRules(1 << 3);

    /// Segregated witness program evaluation.
    pub const BIP141: ForkRules = ForkRules(1 << 4);

    /// Witness version 0 signature hashing.
    pub const BIP143: ForkRules = ForkRules(1 << 5);

    /// CHECKMULTISIG dummy element must be empty.
    pub const BIP147: ForkRules = ForkRules(1 << 6);

    pub const ALL_RULES: ForkRules = ForkRules(
        Self::BIP16.0
            | Self::BIP65.0
            | Self::BIP66.0
            | Self::BIP112.0
            | Self::BIP141.0
            | Self::BIP143.0
            | Self::BIP147.0,
    );

    const NAMES: [(ForkRules, &'static str); 7] = [
        (Self::BIP16, "bip16"),
        (Self::BIP65, "bip65"),
        (Self::BIP66, "bip66"),
        (Self::BIP112, "bip112"),
        (Self::BIP141, "bip141"),
        (Self::BIP143, "bip143"),
        (Self::BIP147, "bip147"),
    ];

    /// Build from raw bits, discarding bits that name no rule.
    pub const fn from_bits(bits: u32) -> Self {
        ForkRules(bits & Self::ALL_RULES.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every rule in `other` is active.
    pub const fn contains(self, other: ForkRules) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: ForkRules) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ForkRules) {
        self.0 &= !other.0;
    }

    /// Copy of `self` with `other` cleared.
    pub const fn without(self, other: ForkRules) -> Self {
        ForkRules(self.0 & !other.0)
    }

    /// Look up a single rule by its lowercase name (e.g. `"bip141"`).
    pub fn from_name(name: &str) -> Option<ForkRules> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "all" | "all_rules" => Some(Self::ALL_RULES),
            "none" | "no_rules" => Some(Self::NO_RULES),
            _ => Self::NAMES
                .iter()
                .find(|(_, n)| *n == name)
                .map(|(rule, _)| *rule),
        }
    }
}

impl From<u32> for ForkRules {
    fn from(bits: u32) -> Self {
        Self::from_bits(bits)
    }
}

impl From<ForkRules> for u32 {
    fn from(rules: ForkRules) -> u32 {
        rules.0
    }
}

impl BitOr for ForkRules {
    type Output = ForkRules;
    fn bitor(self, rhs: ForkRules) -> ForkRules {
        ForkRules(self.0 | rhs.0)
    }
}

impl BitAnd for ForkRules {
    type Output = ForkRules;
    fn bitand(self, rhs: ForkRules) -> ForkRules {
        ForkRules(self.0 & rhs.0)
    }
}

impl BitXor for ForkRules {
    type Output = ForkRules;
    fn bitxor(self, rhs: ForkRules) -> ForkRules {
        ForkRules(self.0 ^ rhs.0)
    }
}

impl Not for ForkRules {
    type Output = ForkRules;
    fn not(self) -> ForkRules {
        ForkRules(!self.0 & Self::ALL_RULES.0)
    }
}

impl fmt::Debug for ForkRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(rule, _)| self.contains(*rule))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "ForkRules({})", active.join(" | "))
    }
}
