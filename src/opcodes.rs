//! Script opcodes
//!
//! Every byte value maps to exactly one [`Opcode`]. Direct pushes
//! (0x01..=0x4b), small integers (OP_1..OP_16) and undefined bytes carry their
//! payload in the variant; everything else is a named variant.

use std::fmt;

macro_rules! opcodes {
    ($($variant:ident => $constant:ident = $byte:literal, $mnemonic:literal;)*) => {
        $(pub const $constant: u8 = $byte;)*

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            /// Push the next n bytes (0x01..=0x4b).
            PushBytes(u8),
            /// Push the number n (OP_1..OP_16).
            PushPositive(u8),
            /// Byte with no assigned meaning (0xba..=0xff).
            Invalid(u8),
            $($variant,)*
        }

        impl Opcode {
            pub fn from_u8(byte: u8) -> Opcode {
                match byte {
                    $($constant => Opcode::$variant,)*
                    0x01..=0x4b => Opcode::PushBytes(byte),
                    0x51..=0x60 => Opcode::PushPositive(byte - 0x50),
                    _ => Opcode::Invalid(byte),
                }
            }

            pub fn to_u8(self) -> u8 {
                match self {
                    $(Opcode::$variant => $constant,)*
                    Opcode::PushBytes(n) => n,
                    Opcode::PushPositive(n) => n + 0x50,
                    Opcode::Invalid(byte) => byte,
                }
            }

            pub fn mnemonic(self) -> String {
                match self {
                    $(Opcode::$variant => $mnemonic.to_string(),)*
                    Opcode::PushBytes(n) => format!("push_{}", n),
                    Opcode::PushPositive(n) => n.to_string(),
                    Opcode::Invalid(byte) => format!("invalid_{:02x}", byte),
                }
            }
        }
    };
}

opcodes! {
    PushSize0 => OP_0 = 0x00, "zero";
    PushData1 => OP_PUSHDATA1 = 0x4c, "pushdata1";
    PushData2 => OP_PUSHDATA2 = 0x4d, "pushdata2";
    PushData4 => OP_PUSHDATA4 = 0x4e, "pushdata4";
    PushNegative1 => OP_1NEGATE = 0x4f, "-1";
    Reserved => OP_RESERVED = 0x50, "reserved";
    Nop => OP_NOP = 0x61, "nop";
    Ver => OP_VER = 0x62, "ver";
    If => OP_IF = 0x63, "if";
    NotIf => OP_NOTIF = 0x64, "notif";
    VerIf => OP_VERIF = 0x65, "verif";
    VerNotIf => OP_VERNOTIF = 0x66, "vernotif";
    Else => OP_ELSE = 0x67, "else";
    EndIf => OP_ENDIF = 0x68, "endif";
    Verify => OP_VERIFY = 0x69, "verify";
    Return => OP_RETURN = 0x6a, "return";
    ToAltStack => OP_TOALTSTACK = 0x6b, "toaltstack";
    FromAltStack => OP_FROMALTSTACK = 0x6c, "fromaltstack";
    Drop2 => OP_2DROP = 0x6d, "drop2";
    Dup2 => OP_2DUP = 0x6e, "dup2";
    Dup3 => OP_3DUP = 0x6f, "dup3";
    Over2 => OP_2OVER = 0x70, "over2";
    Rot2 => OP_2ROT = 0x71, "rot2";
    Swap2 => OP_2SWAP = 0x72, "swap2";
    IfDup => OP_IFDUP = 0x73, "ifdup";
    Depth => OP_DEPTH = 0x74, "depth";
    Drop => OP_DROP = 0x75, "drop";
    Dup => OP_DUP = 0x76, "dup";
    Nip => OP_NIP = 0x77, "nip";
    Over => OP_OVER = 0x78, "over";
    Pick => OP_PICK = 0x79, "pick";
    Roll => OP_ROLL = 0x7a, "roll";
    Rot => OP_ROT = 0x7b, "rot";
    Swap => OP_SWAP = 0x7c, "swap";
    Tuck => OP_TUCK = 0x7d, "tuck";
    Cat => OP_CAT = 0x7e, "cat";
    Substr => OP_SUBSTR = 0x7f, "substr";
    Left => OP_LEFT = 0x80, "left";
    Right => OP_RIGHT = 0x81, "right";
    Size => OP_SIZE = 0x82, "size";
    Invert => OP_INVERT = 0x83, "invert";
    And => OP_AND = 0x84, "and";
    Or => OP_OR = 0x85, "or";
    Xor => OP_XOR = 0x86, "xor";
    Equal => OP_EQUAL = 0x87, "equal";
    EqualVerify => OP_EQUALVERIFY = 0x88, "equalverify";
    Reserved1 => OP_RESERVED1 = 0x89, "reserved1";
    Reserved2 => OP_RESERVED2 = 0x8a, "reserved2";
    Add1 => OP_1ADD = 0x8b, "add1";
    Sub1 => OP_1SUB = 0x8c, "sub1";
    Mul2 => OP_2MUL = 0x8d, "mul2";
    Div2 => OP_2DIV = 0x8e, "div2";
    Negate => OP_NEGATE = 0x8f, "negate";
    Abs => OP_ABS = 0x90, "abs";
    Not => OP_NOT = 0x91, "not";
    NotEqual0 => OP_0NOTEQUAL = 0x92, "nonzero";
    Add => OP_ADD = 0x93, "add";
    Sub => OP_SUB = 0x94, "sub";
    Mul => OP_MUL = 0x95, "mul";
    Div => OP_DIV = 0x96, "div";
    Mod => OP_MOD = 0x97, "mod";
    LShift => OP_LSHIFT = 0x98, "lshift";
    RShift => OP_RSHIFT = 0x99, "rshift";
    BoolAnd => OP_BOOLAND = 0x9a, "booland";
    BoolOr => OP_BOOLOR = 0x9b, "boolor";
    NumEqual => OP_NUMEQUAL = 0x9c, "numequal";
    NumEqualVerify => OP_NUMEQUALVERIFY = 0x9d, "numequalverify";
    NumNotEqual => OP_NUMNOTEQUAL = 0x9e, "numnotequal";
    LessThan => OP_LESSTHAN = 0x9f, "lessthan";
    GreaterThan => OP_GREATERTHAN = 0xa0, "greaterthan";
    LessThanOrEqual => OP_LESSTHANOREQUAL = 0xa1, "lessthanorequal";
    GreaterThanOrEqual => OP_GREATERTHANOREQUAL = 0xa2, "greaterthanorequal";
    Min => OP_MIN = 0xa3, "min";
    Max => OP_MAX = 0xa4, "max";
    Within => OP_WITHIN = 0xa5, "within";
    Ripemd160 => OP_RIPEMD160 = 0xa6, "ripemd160";
    Sha1 => OP_SHA1 = 0xa7, "sha1";
    Sha256 => OP_SHA256 = 0xa8, "sha256";
    Hash160 => OP_HASH160 = 0xa9, "hash160";
    Hash256 => OP_HASH256 = 0xaa, "hash256";
    CodeSeparator => OP_CODESEPARATOR = 0xab, "codeseparator";
    CheckSig => OP_CHECKSIG = 0xac, "checksig";
    CheckSigVerify => OP_CHECKSIGVERIFY = 0xad, "checksigverify";
    CheckMultisig => OP_CHECKMULTISIG = 0xae, "checkmultisig";
    CheckMultisigVerify => OP_CHECKMULTISIGVERIFY = 0xaf, "checkmultisigverify";
    Nop1 => OP_NOP1 = 0xb0, "nop1";
    CheckLockTimeVerify => OP_CHECKLOCKTIMEVERIFY = 0xb1, "checklocktimeverify";
    CheckSequenceVerify => OP_CHECKSEQUENCEVERIFY = 0xb2, "checksequenceverify";
    Nop4 => OP_NOP4 = 0xb3, "nop4";
    Nop5 => OP_NOP5 = 0xb4, "nop5";
    Nop6 => OP_NOP6 = 0xb5, "nop6";
    Nop7 => OP_NOP7 = 0xb6, "nop7";
    Nop8 => OP_NOP8 = 0xb7, "nop8";
    Nop9 => OP_NOP9 = 0xb8, "nop9";
    Nop10 => OP_NOP10 = 0xb9, "nop10";
}

pub const OP_FALSE: u8 = OP_0;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_16: u8 = 0x60;
pub const OP_NOP2: u8 = OP_CHECKLOCKTIMEVERIFY;
pub const OP_NOP3: u8 = OP_CHECKSEQUENCEVERIFY;

impl Opcode {
    /// OP_n for 1 ≤ n ≤ 16.
    pub fn from_small_int(n: u8) -> Option<Opcode> {
        (1..=16).contains(&n).then_some(Opcode::PushPositive(n))
    }

    /// Value pushed by OP_0, OP_1NEGATE and OP_1..OP_16.
    pub fn small_int(self) -> Option<i64> {
        match self {
            Opcode::PushSize0 => Some(0),
            Opcode::PushNegative1 => Some(-1),
            Opcode::PushPositive(n) => Some(i64::from(n)),
            _ => None,
        }
    }

    /// Opcodes up to and including OP_16 are pushes (OP_RESERVED included).
    pub fn is_push(self) -> bool {
        self.to_u8() <= OP_16
    }

    /// Counted against the per-script operation limit.
    pub fn is_counted(self) -> bool {
        self.to_u8() > OP_16
    }

    /// Disabled opcodes fail a script even inside an unexecuted branch.
    pub fn is_disabled(self) -> bool {
        matches!(
            self,
            Opcode::Cat
                | Opcode::Substr
                | Opcode::Left
                | Opcode::Right
                | Opcode::Invert
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::Mul2
                | Opcode::Div2
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::LShift
                | Opcode::RShift
        )
    }

    /// Flow control opcodes are interpreted even inside an unexecuted branch.
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            Opcode::If | Opcode::NotIf | Opcode::Else | Opcode::EndIf
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        Opcode::from_u8(byte)
    }
}
