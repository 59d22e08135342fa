//! Script interpreter
//!
//! [`Interpreter`] binds one input of a transaction to the curve, the fork
//! rules and the resource limits, then evaluates scripts against it:
//!
//! 1. Execute scriptSig on an empty stack
//! 2. Execute the previous output's scriptPubKey on the result; top must be true
//! 3. Witness programs (BIP141) run their witness script
//! 4. Pay-to-script-hash outputs (BIP16) run the serialized redeem script
//! 5. A witness nothing consumed is rejected

use log::{debug, trace};

use crate::config::ScriptLimits;
use crate::constants::*;
use crate::ec::Curve;
use crate::error::{ConsensusError, ResourceLimit, VerifyError, VerifyResult};
use crate::fork::ForkRules;
use crate::hash::{hash160, ripemd160, sha1, sha256, sha256d};
use crate::opcodes::Opcode;
use crate::script::{
    encode_push, find_and_delete, is_pay_script_hash_pattern, is_push_only,
    to_pay_key_hash_pattern, witness_program, Instructions, Operation,
};
use crate::sighash::{signature_hash, ScriptVersion, SighashType};
use crate::signature::{is_strict_der, parse_signature, verify_signature};
use crate::stack::{cast_to_bool, Stack};
use crate::types::*;

/// Per-evaluation state of a single script.
struct Frame<'s> {
    script: &'s [u8],
    version: ScriptVersion,
    stack: &'s mut Stack,
    alt: Stack,
    conditions: Vec<bool>,
    op_count: usize,
    code_start: usize,
}

impl Frame<'_> {
    fn executing(&self) -> bool {
        !self.conditions.contains(&false)
    }

    /// Script code for signature checks: everything after the last executed OP_CODESEPARATOR.
    fn script_code(&self) -> &[u8] {
        &self.script[self.code_start..]
    }
}

/// Verifier for input `input_index` of `tx`.
pub struct Interpreter<'a> {
    curve: &'a Curve,
    tx: &'a Transaction,
    input_index: usize,
    amount: u64,
    rules: ForkRules,
    limits: &'a ScriptLimits,
}

impl<'a> Interpreter<'a> {
    /// `amount` is the value of the output being spent.
    pub fn new(
        curve: &'a Curve,
        tx: &'a Transaction,
        input_index: usize,
        amount: u64,
        rules: ForkRules,
        limits: &'a ScriptLimits,
    ) -> VerifyResult<Self> {
        if input_index >= tx.inputs.len() {
            return Err(ConsensusError::IndexOutOfRange(input_index).into());
        }
        Ok(Interpreter {
            curve,
            tx,
            input_index,
            amount,
            rules,
            limits,
        })
    }

    fn input(&self) -> &'a TransactionInput {
        &self.tx.inputs[self.input_index]
    }

    /// Verify the input against the locking script of the output it spends.
    pub fn verify(&self, script_pubkey: &[u8]) -> VerifyResult<()> {
        let result = self.verify_script(script_pubkey);
        match &result {
            Ok(()) => debug!("input {} verified under {:?}", self.input_index, self.rules),
            Err(e) => debug!("input {} rejected under {:?}: {}", self.input_index, self.rules, e),
        }
        result
    }

    fn verify_script(&self, script_pubkey: &[u8]) -> VerifyResult<()> {
        let script_sig = &self.input().script_sig;
        let witness = &self.input().witness;
        let mut witness_consumed = false;

        let mut stack = Stack::new();
        self.eval_script(script_sig, &mut stack, ScriptVersion::Unversioned)?;
        let p2sh_stack = self.rules.contains(ForkRules::BIP16).then(|| stack.clone());

        self.eval_script(script_pubkey, &mut stack, ScriptVersion::Unversioned)?;
        require_true(&stack)?;

        if self.rules.contains(ForkRules::BIP141) {
            if let Some((version, program)) = witness_program(script_pubkey) {
                witness_consumed = true;
                if !script_sig.is_empty() {
                    return Err(VerifyError::WitnessMalleated);
                }
                self.verify_witness_program(version, program, witness)?;
            }
        }

        if let Some(mut stack) = p2sh_stack.filter(|_| is_pay_script_hash_pattern(script_pubkey)) {
            if !is_push_only(script_sig) {
                return Err(VerifyError::SigPushOnly);
            }
            let redeem = stack.pop()?;
            self.eval_script(&redeem, &mut stack, ScriptVersion::Unversioned)?;
            require_true(&stack)?;

            if self.rules.contains(ForkRules::BIP141) {
                if let Some((version, program)) = witness_program(&redeem) {
                    witness_consumed = true;
                    if *script_sig != encode_push(&redeem) {
                        return Err(VerifyError::WitnessMalleatedP2sh);
                    }
                    self.verify_witness_program(version, program, witness)?;
                }
            }
        }

        if !witness_consumed && !witness.is_empty() {
            return Err(VerifyError::UnexpectedWitness);
        }
        Ok(())
    }

    /// Run a witness program with its witness.
    ///
    /// Version 0 takes a 32-byte script hash or a 20-byte key hash; other
    /// versions are reserved for future soft forks and succeed.
    pub fn verify_witness_program(
        &self,
        version: u8,
        program: &[u8],
        witness: &[ByteString],
    ) -> VerifyResult<()> {
        if version != 0 {
            trace!("witness version {} accepted without evaluation", version);
            return Ok(());
        }
        if witness.is_empty() {
            return Err(VerifyError::MissingWitness);
        }

        let (script, items) = match program.len() {
            32 => {
                let (script, items) = witness.split_last().ok_or(VerifyError::MissingWitness)?;
                if sha256(script)[..] != *program {
                    return Err(VerifyError::WitnessProgramMismatch);
                }
                (script.clone(), items.to_vec())
            }
            20 => {
                if witness.len() != 2 {
                    return Err(VerifyError::WitnessProgramMismatch);
                }
                let mut hash = [0u8; 20];
                hash.copy_from_slice(program);
                (to_pay_key_hash_pattern(&hash), witness.to_vec())
            }
            _ => return Err(VerifyError::WitnessProgramWrongLength),
        };
        trace!(
            "witness v0 program ({} bytes) with {} stack items",
            program.len(),
            items.len()
        );

        if items.iter().any(|item| item.len() > self.limits.max_element_size) {
            return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::PushSize));
        }

        let version = if self.rules.contains(ForkRules::BIP143) {
            ScriptVersion::Zero
        } else {
            ScriptVersion::Unversioned
        };
        let mut stack = Stack::from(items);
        self.eval_script(&script, &mut stack, version)?;

        if stack.len() != 1 {
            return Err(VerifyError::CleanStack);
        }
        require_true(&stack)
    }

    /// Execute `script` on `stack`.
    pub fn eval_script(
        &self,
        script: &[u8],
        stack: &mut Stack,
        version: ScriptVersion,
    ) -> VerifyResult<()> {
        if script.len() > self.limits.max_script_size {
            return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::ScriptSize));
        }

        let mut frame = Frame {
            script,
            version,
            stack,
            alt: Stack::new(),
            conditions: Vec::new(),
            op_count: 0,
            code_start: 0,
        };

        for item in Instructions::new(script) {
            let (end, operation) = item?;
            self.step(&mut frame, operation, end)?;
            if frame.stack.len() + frame.alt.len() > self.limits.max_stack_size {
                return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::StackSize));
            }
        }

        if !frame.conditions.is_empty() {
            return Err(VerifyError::UnbalancedConditional);
        }
        Ok(())
    }

    fn step(&self, frame: &mut Frame<'_>, operation: Operation, end: usize) -> VerifyResult<()> {
        let executing = frame.executing();
        let opcode = match operation {
            Operation::Push { data, .. } => {
                if data.len() > self.limits.max_element_size {
                    return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::PushSize));
                }
                if executing {
                    frame.stack.push(data);
                }
                return Ok(());
            }
            Operation::Code(opcode) => opcode,
        };

        if opcode.is_counted() {
            frame.op_count += 1;
            if frame.op_count > self.limits.max_ops_per_script {
                return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::OpCount));
            }
        }
        if opcode.is_disabled() {
            return Err(VerifyError::DisabledOpcode(opcode.to_u8()));
        }
        let always = opcode.is_conditional() || matches!(opcode, Opcode::VerIf | Opcode::VerNotIf);
        if !executing && !always {
            return Ok(());
        }

        let stack = &mut *frame.stack;
        match opcode {
            Opcode::PushNegative1 => stack.push_num(-1),
            Opcode::PushPositive(n) => stack.push_num(i64::from(n)),

            Opcode::Nop
            | Opcode::Nop1
            | Opcode::Nop4
            | Opcode::Nop5
            | Opcode::Nop6
            | Opcode::Nop7
            | Opcode::Nop8
            | Opcode::Nop9
            | Opcode::Nop10 => {}

            Opcode::CheckLockTimeVerify => {
                if self.rules.contains(ForkRules::BIP65) {
                    let lock_time = stack.peek_num(0, MAX_LOCKTIME_NUM_SIZE)?;
                    if lock_time < 0 {
                        return Err(VerifyError::NegativeLockTime);
                    }
                    if !self.check_lock_time(lock_time) {
                        return Err(VerifyError::UnsatisfiedLockTime);
                    }
                }
            }
            Opcode::CheckSequenceVerify => {
                if self.rules.contains(ForkRules::BIP112) {
                    let sequence = stack.peek_num(0, MAX_LOCKTIME_NUM_SIZE)?;
                    if sequence < 0 {
                        return Err(VerifyError::NegativeLockTime);
                    }
                    if sequence & i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) == 0
                        && !self.check_sequence(sequence)
                    {
                        return Err(VerifyError::UnsatisfiedLockTime);
                    }
                }
            }

            Opcode::If | Opcode::NotIf => {
                let mut value = false;
                if executing {
                    value = stack.pop_bool()?;
                    if opcode == Opcode::NotIf {
                        value = !value;
                    }
                }
                frame.conditions.push(value);
            }
            Opcode::Else => {
                let last = frame
                    .conditions
                    .last_mut()
                    .ok_or(VerifyError::UnbalancedConditional)?;
                *last = !*last;
            }
            Opcode::EndIf => {
                frame
                    .conditions
                    .pop()
                    .ok_or(VerifyError::UnbalancedConditional)?;
            }
            Opcode::Verify => {
                if !stack.pop_bool()? {
                    return Err(VerifyError::VerifyFailed);
                }
            }
            Opcode::Return => return Err(VerifyError::OpReturn),

            Opcode::ToAltStack => {
                let item = stack.pop()?;
                frame.alt.push(item);
            }
            Opcode::FromAltStack => {
                let item = frame
                    .alt
                    .pop()
                    .map_err(|_| VerifyError::InvalidAltStackOperation)?;
                stack.push(item);
            }
            Opcode::Drop2 => stack.truncate_top(2)?,
            Opcode::Dup2 => stack.dup_top(2)?,
            Opcode::Dup3 => stack.dup_top(3)?,
            Opcode::Over2 => {
                // x1 x2 x3 x4 -> x1 x2 x3 x4 x1 x2
                stack.require(4)?;
                let x1 = stack.peek(3)?.clone();
                let x2 = stack.peek(2)?.clone();
                stack.push(x1);
                stack.push(x2);
            }
            Opcode::Rot2 => {
                // x1 x2 x3 x4 x5 x6 -> x3 x4 x5 x6 x1 x2
                stack.require(6)?;
                let x1 = stack.remove(5)?;
                let x2 = stack.remove(4)?;
                stack.push(x1);
                stack.push(x2);
            }
            Opcode::Swap2 => {
                // x1 x2 x3 x4 -> x3 x4 x1 x2
                stack.require(4)?;
                stack.swap(3, 1)?;
                stack.swap(2, 0)?;
            }
            Opcode::IfDup => {
                let top = stack.top()?.clone();
                if cast_to_bool(&top) {
                    stack.push(top);
                }
            }
            Opcode::Depth => {
                let depth = stack.len() as i64;
                stack.push_num(depth);
            }
            Opcode::Drop => {
                stack.pop()?;
            }
            Opcode::Dup => stack.dup_top(1)?,
            Opcode::Nip => {
                stack.remove(1)?;
            }
            Opcode::Over => {
                let item = stack.peek(1)?.clone();
                stack.push(item);
            }
            Opcode::Pick | Opcode::Roll => {
                stack.require(2)?;
                let n = stack.pop_num(MAX_SCRIPT_NUM_SIZE)?;
                if n < 0 || n as usize >= stack.len() {
                    return Err(VerifyError::InvalidStackOperation);
                }
                let item = if opcode == Opcode::Pick {
                    stack.peek(n as usize)?.clone()
                } else {
                    stack.remove(n as usize)?
                };
                stack.push(item);
            }
            Opcode::Rot => {
                // x1 x2 x3 -> x2 x3 x1
                let x1 = stack.remove(2)?;
                stack.push(x1);
            }
            Opcode::Swap => stack.swap(0, 1)?,
            Opcode::Tuck => {
                // x1 x2 -> x2 x1 x2
                stack.require(2)?;
                let top = stack.top()?.clone();
                stack.insert(2, top)?;
            }

            Opcode::Size => {
                let size = stack.top()?.len() as i64;
                stack.push_num(size);
            }

            Opcode::Equal | Opcode::EqualVerify => {
                stack.require(2)?;
                let b = stack.pop()?;
                let a = stack.pop()?;
                let equal = a == b;
                if opcode == Opcode::EqualVerify {
                    if !equal {
                        return Err(VerifyError::EqualVerify);
                    }
                } else {
                    stack.push_bool(equal);
                }
            }

            Opcode::Add1
            | Opcode::Sub1
            | Opcode::Negate
            | Opcode::Abs
            | Opcode::Not
            | Opcode::NotEqual0 => {
                let n = stack.pop_num(MAX_SCRIPT_NUM_SIZE)?;
                let result = match opcode {
                    Opcode::Add1 => n + 1,
                    Opcode::Sub1 => n - 1,
                    Opcode::Negate => -n,
                    Opcode::Abs => n.abs(),
                    Opcode::Not => i64::from(n == 0),
                    _ => i64::from(n != 0),
                };
                stack.push_num(result);
            }

            Opcode::Add
            | Opcode::Sub
            | Opcode::BoolAnd
            | Opcode::BoolOr
            | Opcode::NumEqual
            | Opcode::NumEqualVerify
            | Opcode::NumNotEqual
            | Opcode::LessThan
            | Opcode::GreaterThan
            | Opcode::LessThanOrEqual
            | Opcode::GreaterThanOrEqual
            | Opcode::Min
            | Opcode::Max => {
                stack.require(2)?;
                let a = stack.peek_num(1, MAX_SCRIPT_NUM_SIZE)?;
                let b = stack.peek_num(0, MAX_SCRIPT_NUM_SIZE)?;
                stack.truncate_top(2)?;
                let result = match opcode {
                    Opcode::Add => a + b,
                    Opcode::Sub => a - b,
                    Opcode::BoolAnd => i64::from(a != 0 && b != 0),
                    Opcode::BoolOr => i64::from(a != 0 || b != 0),
                    Opcode::NumEqual | Opcode::NumEqualVerify => i64::from(a == b),
                    Opcode::NumNotEqual => i64::from(a != b),
                    Opcode::LessThan => i64::from(a < b),
                    Opcode::GreaterThan => i64::from(a > b),
                    Opcode::LessThanOrEqual => i64::from(a <= b),
                    Opcode::GreaterThanOrEqual => i64::from(a >= b),
                    Opcode::Min => a.min(b),
                    _ => a.max(b),
                };
                if opcode == Opcode::NumEqualVerify {
                    if result == 0 {
                        return Err(VerifyError::NumEqualVerify);
                    }
                } else {
                    stack.push_num(result);
                }
            }
            Opcode::Within => {
                stack.require(3)?;
                let x = stack.peek_num(2, MAX_SCRIPT_NUM_SIZE)?;
                let min = stack.peek_num(1, MAX_SCRIPT_NUM_SIZE)?;
                let max = stack.peek_num(0, MAX_SCRIPT_NUM_SIZE)?;
                stack.truncate_top(3)?;
                stack.push_bool(min <= x && x < max);
            }

            Opcode::Ripemd160 => {
                let item = stack.pop()?;
                stack.push(ripemd160(&item).to_vec());
            }
            Opcode::Sha1 => {
                let item = stack.pop()?;
                stack.push(sha1(&item).to_vec());
            }
            Opcode::Sha256 => {
                let item = stack.pop()?;
                stack.push(sha256(&item).to_vec());
            }
            Opcode::Hash160 => {
                let item = stack.pop()?;
                stack.push(hash160(&item).to_vec());
            }
            Opcode::Hash256 => {
                let item = stack.pop()?;
                stack.push(sha256d(&item).to_vec());
            }
            Opcode::CodeSeparator => frame.code_start = end,

            Opcode::CheckSig | Opcode::CheckSigVerify => {
                stack.require(2)?;
                let public_key = stack.pop()?;
                let endorsement = stack.pop()?;
                let mut script_code = frame.script[frame.code_start..].to_vec();
                if frame.version == ScriptVersion::Unversioned {
                    script_code = find_and_delete(&script_code, &encode_push(&endorsement)).0;
                }
                let valid =
                    self.check_signature(&endorsement, &public_key, &script_code, frame.version)?;
                if opcode == Opcode::CheckSigVerify {
                    if !valid {
                        return Err(VerifyError::IncorrectSignature);
                    }
                } else {
                    stack.push_bool(valid);
                }
            }
            Opcode::CheckMultisig | Opcode::CheckMultisigVerify => {
                let valid = self.check_multisig(frame)?;
                if opcode == Opcode::CheckMultisigVerify {
                    if !valid {
                        return Err(VerifyError::IncorrectSignature);
                    }
                } else {
                    frame.stack.push_bool(valid);
                }
            }

            Opcode::PushSize0
            | Opcode::PushBytes(_)
            | Opcode::PushData1
            | Opcode::PushData2
            | Opcode::PushData4 => {
                // Pushes arrive as Operation::Push
                return Err(VerifyError::BadOpcode(opcode.to_u8()));
            }

            Opcode::Reserved
            | Opcode::Ver
            | Opcode::VerIf
            | Opcode::VerNotIf
            | Opcode::Reserved1
            | Opcode::Reserved2
            | Opcode::Invalid(_) => return Err(VerifyError::BadOpcode(opcode.to_u8())),

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
            | Opcode::RShift => return Err(VerifyError::DisabledOpcode(opcode.to_u8())),
        }
        Ok(())
    }

    /// CHECKMULTISIG stack layout, top first:
    /// n <key_n..key_1> m <sig_m..sig_1> dummy
    fn check_multisig(&self, frame: &mut Frame<'_>) -> VerifyResult<bool> {
        let stack = &*frame.stack;
        let mut i = 1;
        stack.require(i)?;

        let key_count = stack.peek_num(i - 1, MAX_SCRIPT_NUM_SIZE)?;
        if key_count < 0 || key_count as usize > self.limits.max_pubkeys_per_multisig {
            return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::PubkeyCount));
        }
        let mut keys_left = key_count as usize;
        frame.op_count += keys_left;
        if frame.op_count > self.limits.max_ops_per_script {
            return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::OpCount));
        }
        i += 1;
        let mut key_depth = i;
        i += keys_left;
        stack.require(i)?;

        let sig_count = stack.peek_num(i - 1, MAX_SCRIPT_NUM_SIZE)?;
        if sig_count < 0 || sig_count as usize > keys_left {
            return Err(VerifyError::ResourceLimitExceeded(ResourceLimit::SigCount));
        }
        let mut sigs_left = sig_count as usize;
        i += 1;
        let mut sig_depth = i;
        i += sigs_left;
        stack.require(i)?;

        let mut script_code = frame.script_code().to_vec();
        if frame.version == ScriptVersion::Unversioned {
            for k in 0..sigs_left {
                let endorsement = stack.peek(sig_depth + k - 1)?;
                script_code = find_and_delete(&script_code, &encode_push(endorsement)).0;
            }
        }

        let mut success = true;
        while success && sigs_left > 0 {
            let endorsement = stack.peek(sig_depth - 1)?;
            let public_key = stack.peek(key_depth - 1)?;
            if self.check_signature(endorsement, public_key, &script_code, frame.version)? {
                sig_depth += 1;
                sigs_left -= 1;
            }
            key_depth += 1;
            keys_left -= 1;
            if sigs_left > keys_left {
                success = false;
            }
        }

        // Everything but the dummy
        frame.stack.truncate_top(i - 1)?;
        let dummy = frame.stack.pop()?;
        if self.rules.contains(ForkRules::BIP147) && !dummy.is_empty() {
            return Err(VerifyError::NullDummy);
        }
        Ok(success)
    }

    /// Check one endorsement (DER ‖ flag) against a public key.
    ///
    /// An empty endorsement is a failed check; under BIP66 a non-canonical
    /// encoding is an error.
    fn check_signature(
        &self,
        endorsement: &[u8],
        public_key: &[u8],
        script_code: &[u8],
        version: ScriptVersion,
    ) -> VerifyResult<bool> {
        let Some((&flag, der)) = endorsement.split_last() else {
            return Ok(false);
        };
        if self.rules.contains(ForkRules::BIP66) && !is_strict_der(der) {
            return Err(VerifyError::MalformedSignature);
        }
        let Ok(signature) = parse_signature(der, false) else {
            return Ok(false);
        };
        let hash = signature_hash(
            self.tx,
            self.input_index,
            script_code,
            self.amount,
            SighashType::from_u8(flag),
            version,
        )?;
        Ok(verify_signature(self.curve, public_key, &hash, &signature))
    }

    /// BIP65 comparison of the operand against the transaction lock time.
    fn check_lock_time(&self, lock_time: i64) -> bool {
        let tx_lock_time = i64::from(self.tx.lock_time);
        let threshold = i64::from(LOCKTIME_THRESHOLD);
        let same_kind = (tx_lock_time < threshold && lock_time < threshold)
            || (tx_lock_time >= threshold && lock_time >= threshold);
        if !same_kind || lock_time > tx_lock_time {
            return false;
        }
        self.input().sequence != SEQUENCE_FINAL
    }

    /// BIP112 comparison of the operand against the input's relative lock.
    fn check_sequence(&self, sequence: i64) -> bool {
        let tx_sequence = i64::from(self.input().sequence);
        if self.tx.version < 2 {
            return false;
        }
        if tx_sequence & i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
            return false;
        }
        let mask = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG | SEQUENCE_LOCKTIME_MASK);
        let type_flag = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG);
        let tx_masked = tx_sequence & mask;
        let masked = sequence & mask;
        let same_kind =
            (tx_masked < type_flag && masked < type_flag) || (tx_masked >= type_flag && masked >= type_flag);
        same_kind && masked <= tx_masked
    }
}

fn require_true(stack: &Stack) -> VerifyResult<()> {
    match stack.top() {
        Ok(top) if cast_to_bool(top) => Ok(()),
        _ => Err(VerifyError::StackFalse),
    }
}
