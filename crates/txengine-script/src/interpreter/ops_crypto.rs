//! Hashing and signature-checking opcodes.

use sha1::{Digest, Sha1};
use txengine_primitives::ec::{check_der_encoding, PublicKey, Signature};
use txengine_primitives::hash::{hash160, ripemd160, sha256, sha256d};

use crate::opcodes::*;

use super::error::{InterpreterError, InterpreterErrorCode};
use super::flags::ScriptFlags;
use super::parsed_opcode::ParsedOpcode;
use super::thread::Thread;
use super::TxContext;

const SIGHASH_FORKID: u32 = 0x40;
const SIGHASH_ANYONECANPAY: u32 = 0x80;

impl<'a> Thread<'a> {
    pub(crate) fn exec_crypto(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        match pop.opcode {
            OP_RIPEMD160 | OP_SHA1 | OP_SHA256 | OP_HASH160 | OP_HASH256 => {
                let buf = self.dstack.pop_byte_array()?;
                let digest = match pop.opcode {
                    OP_RIPEMD160 => ripemd160(&buf).to_vec(),
                    OP_SHA1 => Sha1::digest(&buf).to_vec(),
                    OP_SHA256 => sha256(&buf).to_vec(),
                    OP_HASH160 => hash160(&buf).to_vec(),
                    _ => sha256d(&buf).to_vec(),
                };
                self.dstack.push_byte_array(digest);
                Ok(())
            }
            OP_CODESEPARATOR => {
                self.on_code_separator();
                Ok(())
            }
            OP_CHECKSIG => self.op_checksig(pop),
            OP_CHECKSIGVERIFY => {
                self.op_checksig(pop)?;
                self.abstract_verify(pop, InterpreterErrorCode::CheckSigVerify)
            }
            OP_CHECKMULTISIG => self.op_checkmultisig(pop),
            OP_CHECKMULTISIGVERIFY => {
                self.op_checkmultisig(pop)?;
                self.abstract_verify(pop, InterpreterErrorCode::CheckMultiSigVerify)
            }
            _ => Err(Self::unhandled(pop)),
        }
    }

    pub(crate) fn require_tx_context(
        &self,
        pop: &ParsedOpcode,
    ) -> Result<&'a dyn TxContext, InterpreterError> {
        self.tx_context.ok_or_else(|| {
            InterpreterError::new(
                InterpreterErrorCode::MissingTxContext,
                format!("{} needs a transaction context", pop.name()),
            )
        })
    }

    /// Whether a signature with this sighash byte uses the FORKID digest.
    fn uses_forkid(&self, full_sig: &[u8]) -> bool {
        self.has_flag(ScriptFlags::ENABLE_SIGHASH_FORKID)
            && full_sig
                .last()
                .is_some_and(|&b| (b as u32) & SIGHASH_FORKID != 0)
    }

    fn op_checksig(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        let ctx = self.require_tx_context(pop)?;
        let pk_bytes = self.dstack.pop_byte_array()?;
        let full_sig = self.dstack.pop_byte_array()?;

        self.check_signature_with_hash_type(&full_sig)?;
        self.check_pub_key_encoding(&pk_bytes)?;

        let script_code = if self.uses_forkid(&full_sig) {
            self.script_code().to_bytes()
        } else {
            self.script_code().without_signatures(&[full_sig.as_slice()])
        };

        let valid = self.check_sig(ctx, &full_sig, &pk_bytes, &script_code)?;
        if !valid && self.has_flag(ScriptFlags::VERIFY_NULL_FAIL) && !full_sig.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NullFail,
                "signature not empty on failed checksig",
            ));
        }
        self.dstack.push_bool(valid);
        Ok(())
    }

    fn op_checkmultisig(&mut self, pop: &ParsedOpcode) -> Result<(), InterpreterError> {
        let ctx = self.require_tx_context(pop)?;

        let num_keys = self.dstack.pop_int()?.to_i64();
        let max_keys = self.cfg.max_pub_keys_per_multisig();
        let num_keys = usize::try_from(num_keys)
            .ok()
            .filter(|&n| n <= max_keys)
            .ok_or_else(|| {
                InterpreterError::new(
                    InterpreterErrorCode::InvalidPubKeyCount,
                    format!("number of pubkeys {} outside of 0..={}", num_keys, max_keys),
                )
            })?;

        self.add_ops(num_keys)?;

        let mut pub_keys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            pub_keys.push(self.dstack.pop_byte_array()?);
        }

        let num_sigs = self.dstack.pop_int()?.to_i64();
        let num_sigs = usize::try_from(num_sigs)
            .ok()
            .filter(|&n| n <= num_keys)
            .ok_or_else(|| {
                InterpreterError::new(
                    InterpreterErrorCode::InvalidSignatureCount,
                    format!("number of signatures {} outside of 0..={}", num_sigs, num_keys),
                )
            })?;

        let mut signatures = Vec::with_capacity(num_sigs);
        for _ in 0..num_sigs {
            signatures.push(self.dstack.pop_byte_array()?);
        }

        // The extra item consumed by the original off-by-one.
        let dummy = self.dstack.pop_byte_array()?;
        if self.has_flag(ScriptFlags::VERIFY_NULL_DUMMY) && !dummy.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::SigNullDummy,
                format!("multisig dummy argument has length {} instead of 0", dummy.len()),
            ));
        }

        let legacy_sigs: Vec<&[u8]> = signatures
            .iter()
            .filter(|sig| !self.uses_forkid(sig))
            .map(Vec::as_slice)
            .collect();
        let legacy_code = self.script_code().without_signatures(&legacy_sigs);
        let forkid_code = self.script_code().to_bytes();

        let mut success = true;
        let mut key_idx = 0;
        let mut sig_idx = 0;
        while sig_idx < num_sigs {
            if num_sigs - sig_idx > num_keys - key_idx {
                success = false;
                break;
            }

            let sig = &signatures[sig_idx];
            let pub_key = &pub_keys[key_idx];

            self.check_signature_with_hash_type(sig)?;
            self.check_pub_key_encoding(pub_key)?;

            let script_code = if self.uses_forkid(sig) {
                &forkid_code
            } else {
                &legacy_code
            };
            if self.check_sig(ctx, sig, pub_key, script_code)? {
                sig_idx += 1;
            }
            key_idx += 1;
        }

        if !success
            && self.has_flag(ScriptFlags::VERIFY_NULL_FAIL)
            && signatures.iter().any(|sig| !sig.is_empty())
        {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NullFail,
                "not all signatures empty on failed checkmultisig",
            ));
        }

        self.dstack.push_bool(success);
        Ok(())
    }

    /// Verify `full_sig` (DER plus sighash byte) over the digest the context
    /// computes for `script_code`. Undecodable signatures or keys are simply
    /// invalid; only context failures propagate.
    fn check_sig(
        &self,
        ctx: &dyn TxContext,
        full_sig: &[u8],
        pk_bytes: &[u8],
        script_code: &[u8],
    ) -> Result<bool, InterpreterError> {
        let Some((&shf, der)) = full_sig.split_last() else {
            return Ok(false);
        };

        let Ok(sig) = Signature::from_der_lax(der) else {
            return Ok(false);
        };
        let Ok(pub_key) = PublicKey::from_bytes(pk_bytes) else {
            return Ok(false);
        };

        let digest = ctx.signature_digest(
            self.input_idx,
            script_code,
            shf as u32,
            self.uses_forkid(full_sig),
        )?;
        Ok(sig.verify(&digest, &pub_key))
    }

    fn check_signature_with_hash_type(&self, full_sig: &[u8]) -> Result<(), InterpreterError> {
        let Some((&shf, der)) = full_sig.split_last() else {
            return Ok(());
        };
        self.check_hash_type_encoding(shf as u32)?;
        self.check_signature_encoding(der)
    }

    fn check_hash_type_encoding(&self, shf: u32) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::STRICT_ENCODING) {
            return Ok(());
        }

        let base = shf & !(SIGHASH_FORKID | SIGHASH_ANYONECANPAY);
        if !(1..=3).contains(&base) {
            return Err(InterpreterError::new(
                InterpreterErrorCode::InvalidSigHashType,
                format!("invalid hash type 0x{:x}", shf),
            ));
        }

        let has_forkid = shf & SIGHASH_FORKID != 0;
        let forkid_enabled = self.has_flag(ScriptFlags::ENABLE_SIGHASH_FORKID);
        if has_forkid && !forkid_enabled {
            return Err(InterpreterError::new(
                InterpreterErrorCode::IllegalForkId,
                "fork id sighash set without flag",
            ));
        }
        if !has_forkid && forkid_enabled {
            return Err(InterpreterError::new(
                InterpreterErrorCode::IllegalForkId,
                "fork id sighash not set with flag",
            ));
        }
        Ok(())
    }

    fn check_pub_key_encoding(&self, pub_key: &[u8]) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::STRICT_ENCODING) {
            return Ok(());
        }
        match (pub_key.len(), pub_key.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => Ok(()),
            _ => Err(InterpreterError::new(
                InterpreterErrorCode::PubKeyType,
                "unsupported public key type",
            )),
        }
    }

    /// Strict DER under DERSIG, LOW_S or STRICTENC, then the low-S rule.
    fn check_signature_encoding(&self, der: &[u8]) -> Result<(), InterpreterError> {
        if !self.flags.has_any(&[
            ScriptFlags::VERIFY_DER_SIGNATURES,
            ScriptFlags::VERIFY_LOW_S,
            ScriptFlags::STRICT_ENCODING,
        ]) {
            return Ok(());
        }

        check_der_encoding(der)?;

        if self.has_flag(ScriptFlags::VERIFY_LOW_S) {
            let high_s = Signature::from_der_lax(der).map_or(true, |sig| sig.has_high_s());
            if high_s {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::SigHighS,
                    "signature is not canonical due to unnecessarily high S value",
                ));
            }
        }
        Ok(())
    }
}
