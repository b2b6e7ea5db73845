//! Which preimage hash fields a sighash flag forces to zero, and why.
//!
//! The preimage builder consults [`ZeroFieldReport`] for its zeroing
//! decisions, so the report and the bytes cannot drift apart. The same
//! report checks a parsed preimage from elsewhere against the rules.

use serde::{Deserialize, Serialize};

use super::layout::PreimageFields;
use super::{
    BaseSighash, SighashType, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_FORKID, SIGHASH_NONE,
    SIGHASH_SINGLE,
};

/// The three 32-byte hash fields of a FORKID preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreimageField {
    HashPrevouts,
    HashSequence,
    HashOutputs,
}

impl PreimageField {
    pub const ALL: [PreimageField; 3] = [
        PreimageField::HashPrevouts,
        PreimageField::HashSequence,
        PreimageField::HashOutputs,
    ];
}

/// What `hashOutputs` commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashOutputsRule {
    /// sha256d of every output (ALL).
    AllOutputs,
    /// sha256d of the output at the input's index (SINGLE).
    MatchingOutput,
    /// Zero (NONE).
    NoOutputs,
    /// Zero because SINGLE has no output at the input's index. The
    /// signature commits to no output at all.
    SingleOutOfRange,
}

impl HashOutputsRule {
    pub fn classify(sighash_flag: u32, input_index: usize, output_count: usize) -> Self {
        match SighashType::from(sighash_flag).base() {
            BaseSighash::All => HashOutputsRule::AllOutputs,
            BaseSighash::None => HashOutputsRule::NoOutputs,
            BaseSighash::Single if input_index < output_count => HashOutputsRule::MatchingOutput,
            BaseSighash::Single => HashOutputsRule::SingleOutOfRange,
        }
    }

    pub fn is_zero(self) -> bool {
        matches!(self, HashOutputsRule::NoOutputs | HashOutputsRule::SingleOutOfRange)
    }
}

/// Why a field is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZeroReason {
    AnyoneCanPay,
    SighashNone,
    SighashSingle,
    SingleOutOfRange,
}

/// One field required to be 32 zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroField {
    pub field: PreimageField,
    pub reason: ZeroReason,
}

/// A field whose observed bytes disagree with the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub field: PreimageField,
    pub expected_zero: bool,
}

/// Expected zero fields for one (flag, input index, output count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZeroFieldReport {
    pub sighash_flag: u32,
    pub input_index: usize,
    pub output_count: usize,
    pub outputs_rule: HashOutputsRule,
    pub zero_fields: Vec<ZeroField>,
}

impl ZeroFieldReport {
    pub fn for_flag(sighash_flag: u32, input_index: usize, output_count: usize) -> Self {
        let flag = SighashType::from(sighash_flag);
        let outputs_rule = HashOutputsRule::classify(sighash_flag, input_index, output_count);
        let mut zero_fields = Vec::with_capacity(3);

        if flag.anyone_can_pay() {
            zero_fields.push(ZeroField {
                field: PreimageField::HashPrevouts,
                reason: ZeroReason::AnyoneCanPay,
            });
        }

        let sequence_reason = match flag.base() {
            _ if flag.anyone_can_pay() => Some(ZeroReason::AnyoneCanPay),
            BaseSighash::None => Some(ZeroReason::SighashNone),
            BaseSighash::Single => Some(ZeroReason::SighashSingle),
            BaseSighash::All => None,
        };
        if let Some(reason) = sequence_reason {
            zero_fields.push(ZeroField {
                field: PreimageField::HashSequence,
                reason,
            });
        }

        let outputs_reason = match outputs_rule {
            HashOutputsRule::NoOutputs => Some(ZeroReason::SighashNone),
            HashOutputsRule::SingleOutOfRange => Some(ZeroReason::SingleOutOfRange),
            HashOutputsRule::AllOutputs | HashOutputsRule::MatchingOutput => None,
        };
        if let Some(reason) = outputs_reason {
            zero_fields.push(ZeroField {
                field: PreimageField::HashOutputs,
                reason,
            });
        }

        ZeroFieldReport {
            sighash_flag,
            input_index,
            output_count,
            outputs_rule,
            zero_fields,
        }
    }

    pub fn is_zero(&self, field: PreimageField) -> bool {
        self.zero_fields.iter().any(|z| z.field == field)
    }

    pub fn reason(&self, field: PreimageField) -> Option<ZeroReason> {
        self.zero_fields
            .iter()
            .find(|z| z.field == field)
            .map(|z| z.reason)
    }

    /// Compare a parsed preimage with the expectation. Empty means it
    /// conforms.
    pub fn check(&self, fields: &PreimageFields) -> Vec<FieldMismatch> {
        PreimageField::ALL
            .iter()
            .filter_map(|&field| {
                let expected_zero = self.is_zero(field);
                let actual_zero = fields.hash(field) == &[0u8; 32];
                (expected_zero != actual_zero).then_some(FieldMismatch {
                    field,
                    expected_zero,
                })
            })
            .collect()
    }
}

/// Reports for the six base flag combinations (ALL, NONE, SINGLE, each with
/// and without ANYONECANPAY, all with FORKID) for input 0 of a transaction
/// with one output.
pub fn conformance_table() -> Vec<ZeroFieldReport> {
    [SIGHASH_ALL, SIGHASH_NONE, SIGHASH_SINGLE]
        .iter()
        .flat_map(|&base| [base, base | SIGHASH_ANYONECANPAY])
        .map(|flag| ZeroFieldReport::for_flag(flag | SIGHASH_FORKID, 0, 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zeroes_nothing() {
        let report = ZeroFieldReport::for_flag(SIGHASH_ALL | SIGHASH_FORKID, 0, 2);
        assert!(report.zero_fields.is_empty());
        assert_eq!(report.outputs_rule, HashOutputsRule::AllOutputs);
    }

    #[test]
    fn test_anyone_can_pay_zeroes_prevouts_and_sequence() {
        let report = ZeroFieldReport::for_flag(SIGHASH_ALL | SIGHASH_ANYONECANPAY | SIGHASH_FORKID, 1, 2);
        assert_eq!(report.reason(PreimageField::HashPrevouts), Some(ZeroReason::AnyoneCanPay));
        assert_eq!(report.reason(PreimageField::HashSequence), Some(ZeroReason::AnyoneCanPay));
        assert!(!report.is_zero(PreimageField::HashOutputs));
    }

    #[test]
    fn test_none_and_single() {
        let none = ZeroFieldReport::for_flag(SIGHASH_NONE | SIGHASH_FORKID, 0, 2);
        assert!(!none.is_zero(PreimageField::HashPrevouts));
        assert_eq!(none.reason(PreimageField::HashSequence), Some(ZeroReason::SighashNone));
        assert_eq!(none.reason(PreimageField::HashOutputs), Some(ZeroReason::SighashNone));

        let single = ZeroFieldReport::for_flag(SIGHASH_SINGLE | SIGHASH_FORKID, 1, 2);
        assert_eq!(single.reason(PreimageField::HashSequence), Some(ZeroReason::SighashSingle));
        assert_eq!(single.outputs_rule, HashOutputsRule::MatchingOutput);
        assert!(!single.is_zero(PreimageField::HashOutputs));
    }

    #[test]
    fn test_single_out_of_range_is_flagged() {
        let report = ZeroFieldReport::for_flag(SIGHASH_SINGLE | SIGHASH_FORKID, 2, 2);
        assert_eq!(report.outputs_rule, HashOutputsRule::SingleOutOfRange);
        assert_eq!(report.reason(PreimageField::HashOutputs), Some(ZeroReason::SingleOutOfRange));
        assert!(report.outputs_rule.is_zero());
    }

    #[test]
    fn test_conformance_table() {
        let table = conformance_table();
        assert_eq!(table.len(), 6);
        let zero_counts: Vec<usize> = table.iter().map(|r| r.zero_fields.len()).collect();
        // ALL, ALL|ACP, NONE, NONE|ACP, SINGLE, SINGLE|ACP
        assert_eq!(zero_counts, vec![0, 2, 2, 3, 1, 2]);
        assert!(table.iter().all(|r| r.sighash_flag & SIGHASH_FORKID != 0));
    }

    #[test]
    fn test_report_serializes() {
        let report = ZeroFieldReport::for_flag(SIGHASH_NONE | SIGHASH_FORKID, 0, 1);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"HashOutputs\""));
        assert!(json.contains("\"SighashNone\""));
        let back: ZeroFieldReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
