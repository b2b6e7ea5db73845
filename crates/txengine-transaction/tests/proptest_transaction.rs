use proptest::prelude::*;

use txengine_script::Script;
use txengine_transaction::sighash::{
    self, PreimageFields, ZeroFieldReport, SIGHASH_ANYONECANPAY, SIGHASH_FORKID,
};
use txengine_transaction::{Transaction, TransactionInput, TransactionOutput};

/// Strategy to generate a valid random transaction.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()),       // prev tx hash
        any::<u32>(),                              // prev tx index
        prop::collection::vec(any::<u8>(), 0..64), // script bytes
        any::<u32>(),                              // sequence
    )
        .prop_map(|(hash, idx, script_bytes, seq)| {
            let mut input = TransactionInput::new(hash, idx);
            input.unlocking_script = Script::from_bytes(&script_bytes);
            input.sequence_number = seq;
            input
        });

    let arb_output = (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(satoshis, script_bytes)| {
            TransactionOutput::new(satoshis, Script::from_bytes(&script_bytes))
        });

    (
        any::<u32>(), // version
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 0..4),
        any::<u32>(), // locktime
    )
        .prop_map(|(version, inputs, outputs, locktime)| {
            let mut tx = Transaction::new();
            tx.version = version;
            tx.lock_time = locktime;
            for i in inputs {
                tx.add_input(i);
            }
            for o in outputs {
                tx.add_output(o);
            }
            tx
        })
}

fn arb_sighash_flag() -> impl Strategy<Value = u32> {
    (1u32..=3, any::<bool>()).prop_map(|(base, acp)| {
        let flag = base | SIGHASH_FORKID;
        if acp {
            flag | SIGHASH_ANYONECANPAY
        } else {
            flag
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transaction_serialize_deserialize_roundtrip(tx in arb_transaction()) {
        let bytes = tx.to_bytes();
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx2, &tx);
        prop_assert_eq!(tx2.to_bytes(), bytes);
    }

    #[test]
    fn preimage_matches_zero_field_report(
        tx in arb_transaction(),
        flag in arb_sighash_flag(),
        script_code in prop::collection::vec(any::<u8>(), 0..300),
        amount in any::<u64>(),
        pick in any::<prop::sample::Index>(),
    ) {
        let idx = pick.index(tx.inputs.len());
        let preimage = sighash::calc_preimage(&tx, idx, &script_code, amount, flag).unwrap();
        let fields = PreimageFields::parse(&preimage).unwrap();

        prop_assert_eq!(&fields.script_code, &script_code);
        prop_assert_eq!(fields.amount, amount);
        prop_assert_eq!(fields.sighash_flag, flag);
        prop_assert_eq!(fields.outpoint_txid, tx.inputs[idx].source_txid);
        prop_assert!(fields.is_minimal_length_prefix());

        let report = ZeroFieldReport::for_flag(flag, idx, tx.outputs.len());
        prop_assert!(report.check(&fields).is_empty());
    }
}
