//! Shallow-merge behaviour of the snapshot store.

use proptest::prelude::*;
use serde_json::{Map, Value};
use transformer_hmi::signals::Signal;
use transformer_hmi::snapshot::{SignalValue, Snapshot};

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-50.0f64..200.0).prop_map(Value::from),
    ]
}

fn arb_payload() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec((0usize..Signal::ALL.len(), arb_value()), 0..12).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(i, v)| (Signal::ALL[i].key().to_string(), v))
            .collect()
    })
}

fn expected(v: &Value) -> SignalValue {
    match v {
        Value::Bool(b) => SignalValue::Bool(*b),
        Value::Number(n) => SignalValue::Number(n.as_f64().unwrap()),
        _ => unreachable!("generator only yields scalars"),
    }
}

proptest! {
    #[test]
    fn merge_overwrites_named_keys_and_keeps_the_rest(base in arb_payload(), p in arb_payload()) {
        let mut s = Snapshot::new();
        s.merge(&base);
        let before = s.clone();

        s.merge(&p);

        for signal in Signal::ALL {
            let key = signal.key();
            match p.get(key) {
                Some(v) => prop_assert_eq!(s.get(key), Some(expected(v))),
                None => prop_assert_eq!(s.get(key), before.get(key)),
            }
        }
    }

    #[test]
    fn merge_is_idempotent(base in arb_payload(), p in arb_payload()) {
        let mut once = Snapshot::new();
        once.merge(&base);
        once.merge(&p);
        let mut twice = once.clone();
        twice.merge(&p);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn disjoint_payloads_commute(a in arb_payload(), b in arb_payload()) {
        let b: Map<String, Value> = b.into_iter().filter(|(k, _)| !a.contains_key(k)).collect();

        let mut ab = Snapshot::new();
        ab.merge(&a);
        ab.merge(&b);
        let mut ba = Snapshot::new();
        ba.merge(&b);
        ba.merge(&a);
        prop_assert_eq!(ab, ba);
    }
}
