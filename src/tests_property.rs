//! Property-based tests for message encoding and nonce search

use crate::address::{Address, FriendlyFormat};
use crate::search::{FixedClock, Search};
use crate::stack::{decode_mining_data, StackEntry};
use crate::transfer::TransferDescriptor;
use crate::types::{Complexity, MineMessageParams};
use num_bigint::BigUint;
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = Address> {
    (any::<i8>(), any::<[u8; 32]>()).prop_map(|(wc, id)| Address::new(wc, id))
}

fn arb_uint(bytes: usize) -> impl Strategy<Value = BigUint> {
    prop::collection::vec(any::<u8>(), bytes).prop_map(|b| BigUint::from_bytes_be(&b))
}

fn arb_params() -> impl Strategy<Value = MineMessageParams> {
    (any::<u32>(), arb_address(), arb_uint(32), arb_uint(16)).prop_map(
        |(expire, mint_to, nonce, seed)| MineMessageParams {
            expire: expire as u64,
            mint_to,
            nonce,
            seed,
        },
    )
}

proptest! {
    #[test]
    fn prop_encoding_is_deterministic(params in arb_params()) {
        let first = params.encode().unwrap();
        let second = params.clone().encode().unwrap();
        prop_assert_eq!(first.hash(), second.hash());
        prop_assert_eq!(first.to_boc().unwrap(), second.to_boc().unwrap());
    }

    #[test]
    fn prop_changed_field_changes_bytes(params in arb_params(), field in 0usize..4) {
        let mut changed = params.clone();
        match field {
            0 => changed.expire ^= 1,
            1 => changed.nonce ^= BigUint::from(1u8),
            2 => changed.seed ^= BigUint::from(1u8),
            _ => {
                let mut id = *params.mint_to.account_id();
                id[31] ^= 1;
                changed.mint_to = Address::new(params.mint_to.workchain(), id);
            }
        }

        let original = params.encode().unwrap();
        let modified = changed.encode().unwrap();
        prop_assert_ne!(original.cell().data(), modified.cell().data());
        prop_assert_ne!(original.hash(), modified.hash());
    }

    #[test]
    fn prop_nonces_increase_by_one(start in any::<u64>(), steps in 1usize..16) {
        let mut search = Search::new(Address::new(0, [7; 32]), BigUint::from(5u8), Complexity::new(BigUint::default()))
            .with_clock(FixedClock(1_700_000_000))
            .with_initial_nonce(BigUint::from(start));

        for i in 0..steps {
            let attempt = search.next().unwrap().unwrap();
            prop_assert_eq!(attempt.number, i as u64 + 1);
            prop_assert_eq!(attempt.nonce, BigUint::from(start) + i);
            prop_assert!(!attempt.found);
        }
    }

    #[test]
    fn prop_search_stops_at_first_accepted_hash(
        seed in arb_uint(16),
        id in any::<[u8; 32]>(),
        exp in 252usize..256,
    ) {
        let complexity = BigUint::from(1u8) << exp;
        let search = Search::new(Address::new(0, id), seed, Complexity::new(complexity.clone()))
            .with_clock(FixedClock(1_700_000_000));

        let attempts = search.collect::<crate::Result<Vec<_>>>().unwrap();
        let (last, earlier) = attempts.split_last().unwrap();
        prop_assert!(last.found);
        prop_assert!(last.hash_value() < complexity);
        for attempt in earlier {
            prop_assert!(attempt.hash_value() >= complexity);
        }
    }

    #[test]
    fn prop_payload_base64url_round_trip(payload in prop::collection::vec(any::<u8>(), 0..256)) {
        let descriptor = TransferDescriptor::from_payload(&payload, &Address::new(0, [1; 32]), 1);
        prop_assert!(!descriptor.payload_base64_url.contains(['+', '/', '=']));
        prop_assert_eq!(descriptor.payload().unwrap(), payload);
    }

    #[test]
    fn prop_mining_data_field_order(values in prop::collection::vec(any::<u64>(), 6)) {
        let stack: Vec<StackEntry> = values
            .iter()
            .map(|v| StackEntry::num(format!("{:#x}", v)))
            .collect();
        let params = decode_mining_data(&stack).unwrap();

        let decoded = [
            &params.complexity,
            &params.last_success,
            &params.seed,
            &params.target_delta,
            &params.min_cpl,
            &params.max_cpl,
        ];
        for (value, field) in values.iter().zip(decoded) {
            prop_assert_eq!(&BigUint::from(*value), field);
        }
    }

    #[test]
    fn prop_address_round_trip(
        address in arb_address(),
        url_safe in any::<bool>(),
        bounceable in any::<bool>(),
        testnet_only in any::<bool>(),
    ) {
        prop_assert_eq!(Address::from_raw(&address.to_raw()).unwrap(), address);

        let format = FriendlyFormat { url_safe, bounceable, testnet_only };
        let (parsed, flags) = Address::from_friendly(&address.to_friendly(format)).unwrap();
        prop_assert_eq!(parsed, address);
        prop_assert_eq!(flags.bounceable, bounceable);
        prop_assert_eq!(flags.testnet_only, testnet_only);
    }
}
