use alloc::{collections::BTreeMap, string::ToString, vec, vec::Vec};
use std::collections::HashMap;

use p3_baby_bear::BabyBear;
use p3_field::{PrimeCharacteristicRing, extension::BinomialExtensionField};
use p3_goldilocks::Goldilocks;
use p3_koala_bear::KoalaBear;
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{sample::random_eval_proof, *};
use crate::{
    fri::{FriParams, FriParamsError, encode_fri_proof, expected_fri_len},
    marshalling::{
        Endianness,
        bundle::encode_bundle,
        errors::{WireFault, WireSection},
    },
};

type F = BabyBear;
type EF = BinomialExtensionField<F, 4>;
const DIGEST_ELEMS: usize = 8;
type Proof = EvalProof<F, EF, DIGEST_ELEMS>;

fn le() -> WireConfig {
    WireConfig::for_field::<F>(Endianness::Little)
}

/// Two folding rounds over a domain of size 16, opened on pairs.
fn two_round_params(num_queries: usize) -> FriParams {
    FriParams {
        num_queries,
        log_domain_size: 4,
        fold_steps: vec![1, 1],
        final_poly_len: 1,
    }
}

fn shapes(entries: &[(usize, usize, usize)]) -> BTreeMap<usize, BatchShape> {
    entries
        .iter()
        .map(|&(id, num_polys, num_points)| {
            (
                id,
                BatchShape {
                    num_polys,
                    num_points,
                },
            )
        })
        .collect()
}

fn sample_proof(seed: u64, batches: &[(usize, usize, usize)], params: &FriParams) -> Proof {
    let mut rng = StdRng::seed_from_u64(seed);
    random_eval_proof(&mut rng, &shapes(batches), params)
}

#[test]
fn test_single_batch_two_rounds_scenario() {
    let params = two_round_params(1);
    let config = le();
    let proof = sample_proof(1, &[(0, 1, 1)], &params);

    let wire = encode_eval_proof(&proof, &params, &config).unwrap();

    // z: 4 (count) + 12 (header) + 16 (point) + 16 (value) = 48
    // FRI: 2 roots (64) + final poly (16) + query (304) + pow (4) = 388
    //   query: batch 4 + 2 * 16 + path(4 + 3 * 32)
    //          round 0: 2 * 16 + path(4 + 2 * 32)
    //          round 1: 2 * 16 + path(4 + 1 * 32)
    // Bundle: 4 + (4 + 48) + (4 + 388) = 448
    assert_eq!(wire.len(), 448);
    assert_eq!(
        expected_fri_len::<F, EF, DIGEST_ELEMS>(&derive_batch_descriptor(&proof.z), &params, &config),
        Ok(388)
    );

    // Encoding twice gives the same bytes
    assert_eq!(encode_eval_proof(&proof, &params, &config).unwrap(), wire);

    let decoded: Proof = decode_eval_proof(wire.as_bytes(), &params, &config).unwrap();
    assert_eq!(decoded.z.num_batches(), 1);
    assert_eq!(decoded.z.get(0).unwrap().num_points(), 1);
    assert_eq!(decoded.fri_proof.fri_roots.len(), 2);
    assert_eq!(decoded.fri_proof.query_proofs[0].round_proofs.len(), 2);
    assert_eq!(decoded, proof);
}

#[test]
fn test_descriptor_survives_round_trip() {
    let params = two_round_params(3);
    let config = le();
    let proof = sample_proof(2, &[(0, 2, 3), (5, 1, 1), (9, 4, 2)], &params);

    let wire = encode_eval_proof(&proof, &params, &config).unwrap();
    let decoded: Proof = decode_eval_proof(wire.as_bytes(), &params, &config).unwrap();

    assert_eq!(
        derive_batch_descriptor(&proof.z),
        derive_batch_descriptor(&decoded.z)
    );
    assert_eq!(decoded, proof);
}

#[test]
fn test_commitment_and_proof_through_codec() {
    let params = FriParams {
        num_queries: 4,
        log_domain_size: 10,
        fold_steps: vec![2, 3, 1],
        final_poly_len: 8,
    };
    let scheme = CommitmentScheme::Lpc(LpcScheme {
        fri_params: params.clone(),
    });
    assert!(scheme.is_lpc_family());

    let codec = LpcCodec::<F, EF, DIGEST_ELEMS>::for_scheme(&scheme, le()).unwrap();
    assert_eq!(codec.fri_params(), &params);

    let root = core::array::from_fn(|i| F::from_u64(i as u64 * 7));
    let wire = codec.encode_commitment(&root).unwrap();
    assert_eq!(codec.decode_commitment(wire.as_bytes()).unwrap(), root);

    let proof = sample_proof(3, &[(1, 3, 2), (2, 1, 4)], &params);
    let wire = codec.encode_eval_proof(&proof).unwrap();
    assert_eq!(codec.decode_eval_proof(wire.as_bytes()).unwrap(), proof);
}

#[test]
fn test_non_lpc_scheme_is_rejected() {
    let scheme = CommitmentScheme::Other {
        name: "kzg".to_string(),
    };
    assert!(!scheme.is_lpc_family());
    assert!(scheme.as_lpc().is_none());

    let err = LpcCodec::<F, EF, DIGEST_ELEMS>::for_scheme(&scheme, le()).unwrap_err();
    assert_eq!(err, MarshalError::UnsupportedScheme("kzg".to_string()));
}

#[test]
fn test_construction_order_does_not_change_bytes() {
    let params = two_round_params(2);
    let config = le();
    let proof = sample_proof(4, &[(0, 1, 2), (3, 2, 1), (7, 1, 1)], &params);

    // Rebuild z through a hash map and the openings in reverse order
    let by_hash: HashMap<usize, EvalBatch<EF>> = proof
        .z
        .batches()
        .map(|(id, batch)| (id, batch.clone()))
        .collect();
    let mut rebuilt = proof.clone();
    rebuilt.z = by_hash.into_iter().collect();
    for query in &mut rebuilt.fri_proof.query_proofs {
        let mut reversed: Vec<_> = core::mem::take(&mut query.initial_proof)
            .into_iter()
            .collect();
        reversed.reverse();
        for (id, opening) in reversed {
            query.initial_proof.insert(id, opening);
        }
    }

    assert_eq!(
        encode_eval_proof(&proof, &params, &config).unwrap(),
        encode_eval_proof(&rebuilt, &params, &config).unwrap()
    );
}

#[test]
fn test_swapped_fields_are_rejected() {
    let params = two_round_params(2);
    let config = le();
    let mut proof = sample_proof(5, &[(0, 2, 2), (1, 1, 3)], &params);

    // A large leading root word makes the FRI field unreadable as a batch count
    proof.fri_proof.fri_roots[0][0] = F::from_u64(0x1234_5678);

    let wire = encode_eval_proof(&proof, &params, &config).unwrap();
    let [z, fri] = eval_proof_fields(wire.as_bytes(), &config).unwrap();
    let swapped = encode_bundle(
        &[WireForm::from(fri.to_vec()), WireForm::from(z.to_vec())],
        &config,
    )
    .unwrap();

    let err = decode_eval_proof::<F, EF, DIGEST_ELEMS>(swapped.as_bytes(), &params, &config)
        .unwrap_err();
    assert!(err.is_malformed() || err.is_inconsistent(), "{err:?}");
    assert_eq!(
        err,
        MarshalError::malformed(
            WireSection::EvalStorage,
            WireFault::InvalidLength {
                field: "num_batches"
            }
        )
    );
}

#[test]
fn test_truncated_wire_is_malformed() {
    let params = two_round_params(1);
    let config = le();
    let proof = sample_proof(6, &[(0, 1, 1), (2, 2, 1)], &params);
    let wire = encode_eval_proof(&proof, &params, &config)
        .unwrap()
        .into_bytes();

    for cut in 0..wire.len() {
        let err = decode_eval_proof::<F, EF, DIGEST_ELEMS>(&wire[..cut], &params, &config)
            .unwrap_err();
        assert!(err.is_malformed(), "cut at {cut} gave {err:?}");
    }

    // Last byte dropped
    let err = decode_eval_proof::<F, EF, DIGEST_ELEMS>(&wire[..wire.len() - 1], &params, &config)
        .unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn test_trailing_and_extra_fields_are_malformed() {
    let params = two_round_params(1);
    let config = le();
    let proof = sample_proof(7, &[(0, 1, 1)], &params);
    let wire = encode_eval_proof(&proof, &params, &config).unwrap();

    let mut trailing = wire.clone().into_bytes();
    trailing.push(0);
    let err =
        decode_eval_proof::<F, EF, DIGEST_ELEMS>(&trailing, &params, &config).unwrap_err();
    assert!(matches!(
        err,
        MarshalError::MalformedWire {
            section: WireSection::Bundle,
            fault: WireFault::TrailingBytes { .. }
        }
    ));

    let [z, fri] = eval_proof_fields(wire.as_bytes(), &config).unwrap();
    let three = encode_bundle(
        &[
            WireForm::from(z.to_vec()),
            WireForm::from(fri.to_vec()),
            WireForm::default(),
        ],
        &config,
    )
    .unwrap();
    assert_eq!(
        decode_eval_proof::<F, EF, DIGEST_ELEMS>(three.as_bytes(), &params, &config),
        Err(MarshalError::malformed(
            WireSection::Bundle,
            WireFault::FieldCount {
                expected: 2,
                actual: 3
            }
        ))
    );
}

#[test]
fn test_tampered_storage_is_inconsistent() {
    let params = two_round_params(2);
    let config = le();
    let proof = sample_proof(8, &[(0, 2, 1), (1, 1, 1)], &params);
    let wire = encode_eval_proof(&proof, &params, &config).unwrap();
    let [_, fri] = eval_proof_fields(wire.as_bytes(), &config).unwrap();

    let splice = |z: &EvalStorage<EF>| {
        let z = encode_eval_storage::<F, EF>(z, &config).unwrap();
        encode_bundle(&[z, WireForm::from(fri.to_vec())], &config).unwrap()
    };

    // Step 1: an extra batch changes the implied FRI length
    let mut extra = proof.z.clone();
    extra.insert(4, EvalBatch::new(vec![EF::ONE], vec![vec![EF::TWO]]));
    let err = decode_eval_proof::<F, EF, DIGEST_ELEMS>(splice(&extra).as_bytes(), &params, &config)
        .unwrap_err();
    assert!(matches!(
        err,
        MarshalError::InconsistentStructure {
            what: "FRI proof length",
            ..
        }
    ));

    // Step 2: moving a polynomial between batches keeps the length, so only
    // the per-batch count gives it away
    let moved: EvalStorage<EF> = [
        (0, EvalBatch::new(vec![EF::ONE], vec![vec![EF::ONE]])),
        (
            1,
            EvalBatch::new(vec![EF::ONE], vec![vec![EF::ONE], vec![EF::TWO]]),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        decode_eval_proof::<F, EF, DIGEST_ELEMS>(splice(&moved).as_bytes(), &params, &config),
        Err(MarshalError::InconsistentStructure {
            what: "polynomial count",
            expected: 1,
            actual: 2,
        })
    );
}

#[test]
fn test_encode_detects_mismatched_openings() {
    let params = two_round_params(1);
    let config = le();
    let proof = sample_proof(9, &[(0, 1, 1), (1, 2, 1)], &params);

    // Openings for a batch that is not in z
    let mut missing = proof.clone();
    missing.fri_proof.query_proofs[0].initial_proof.remove(&1);
    assert_eq!(
        encode_eval_proof(&missing, &params, &config),
        Err(MarshalError::InconsistentStructure {
            what: "batch count",
            expected: 2,
            actual: 1,
        })
    );

    // Opening with one polynomial too many
    let mut extra_poly = proof.clone();
    let opening = extra_poly.fri_proof.query_proofs[0]
        .initial_proof
        .get_mut(&0)
        .unwrap();
    opening.values.push(opening.values[0].clone());
    assert_eq!(
        encode_eval_proof(&extra_poly, &params, &config),
        Err(MarshalError::InconsistentStructure {
            what: "polynomial count",
            expected: 1,
            actual: 2,
        })
    );

    // Wrong number of rounds is a plain shape error
    let mut short = proof;
    short.fri_proof.fri_roots.pop();
    assert!(matches!(
        encode_eval_proof(&short, &params, &config),
        Err(MarshalError::InvalidProof(_))
    ));
}

#[test]
fn test_byte_order_changes_layout_only() {
    let params = two_round_params(2);
    let proof = sample_proof(10, &[(0, 2, 2)], &params);

    let little = le();
    let big = WireConfig::for_field::<F>(Endianness::Big);

    let le_wire = encode_eval_proof(&proof, &params, &little).unwrap();
    let be_wire = encode_eval_proof(&proof, &params, &big).unwrap();

    assert_eq!(le_wire.len(), be_wire.len());
    assert_ne!(le_wire, be_wire);
    assert_eq!(&le_wire.as_bytes()[..4], &[2, 0, 0, 0]);
    assert_eq!(&be_wire.as_bytes()[..4], &[0, 0, 0, 2]);

    let from_le: Proof = decode_eval_proof(le_wire.as_bytes(), &params, &little).unwrap();
    let from_be: Proof = decode_eval_proof(be_wire.as_bytes(), &params, &big).unwrap();
    assert_eq!(from_le, proof);
    assert_eq!(from_be, proof);

    // Reading with the wrong byte order never yields the same proof
    assert_ne!(
        decode_eval_proof::<F, EF, DIGEST_ELEMS>(be_wire.as_bytes(), &params, &little).ok(),
        Some(proof)
    );
}

#[test]
fn test_field_width_overflow() {
    type G = Goldilocks;
    type GF = BinomialExtensionField<G, 2>;

    let params = two_round_params(1);
    let narrow = WireConfig::new(Endianness::Little, 32).unwrap();

    assert!(matches!(
        LpcCodec::<G, GF, 4>::new(narrow, params.clone()),
        Err(MarshalError::FieldWidthOverflow {
            required: 64,
            available: 32
        })
    ));

    let mut rng = StdRng::seed_from_u64(11);
    let proof: EvalProof<G, GF, 4> = random_eval_proof(&mut rng, &shapes(&[(0, 1, 1)]), &params);
    assert!(matches!(
        encode_eval_proof(&proof, &params, &narrow),
        Err(MarshalError::FieldWidthOverflow { .. })
    ));

    // The full width works and uses 8 bytes per element
    let wide = WireConfig::for_field::<G>(Endianness::Big);
    assert_eq!(wide.element_bytes(), 8);
    let codec = LpcCodec::<G, GF, 4>::new(wide, params).unwrap();
    let wire = codec.encode_eval_proof(&proof).unwrap();
    assert_eq!(codec.decode_eval_proof(wire.as_bytes()).unwrap(), proof);
}

#[test]
fn test_koala_bear_round_trip() {
    type K = KoalaBear;
    type KF = BinomialExtensionField<K, 4>;

    let params = FriParams {
        num_queries: 2,
        log_domain_size: 8,
        fold_steps: vec![3, 2],
        final_poly_len: 2,
    };
    let codec = LpcCodec::<K, KF, 8>::new(WireConfig::for_field::<K>(Endianness::Little), params.clone())
        .unwrap();

    let mut rng = StdRng::seed_from_u64(12);
    let proof: EvalProof<K, KF, 8> =
        random_eval_proof(&mut rng, &shapes(&[(2, 3, 1), (6, 1, 2)]), &params);

    let wire = codec.encode_eval_proof(&proof).unwrap();
    assert_eq!(codec.decode_eval_proof(wire.as_bytes()).unwrap(), proof);
}

#[test]
fn test_decode_many_keeps_order() {
    let params = two_round_params(1);
    let codec = LpcCodec::<F, EF, DIGEST_ELEMS>::new(le(), params.clone()).unwrap();

    let proofs: Vec<Proof> = (0..6)
        .map(|seed| sample_proof(100 + seed, &[(0, 1 + seed as usize % 3, 1)], &params))
        .collect();
    let mut wires: Vec<WireForm> = proofs
        .iter()
        .map(|proof| codec.encode_eval_proof(proof).unwrap())
        .collect();

    // Corrupt the third wire
    let mut broken = wires[2].clone().into_bytes();
    broken.truncate(broken.len() / 2);
    wires[2] = WireForm::from(broken);

    let decoded = codec.decode_eval_proofs(&wires);
    assert_eq!(decoded.len(), proofs.len());
    for (i, (result, proof)) in decoded.into_iter().zip(&proofs).enumerate() {
        if i == 2 {
            assert!(result.unwrap_err().is_malformed());
        } else {
            assert_eq!(&result.unwrap(), proof);
        }
    }
}

#[test]
fn test_fri_field_matches_expected_length() {
    let params = two_round_params(3);
    let config = le();
    let proof = sample_proof(13, &[(0, 2, 1), (4, 3, 2)], &params);
    let descriptor = derive_batch_descriptor(&proof.z);

    let fri = encode_fri_proof(&proof.fri_proof, &descriptor, &params, &config).unwrap();
    assert_eq!(
        expected_fri_len::<F, EF, DIGEST_ELEMS>(&descriptor, &params, &config),
        Ok(fri.len())
    );
}

#[test]
fn test_expected_fri_len_rejects_invalid_params() {
    let config = le();
    let descriptor = derive_batch_descriptor(&sample_proof(14, &[(0, 1, 1)], &two_round_params(1)).z);

    // No folding rounds at all
    let mut no_rounds = two_round_params(1);
    no_rounds.fold_steps.clear();
    assert_eq!(
        expected_fri_len::<F, EF, DIGEST_ELEMS>(&descriptor, &no_rounds, &config),
        Err(MarshalError::InvalidFriParams(FriParamsError::NoRounds))
    );

    // A step wider than any shift the geometry could take
    let mut huge_step = two_round_params(1);
    huge_step.fold_steps = vec![64];
    assert_eq!(
        expected_fri_len::<F, EF, DIGEST_ELEMS>(&descriptor, &huge_step, &config),
        Err(MarshalError::InvalidFriParams(FriParamsError::DomainTooSmall {
            log_domain_size: 4,
            required: 65,
        }))
    );
}

#[test]
fn test_fri_field_of_wrong_length_is_a_structure_mismatch() {
    let config = le();
    let written_with = two_round_params(2);
    let proof = sample_proof(15, &[(0, 2, 1), (3, 1, 2)], &written_with);
    let wire = encode_eval_proof(&proof, &written_with, &config).unwrap();

    // Step 1: z is intact, but the reader expects a single query
    let err = decode_eval_proof::<F, EF, DIGEST_ELEMS>(wire.as_bytes(), &two_round_params(1), &config)
        .unwrap_err();
    assert!(matches!(
        err,
        MarshalError::InconsistentStructure {
            what: "FRI proof length",
            ..
        }
    ));

    // Step 2: the FRI field padded by one byte inside a well-framed bundle
    let [z, fri] = eval_proof_fields(wire.as_bytes(), &config).unwrap();
    let mut padded = fri.to_vec();
    padded.push(0);
    let expected = padded.len() - 1;
    let rebundled = encode_bundle(
        &[WireForm::from(z.to_vec()), WireForm::from(padded)],
        &config,
    )
    .unwrap();
    assert_eq!(
        decode_eval_proof::<F, EF, DIGEST_ELEMS>(rebundled.as_bytes(), &written_with, &config),
        Err(MarshalError::InconsistentStructure {
            what: "FRI proof length",
            expected,
            actual: expected + 1,
        })
    );
}

#[test]
fn test_encode_detects_foreign_batch_id() {
    let params = two_round_params(1);
    let config = le();
    let mut proof = sample_proof(16, &[(0, 1, 1), (1, 1, 1)], &params);

    // Same number of openings, but batch 1 is opened under id 5
    let initial = &mut proof.fri_proof.query_proofs[0].initial_proof;
    let opening = initial.remove(&1).unwrap();
    initial.insert(5, opening);

    assert_eq!(
        encode_eval_proof(&proof, &params, &config),
        Err(MarshalError::InconsistentStructure {
            what: "batch id",
            expected: 1,
            actual: 5,
        })
    );
}

proptest! {
    #[test]
    fn prop_eval_proof_round_trip(
        // Batch id -> (polynomials, points)
        batches in prop::collection::btree_map(0usize..64, (1usize..4, 1usize..4), 1..4),
        num_queries in 1usize..3,
        big_endian in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let params = two_round_params(num_queries);
        let endianness = if big_endian { Endianness::Big } else { Endianness::Little };
        let config = WireConfig::for_field::<F>(endianness);

        let entries: Vec<_> = batches
            .into_iter()
            .map(|(id, (num_polys, num_points))| (id, num_polys, num_points))
            .collect();
        let proof = sample_proof(seed, &entries, &params);

        let wire = encode_eval_proof(&proof, &params, &config).unwrap();
        let decoded: Proof = decode_eval_proof(wire.as_bytes(), &params, &config).unwrap();

        prop_assert_eq!(derive_batch_descriptor(&decoded.z), derive_batch_descriptor(&proof.z));
        prop_assert_eq!(decoded, proof);
    }

    #[test]
    fn prop_swapped_fields_never_decode(
        batches in prop::collection::btree_map(0usize..64, (1usize..4, 1usize..4), 1..4),
        num_queries in 1usize..3,
        big_endian in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let params = two_round_params(num_queries);
        let endianness = if big_endian { Endianness::Big } else { Endianness::Little };
        let config = WireConfig::for_field::<F>(endianness);

        let entries: Vec<_> = batches
            .into_iter()
            .map(|(id, (num_polys, num_points))| (id, num_polys, num_points))
            .collect();
        let proof = sample_proof(seed, &entries, &params);

        // Put the FRI field first and z second
        let wire = encode_eval_proof(&proof, &params, &config).unwrap();
        let [z, fri] = eval_proof_fields(wire.as_bytes(), &config).unwrap();
        let swapped = encode_bundle(
            &[WireForm::from(fri.to_vec()), WireForm::from(z.to_vec())],
            &config,
        )
        .unwrap();

        let result = decode_eval_proof::<F, EF, DIGEST_ELEMS>(swapped.as_bytes(), &params, &config);
        prop_assert!(result.is_err());
        if let Err(err) = result {
            prop_assert!(err.is_malformed() || err.is_inconsistent(), "{:?}", err);
        }
    }
}
