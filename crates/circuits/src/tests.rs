//! End-to-end Groth16 tests for the registry circuits.

use ark_bn254::{Bn254, Fr};
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use crate::insertion::InsertionValidityCircuit;
use crate::membership::MembershipCircuit;
use crate::schema::{PublicKeyBytes, Schema, UserData, UserSession};
use crate::smt::{SparseMerkleTree, MERKLE_HEIGHT};

fn sample_user(tag: u8) -> UserData {
    UserData {
        user_address: PublicKeyBytes([tag; 32]),
        session: UserSession::new("bob", "bob@example.com", "").unwrap(),
    }
}

/// Full Groth16 round for the insertion-validity circuit.
#[test]
fn test_insertion_full_proof() {
    let mut rng = StdRng::seed_from_u64(7);

    let (pk, vk) =
        Groth16::<Bn254>::circuit_specific_setup(InsertionValidityCircuit::empty(), &mut rng)
            .unwrap();

    let tree = SparseMerkleTree::new(MERKLE_HEIGHT);
    let path = tree.witness(0).unwrap();
    let circuit = InsertionValidityCircuit::new(path.clone(), tree.root(), true);

    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    let public_inputs = InsertionValidityCircuit::public_inputs(&path);
    assert!(Groth16::<Bn254>::verify(&vk, &public_inputs, &proof).unwrap());

    // Bound to the path: another slot's path does not verify
    let other = tree.witness(1).unwrap();
    let other_inputs = InsertionValidityCircuit::public_inputs(&other);
    assert!(!Groth16::<Bn254>::verify(&vk, &other_inputs, &proof).unwrap());
}

/// Full Groth16 round for the membership circuit with a real record.
#[test]
fn test_membership_full_proof() {
    let mut rng = StdRng::seed_from_u64(11);

    let (pk, vk) =
        Groth16::<Bn254>::circuit_specific_setup(MembershipCircuit::empty(), &mut rng).unwrap();

    let user = sample_user(4);
    let fingerprint = user.fingerprint();

    let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
    tree.set_leaf(0, sample_user(3).fingerprint()).unwrap();
    tree.set_leaf(1, fingerprint).unwrap();
    let root = tree.root();

    let circuit = MembershipCircuit::new(root, fingerprint, tree.witness(1).unwrap());
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    assert!(
        Groth16::<Bn254>::verify(&vk, &MembershipCircuit::public_inputs(root, fingerprint), &proof)
            .unwrap()
    );
    assert!(!Groth16::<Bn254>::verify(
        &vk,
        &MembershipCircuit::public_inputs(root, sample_user(5).fingerprint()),
        &proof
    )
    .unwrap());
    assert!(!Groth16::<Bn254>::verify(
        &vk,
        &MembershipCircuit::public_inputs(Fr::from(1u64), fingerprint),
        &proof
    )
    .unwrap());
}
