//! Circuit statistics utility - reports constraint counts and proof timing
//!
//! Usage:
//!   cargo run --release --bin circuit-stats           # Just constraint counts
//!   cargo run --release --bin circuit-stats -- --time # Include proof timing

use std::time::Instant;

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, SynthesisError};

use mvs_circuits::{
    InsertionValidityCircuit, MembershipCircuit, Schema, SparseMerkleTree, UserData, UserSession,
    MERKLE_HEIGHT,
};
use mvs_prover::{prove_insertion, prove_membership, setup_all_circuits};

fn count_constraints<C: ConstraintSynthesizer<Fr>>(
    circuit: C,
    name: &str,
) -> Result<usize, SynthesisError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone())?;
    let count = cs.num_constraints();
    println!(
        "{:25} {:>8} constraints {:>4} public inputs",
        name,
        count,
        cs.num_instance_variables() - 1
    );
    Ok(count)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let include_timing = std::env::args().any(|a| a == "--time");

    println!("Merkle height: {}", MERKLE_HEIGHT);
    println!("Slots: {}\n", 1u64 << MERKLE_HEIGHT);

    println!("CIRCUIT CONSTRAINTS:");
    let insertion = count_constraints(InsertionValidityCircuit::empty(), "InsertionValidity")?;
    let membership = count_constraints(MembershipCircuit::empty(), "Membership")?;
    println!("\nTotal constraints: {}", insertion + membership);

    if include_timing {
        run_timing_benchmarks()?;
    } else {
        println!("\n(Run with --time to include proof generation timing)");
    }
    Ok(())
}

fn run_timing_benchmarks() -> Result<(), Box<dyn std::error::Error>> {
    const RUNS: u32 = 3;

    println!("\nPROOF TIMING:");
    let start = Instant::now();
    let keys = setup_all_circuits(42)?;
    println!("Setup in {:?}", start.elapsed());

    let user = UserData {
        user_address: [7u8; 32].into(),
        session: UserSession::new("bench", "bench@example.com", "")?,
    };
    let mut tree = SparseMerkleTree::new(MERKLE_HEIGHT);
    let empty_root = tree.root();
    let path = tree.witness(0)?;
    tree.set_leaf(0, user.fingerprint())?;

    let start = Instant::now();
    for _ in 0..RUNS {
        prove_insertion(&keys.insertion.proving_key, &path, empty_root, true)?;
    }
    println!("InsertionValidity avg {:?}", start.elapsed() / RUNS);

    let start = Instant::now();
    for _ in 0..RUNS {
        prove_membership(&keys.membership.proving_key, tree.root(), user.fingerprint(), &path)?;
    }
    println!("Membership        avg {:?}", start.elapsed() / RUNS);

    Ok(())
}
