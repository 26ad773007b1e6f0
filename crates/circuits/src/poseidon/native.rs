//! Native Poseidon hashing (outside circuits).

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;

use super::config::poseidon_config;

/// Hash two field elements. Used to combine Merkle siblings.
pub fn hash_two(left: Fr, right: Fr) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&left);
    sponge.absorb(&right);
    sponge.squeeze_field_elements(1)[0]
}

/// Hash an arbitrary sequence of field elements.
pub fn hash_many(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_field_elements(1)[0]
}
