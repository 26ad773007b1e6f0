//! Poseidon parameters for BN254.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::MontFp;

/// Full rounds (half before, half after the partial rounds)
const FULL_ROUNDS: usize = 8;

const PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
const ALPHA: u64 = 5;

const RATE: usize = 2;
const CAPACITY: usize = 1;

/// Seed of the round-constant chain ("POSEIDON" as ASCII).
const ARK_SEED: u64 = 0x504f534549444f4e;

static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// Shared Poseidon configuration (rate 2, capacity 1, x^5 S-box).
///
/// Built on first use and reused afterwards; every participant has to hash
/// with exactly these parameters for roots to match.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    CONFIG.get_or_init(build_config)
}

fn build_config() -> PoseidonConfig<Fr> {
    let mds = vec![
        vec![
            MontFp!("7511745149465107256748700652201246547602992235352608707588321460060273774987"),
            MontFp!("10370080108974718697676803824769673834027675643658433702224577712625900127200"),
            MontFp!("19705173408229649878903981084052839426532978878058043055305024233888854471533"),
        ],
        vec![
            MontFp!("18732019378264290557468133440468564866454307626475683536618613112504878618481"),
            MontFp!("20870176810702568768751421378473869562658540583882454726129544628203806653987"),
            MontFp!("7266061498423634438932006217945904744987532209093972706694887950396501989428"),
        ],
        vec![
            MontFp!("9131299761947733513298312097611845208338517739621853568979632113419485819303"),
            MontFp!("10595341252162738537912664445405114076324478519622938027420701542910180337937"),
            MontFp!("11597556804922396090267472882856054602429588299176362916247939723151043581408"),
        ],
    ];

    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark: round_constants(),
        mds,
        rate: RATE,
        capacity: CAPACITY,
    }
}

/// Round constants from a squaring chain seeded with [`ARK_SEED`].
fn round_constants() -> Vec<Vec<Fr>> {
    let width = RATE + CAPACITY;
    let mut state = Fr::from(ARK_SEED);

    (0..FULL_ROUNDS + PARTIAL_ROUNDS)
        .map(|_| {
            (0..width)
                .map(|_| {
                    state = state * state + Fr::from(7u64);
                    state
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_shape() {
        let config = poseidon_config();
        assert_eq!(config.full_rounds, FULL_ROUNDS);
        assert_eq!(config.partial_rounds, PARTIAL_ROUNDS);
        assert_eq!(config.rate, RATE);
        assert_eq!(config.capacity, CAPACITY);
        assert_eq!(config.mds.len(), RATE + CAPACITY);
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
        assert!(config.ark.iter().all(|row| row.len() == RATE + CAPACITY));
    }

    #[test]
    fn test_config_is_shared() {
        assert!(std::ptr::eq(poseidon_config(), poseidon_config()));
    }
}
