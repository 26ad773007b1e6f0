//! Poseidon hash over the BN254 scalar field.
//!
//! Every hash in the registry goes through this module: record fingerprints,
//! internal Merkle nodes and the matching in-circuit gadgets. Native and
//! gadget versions must agree bit for bit, otherwise witnesses produced off
//! circuit will not satisfy the circuits.

mod config;
mod gadgets;
mod native;


pub use config::poseidon_config;
pub use gadgets::{hash_many_var, hash_two_var};
pub use native::{hash_many, hash_two};
