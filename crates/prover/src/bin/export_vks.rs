//! Export verifying keys.
//!
//! Loads the circuit keys (running setup if the directory is empty) and
//! prints each verifying key as hex, then writes them to
//! `<keys>/verifying_keys.json` for scripting.
//!
//! Usage:
//!   export-vks [keys_dir] [seed]

use std::error::Error;
use std::path::PathBuf;

use mvs_prover::setup::{load_or_setup, CircuitKeys};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let keys_dir = PathBuf::from(args.next().unwrap_or_else(|| "keys".to_string()));
    let seed: u64 = match args.next() {
        Some(seed) => seed.parse()?,
        None => 42,
    };

    if CircuitKeys::exists_in(&keys_dir) {
        println!("Loading existing keys from {:?}", keys_dir);
    } else {
        println!("Running trusted setup with seed {} (this may take a while)...", seed);
    }
    let keys = load_or_setup(&keys_dir, seed)?;

    println!("\n=== Verifying Keys ===\n");

    let insertion_vk = keys.insertion.serialize_vk()?;
    let membership_vk = keys.membership.serialize_vk()?;

    println!("Insertion VK ({} bytes):", insertion_vk.len());
    println!("0x{}\n", hex::encode(&insertion_vk));

    println!("Membership VK ({} bytes):", membership_vk.len());
    println!("0x{}\n", hex::encode(&membership_vk));

    let json = serde_json::json!({
        "insertion_vk": format!("0x{}", hex::encode(&insertion_vk)),
        "membership_vk": format!("0x{}", hex::encode(&membership_vk)),
    });

    let json_path = keys_dir.join("verifying_keys.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&json)?)?;
    println!("JSON exported to {:?}", json_path);

    Ok(())
}
