use crate::hardfork::Hardfork;

/// Retrieves the base miner reward for the provided hardfork, in wei.
/// Returns `None` once proof-of-stake removes block rewards.
pub fn miner_reward(hardfork: Hardfork) -> Option<u128> {
    match hardfork {
        Hardfork::Frontier
        | Hardfork::Homestead
        | Hardfork::Dao
        | Hardfork::Tangerine
        | Hardfork::SpuriousDragon => Some(5_000_000_000_000_000_000u128),
        Hardfork::Byzantium => Some(3_000_000_000_000_000_000u128),
        Hardfork::Constantinople
        | Hardfork::Petersburg
        | Hardfork::Istanbul
        | Hardfork::MuirGlacier
        | Hardfork::Berlin
        | Hardfork::London
        | Hardfork::ArrowGlacier
        | Hardfork::GrayGlacier => Some(2_000_000_000_000_000_000u128),
        _ => None,
    }
}
