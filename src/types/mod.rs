use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// Fixed on-chain addresses for the supported venues.
///
/// Authority addresses are the program-owned accounts that custody both
/// legs of a pool. Program addresses gate which classifiers are attempted
/// for a given transaction.
pub mod addresses {
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    /// Wrapped SOL mint
    pub fn wsol_mint() -> Pubkey {
        Pubkey::from_str("So11111111111111111111111111111111111111112")
            .expect("Invalid WSOL mint pubkey")
    }

    /// Pump.fun bonding curve program
    pub fn pump_fun_program() -> Pubkey {
        Pubkey::from_str("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P")
            .expect("Invalid pump.fun program pubkey")
    }

    /// PumpSwap AMM program
    pub fn pump_swap_program() -> Pubkey {
        Pubkey::from_str("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA")
            .expect("Invalid PumpSwap program pubkey")
    }

    /// Raydium AMM V4 program
    pub fn raydium_v4_program() -> Pubkey {
        Pubkey::from_str("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8")
            .expect("Invalid Raydium V4 program pubkey")
    }

    /// Raydium AMM V4 pool authority
    pub fn raydium_v4_authority() -> Pubkey {
        Pubkey::from_str("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1")
            .expect("Invalid Raydium V4 authority pubkey")
    }

    /// Raydium CPMM program
    pub fn raydium_cpmm_program() -> Pubkey {
        Pubkey::from_str("CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C")
            .expect("Invalid Raydium CPMM program pubkey")
    }

    /// Raydium CPMM pool authority
    pub fn raydium_cpmm_authority() -> Pubkey {
        Pubkey::from_str("GpMZbSM2GgvTKHJirzeGfMFoaZ8UR2X7F4v8vHTvxFbL")
            .expect("Invalid Raydium CPMM authority pubkey")
    }

    /// Raydium Launchpad program
    pub fn raydium_launchpad_program() -> Pubkey {
        Pubkey::from_str("LanMV9sAd7wArD4vJFi2qDdfnVhFxYSUg6eADduJ3uj")
            .expect("Invalid Raydium Launchpad program pubkey")
    }

    /// Raydium Launchpad pool authority
    pub fn raydium_launchpad_authority() -> Pubkey {
        Pubkey::from_str("WLHv2UAZm6z4KyaaELi5pjdbJh6RESMva1Rnn8pJVVh")
            .expect("Invalid Raydium Launchpad authority pubkey")
    }

    /// Meteora Dynamic Bonding Curve program
    pub fn meteora_dbc_program() -> Pubkey {
        Pubkey::from_str("dbcij3LWUppWqq96dh6gJWwBifmcGfLSB5D4DuSMaqN")
            .expect("Invalid Meteora DBC program pubkey")
    }

    /// Meteora Dynamic Bonding Curve pool authority
    pub fn meteora_dbc_authority() -> Pubkey {
        Pubkey::from_str("FhVo3mqL8PW5pH5U2CN4XE33DokiyZnUwuGpH2hmHLuM")
            .expect("Invalid Meteora DBC authority pubkey")
    }
}

/// A supported DEX or launch venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    PumpFun,
    RaydiumV4,
    RaydiumCpmm,
    RaydiumLaunchpad,
    MeteoraDbc,
    PumpSwap,
}

impl Venue {
    /// All venues in classification order: bonding curve first, then the
    /// fixed-authority pools, then the multi-market AMM.
    pub fn all() -> [Venue; 6] {
        [
            Venue::PumpFun,
            Venue::RaydiumV4,
            Venue::RaydiumCpmm,
            Venue::RaydiumLaunchpad,
            Venue::MeteoraDbc,
            Venue::PumpSwap,
        ]
    }

    /// The on-chain program that executes swaps for this venue
    pub fn program_id(&self) -> Pubkey {
        match self {
            Venue::PumpFun => addresses::pump_fun_program(),
            Venue::RaydiumV4 => addresses::raydium_v4_program(),
            Venue::RaydiumCpmm => addresses::raydium_cpmm_program(),
            Venue::RaydiumLaunchpad => addresses::raydium_launchpad_program(),
            Venue::MeteoraDbc => addresses::meteora_dbc_program(),
            Venue::PumpSwap => addresses::pump_swap_program(),
        }
    }

    /// The fixed pool authority, for venues that have one
    pub fn pool_authority(&self) -> Option<Pubkey> {
        match self {
            Venue::RaydiumV4 => Some(addresses::raydium_v4_authority()),
            Venue::RaydiumCpmm => Some(addresses::raydium_cpmm_authority()),
            Venue::RaydiumLaunchpad => Some(addresses::raydium_launchpad_authority()),
            Venue::MeteoraDbc => Some(addresses::meteora_dbc_authority()),
            Venue::PumpFun | Venue::PumpSwap => None,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::PumpFun => write!(f, "pump.fun"),
            Venue::RaydiumV4 => write!(f, "Raydium V4"),
            Venue::RaydiumCpmm => write!(f, "Raydium CPMM"),
            Venue::RaydiumLaunchpad => write!(f, "Raydium Launchpad"),
            Venue::MeteoraDbc => write!(f, "Meteora DBC"),
            Venue::PumpSwap => write!(f, "PumpSwap"),
        }
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pump_fun" | "pumpfun" => Ok(Venue::PumpFun),
            "raydium_v4" => Ok(Venue::RaydiumV4),
            "raydium_cpmm" => Ok(Venue::RaydiumCpmm),
            "raydium_launchpad" => Ok(Venue::RaydiumLaunchpad),
            "meteora_dbc" => Ok(Venue::MeteoraDbc),
            "pump_swap" | "pumpswap" => Ok(Venue::PumpSwap),
            other => Err(format!("unknown venue: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Yellowstone geyser gRPC endpoint URL
    pub grpc_endpoint: String,

    /// Optional x-token for the gRPC endpoint
    pub grpc_x_token: Option<String>,

    /// List of RPC endpoint URLs (for historical backfill and failover)
    pub rpc_endpoints: Vec<String>,

    /// Venues to classify; transactions that touch none of these programs
    /// are dropped without decoding
    pub venues: Vec<Venue>,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Maximum number of reconnection attempts before giving up
    pub max_reconnect_attempts: u32,

    /// Whether to use commitment level "confirmed" (faster) or "finalized" (safer)
    pub use_confirmed_commitment: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            grpc_endpoint: "https://grpc.mainnet.example:10000".to_string(),
            grpc_x_token: None,
            rpc_endpoints: vec!["https://api.mainnet-beta.solana.com".to_string()],
            venues: Venue::all().to_vec(),
            connection_timeout_secs: 30,
            max_reconnect_attempts: 5,
            use_confirmed_commitment: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_serde_round_trip() {
        for venue in Venue::all() {
            let s = serde_json::to_string(&venue).unwrap();
            let back: Venue = serde_json::from_str(&s).unwrap();
            assert_eq!(venue, back);
        }
    }

    #[test]
    fn test_venue_from_str() {
        assert_eq!("pump_fun".parse::<Venue>().unwrap(), Venue::PumpFun);
        assert_eq!("raydium_cpmm".parse::<Venue>().unwrap(), Venue::RaydiumCpmm);
        assert!("orca".parse::<Venue>().is_err());
    }

    #[test]
    fn test_pool_authority_only_for_fixed_authority_venues() {
        assert!(Venue::PumpFun.pool_authority().is_none());
        assert!(Venue::PumpSwap.pool_authority().is_none());
        assert!(Venue::RaydiumV4.pool_authority().is_some());
        assert!(Venue::RaydiumCpmm.pool_authority().is_some());
        assert!(Venue::RaydiumLaunchpad.pool_authority().is_some());
        assert!(Venue::MeteoraDbc.pool_authority().is_some());
    }
}
