use std::{fmt, str::FromStr};

use super::ChainConfig;

/// Public networks with built-in fork schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Ropsten,
    Goerli,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown network: {0}")]
pub struct UnknownNetwork(String);

impl Network {
    pub fn chain_config(self) -> ChainConfig {
        match self {
            Network::Mainnet => ChainConfig {
                chain_id: 1,
                homestead_block: Some(1_150_000),
                eip150_block: Some(2_463_000),
                eip155_block: Some(2_675_000),
                eip158_block: Some(2_675_000),
                byzantium_block: Some(4_370_000),
                constantinople_block: Some(7_280_000),
                petersburg_block: Some(7_280_000),
                istanbul_block: Some(9_069_000),
            },
            Network::Ropsten => ChainConfig {
                chain_id: 3,
                homestead_block: Some(0),
                eip150_block: Some(0),
                eip155_block: Some(10),
                eip158_block: Some(10),
                byzantium_block: Some(1_700_000),
                constantinople_block: Some(4_230_000),
                petersburg_block: Some(4_939_394),
                istanbul_block: Some(6_485_846),
            },
            Network::Goerli => ChainConfig {
                chain_id: 5,
                homestead_block: Some(0),
                eip150_block: Some(0),
                eip155_block: Some(0),
                eip158_block: Some(0),
                byzantium_block: Some(0),
                constantinople_block: Some(0),
                petersburg_block: Some(0),
                istanbul_block: Some(1_561_651),
            },
        }
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "ropsten" => Ok(Network::Ropsten),
            "goerli" => Ok(Network::Goerli),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Goerli => "goerli",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Fork;

    #[test]
    fn select_network_by_name() {
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("goerli".parse::<Network>().unwrap().chain_config().chain_id, 5);
        assert!("rinkeby".parse::<Network>().is_err());
        assert_eq!(Network::Ropsten.to_string(), "ropsten");
    }

    #[test]
    fn presets_are_independent_values() {
        let mut config = Network::Goerli.chain_config();
        config.istanbul_block = None;
        assert_eq!(
            Network::Goerli.chain_config().fork(1_561_651),
            Fork::Istanbul
        );
        assert_eq!(config.fork(1_561_651), Fork::Petersburg);
    }
}
