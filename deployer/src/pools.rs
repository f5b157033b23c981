//! The pool contracts and the constructor arguments they're deployed with.

use std::str::FromStr;

use eyre::bail;

/// Constructor argument `DestinationPool` is deployed with by default.
pub const DESTINATION_POOL_ARG: &str =
    "0x13576E2eeB9696e63f10DD2778697c84EAaF4872";

/// A pool contract with known deployment defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// `OriginPool`, its constructor values are hardcoded.
    Origin,
    /// `DestinationPool`, constructed with a single address.
    Destination,
}

impl Pool {
    /// Every known pool.
    pub const ALL: [Pool; 2] = [Pool::Origin, Pool::Destination];

    /// Name of the contract, as found in its artifact.
    #[must_use]
    pub const fn contract_name(self) -> &'static str {
        match self {
            Pool::Origin => "OriginPool",
            Pool::Destination => "DestinationPool",
        }
    }

    /// Constructor arguments used when none are given.
    #[must_use]
    pub fn default_args(self) -> Vec<String> {
        match self {
            Pool::Origin => vec![],
            Pool::Destination => vec![DESTINATION_POOL_ARG.to_owned()],
        }
    }
}

impl FromStr for Pool {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Pool::ALL.into_iter().find(|pool| pool.contract_name() == s) {
            Some(pool) => Ok(pool),
            None => bail!("`{s}` is not a pool contract"),
        }
    }
}

/// Constructor arguments to deploy `contract` with.
///
/// Explicit arguments win. Otherwise known pools fall back to their defaults
/// and any other contract is deployed without arguments.
#[must_use]
pub fn constructor_args(contract: &str, explicit: Vec<String>) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit;
    }
    contract.parse::<Pool>().map(Pool::default_args).unwrap_or_default()
}
