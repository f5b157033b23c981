//! End-to-end tests of the pool contract deployments.
use std::path::PathBuf;

use pool_deployer::ContractFactory;

/// Load the test artifact of `contract`.
///
/// Test artifacts share the pool contracts' ABIs but carry a minimal creation
/// code, so the tests don't depend on a Solidity toolchain.
///
/// # Errors
///
/// May fail if there's no test artifact for `contract`.
pub fn factory(contract: &str) -> eyre::Result<ContractFactory> {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../deployer/tests/fixtures");
    ContractFactory::load(fixtures, contract)
}
