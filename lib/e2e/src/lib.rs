//! End-to-end testing against ephemeral local chains.
//!
//! Every test annotated with [`test`] spawns its own chain and gets one
//! prefunded [`Account`] per parameter.
//!
//! ```rust,ignore
//! #[e2e::test]
//! async fn deploys(alice: Account) -> eyre::Result<()> {
//!     let factory = ContractFactory::load("artifacts", "OriginPool")?;
//!     let deployment = alice.as_deployer().deploy(&factory).await?;
//!     e2e::log("Contract address", deployment.address);
//!     Ok(())
//! }
//! ```
mod account;
mod chain;

use std::fmt::Display;

pub use account::Account;
pub use chain::Chain;
pub use e2e_proc::test;

/// Log `value` under a `context` heading.
pub fn log(context: &str, value: impl Display) {
    tracing::info!(context, %value);
}
