use std::fmt;

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use pool_deployer::{wallet, Deployer, Wallet};

use crate::Chain;

/// Type that corresponds to a test account.
#[derive(Clone)]
pub struct Account {
    /// The account's local private key wrapper.
    pub signer: PrivateKeySigner,
    /// The account's wallet -- an `alloy` provider with a `WalletFiller`.
    pub wallet: Wallet,
    url: Url,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Take the next prefunded account of `chain`.
    ///
    /// # Errors
    ///
    /// May fail if the chain has no unused accounts left.
    pub fn new(chain: &Chain) -> eyre::Result<Self> {
        let signer = chain.next_signer()?;
        let url = chain.url();
        let wallet = wallet(url.clone(), signer.clone());
        Ok(Self { signer, wallet, url })
    }

    /// Get a hex-encoded String representing this account's private key.
    #[must_use]
    pub fn pk(&self) -> String {
        alloy::hex::encode(self.signer.to_bytes())
    }

    /// Retrieve this account's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The rpc endpoint this account's provider is connected to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get gas token balance.
    ///
    /// # Errors
    ///
    /// May fail if the chain can't be reached.
    pub async fn balance(&self) -> eyre::Result<U256> {
        Ok(self.wallet.get_balance(self.address()).await?)
    }

    /// Create a configurable smart contract deployer on behalf of this
    /// account.
    #[must_use]
    pub fn as_deployer(&self) -> Deployer {
        Deployer::new(self.url.clone(), self.signer.clone())
    }
}
