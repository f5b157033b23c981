use alloy::{
    network::EthereumWallet,
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::{Context, ContextCompat};
use tracing::info;

use crate::{
    config::{Endpoint, Fork, Target},
    deploy::Deployer,
};

/// Convenience type alias that represents an Ethereum wallet -- an `alloy`
/// provider with a wallet filler.
pub type Wallet = DynProvider;

/// Build a [`Wallet`] that signs with `signer` and talks to `url`.
#[must_use]
pub fn wallet(url: Url, signer: PrivateKeySigner) -> Wallet {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url)
        .erased()
}

/// Start an ephemeral local chain, optionally forking `fork`.
///
/// The chain is killed when the returned instance is dropped.
///
/// # Errors
///
/// May fail if the `anvil` binary is missing or the fork endpoint can't be
/// reached.
pub fn spawn_local_chain(fork: Option<&Fork>) -> eyre::Result<AnvilInstance> {
    let mut anvil = Anvil::new();
    if let Some(fork) = fork {
        anvil = anvil.fork(fork.url.as_str());
        if let Some(block_number) = fork.block_number {
            anvil = anvil.fork_block_number(block_number);
        }
    }

    let instance = anvil
        .try_spawn()
        .wrap_err("failed to spawn local chain, is `anvil` installed?")?;
    info!(
        url = %instance.endpoint_url(),
        chain_id = instance.chain_id(),
        forked = fork.is_some(),
        "spawned local chain"
    );
    Ok(instance)
}

/// Get the prefunded development signer number `index` of a local chain.
///
/// # Errors
///
/// May fail if the chain exposes fewer than `index + 1` accounts.
pub fn local_signer(
    chain: &AnvilInstance,
    index: usize,
) -> eyre::Result<PrivateKeySigner> {
    let keys = chain.keys();
    let key = keys.get(index).with_context(|| {
        format!("local chain only has {} dev accounts", keys.len())
    })?;
    PrivateKeySigner::from_bytes(&B256::from_slice(&key.to_bytes()))
        .wrap_err("local chain returned an invalid dev key")
}

/// An opened [`Target`]: an endpoint plus the identity that signs for it.
pub struct Connection {
    url: Url,
    signer: PrivateKeySigner,
    // Kept alive for as long as the connection, dropping it kills the chain.
    _chain: Option<AnvilInstance>,
}

impl Connection {
    /// Open `target`, spawning a local chain for ephemeral endpoints.
    ///
    /// Live endpoints aren't contacted here, the first request happens when
    /// deploying.
    ///
    /// # Errors
    ///
    /// May fail if the local chain can't be started.
    pub fn open(target: &Target) -> eyre::Result<Self> {
        match &target.endpoint {
            Endpoint::Live { url, signer } => Ok(Self {
                url: url.clone(),
                signer: signer.clone(),
                _chain: None,
            }),
            Endpoint::Ephemeral { fork } => {
                let chain = spawn_local_chain(fork.as_ref())?;
                let signer = local_signer(&chain, 0)?;
                Ok(Self {
                    url: chain.endpoint_url(),
                    signer,
                    _chain: Some(chain),
                })
            }
        }
    }

    /// The rpc endpoint deployments are sent to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Address of the account signing deployments.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Create a configurable smart contract deployer on behalf of this
    /// connection's signer.
    #[must_use]
    pub fn as_deployer(&self) -> Deployer {
        Deployer::new(self.url.clone(), self.signer.clone())
    }
}
