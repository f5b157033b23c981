use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::{
    node_bindings::AnvilInstance, signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::Context;
use pool_deployer::{local_signer, spawn_local_chain, Fork};
use tracing_subscriber::EnvFilter;

const FORK_URL_ENV_VAR_NAME: &str = "E2E_FORK_URL";
const FORK_BLOCK_NUMBER_ENV_VAR_NAME: &str = "E2E_FORK_BLOCK_NUMBER";

/// An ephemeral local chain, killed when dropped.
pub struct Chain {
    anvil: AnvilInstance,
    next_account: AtomicUsize,
}

impl Chain {
    /// Spawn a fresh chain.
    ///
    /// When `E2E_FORK_URL` is set the chain forks it, pinned at
    /// `E2E_FORK_BLOCK_NUMBER` if that is set too.
    ///
    /// # Errors
    ///
    /// May fail if `anvil` isn't installed or the fork settings are invalid.
    pub fn spawn() -> eyre::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();

        let fork = fork_from_env(|key| std::env::var(key).ok())?;
        let anvil = spawn_local_chain(fork.as_ref())?;
        Ok(Self { anvil, next_account: AtomicUsize::new(0) })
    }

    /// The rpc endpoint of this chain.
    #[must_use]
    pub fn url(&self) -> Url {
        self.anvil.endpoint_url()
    }

    /// Hand out the next unused prefunded signer.
    pub(crate) fn next_signer(&self) -> eyre::Result<PrivateKeySigner> {
        let index = self.next_account.fetch_add(1, Ordering::Relaxed);
        local_signer(&self.anvil, index)
    }
}

fn fork_from_env(
    env: impl Fn(&str) -> Option<String>,
) -> eyre::Result<Option<Fork>> {
    let set = |key: &str| env(key).filter(|value| !value.is_empty());

    let Some(url) = set(FORK_URL_ENV_VAR_NAME) else {
        return Ok(None);
    };
    let url = url
        .parse::<Url>()
        .wrap_err_with(|| format!("{FORK_URL_ENV_VAR_NAME} is not a url"))?;
    let block_number = set(FORK_BLOCK_NUMBER_ENV_VAR_NAME)
        .map(|block| block.parse::<u64>())
        .transpose()
        .wrap_err_with(|| {
            format!("{FORK_BLOCK_NUMBER_ENV_VAR_NAME} is not a block number")
        })?;
    Ok(Some(Fork { url, block_number }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(
        vars: &'static [(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn no_fork_when_url_is_unset_or_empty() -> eyre::Result<()> {
        assert_eq!(fork_from_env(env(&[]))?, None);
        assert_eq!(
            fork_from_env(env(&[
                (FORK_URL_ENV_VAR_NAME, ""),
                (FORK_BLOCK_NUMBER_ENV_VAR_NAME, "8439100"),
            ]))?,
            None
        );
        Ok(())
    }

    #[test]
    fn forks_at_the_given_block() -> eyre::Result<()> {
        let fork = fork_from_env(env(&[
            (FORK_URL_ENV_VAR_NAME, "http://127.0.0.1:8545"),
            (FORK_BLOCK_NUMBER_ENV_VAR_NAME, "8439100"),
        ]))?
        .expect("fork url is set");
        assert_eq!(fork.block_number, Some(8_439_100));

        let fork = fork_from_env(env(&[
            (FORK_URL_ENV_VAR_NAME, "http://127.0.0.1:8545"),
            (FORK_BLOCK_NUMBER_ENV_VAR_NAME, ""),
        ]))?
        .expect("fork url is set");
        assert_eq!(fork.block_number, None);
        Ok(())
    }

    #[test]
    fn rejects_invalid_fork_settings() {
        let err = fork_from_env(env(&[(FORK_URL_ENV_VAR_NAME, "not a url")]))
            .expect_err("should reject the url");
        assert!(err.to_string().contains("is not a url"));

        let err = fork_from_env(env(&[
            (FORK_URL_ENV_VAR_NAME, "http://127.0.0.1:8545"),
            (FORK_BLOCK_NUMBER_ENV_VAR_NAME, "latest"),
        ]))
        .expect_err("should reject the block");
        assert!(err.to_string().contains("is not a block number"));
    }
}
