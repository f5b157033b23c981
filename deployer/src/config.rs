//! Named deployment targets.
//!
//! Secrets never live in the configuration itself. Every network names the
//! environment variables holding its endpoint URL and signing key, and those
//! are read when the network is resolved into a [`Target`].

use std::{collections::BTreeMap, fmt, fs, path::Path, str::FromStr};

use alloy::{signers::local::PrivateKeySigner, transports::http::reqwest::Url};
use eyre::{bail, Context};
use serde::Deserialize;
use tracing::warn;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "deploy.toml";

const GOERLI_URL_ENV: &str = "ALCHEMY_GOERLI_API_URL";
const MUMBAI_URL_ENV: &str = "ALCHEMY_MUMBAI_API_URL";
const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";
const EXPLORER_API_KEY_ENV: &str = "POLYGONSCAN_API_KEY";
/// Goerli block the local network forks from by default.
const GOERLI_FORK_BLOCK: u64 = 8_439_100;

/// Deployment networks and explorer credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Networks by name.
    pub networks: BTreeMap<String, Network>,
    /// Block explorer credentials.
    #[serde(default)]
    pub explorer: Explorer,
}

/// A network as declared in the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Network {
    /// Whether deployments go to an ephemeral local chain.
    #[serde(default)]
    pub local: bool,
    /// Variable holding the endpoint URL of a live network.
    pub url_env: Option<String>,
    /// Variable holding the signing key of a live network.
    pub private_key_env: Option<String>,
    /// Chain state a local network starts from.
    pub fork: Option<ForkSource>,
}

/// Where a local network forks from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ForkSource {
    /// Variable holding the URL of the forked chain.
    pub url_env: String,
    /// Block to pin the fork at, latest when unset.
    pub block_number: Option<u64>,
}

/// Block explorer credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Explorer {
    /// Variable holding the explorer API key.
    pub api_key_env: String,
}

impl Default for Explorer {
    fn default() -> Self {
        Self { api_key_env: EXPLORER_API_KEY_ENV.to_owned() }
    }
}

impl Default for Config {
    fn default() -> Self {
        let live = |url_env: &str| Network {
            url_env: Some(url_env.to_owned()),
            private_key_env: Some(PRIVATE_KEY_ENV.to_owned()),
            ..Network::default()
        };

        let networks = BTreeMap::from([
            (
                "hardhat".to_owned(),
                Network {
                    local: true,
                    fork: Some(ForkSource {
                        url_env: GOERLI_URL_ENV.to_owned(),
                        block_number: Some(GOERLI_FORK_BLOCK),
                    }),
                    ..Network::default()
                },
            ),
            ("goerli".to_owned(), live(GOERLI_URL_ENV)),
            ("mumbai".to_owned(), live(MUMBAI_URL_ENV)),
        ]);

        Self { networks, explorer: Explorer::default() }
    }
}

impl FromStr for Config {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).wrap_err("invalid network configuration")
    }
}

impl Config {
    /// Read the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// May fail if the file can't be read or isn't valid configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?
            .parse::<Config>()
            .wrap_err_with(|| format!("failed to parse {}", path.display()))
    }

    /// Read the configuration at `path`, or [`DEFAULT_CONFIG_FILE`] when it
    /// exists, falling back to the built-in networks.
    ///
    /// # Errors
    ///
    /// May fail if a configuration file is found but can't be loaded.
    pub fn load_or_default(path: Option<&Path>) -> eyre::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    /// Resolve the network `name` against the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::resolve_with`].
    pub fn resolve(&self, name: &str) -> eyre::Result<Target> {
        self.resolve_with(name, |key| std::env::var(key).ok())
    }

    /// Resolve the network `name`, looking variables up with `env`.
    ///
    /// # Errors
    ///
    /// May fail if:
    ///
    /// - There's no network called `name`.
    /// - A variable the network needs is unset or unparsable.
    /// - The network is both local and live, or forks while live.
    pub fn resolve_with(
        &self,
        name: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> eyre::Result<Target> {
        let Some(network) = self.networks.get(name) else {
            let known: Vec<&str> =
                self.networks.keys().map(String::as_str).collect();
            bail!("unknown network `{name}`, known: {}", known.join(", "));
        };

        let endpoint = if network.local {
            if network.url_env.is_some() || network.private_key_env.is_some()
            {
                bail!("network `{name}` is local and can't set an endpoint");
            }
            Endpoint::Ephemeral { fork: resolve_fork(name, network, &env)? }
        } else {
            if network.fork.is_some() {
                bail!("network `{name}` is live and can't fork, set `local = true`");
            }
            let (Some(url_env), Some(key_env)) =
                (&network.url_env, &network.private_key_env)
            else {
                bail!("network `{name}` needs both `url-env` and `private-key-env`");
            };
            let url = parse_url(url_env, &require(url_env, &env)?)?;
            let signer = require(key_env, &env)?
                .trim()
                .parse::<PrivateKeySigner>()
                .wrap_err_with(|| format!("{key_env} is not a private key"))?;
            Endpoint::Live { url, signer }
        };

        Ok(Target { name: name.to_owned(), endpoint })
    }

    /// The explorer API key, if its variable is set.
    pub fn explorer_api_key(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        env(&self.explorer.api_key_env).filter(|key| !key.is_empty())
    }
}

fn resolve_fork(
    name: &str,
    network: &Network,
    env: &impl Fn(&str) -> Option<String>,
) -> eyre::Result<Option<Fork>> {
    let Some(source) = &network.fork else {
        return Ok(None);
    };
    match env(&source.url_env).filter(|url| !url.is_empty()) {
        Some(url) => Ok(Some(Fork {
            url: parse_url(&source.url_env, &url)?,
            block_number: source.block_number,
        })),
        None => {
            warn!(
                network = name,
                var = %source.url_env,
                "fork url is unset, starting from an empty chain"
            );
            Ok(None)
        }
    }
}

fn require(
    key: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> eyre::Result<String> {
    match env(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("failed to load {key}"),
    }
}

fn parse_url(key: &str, value: &str) -> eyre::Result<Url> {
    value.parse::<Url>().wrap_err_with(|| format!("{key} is not a valid url"))
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.local {
            f.write_str("local")?;
            if let Some(fork) = &self.fork {
                write!(f, ", fork of ${}", fork.url_env)?;
                if let Some(block) = fork.block_number {
                    write!(f, " at block {block}")?;
                }
            }
            return Ok(());
        }

        let url = self.url_env.as_deref().unwrap_or("?");
        let key = self.private_key_env.as_deref().unwrap_or("?");
        write!(f, "url ${url}, key ${key}")
    }
}

/// A resolved deployment target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Network name.
    pub name: String,
    /// Where deployments go.
    pub endpoint: Endpoint,
}

/// Where a [`Target`] sends its transactions.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A live network reached over HTTP.
    Live {
        /// Rpc endpoint.
        url: Url,
        /// Signing credential.
        signer: PrivateKeySigner,
    },
    /// A fresh local chain, discarded when the process exits.
    Ephemeral {
        /// Chain state to start from.
        fork: Option<Fork>,
    },
}

/// A live chain a local chain is forked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fork {
    /// Rpc endpoint of the forked chain.
    pub url: Url,
    /// Block the fork is pinned at.
    pub block_number: Option<u64>,
}
