/*!
# Pool deployer

Deployment tooling for the `OriginPool` and `DestinationPool` contracts.

A deployment goes through three steps:

1. A named network from [`Config`] is resolved into a [`Target`], reading
   endpoint URLs and signing keys from the environment.
2. The target is opened as a [`Connection`]. Live networks are reached over
   HTTP, local ones get a fresh ephemeral chain that lives as long as the
   connection.
3. A [`Deployer`] sends the creation code built by a [`ContractFactory`] and
   waits for the receipt.

```ignore
let config = Config::default();
let target = config.resolve("goerli")?;
let connection = Connection::open(&target)?;

let factory = ContractFactory::load("artifacts", "DestinationPool")?;
let deployment = connection
    .as_deployer()
    .with_constructor(pools::constructor_args("DestinationPool", vec![]))
    .deploy(&factory)
    .await?;

println!("{deployment}");
```
*/

pub mod artifact;
pub mod config;
mod deploy;
pub mod pools;
mod system;

pub use artifact::ContractFactory;
pub use config::{Config, Endpoint, Fork, Target};
pub use deploy::{Deployer, Deployment, DeploymentError};
pub use system::{local_signer, spawn_local_chain, wallet, Connection, Wallet};
