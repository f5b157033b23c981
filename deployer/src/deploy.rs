use std::fmt;

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, RpcError, TransportErrorKind},
};
use eyre::{Context, ContextCompat};
use tracing::{debug, info};

use crate::{
    artifact::ContractFactory,
    system::{wallet, Wallet},
};

/// Json-rpc error code nodes answer with when execution reverts.
const EXECUTION_REVERTED_CODE: i64 = 3;

/// The contract's constructor reverted.
///
/// Nodes usually catch the revert while estimating gas, before anything is
/// sent, in which case there's no transaction hash.
#[derive(Debug)]
pub struct DeploymentError {
    /// Name of the contract being deployed.
    pub contract: String,
    /// Hash of the reverted creation transaction, if one was mined.
    pub tx_hash: Option<TxHash>,
    /// Revert data returned by the node, empty when unknown.
    pub revert_data: Bytes,
}

impl DeploymentError {
    /// Convert [`eyre::Report`] into [`DeploymentError`].
    #[must_use]
    pub fn from_report(report: &eyre::Report) -> Option<&Self> {
        report.downcast_ref::<DeploymentError>()
    }

    /// Recognize a revert reported by the node while submitting the
    /// deployment of `contract`.
    fn from_rpc(
        contract: &str,
        err: &RpcError<TransportErrorKind>,
    ) -> Option<Self> {
        let payload = err.as_error_resp()?;
        let reverted = payload.code == EXECUTION_REVERTED_CODE
            || payload.message.contains("execution reverted");
        if !reverted {
            return None;
        }
        let revert_data = payload
            .try_data_as::<Bytes>()
            .and_then(Result::ok)
            .unwrap_or_default();
        Some(Self { contract: contract.to_owned(), tx_hash: None, revert_data })
    }
}

impl fmt::Display for DeploymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} deployment reverted", self.contract)?;
        if let Some(tx_hash) = self.tx_hash {
            write!(f, " in transaction {tx_hash}")?;
        }
        if !self.revert_data.is_empty() {
            write!(f, ": {}", self.revert_data)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeploymentError {}

/// A contract confirmed on chain.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Name of the deployed contract.
    pub contract: String,
    /// Address the contract lives at.
    pub address: Address,
    /// Account that sent the creation transaction.
    pub deployer: Address,
    /// Receipt of the creation transaction.
    pub receipt: TransactionReceipt,
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Deployed to {}", self.contract, self.address)
    }
}

/// A basic smart contract deployer.
pub struct Deployer {
    wallet: Wallet,
    signer: Address,
    ctr_args: Option<Vec<String>>,
    confirmations: u64,
}

impl Deployer {
    /// Create a deployer sending transactions to `rpc_url` on behalf of
    /// `signer`.
    #[must_use]
    pub fn new(rpc_url: Url, signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            wallet: wallet(rpc_url, signer),
            signer: address,
            ctr_args: None,
            confirmations: 1,
        }
    }

    /// Add solidity constructor arguments to the deployer.
    #[must_use]
    pub fn with_constructor(mut self, ctr_args: Vec<String>) -> Deployer {
        self.ctr_args = Some(ctr_args);
        self
    }

    /// Wait for `confirmations` blocks before reporting the deployment.
    #[must_use]
    pub fn with_confirmations(mut self, confirmations: u64) -> Deployer {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Deploy the contract produced by `factory` and wait for its receipt.
    /// Consumes currently configured deployer.
    ///
    /// # Errors
    ///
    /// May error if:
    ///
    /// - The constructor arguments don't match the contract's constructor.
    /// - The endpoint is unreachable or rejects the transaction.
    /// - The creation transaction reverts, see [`DeploymentError`].
    pub async fn deploy(
        self,
        factory: &ContractFactory,
    ) -> eyre::Result<Deployment> {
        let contract = factory.name().to_owned();
        let args = self.ctr_args.unwrap_or_default();
        let code = factory.deploy_code(&args)?;

        info!(%contract, deployer = %self.signer, ?args, "deploying");
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_deploy_code(code);

        let pending =
            self.wallet.send_transaction(tx).await.map_err(|err| {
                match DeploymentError::from_rpc(&contract, &err) {
                    Some(revert) => eyre::Report::new(revert),
                    None => eyre::Report::new(err).wrap_err(format!(
                        "failed to send {contract} deployment"
                    )),
                }
            })?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, confirmations = self.confirmations, "submitted");

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .wrap_err_with(|| {
                format!("failed to confirm {contract} deployment {tx_hash}")
            })?;

        if !receipt.status() {
            return Err(eyre::Report::new(DeploymentError {
                contract,
                tx_hash: Some(tx_hash),
                revert_data: Bytes::new(),
            }));
        }

        let address = receipt
            .contract_address()
            .context("receipt contains no contract address")?;
        info!(
            %contract,
            %address,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "deployed"
        );

        Ok(Deployment { contract, address, deployer: self.signer, receipt })
    }
}

#[cfg(test)]
mod tests {
    use alloy::rpc::json_rpc::ErrorPayload;

    use super::*;

    fn rpc_error(json: &str) -> RpcError<TransportErrorKind> {
        let payload: ErrorPayload =
            serde_json::from_str(json).expect("should be an error payload");
        RpcError::ErrorResp(payload)
    }

    #[test]
    fn recovers_deployment_error_from_report() {
        let tx_hash = TxHash::repeat_byte(0x11);
        let report = eyre::Report::new(DeploymentError {
            contract: "OriginPool".to_owned(),
            tx_hash: Some(tx_hash),
            revert_data: Bytes::new(),
        })
        .wrap_err("deploy failed");

        let err = DeploymentError::from_report(&report)
            .expect("should downcast to DeploymentError");
        assert_eq!(err.tx_hash, Some(tx_hash));
        assert_eq!(
            err.to_string(),
            format!("OriginPool deployment reverted in transaction {tx_hash}")
        );

        let other = eyre::eyre!("connection refused");
        assert!(DeploymentError::from_report(&other).is_none());
    }

    #[test]
    fn classifies_reverts_reported_by_the_node() {
        let err = rpc_error(
            r#"{"code":3,"message":"execution reverted","data":"0x08c379a0"}"#,
        );
        let revert = DeploymentError::from_rpc("DestinationPool", &err)
            .expect("code 3 is a revert");
        assert_eq!(revert.tx_hash, None);
        assert_eq!(&revert.revert_data[..], [0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(
            revert.to_string(),
            "DestinationPool deployment reverted: 0x08c379a0"
        );

        let err = rpc_error(r#"{"code":-32000,"message":"execution reverted"}"#);
        let revert = DeploymentError::from_rpc("OriginPool", &err)
            .expect("the message names a revert");
        assert!(revert.revert_data.is_empty());

        let err = rpc_error(
            r#"{"code":-32000,"message":"insufficient funds for gas * price + value"}"#,
        );
        assert!(DeploymentError::from_rpc("OriginPool", &err).is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() -> eyre::Result<()> {
        let factory = ContractFactory::from_json(
            "OriginPool",
            r#"{ "abi": [], "bytecode": "0x6001600c60003960016000f300" }"#,
        )?;
        let signer = PrivateKeySigner::random();

        let err = Deployer::new("http://127.0.0.1:1".parse()?, signer)
            .deploy(&factory)
            .await
            .expect_err("nothing listens on port 1");
        assert!(err.to_string().contains("failed to send OriginPool"));
        assert!(DeploymentError::from_report(&err).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rejects_bad_arguments_before_sending() -> eyre::Result<()> {
        let factory = ContractFactory::from_json(
            "OriginPool",
            r#"{ "abi": [], "bytecode": "0x6001600c60003960016000f300" }"#,
        )?;

        let err = Deployer::new(
            "http://127.0.0.1:1".parse()?,
            PrivateKeySigner::random(),
        )
        .with_constructor(vec!["1".to_owned()])
        .deploy(&factory)
        .await
        .expect_err("OriginPool takes no arguments");
        assert!(err.to_string().contains("has no constructor"));
        Ok(())
    }
}
