//! Compiled contract artifacts.
//!
//! Artifacts are the JSON files a Solidity toolchain writes next to its
//! build output. Both the Hardhat layout (`bytecode` is a hex string) and the
//! Foundry layout (`bytecode.object` is a hex string) are understood.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use eyre::{bail, ensure, Context};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

/// Produces creation code for a compiled contract.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    name: String,
    abi: JsonAbi,
    bytecode: Bytes,
}

impl ContractFactory {
    /// Find the artifact of contract `name` under `dir`.
    ///
    /// The following locations are tried in order:
    ///
    /// - `<dir>/contracts/<name>.sol/<name>.json`
    /// - `<dir>/<name>.sol/<name>.json`
    /// - `<dir>/<name>.json`
    ///
    /// # Errors
    ///
    /// May fail if no artifact is found or it can't be parsed.
    pub fn load<P: AsRef<Path>>(dir: P, name: &str) -> eyre::Result<Self> {
        let dir = dir.as_ref();
        let candidates = artifact_paths(dir, name);
        let Some(path) = candidates.iter().find(|path| path.is_file()) else {
            bail!(
                "no artifact for `{name}` in {}, were the contracts compiled?",
                dir.display()
            );
        };
        Self::from_file(path, name)
    }

    /// Read the artifact at `path`. `name` is used when the artifact doesn't
    /// carry its own contract name.
    ///
    /// # Errors
    ///
    /// May fail if the file can't be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P, name: &str) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::from_json(name, &json)
            .wrap_err_with(|| format!("invalid artifact {}", path.display()))
    }

    /// Parse an artifact from its JSON representation.
    ///
    /// # Errors
    ///
    /// May fail if the JSON isn't an artifact, or the bytecode is empty or
    /// has unlinked libraries.
    pub fn from_json(name: &str, json: &str) -> eyre::Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)
            .wrap_err("expected an artifact with `abi` and linked `bytecode`")?;

        let name = raw.contract_name.unwrap_or_else(|| name.to_owned());
        let bytecode = match raw.bytecode {
            RawBytecode::Hex(code) | RawBytecode::Object { object: code } => {
                code
            }
        };
        ensure!(
            !bytecode.is_empty(),
            "`{name}` has no bytecode, is it abstract or an interface?"
        );

        Ok(Self { name, abi: raw.abi, bytecode })
    }

    /// The contract's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The contract's ABI.
    #[must_use]
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Creation bytecode followed by the ABI-encoded constructor `args`.
    ///
    /// Each argument is coerced from its textual form into the type of the
    /// matching constructor parameter, e.g. `"0x1357..."` for an `address`
    /// or `"[1,2]"` for a `uint256[]`.
    ///
    /// # Errors
    ///
    /// May fail if the number of arguments doesn't match the constructor or
    /// an argument can't be coerced into its parameter type.
    pub fn deploy_code(&self, args: &[String]) -> eyre::Result<Bytes> {
        let name = &self.name;
        let Some(constructor) = self.abi.constructor() else {
            ensure!(
                args.is_empty(),
                "`{name}` has no constructor, got {} argument(s)",
                args.len()
            );
            return Ok(self.bytecode.clone());
        };

        let inputs = &constructor.inputs;
        ensure!(
            inputs.len() == args.len(),
            "`{name}` constructor takes {} argument(s), got {}",
            inputs.len(),
            args.len()
        );

        let values = inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve()?;
                ty.coerce_str(arg).wrap_err_with(|| {
                    format!("`{arg}` is not a valid {} for `{}`", param.ty, param.name)
                })
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        let encoded = constructor.abi_encode_input(&values)?;

        Ok([self.bytecode.as_ref(), encoded.as_slice()].concat().into())
    }
}

fn artifact_paths(dir: &Path, name: &str) -> [PathBuf; 3] {
    let file = format!("{name}.json");
    let source = format!("{name}.sol");
    [
        dir.join("contracts").join(&source).join(&file),
        dir.join(&source).join(&file),
        dir.join(file),
    ]
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, hex};

    use super::*;

    const CREATION_CODE: &str = "0x6001600c60003960016000f300";

    fn destination_pool() -> String {
        format!(
            r#"{{
                "contractName": "DestinationPool",
                "abi": [{{
                    "type": "constructor",
                    "stateMutability": "nonpayable",
                    "inputs": [{{ "name": "peer", "type": "address", "internalType": "address" }}]
                }}],
                "bytecode": "{CREATION_CODE}"
            }}"#
        )
    }

    #[test]
    fn parses_hardhat_artifact() -> eyre::Result<()> {
        let factory =
            ContractFactory::from_json("Unused", &destination_pool())?;
        assert_eq!(factory.name(), "DestinationPool");
        assert!(factory.abi().constructor().is_some());
        Ok(())
    }

    #[test]
    fn parses_foundry_artifact() -> eyre::Result<()> {
        let json = format!(
            r#"{{ "abi": [], "bytecode": {{ "object": "{CREATION_CODE}" }} }}"#
        );
        let factory = ContractFactory::from_json("OriginPool", &json)?;
        assert_eq!(factory.name(), "OriginPool");
        assert_eq!(&factory.deploy_code(&[])?[..], hex::decode(CREATION_CODE)?);
        Ok(())
    }

    #[test]
    fn rejects_empty_bytecode() {
        let err = ContractFactory::from_json(
            "IPool",
            r#"{ "abi": [], "bytecode": "0x" }"#,
        )
        .expect_err("interfaces can't be deployed");
        assert!(err.to_string().contains("has no bytecode"));
    }

    #[test]
    fn rejects_unlinked_bytecode() {
        let json = r#"{ "abi": [], "bytecode": "0x6080__$abcdef$__" }"#;
        assert!(ContractFactory::from_json("Linked", json).is_err());
    }

    #[test]
    fn appends_encoded_constructor_args() -> eyre::Result<()> {
        let factory = ContractFactory::from_json("", &destination_pool())?;
        let peer = address!("13576E2eeB9696e63f10DD2778697c84EAaF4872");

        let code = factory.deploy_code(&[peer.to_string()])?;

        let creation = hex::decode(CREATION_CODE)?;
        assert_eq!(code.len(), creation.len() + 32);
        assert_eq!(&code[..creation.len()], creation.as_slice());
        assert_eq!(&code[creation.len() + 12..], peer.as_slice());
        Ok(())
    }

    #[test]
    fn rejects_wrong_arity() -> eyre::Result<()> {
        let factory = ContractFactory::from_json("", &destination_pool())?;

        let err = factory.deploy_code(&[]).expect_err("peer is required");
        assert_eq!(
            err.to_string(),
            "`DestinationPool` constructor takes 1 argument(s), got 0"
        );

        let json = format!(r#"{{ "abi": [], "bytecode": "{CREATION_CODE}" }}"#);
        let factory = ContractFactory::from_json("OriginPool", &json)?;
        let err = factory
            .deploy_code(&["1".to_owned()])
            .expect_err("there's no constructor");
        assert!(err.to_string().contains("has no constructor"));
        Ok(())
    }

    #[test]
    fn rejects_uncoercible_args() -> eyre::Result<()> {
        let factory = ContractFactory::from_json("", &destination_pool())?;
        let err = factory
            .deploy_code(&["not an address".to_owned()])
            .expect_err("should not coerce");
        assert!(err.to_string().contains("is not a valid address"));
        Ok(())
    }

    #[test]
    fn loads_from_known_layouts() -> eyre::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = ContractFactory::load(dir.path(), "DestinationPool")
            .expect_err("nothing compiled yet");
        assert!(err.to_string().contains("were the contracts compiled?"));

        let hardhat = dir.path().join("contracts/DestinationPool.sol");
        fs::create_dir_all(&hardhat)?;
        fs::write(hardhat.join("DestinationPool.json"), destination_pool())?;
        let factory = ContractFactory::load(dir.path(), "DestinationPool")?;
        assert_eq!(factory.name(), "DestinationPool");

        let foundry = dir.path().join("OriginPool.sol");
        fs::create_dir_all(&foundry)?;
        fs::write(
            foundry.join("OriginPool.json"),
            format!(r#"{{ "abi": [], "bytecode": {{ "object": "{CREATION_CODE}" }} }}"#),
        )?;
        let factory = ContractFactory::load(dir.path(), "OriginPool")?;
        assert_eq!(factory.name(), "OriginPool");
        Ok(())
    }
}
