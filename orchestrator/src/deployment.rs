//! The persisted deployment record: the one contract address every command
//! after `deploy` acts on.

use mjvs_client::Ledger;
use mjvs_types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::OrchestratorError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_address: Address,
}

impl DeploymentRecord {
    pub fn new(contract_address: Address) -> Self {
        Self { contract_address }
    }

    /// Read the record at `path`. A missing file is `ConfigurationMissing`.
    pub fn load(path: &Path) -> Result<Self, OrchestratorError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OrchestratorError::ConfigurationMissing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&content)
            .map_err(|e| OrchestratorError::Config(format!("{}: {e}", path.display())))
    }

    /// Write the record to `path`, replacing any previous deployment.
    pub fn save(&self, path: &Path) -> Result<(), OrchestratorError> {
        let content =
            toml::to_string(self).map_err(|e| OrchestratorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        tracing::info!(contract = %self.contract_address, path = %path.display(), "deployment recorded");
        Ok(())
    }
}

/// Deploy a fresh election contract from `signer` and return its address.
pub async fn deploy_contract<L: Ledger>(ledger: &L, signer: &Address) -> Result<Address, OrchestratorError> {
    let (address, receipt) = ledger.deploy(signer).await?;
    if !receipt.succeeded() {
        return Err(OrchestratorError::TransactionFailed {
            operation: "deploy",
            tx_hash: receipt.tx_hash,
        });
    }
    tracing::info!(contract = %address, tx = %receipt.tx_hash, "election contract deployed");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mjvs-deployment.toml");
        let record = DeploymentRecord::new(Address::from_low_u64(0x1000));
        record.save(&path).unwrap();
        assert_eq!(DeploymentRecord::load(&path).unwrap(), record);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("contract_address = \"0x"));
    }

    #[test]
    fn missing_record_is_configuration_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        match DeploymentRecord::load(&path) {
            Err(OrchestratorError::ConfigurationMissing { path: p }) => assert_eq!(p, path),
            other => panic!("expected ConfigurationMissing, got {other:?}"),
        }
    }

    #[test]
    fn garbage_record_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "contract_address = \"not-an-address\"").unwrap();
        assert!(matches!(
            DeploymentRecord::load(&path),
            Err(OrchestratorError::Config(_))
        ));
    }
}
