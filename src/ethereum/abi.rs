use alloy::{json_abi::JsonAbi, primitives::Address};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

/// Where contract ABIs are looked up
#[derive(Debug, Clone)]
pub struct AbiSource {
    /// Directory of `<address>.json` ABI files
    pub abi_dir: PathBuf,
}

impl Default for AbiSource {
    fn default() -> Self {
        let abi_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("contract-schema")
            .join("abis");

        Self { abi_dir }
    }
}

/// Resolves contract ABIs from memory or from the ABI directory
#[derive(Debug)]
pub struct AbiLoader {
    config: AbiSource,
    memory_cache: HashMap<Address, JsonAbi>,
}

impl AbiLoader {
    pub fn new(config: AbiSource) -> Self {
        Self {
            config,
            memory_cache: HashMap::new(),
        }
    }

    /// Get ABI for a contract, trying the memory cache before the ABI directory
    pub async fn get_abi(&mut self, address: &str) -> Result<JsonAbi> {
        let address = parse_address(address)?;

        if let Some(abi) = self.memory_cache.get(&address) {
            debug!("ABI cache hit for {:?}", address);
            return Ok(abi.clone());
        }

        let path = self.abi_path(&address);
        if !path.exists() {
            return Err(anyhow!(
                "No ABI found for {:?}, expected {}",
                address,
                path.display()
            ));
        }

        let abi = Self::load_file(&path).await?;
        self.memory_cache.insert(address, abi.clone());
        Ok(abi)
    }

    /// Load an ABI JSON file from any path
    pub async fn load_file<P: AsRef<Path>>(path: P) -> Result<JsonAbi> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read ABI file {:?}: {}", path, e))?;

        let abi: JsonAbi = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse ABI file {:?}: {}", path, e))?;

        info!("Loaded ABI from {:?}", path);
        Ok(abi)
    }

    /// Register an ABI that is not on disk
    pub fn add_manual_abi(&mut self, address: &str, abi: JsonAbi) -> Result<()> {
        let address = parse_address(address)?;
        self.memory_cache.insert(address, abi);
        info!("Added manual ABI for {:?}", address);
        Ok(())
    }

    pub fn has_abi(&self, address: &str) -> bool {
        match parse_address(address) {
            Ok(address) => {
                self.memory_cache.contains_key(&address) || self.abi_path(&address).exists()
            }
            Err(_) => false,
        }
    }

    /// Drop every ABI held in memory; files in the ABI directory are untouched
    pub fn clear_cache(&mut self) {
        self.memory_cache.clear();
        debug!("Cleared in-memory ABI cache");
    }

    fn abi_path(&self, address: &Address) -> PathBuf {
        self.config.abi_dir.join(format!("0x{:x}.json", address))
    }
}

fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(anyhow!(
            "Invalid address '{}'. Addresses must be 0x followed by 40 hex characters",
            address
        ));
    }

    Address::from_str(address).map_err(|e| anyhow!("Invalid address '{}': {}", address, e))
}
