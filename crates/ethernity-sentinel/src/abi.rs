use ethernity_core::{utils, Error, Result};
use ethers::abi::Abi;
use std::collections::HashMap;

/// ABIs conhecidas, indexadas pela referência usada na configuração (`abiFile`).
///
/// A leitura dos arquivos fica a cargo do hospedeiro; aqui só entram ABIs já carregadas.
#[derive(Debug, Clone, Default)]
pub struct AbiRegistry {
    abis: HashMap<String, Abi>,
}

impl AbiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra uma ABI, substituindo uma anterior com o mesmo nome
    pub fn insert(&mut self, name: impl Into<String>, abi: Abi) -> &mut Self {
        self.abis.insert(name.into(), abi);
        self
    }

    pub fn with_abi(mut self, name: impl Into<String>, abi: Abi) -> Self {
        self.insert(name, abi);
        self
    }

    /// Registra uma ABI a partir do JSON padrão do compilador
    pub fn insert_json(&mut self, name: impl Into<String>, json: &str) -> Result<&mut Self> {
        let name = name.into();
        let abi: Abi = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("ABI '{}' inválida: {}", name, e)))?;
        Ok(self.insert(name, abi))
    }

    /// Obtém a ABI registrada sob `name`
    pub fn get(&self, name: &str) -> Result<&Abi> {
        self.abis
            .get(name)
            .ok_or_else(|| Error::ConfigError(format!("ABI '{}' não registrada", name)))
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}

/// Assinaturas canônicas de todos os eventos declarados na ABI
pub fn event_signatures(abi: &Abi) -> Vec<String> {
    abi.events().map(utils::event_signature).collect()
}

/// Garante que a ABI declara todos os eventos em `required`
pub fn require_events(abi: &Abi, required: &[&str]) -> Result<()> {
    match required.iter().find(|name| !abi.events.contains_key(**name)) {
        Some(missing) => Err(Error::ConfigError(format!(
            "ABI não contém o evento mínimo suportado: {}",
            missing
        ))),
        None => Ok(()),
    }
}
