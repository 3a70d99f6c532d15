/*!
 * Ethernity Traits
 *
 * Traits comuns usados em toda a workspace Ethernity
 */

use async_trait::async_trait;
use crate::error::Result;
use ethers::abi::{Function, Token};
use ethers::types::Address;

/// Leitor somente-leitura de estado de contratos.
///
/// Compartilhado entre avaliações concorrentes, por isso `Send + Sync`.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Executa `function` em `contract` sem alterar estado e retorna as saídas decodificadas
    async fn call(&self, contract: Address, function: &Function, args: &[Token]) -> Result<Vec<Token>>;
}
