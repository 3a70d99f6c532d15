use async_trait::async_trait;
use ethernity_core::traits::ContractReader;
use ethernity_core::{utils, Error, Result};
use ethers::abi::{Function, Token};
use ethers::providers::Middleware;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest};
use std::sync::Arc;

/// Leitor de contratos sobre qualquer `Middleware` do ethers (HTTP, WS, IPC)
#[derive(Debug)]
pub struct EthersContractReader<M> {
    provider: Arc<M>,
}

impl<M: Middleware> EthersContractReader<M> {
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<M> ContractReader for EthersContractReader<M>
where
    M: Middleware + 'static,
{
    async fn call(&self, contract: Address, function: &Function, args: &[Token]) -> Result<Vec<Token>> {
        let data = function
            .encode_input(args)
            .map_err(|e| Error::EncodeError(format!("Falha ao codificar {}: {}", function.name, e)))?;

        let tx: TypedTransaction = TransactionRequest::new().to(contract).data(data).into();
        let output = self.provider.call(&tx, None).await.map_err(|e| {
            Error::RpcError(format!(
                "Chamada {} em {} falhou: {}",
                function.name,
                utils::format_address(&contract),
                e
            ))
        })?;

        function
            .decode_output(&output)
            .map_err(|e| Error::DecodeError(format!("Falha ao decodificar {}: {}", function.name, e)))
    }
}
