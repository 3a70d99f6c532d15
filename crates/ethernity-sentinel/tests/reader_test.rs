mod common;

use common::*;
use ethernity_core::traits::ContractReader;
use ethernity_core::Error;
use ethernity_sentinel::EthersContractReader;
use ethers::abi::{encode, Token};
use ethers::providers::Provider;
use ethers::types::{Bytes, U256};
use std::sync::Arc;

#[tokio::test]
async fn decodes_getter_output() {
    let (provider, mock) = Provider::mocked();
    mock.push::<Bytes, _>(Bytes::from(encode(&[Token::Uint(U256::from(777u64))])))
        .unwrap();
    let reader = EthersContractReader::new(Arc::new(provider));

    let abi = token_abi();
    let out = reader
        .call(addr(TOKEN), abi.function("totalSupply").unwrap(), &[])
        .await
        .unwrap();
    assert_eq!(out, vec![Token::Uint(U256::from(777u64))]);
}

#[tokio::test]
async fn maps_failures_to_error_kinds() {
    let (provider, mock) = Provider::mocked();
    let reader = EthersContractReader::new(Arc::new(provider));
    let abi = token_abi();
    let total_supply = abi.function("totalSupply").unwrap();

    // sem resposta enfileirada
    let err = reader.call(addr(TOKEN), total_supply, &[]).await.unwrap_err();
    assert!(matches!(err, Error::RpcError(_)));

    // argumentos incompatíveis com a função
    let balance_of = abi.function("balanceOf").unwrap();
    let err = reader.call(addr(TOKEN), balance_of, &[]).await.unwrap_err();
    assert!(matches!(err, Error::EncodeError(_)));

    mock.push::<Bytes, _>(Bytes::from(vec![0x01, 0x02, 0x03])).unwrap();
    let err = reader.call(addr(TOKEN), total_supply, &[]).await.unwrap_err();
    assert!(matches!(err, Error::DecodeError(_)));
}
