/*!
 * Ethernity Utils
 *
 * Utilitários comuns usados em toda a workspace Ethernity
 */

use ethers::abi::{Event, EventExt, Token};
use ethers::types::{Address, I256};
use std::str::FromStr;

/// Converte uma string hexadecimal para Address
pub fn hex_to_address(hex: &str) -> Option<Address> {
    let hex_str = hex.strip_prefix("0x").unwrap_or(hex);
    if hex_str.len() != 40 {
        return None;
    }
    Address::from_str(hex_str).ok()
}

/// Formata um Address para exibição
pub fn format_address(address: &Address) -> String {
    format!("0x{:x}", address)
}

/// Verifica se a string está preenchida
pub fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Monta o identificador de alerta `{dev}-{protocolo}-{sufixo}`
pub fn alert_id(developer_abbreviation: &str, protocol_abbreviation: &str, suffix: &str) -> String {
    format!("{}-{}-{}", developer_abbreviation, protocol_abbreviation, suffix)
}

/// Assinatura canônica de um evento, ex.: `VoteCast(address,uint256,uint8,uint256,string)`
pub fn event_signature(event: &Event) -> String {
    event.abi_signature()
}

/// Formata um token ABI decodificado para uso em metadados
pub fn format_token(token: &Token) -> String {
    match token {
        Token::Address(address) => format_address(address),
        Token::Uint(value) => value.to_string(),
        Token::Int(value) => I256::from_raw(*value).to_string(),
        Token::Bool(value) => value.to_string(),
        Token::String(value) => value.clone(),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => format!("0x{}", hex::encode(bytes)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => items
            .iter()
            .map(format_token)
            .collect::<Vec<_>>()
            .join(","),
    }
}
