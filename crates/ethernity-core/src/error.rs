use thiserror::Error;

/// Erros comuns da biblioteca Ethernity
#[derive(Error, Debug)]
pub enum Error {
    /// Configuração ausente ou inválida
    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    /// Erro de comunicação com o node Ethereum
    #[error("Erro de RPC: {0}")]
    RpcError(String),

    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Erro de codificação de dados
    #[error("Erro de codificação: {0}")]
    EncodeError(String),

    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Amostras insuficientes para o cálculo solicitado
    #[error("Dados insuficientes: {0}")]
    InsufficientData(String),

    /// Recurso não encontrado
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// Falha de um detector durante o processamento de um evento
    #[error("Detector '{agent_type}' ({name}) falhou: {source}")]
    DetectorFailed {
        agent_type: String,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;
