use tracing::Level;

/// Variável de ambiente com o nível de log (`trace`, `debug`, `info`, `warn`, `error`)
pub const LOG_LEVEL_ENV: &str = "ETHERNITY_LOG_LEVEL";

/// Instala o subscriber de logs; chamadas repetidas são ignoradas
pub fn init_tracing() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
