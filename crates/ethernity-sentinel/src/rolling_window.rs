use bigdecimal::{BigDecimal, Zero};
use ethernity_core::{Error, Result};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Janela deslizante de amostras decimais com capacidade fixa.
///
/// Ao atingir a capacidade a amostra mais antiga é descartada (FIFO). As amostras
/// têm precisão arbitrária, então valores on-chain de 256 bits cabem sem perda, e
/// a média é sempre recalculada a partir das amostras armazenadas.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<BigDecimal>,
    capacity: NonZeroUsize,
}

impl RollingWindow {
    /// Cria uma janela vazia
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Adiciona uma amostra, descartando a mais antiga se necessário
    pub fn add_element(&mut self, sample: BigDecimal) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity.get() {
            self.samples.pop_front();
        }
    }

    /// Média aritmética das amostras atuais
    pub fn average(&self) -> Result<BigDecimal> {
        if self.samples.is_empty() {
            return Err(Error::InsufficientData("janela sem amostras".to_string()));
        }

        let sum = self
            .samples
            .iter()
            .fold(BigDecimal::zero(), |acc, sample| acc + sample);
        Ok(sum / BigDecimal::from(self.samples.len() as u64))
    }

    /// Número de amostras atualmente na janela
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Amostras da mais antiga para a mais recente
    pub fn iter(&self) -> impl Iterator<Item = &BigDecimal> {
        self.samples.iter()
    }
}
