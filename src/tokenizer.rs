use anyhow::{anyhow, Result};
use log::info;
use std::path::Path;
use tokenizers::Tokenizer;
use crate::enrich::QuestionTokenizer;

/// Pretrained subword tokenizer producing one decoded string per token id.
pub struct PretrainedTokenizer {
    tokenizer: Tokenizer,
    skip_token_id: u32,
}

impl PretrainedTokenizer {
    /// Loads from a local `tokenizer.json` if `source` points to one,
    /// otherwise treats `source` as a pretrained model identifier.
    pub fn load(source: &str, skip_token_id: u32) -> Result<Self> {
        let tokenizer = if Path::new(source).is_file() {
            info!("Loading tokenizer from {}", source);
            Tokenizer::from_file(source)
                .map_err(|e| anyhow!("Failed to load tokenizer {}: {}", source, e))?
        } else {
            info!("Loading pretrained tokenizer {}", source);
            Tokenizer::from_pretrained(source, None)
                .map_err(|e| anyhow!("Failed to fetch tokenizer {}: {}", source, e))?
        };
        Ok(Self::new(tokenizer, skip_token_id))
    }

    pub fn new(tokenizer: Tokenizer, skip_token_id: u32) -> Self {
        Self {
            tokenizer,
            skip_token_id,
        }
    }

    fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Failed to encode {:?}: {}", text, e))?;
        Ok(encoding
            .get_ids()
            .iter()
            .copied()
            .filter(|&id| id != self.skip_token_id)
            .collect())
    }
}

impl QuestionTokenizer for PretrainedTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        self.token_ids(text)?
            .into_iter()
            .map(|id| {
                self.tokenizer
                    .decode(&[id], false)
                    .map_err(|e| anyhow!("Failed to decode token {}: {}", id, e))
            })
            .collect()
    }
}
