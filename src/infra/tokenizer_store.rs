// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Resolves a pretrained tokenizer by identifier and wraps it
// for the pipeline:
//
//   "path/to/tokenizer.json"  → that file
//   "path/to/model_dir"       → model_dir/tokenizer.json
//   "t5-base"                 → tokenizer.json from the Hub repo
//
// The tokenizer is loaded independently of the model so the
// two identifiers may differ.
//
// Reference: tokenizers crate documentation (Tokenizer, TruncationParams)

use std::path::{Path, PathBuf};

use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{PipelineError, Result};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Candidate pad tokens, tried in order when no padding is configured
const PAD_TOKENS: [&str; 2] = ["<pad>", "[PAD]"];

/// A loaded tokenizer plus the name it was resolved from.
#[derive(Clone)]
pub struct TextEncoder {
    identifier: String,
    tokenizer:  Tokenizer,
}

impl TextEncoder {
    /// Resolve `identifier` to a tokenizer.json and load it.
    pub fn resolve(identifier: &str) -> Result<Self> {
        let path = resolve_tokenizer_file(identifier)?;
        Self::from_file(identifier, &path)
    }

    pub fn from_file(identifier: &str, path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| PipelineError::tokenizer(identifier, e))?;
        tracing::debug!(tokenizer = identifier, path = %path.display(), "Loaded tokenizer");
        Ok(Self { identifier: identifier.to_string(), tokenizer })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Pad id from the tokenizer's padding params, else a known pad
    /// token, else 0.
    pub fn pad_id(&self) -> u32 {
        if let Some(padding) = self.tokenizer.get_padding() {
            return padding.pad_id;
        }
        PAD_TOKENS
            .iter()
            .find_map(|t| self.tokenizer.token_to_id(t))
            .unwrap_or(0)
    }

    /// Truncate every encoding to at most `max_length` tokens.
    pub fn with_max_length(mut self, max_length: usize) -> Result<Self> {
        let params = TruncationParams { max_length, ..Default::default() };
        self.tokenizer
            .with_truncation(Some(params))
            .map_err(|e| PipelineError::tokenizer(&self.identifier, e))?;
        Ok(self)
    }

    /// Token ids for every text, truncated but not padded.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<u32>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| PipelineError::tokenizer(&self.identifier, e))?;
        Ok(encodings.iter().map(|e| e.get_ids().to_vec()).collect())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.tokenizer
            .save(path, true)
            .map_err(|e| PipelineError::tokenizer(&self.identifier, e))
    }
}

fn resolve_tokenizer_file(identifier: &str) -> Result<PathBuf> {
    let local = Path::new(identifier);
    if local.is_file() {
        return Ok(local.to_path_buf());
    }
    if local.is_dir() {
        let file = local.join(TOKENIZER_FILE);
        if file.is_file() {
            return Ok(file);
        }
        return Err(PipelineError::tokenizer(
            identifier,
            format!("directory has no {TOKENIZER_FILE}"),
        ));
    }

    tracing::info!(tokenizer = identifier, "Fetching tokenizer from the Hugging Face Hub");
    let api  = Api::new().map_err(|e| PipelineError::tokenizer(identifier, e))?;
    let repo = api.repo(Repo::new(identifier.to_string(), RepoType::Model));
    repo.get(TOKENIZER_FILE)
        .map_err(|e| PipelineError::tokenizer(identifier, e))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::str::FromStr;

    /// Word-level tokenizer over a handful of review words.
    pub(crate) fn word_level_json() -> String {
        serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {"type": "Lowercase"},
            "pre_tokenizer": {"type": "Whitespace"},
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {
                    "[PAD]": 0, "[UNK]": 1, "great": 2, "film": 3, "awful": 4,
                    "movie": 5, "loved": 6, "it": 7, "hated": 8, "boring": 9
                },
                "unk_token": "[UNK]"
            }
        })
        .to_string()
    }

    pub(crate) fn word_level() -> TextEncoder {
        let tokenizer = Tokenizer::from_str(&word_level_json()).unwrap();
        TextEncoder { identifier: "word-level".to_string(), tokenizer }
    }

    #[test]
    fn test_pad_id_found_by_token() {
        assert_eq!(word_level().pad_id(), 0);
    }

    #[test]
    fn test_truncates_to_max_length() {
        let encoder = word_level().with_max_length(2).unwrap();
        let ids = encoder
            .encode_batch(&["Loved it great film".to_string(), "awful".to_string()])
            .unwrap();
        assert_eq!(ids[0], vec![6, 7]);
        assert_eq!(ids[1], vec![4]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let ids = word_level().encode_batch(&["great popcorn".to_string()]).unwrap();
        assert_eq!(ids[0], vec![2, 1]);
    }

    #[test]
    fn test_resolves_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKENIZER_FILE), word_level_json()).unwrap();

        let from_dir = TextEncoder::resolve(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(from_dir.vocab_size(), 10);

        let file = dir.path().join(TOKENIZER_FILE);
        assert!(TextEncoder::resolve(file.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_directory_without_tokenizer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TextEncoder::resolve(dir.path().to_str().unwrap()).err().unwrap();
        assert!(matches!(err, PipelineError::Tokenizer { .. }));
    }
}
