// ============================================================
// Layer 5 — Sentiment Classifier Architecture
// ============================================================
// A transformer encoder backbone with a sequence classification
// head on top:
//
//   input_ids [b, s] ─▶ token + position + token-type emb
//                       │
//                       ▼
//                  embedding LayerNorm
//                       │
//                       ▼
//                  N × EncoderBlock (post-norm, padding masked)
//                       │                [b, s, h]
//                       ▼
//                  masked mean pool         [b, h]
//                       │
//                       ▼
//                  dropout → Linear         [b, num_labels]
//
// The backbone hyperparameters come from the pretrained
// model's `config.json`; only the head is sized at build time
// from the label space. The layout mirrors BERT so Hugging Face
// encoder checkpoints map onto it one tensor per parameter.
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

// ─── BackboneConfig ───────────────────────────────────────────────────────────
/// Encoder hyperparameters as stored in a pretrained model's config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackboneConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub hidden_size:             usize,
    pub num_attention_heads:     usize,
    pub num_hidden_layers:       usize,
    pub intermediate_size:       usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size:         usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
    /// Absent for backbones without a configurable dropout
    #[serde(default)]
    pub hidden_dropout_prob:     Option<f64>,
}

fn default_type_vocab_size() -> usize { 2 }
fn default_layer_norm_eps() -> f64 { 1e-12 }

impl BackboneConfig {
    pub fn dropout(&self) -> f64 {
        self.hidden_dropout_prob.unwrap_or(0.0)
    }

    /// Replace the backbone dropout. Returns false (and leaves the
    /// config untouched) when the backbone exposes no dropout field.
    pub fn override_dropout(&mut self, rate: f64) -> bool {
        match self.hidden_dropout_prob.as_mut() {
            Some(current) => {
                *current = rate;
                true
            }
            None => false,
        }
    }

    pub fn init_backbone<B: Backend>(&self, device: &B::Device) -> Backbone<B> {
        let token_embedding      = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding   = EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device);
        let token_type_embedding = EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device);
        let embedding_norm       = self.layer_norm(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_hidden_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let dropout = DropoutConfig::new(self.dropout()).init();
        Backbone { token_embedding, position_embedding, token_type_embedding, embedding_norm, layers, dropout }
    }

    pub fn init_classifier<B: Backend>(&self, num_labels: usize, device: &B::Device) -> SentimentClassifier<B> {
        SentimentClassifier {
            backbone:   self.init_backbone(device),
            dropout:    DropoutConfig::new(self.dropout()).init(),
            head:       LinearConfig::new(self.hidden_size, num_labels).init(device),
            num_labels,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden_size, self.num_attention_heads)
            .with_dropout(self.dropout())
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1   = self.layer_norm(device);
        let norm2   = self.layer_norm(device);
        let dropout = DropoutConfig::new(self.dropout()).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }
}

// ─── EncoderBlock ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true at padding positions.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

// ─── Backbone ─────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Backbone<B: Backend> {
    pub token_embedding:      Embedding<B>,
    pub position_embedding:   Embedding<B>,
    pub token_type_embedding: Embedding<B>,
    pub embedding_norm:       LayerNorm<B>,
    pub layers:               Vec<EncoderBlock<B>>,
    pub dropout:              Dropout,
}

impl<B: Backend> Backbone<B> {
    /// input_ids, attention_mask: [batch, seq_len] → hidden: [batch, seq_len, hidden]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let device  = input_ids.device();
        let tok_emb = self.token_embedding.forward(input_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);
        // single-segment input: every token is type 0
        let type_emb = self
            .token_type_embedding
            .forward(Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device));

        let pad_mask = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(self.embedding_norm.forward(tok_emb + pos_emb + type_emb));
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        x
    }
}

// ─── SentimentClassifier ──────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SentimentClassifier<B: Backend> {
    pub backbone:   Backbone<B>,
    pub dropout:    Dropout,
    pub head:       Linear<B>,
    pub num_labels: usize,
}

impl<B: Backend> SentimentClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let hidden = self.backbone.forward(input_ids, attention_mask.clone());
        let [batch_size, seq_len, hidden_size] = hidden.dims();

        // mean over real tokens only
        let mask = attention_mask
            .float()
            .unsqueeze_dim::<3>(2)
            .expand([batch_size, seq_len, hidden_size]);
        let summed = (hidden * mask.clone()).sum_dim(1);
        let counts = mask.sum_dim(1).clamp_min(1.0);
        let pooled = (summed / counts).reshape([batch_size, hidden_size]);

        self.head.forward(self.dropout.forward(pooled))
    }

    /// Cross-entropy against LabelSpace ids. Returns (loss, logits).
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, attention_mask);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }

    /// Freeze every backbone parameter; only the head keeps training.
    pub fn freeze_backbone(mut self) -> Self {
        self.backbone = self.backbone.no_grad();
        self
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::NdArray;

    pub(crate) fn tiny_config() -> BackboneConfig {
        BackboneConfig {
            vocab_size:              32,
            max_position_embeddings: 16,
            hidden_size:             8,
            num_attention_heads:     2,
            num_hidden_layers:       1,
            intermediate_size:       16,
            type_vocab_size:         2,
            layer_norm_eps:          1e-12,
            hidden_dropout_prob:     Some(0.1),
        }
    }

    #[test]
    fn test_logits_shape_matches_label_count() {
        let device = Default::default();
        let model  = tiny_config().init_classifier::<NdArray>(3, &device);

        let ids  = Tensor::<NdArray, 2, Int>::from_ints([[1, 2, 3, 0], [4, 5, 0, 0]], &device);
        let mask = Tensor::<NdArray, 2, Int>::from_ints([[1, 1, 1, 0], [1, 1, 0, 0]], &device);
        let logits = model.forward(ids, mask);

        assert_eq!(logits.dims(), [2, 3]);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let device = Default::default();
        let model  = tiny_config().init_classifier::<NdArray>(2, &device);

        let ids    = Tensor::<NdArray, 2, Int>::from_ints([[1, 2], [3, 4]], &device);
        let mask   = Tensor::<NdArray, 2, Int>::from_ints([[1, 1], [1, 1]], &device);
        let labels = Tensor::<NdArray, 1, Int>::from_ints([0, 1], &device);
        let (loss, _) = model.forward_loss(ids, mask, labels);

        let value: f32 = loss.into_scalar().elem();
        assert!(value.is_finite() && value > 0.0);
    }

    #[test]
    fn test_dropout_override() {
        let mut cfg = tiny_config();
        assert!(cfg.override_dropout(0.3));
        assert_eq!(cfg.hidden_dropout_prob, Some(0.3));

        cfg.hidden_dropout_prob = None;
        assert!(!cfg.override_dropout(0.3));
        assert_eq!(cfg.hidden_dropout_prob, None);
    }

    #[test]
    fn test_backbone_config_reads_hub_style_json() {
        let cfg: BackboneConfig = serde_json::from_str(r#"{
            "vocab_size": 100, "max_position_embeddings": 64, "hidden_size": 16,
            "num_attention_heads": 4, "num_hidden_layers": 2, "intermediate_size": 32,
            "architectures": ["Encoder"]
        }"#).unwrap();
        assert_eq!(cfg.hidden_dropout_prob, None);
        assert_eq!(cfg.dropout(), 0.0);
        assert_eq!(cfg.type_vocab_size, 2);
        assert_eq!(cfg.layer_norm_eps, 1e-12);
    }
}
