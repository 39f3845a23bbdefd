use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use ort::inputs;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::error::{QualityError, QualityResult};
use crate::retry::{with_retry, RetryConfig};
use crate::scorer::Scorer;
use crate::types::{Score, ScoreInput};

/// How to turn the model's raw output into a [0,1] quality score.
#[derive(Debug, Clone, Copy)]
pub enum Interpretation {
    /// Output is a single logit (cross-encoder reranker); squash with sigmoid.
    Logit,
    /// Output is a last-hidden-state tensor; mean-pool over the sequence
    /// (respecting the attention mask), L2-normalize, then project onto a
    /// fixed "quality direction" before squashing.
    MeanPooledEmbedding,
}

#[derive(Debug, Clone)]
pub struct NeuralConfig {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_sequence_length: usize,
    pub vocab_size: usize,
    pub interpretation: Interpretation,
    pub quality_direction: Vec<f32>,
    pub cost_per_call: f64,
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
}

fn sigmoid(x: f32) -> f64 {
    (1.0 / (1.0 + (-x).exp())) as f64
}

/// Neural cross-encoder/embedder scorer, wrapped in a circuit breaker and
/// retry so a flaky inference runtime cannot stall the chain: after
/// `failure_threshold` consecutive failures the breaker trips and `score`
/// fails fast rather than spending a retry budget per call.
pub struct NeuralScorer {
    config: NeuralConfig,
    tokenizer: Tokenizer,
    session: Mutex<Session>,
    breaker: CircuitBreaker,
}

impl NeuralScorer {
    pub fn load(config: NeuralConfig) -> QualityResult<Self> {
        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| QualityError::Backend(format!("tokenizer load failed: {e}")))?;
        let session = Session::builder()
            .and_then(|b| b.commit_from_file(&config.model_path))
            .map_err(|e| QualityError::Backend(format!("model load failed: {e}")))?;
        let breaker = CircuitBreaker::new(config.circuit_breaker.clone());
        Ok(Self {
            config,
            tokenizer,
            session: Mutex::new(session),
            breaker,
        })
    }

    fn encode(&self, text: &str) -> QualityResult<(Vec<i64>, Vec<i64>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| QualityError::Backend(format!("tokenize failed: {e}")))?;
        let ids = encoding.get_ids();

        if ids.iter().any(|&id| id as usize >= self.config.vocab_size) {
            return Err(QualityError::UnsupportedContent(
                "token id outside model vocabulary range".into(),
            ));
        }

        let max_len = self.config.max_sequence_length;
        let mut input_ids: Vec<i64> = ids.iter().take(max_len).map(|&id| id as i64).collect();
        let mut attention_mask = vec![1i64; input_ids.len()];
        while input_ids.len() < max_len {
            input_ids.push(0);
            attention_mask.push(0);
        }
        Ok((input_ids, attention_mask))
    }

    fn run_inference(&self, input_ids: &[i64], attention_mask: &[i64]) -> QualityResult<f64> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| QualityError::Backend("session lock poisoned".into()))?;

        let seq_len = input_ids.len();
        let input_ids_tensor = Tensor::from_array(([1usize, seq_len], input_ids.to_vec()))
            .map_err(|e| QualityError::Backend(format!("input_ids tensor build failed: {e}")))?;
        let attention_mask_tensor = Tensor::from_array(([1usize, seq_len], attention_mask.to_vec()))
            .map_err(|e| QualityError::Backend(format!("attention_mask tensor build failed: {e}")))?;

        let outputs = session
            .run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
            ])
            .map_err(|e| QualityError::Backend(format!("inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| QualityError::Backend(format!("output tensor extract failed: {e}")))?;

        match self.config.interpretation {
            Interpretation::Logit => {
                let logit = *data
                    .first()
                    .ok_or_else(|| QualityError::Backend("model returned empty logit tensor".into()))?;
                Ok(self.interpret(logit))
            }
            Interpretation::MeanPooledEmbedding => {
                let hidden_dim = *shape.last().unwrap_or(&(data.len() as i64)) as usize;
                let pooled = mean_pool(data, attention_mask, hidden_dim);
                Ok(self.project(&pooled))
            }
        }
    }

    fn interpret(&self, logit: f32) -> f64 {
        sigmoid(logit)
    }

    /// Projects a pooled embedding onto the configured quality direction and
    /// squashes the result into `[0, 1]`.
    fn project(&self, embedding: &[f32]) -> f64 {
        let projected: f32 = embedding
            .iter()
            .zip(self.config.quality_direction.iter())
            .map(|(v, d)| v * d)
            .sum();
        sigmoid(projected)
    }
}

/// Mean-pools a flattened `[seq_len, hidden_dim]` hidden-state tensor over
/// the sequence dimension, counting only positions where `attention_mask`
/// is nonzero.
fn mean_pool(hidden_states: &[f32], attention_mask: &[i64], hidden_dim: usize) -> Vec<f32> {
    if hidden_dim == 0 {
        return Vec::new();
    }
    let mut pooled = vec![0f32; hidden_dim];
    let mut count = 0f32;
    for (row, &mask) in hidden_states.chunks(hidden_dim).zip(attention_mask) {
        if mask == 0 {
            continue;
        }
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1.0;
    }
    if count > 0.0 {
        for v in &mut pooled {
            *v /= count;
        }
    }
    pooled
}

#[async_trait]
impl Scorer for NeuralScorer {
    fn name(&self) -> &str {
        "neural"
    }

    async fn score(&self, input: &ScoreInput) -> QualityResult<Score> {
        if !self.breaker.allow_request() {
            return Err(QualityError::CircuitOpen);
        }
        let (input_ids, attention_mask) = self.encode(&input.text)?;

        let result = with_retry(&self.config.retry, || async {
            self.run_inference(&input_ids, &attention_mask)
        })
        .await;

        match result {
            Ok(value) => {
                self.breaker.record_success();
                Ok(Score::new(value, 0.9))
            }
            Err(e) => {
                self.breaker.record_failure();
                Err(e)
            }
        }
    }

    fn available(&self) -> bool {
        self.breaker.allow_request()
    }

    fn cost(&self) -> f64 {
        self.config.cost_per_call
    }
}
