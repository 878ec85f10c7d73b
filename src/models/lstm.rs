//! Two-layer LSTM regressor with dropout and a dense head
//!
//! Architecture: LSTM(hidden) -> dropout -> LSTM(hidden) -> dropout ->
//! dense(dense_size) -> dense(1), trained with mini-batch SGD on mean squared
//! error and full backpropagation through time. Weights are initialised from
//! a seeded RNG so runs are reproducible.

use crate::error::{Result, TrafficError};
use crate::models::{SequenceModel, TrainedSequenceModel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Gradients larger than this norm are scaled down before each update
const GRADIENT_CLIP_NORM: f64 = 5.0;

/// Architecture and training parameters for the LSTM model
#[derive(Debug, Clone)]
pub struct LstmConfig {
    /// Units per LSTM layer
    pub hidden_size: usize,
    /// Units in the intermediate dense layer
    pub dense_size: usize,
    /// Training epochs
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// SGD learning rate
    pub learning_rate: f64,
    /// Dropout probability applied after each LSTM layer during training
    pub dropout: f64,
    /// RNG seed for weight initialisation, batch order and dropout masks
    pub seed: u64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_size: 50,
            dense_size: 25,
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.01,
            dropout: 0.2,
            seed: 42,
        }
    }
}

/// Untrained two-layer LSTM model
#[derive(Debug, Clone)]
pub struct LstmModel {
    name: String,
    config: LstmConfig,
}

impl LstmModel {
    /// Create a model with the given configuration
    pub fn new(config: LstmConfig) -> Result<Self> {
        if config.hidden_size == 0 || config.dense_size == 0 {
            return Err(TrafficError::InvalidParameter(
                "Layer sizes must be at least 1".to_string(),
            ));
        }
        if config.epochs == 0 || config.batch_size == 0 {
            return Err(TrafficError::InvalidParameter(
                "Epochs and batch size must be at least 1".to_string(),
            ));
        }
        if config.learning_rate <= 0.0 {
            return Err(TrafficError::InvalidParameter(
                "Learning rate must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&config.dropout) {
            return Err(TrafficError::InvalidParameter(format!(
                "Dropout must be in [0, 1), got {}",
                config.dropout
            )));
        }

        Ok(Self {
            name: format!(
                "LSTM({}x2, dropout={})",
                config.hidden_size, config.dropout
            ),
            config,
        })
    }

    /// Create a model with the default architecture
    pub fn with_defaults() -> Result<Self> {
        Self::new(LstmConfig::default())
    }
}

/// Trained LSTM ready for inference
#[derive(Debug, Clone)]
pub struct TrainedLstm {
    name: String,
    params: LstmParams,
    loss_history: Vec<f64>,
}

impl TrainedLstm {
    /// Mean training loss per epoch, in epoch order
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }
}

impl SequenceModel for LstmModel {
    type Trained = TrainedLstm;

    fn fit(&self, histories: &[Vec<f64>], targets: &[f64]) -> Result<Self::Trained> {
        if histories.is_empty() {
            return Err(TrafficError::ModelFitFailure(
                "No training windows supplied".to_string(),
            ));
        }
        if histories.len() != targets.len() {
            return Err(TrafficError::ModelFitFailure(format!(
                "History count ({}) does not match target count ({})",
                histories.len(),
                targets.len()
            )));
        }
        if histories.iter().any(|h| h.is_empty()) {
            return Err(TrafficError::ModelFitFailure(
                "Training histories must not be empty".to_string(),
            ));
        }

        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut params = LstmParams::init(config, &mut rng)?;

        let n = histories.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut loss_history = Vec::with_capacity(config.epochs);

        for _epoch in 0..config.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(config.batch_size) {
                let mut grads = LstmGrads::zeros(&params);
                let batch_len = batch.len() as f64;

                for &idx in batch {
                    let trace = params.forward(&histories[idx], config.dropout, Some(&mut rng));
                    let error = trace.output - targets[idx];
                    epoch_loss += error * error;

                    // Loss is averaged over the batch, so scale here
                    let d_output = 2.0 * error / batch_len;
                    params.backward(&trace, d_output, &mut grads);
                }

                grads.clip(GRADIENT_CLIP_NORM);
                params.apply(&grads, config.learning_rate);
            }

            let mean_loss = epoch_loss / n as f64;
            if !mean_loss.is_finite() {
                return Err(TrafficError::ModelFitFailure(format!(
                    "Training diverged: loss became {} (try a lower learning rate)",
                    mean_loss
                )));
            }
            loss_history.push(mean_loss);
        }

        Ok(TrainedLstm {
            name: self.name.clone(),
            params,
            loss_history,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSequenceModel for TrainedLstm {
    fn predict(&self, histories: &[Vec<f64>]) -> Result<Vec<f64>> {
        histories
            .iter()
            .map(|history| {
                if history.is_empty() {
                    return Err(TrafficError::ModelPredictFailure(
                        "Cannot predict from an empty history".to_string(),
                    ));
                }
                let trace = self.params.forward(history, 0.0, None);
                if !trace.output.is_finite() {
                    return Err(TrafficError::ModelPredictFailure(
                        "Model produced a non-finite prediction".to_string(),
                    ));
                }
                Ok(trace.output)
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Network internals
// ---------------------------------------------------------------------------

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// One LSTM layer. Gate weights are packed row-major as [i; f; g; o].
#[derive(Debug, Clone)]
struct LstmLayer {
    /// Input weights, shape [4 * hidden, input]
    wx: Vec<f64>,
    /// Recurrent weights, shape [4 * hidden, hidden]
    wh: Vec<f64>,
    /// Gate biases, shape [4 * hidden]
    b: Vec<f64>,
    input: usize,
    hidden: usize,
}

/// Fully connected layer, y = W x + b
#[derive(Debug, Clone)]
struct Dense {
    /// Weights, shape [rows, cols]
    w: Vec<f64>,
    b: Vec<f64>,
    rows: usize,
    cols: usize,
}

#[derive(Debug, Clone)]
struct LstmParams {
    layer1: LstmLayer,
    layer2: LstmLayer,
    dense1: Dense,
    dense2: Dense,
}

/// Per-timestep forward state cached for backpropagation
#[derive(Debug, Clone)]
struct StepCache {
    x: Vec<f64>,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    i: Vec<f64>,
    f: Vec<f64>,
    g: Vec<f64>,
    o: Vec<f64>,
    c: Vec<f64>,
    tanh_c: Vec<f64>,
    h: Vec<f64>,
}

/// Full forward trace of one sample
#[derive(Debug)]
struct ForwardTrace {
    steps1: Vec<StepCache>,
    steps2: Vec<StepCache>,
    /// Dropout masks applied to layer-1 outputs, one per timestep
    masks1: Vec<Vec<f64>>,
    /// Dropout mask applied to the final layer-2 output
    mask2: Vec<f64>,
    /// Dropped layer-2 output feeding the dense head
    head_input: Vec<f64>,
    /// Intermediate dense activation
    dense1_out: Vec<f64>,
    output: f64,
}

#[derive(Debug)]
struct LstmGrads {
    wx1: Vec<f64>,
    wh1: Vec<f64>,
    b1: Vec<f64>,
    wx2: Vec<f64>,
    wh2: Vec<f64>,
    b2: Vec<f64>,
    dense1_w: Vec<f64>,
    dense1_b: Vec<f64>,
    dense2_w: Vec<f64>,
    dense2_b: Vec<f64>,
}

impl LstmLayer {
    fn init(input: usize, hidden: usize, rng: &mut StdRng) -> Result<Self> {
        let std = (1.0 / (input + hidden) as f64).sqrt();
        let normal = Normal::new(0.0, std).map_err(|e| {
            TrafficError::ModelFitFailure(format!("Weight initialisation failed: {}", e))
        })?;

        let mut b = vec![0.0; 4 * hidden];
        // Forget gate biases start at 1 so early gradients flow through time
        for j in 0..hidden {
            b[hidden + j] = 1.0;
        }

        Ok(Self {
            wx: (0..4 * hidden * input).map(|_| normal.sample(rng)).collect(),
            wh: (0..4 * hidden * hidden).map(|_| normal.sample(rng)).collect(),
            b,
            input,
            hidden,
        })
    }

    fn forward_step(&self, x: &[f64], h_prev: &[f64], c_prev: &[f64]) -> StepCache {
        let hh = self.hidden;
        let mut gates = self.b.clone();

        for r in 0..4 * hh {
            let mut sum = gates[r];
            for c in 0..self.input {
                sum += self.wx[r * self.input + c] * x[c];
            }
            for c in 0..hh {
                sum += self.wh[r * hh + c] * h_prev[c];
            }
            gates[r] = sum;
        }

        let mut i = vec![0.0; hh];
        let mut f = vec![0.0; hh];
        let mut g = vec![0.0; hh];
        let mut o = vec![0.0; hh];
        let mut c_new = vec![0.0; hh];
        let mut tanh_c = vec![0.0; hh];
        let mut h = vec![0.0; hh];

        for j in 0..hh {
            i[j] = sigmoid(gates[j]);
            f[j] = sigmoid(gates[hh + j]);
            g[j] = gates[2 * hh + j].tanh();
            o[j] = sigmoid(gates[3 * hh + j]);
            c_new[j] = f[j] * c_prev[j] + i[j] * g[j];
            tanh_c[j] = c_new[j].tanh();
            h[j] = o[j] * tanh_c[j];
        }

        StepCache {
            x: x.to_vec(),
            h_prev: h_prev.to_vec(),
            c_prev: c_prev.to_vec(),
            i,
            f,
            g,
            o,
            c: c_new,
            tanh_c,
            h,
        }
    }

    /// Backward through one timestep. Accumulates parameter gradients and
    /// returns (dx, dh_prev, dc_prev).
    #[allow(clippy::too_many_arguments)]
    fn backward_step(
        &self,
        cache: &StepCache,
        dh: &[f64],
        dc_next: &[f64],
        grad_wx: &mut [f64],
        grad_wh: &mut [f64],
        grad_b: &mut [f64],
    ) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let hh = self.hidden;
        let mut dgates = vec![0.0; 4 * hh];
        let mut dc_prev = vec![0.0; hh];

        for j in 0..hh {
            let d_o = dh[j] * cache.tanh_c[j];
            let dc = dh[j] * cache.o[j] * (1.0 - cache.tanh_c[j] * cache.tanh_c[j]) + dc_next[j];
            let d_i = dc * cache.g[j];
            let d_g = dc * cache.i[j];
            let d_f = dc * cache.c_prev[j];
            dc_prev[j] = dc * cache.f[j];

            dgates[j] = d_i * cache.i[j] * (1.0 - cache.i[j]);
            dgates[hh + j] = d_f * cache.f[j] * (1.0 - cache.f[j]);
            dgates[2 * hh + j] = d_g * (1.0 - cache.g[j] * cache.g[j]);
            dgates[3 * hh + j] = d_o * cache.o[j] * (1.0 - cache.o[j]);
        }

        for r in 0..4 * hh {
            for c in 0..self.input {
                grad_wx[r * self.input + c] += dgates[r] * cache.x[c];
            }
            for c in 0..hh {
                grad_wh[r * hh + c] += dgates[r] * cache.h_prev[c];
            }
            grad_b[r] += dgates[r];
        }

        let mut dx = vec![0.0; self.input];
        let mut dh_prev = vec![0.0; hh];
        for r in 0..4 * hh {
            for c in 0..self.input {
                dx[c] += self.wx[r * self.input + c] * dgates[r];
            }
            for c in 0..hh {
                dh_prev[c] += self.wh[r * hh + c] * dgates[r];
            }
        }

        (dx, dh_prev, dc_prev)
    }
}

impl Dense {
    fn init(rows: usize, cols: usize, rng: &mut StdRng) -> Result<Self> {
        let std = (1.0 / cols as f64).sqrt();
        let normal = Normal::new(0.0, std).map_err(|e| {
            TrafficError::ModelFitFailure(format!("Weight initialisation failed: {}", e))
        })?;

        Ok(Self {
            w: (0..rows * cols).map(|_| normal.sample(rng)).collect(),
            b: vec![0.0; rows],
            rows,
            cols,
        })
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        let mut out = self.b.clone();
        for r in 0..self.rows {
            let mut sum = out[r];
            for c in 0..self.cols {
                sum += self.w[r * self.cols + c] * x[c];
            }
            out[r] = sum;
        }
        out
    }

    /// Backward pass; accumulates gradients and returns dx
    fn backward(
        &self,
        x: &[f64],
        d_out: &[f64],
        grad_w: &mut [f64],
        grad_b: &mut [f64],
    ) -> Vec<f64> {
        let mut dx = vec![0.0; self.cols];
        for r in 0..self.rows {
            for c in 0..self.cols {
                grad_w[r * self.cols + c] += d_out[r] * x[c];
                dx[c] += self.w[r * self.cols + c] * d_out[r];
            }
            grad_b[r] += d_out[r];
        }
        dx
    }
}

impl LstmParams {
    fn init(config: &LstmConfig, rng: &mut StdRng) -> Result<Self> {
        let hh = config.hidden_size;
        Ok(Self {
            layer1: LstmLayer::init(1, hh, rng)?,
            layer2: LstmLayer::init(hh, hh, rng)?,
            dense1: Dense::init(config.dense_size, hh, rng)?,
            dense2: Dense::init(1, config.dense_size, rng)?,
        })
    }

    /// Run one history through the network. With `rng` present, inverted
    /// dropout masks are sampled; at inference dropout is a no-op.
    fn forward(&self, history: &[f64], dropout: f64, mut rng: Option<&mut StdRng>) -> ForwardTrace {
        let hh = self.layer1.hidden;
        let steps = history.len();

        let mut steps1 = Vec::with_capacity(steps);
        let mut steps2 = Vec::with_capacity(steps);
        let mut masks1 = Vec::with_capacity(steps);

        let mut h1 = vec![0.0; hh];
        let mut c1 = vec![0.0; hh];
        let mut h2 = vec![0.0; hh];
        let mut c2 = vec![0.0; hh];

        for &value in history {
            let cache1 = self.layer1.forward_step(&[value], &h1, &c1);
            h1 = cache1.h.clone();
            c1 = cache1.c.clone();

            let mask1 = sample_mask(hh, dropout, rng.as_deref_mut());
            let dropped: Vec<f64> = h1.iter().zip(mask1.iter()).map(|(&h, &m)| h * m).collect();

            let cache2 = self.layer2.forward_step(&dropped, &h2, &c2);
            h2 = cache2.h.clone();
            c2 = cache2.c.clone();

            steps1.push(cache1);
            steps2.push(cache2);
            masks1.push(mask1);
        }

        let mask2 = sample_mask(hh, dropout, rng.as_deref_mut());
        let head_input: Vec<f64> = h2.iter().zip(mask2.iter()).map(|(&h, &m)| h * m).collect();

        let dense1_out = self.dense1.forward(&head_input);
        let output = self.dense2.forward(&dense1_out)[0];

        ForwardTrace {
            steps1,
            steps2,
            masks1,
            mask2,
            head_input,
            dense1_out,
            output,
        }
    }

    /// Backpropagate one sample's output gradient through the whole network
    fn backward(&self, trace: &ForwardTrace, d_output: f64, grads: &mut LstmGrads) {
        let hh = self.layer1.hidden;
        let steps = trace.steps1.len();

        // Dense head
        let d_dense1_out = self.dense2.backward(
            &trace.dense1_out,
            &[d_output],
            &mut grads.dense2_w,
            &mut grads.dense2_b,
        );
        let d_head_input = self.dense1.backward(
            &trace.head_input,
            &d_dense1_out,
            &mut grads.dense1_w,
            &mut grads.dense1_b,
        );

        // Gradient reaches layer 2 only through its final hidden state
        let mut dh2: Vec<f64> = d_head_input
            .iter()
            .zip(trace.mask2.iter())
            .map(|(&d, &m)| d * m)
            .collect();
        let mut dc2 = vec![0.0; hh];

        // Layer 2 backward through time, collecting input gradients per step
        let mut d_layer2_inputs = vec![vec![0.0; hh]; steps];
        for t in (0..steps).rev() {
            let (dx, dh_prev, dc_prev) = self.layer2.backward_step(
                &trace.steps2[t],
                &dh2,
                &dc2,
                &mut grads.wx2,
                &mut grads.wh2,
                &mut grads.b2,
            );
            d_layer2_inputs[t] = dx;
            dh2 = dh_prev;
            dc2 = dc_prev;
        }

        // Layer 1 backward through time; every step receives a gradient from
        // layer 2 through the dropout mask
        let mut dh1 = vec![0.0; hh];
        let mut dc1 = vec![0.0; hh];
        for t in (0..steps).rev() {
            for j in 0..hh {
                dh1[j] += d_layer2_inputs[t][j] * trace.masks1[t][j];
            }
            let (_dx, dh_prev, dc_prev) = self.layer1.backward_step(
                &trace.steps1[t],
                &dh1,
                &dc1,
                &mut grads.wx1,
                &mut grads.wh1,
                &mut grads.b1,
            );
            dh1 = dh_prev;
            dc1 = dc_prev;
        }
    }

    fn apply(&mut self, grads: &LstmGrads, learning_rate: f64) {
        apply_update(&mut self.layer1.wx, &grads.wx1, learning_rate);
        apply_update(&mut self.layer1.wh, &grads.wh1, learning_rate);
        apply_update(&mut self.layer1.b, &grads.b1, learning_rate);
        apply_update(&mut self.layer2.wx, &grads.wx2, learning_rate);
        apply_update(&mut self.layer2.wh, &grads.wh2, learning_rate);
        apply_update(&mut self.layer2.b, &grads.b2, learning_rate);
        apply_update(&mut self.dense1.w, &grads.dense1_w, learning_rate);
        apply_update(&mut self.dense1.b, &grads.dense1_b, learning_rate);
        apply_update(&mut self.dense2.w, &grads.dense2_w, learning_rate);
        apply_update(&mut self.dense2.b, &grads.dense2_b, learning_rate);
    }
}

impl LstmGrads {
    fn zeros(params: &LstmParams) -> Self {
        Self {
            wx1: vec![0.0; params.layer1.wx.len()],
            wh1: vec![0.0; params.layer1.wh.len()],
            b1: vec![0.0; params.layer1.b.len()],
            wx2: vec![0.0; params.layer2.wx.len()],
            wh2: vec![0.0; params.layer2.wh.len()],
            b2: vec![0.0; params.layer2.b.len()],
            dense1_w: vec![0.0; params.dense1.w.len()],
            dense1_b: vec![0.0; params.dense1.b.len()],
            dense2_w: vec![0.0; params.dense2.w.len()],
            dense2_b: vec![0.0; params.dense2.b.len()],
        }
    }

    fn buffers_mut(&mut self) -> [&mut Vec<f64>; 10] {
        [
            &mut self.wx1,
            &mut self.wh1,
            &mut self.b1,
            &mut self.wx2,
            &mut self.wh2,
            &mut self.b2,
            &mut self.dense1_w,
            &mut self.dense1_b,
            &mut self.dense2_w,
            &mut self.dense2_b,
        ]
    }

    /// Scale all gradients down when their global norm exceeds `max_norm`
    fn clip(&mut self, max_norm: f64) {
        let mut sum_sq = 0.0;
        for buffer in self.buffers_mut() {
            for &g in buffer.iter() {
                sum_sq += g * g;
            }
        }

        let norm = sum_sq.sqrt();
        if norm > max_norm && norm.is_finite() {
            let scale = max_norm / norm;
            for buffer in self.buffers_mut() {
                for g in buffer.iter_mut() {
                    *g *= scale;
                }
            }
        }
    }
}

fn apply_update(params: &mut [f64], grads: &[f64], learning_rate: f64) {
    for (p, g) in params.iter_mut().zip(grads.iter()) {
        *p -= learning_rate * g;
    }
}

/// Inverted dropout mask: zeros with probability `dropout`, survivors scaled
/// by 1 / (1 - dropout). Without an RNG (inference) the mask is all ones.
fn sample_mask(len: usize, dropout: f64, rng: Option<&mut StdRng>) -> Vec<f64> {
    match rng {
        Some(rng) if dropout > 0.0 => {
            let keep = 1.0 - dropout;
            (0..len)
                .map(|_| {
                    if rng.gen::<f64>() < dropout {
                        0.0
                    } else {
                        1.0 / keep
                    }
                })
                .collect()
        }
        _ => vec![1.0; len],
    }
}
