// ============================================================
// Layer 5 — Spike Model (Burn)
// ============================================================
// Inception / bidirectional-LSTM network mapping a calcium window
// and its dataset id to a spike-bin distribution per timestep.
//
//   dataset [B]          calcium [B, T, 1]
//       │                    │
//   repeat over T         BatchNorm over time
//   Embedding(10, 1)         │
//       │                    │
//       └──── concat ────────┘        [B, T, 2]
//                │
//         InceptionCell × 3           [B, T, 256]
//                │
//         BiLSTM(64) per step         [B, T, 128]
//                │
//         Linear(7) + softmax         [B, T, 7]
//
// Layout convention: tensors flow as [batch, time, channels].
// Conv1d and AvgPool1d want [batch, channels, time], so ConvBn
// and the pool branch swap the last two dims around the call.
//
// Every BatchNorm here treats *time* as the feature axis: one
// set of statistics per timestep, pooled over batch and
// channels. That is why the norms are sized by num_timesteps
// and why the model is tied to the window length it was
// built with.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{AvgPool1d, AvgPool1dConfig},
        BatchNorm, BatchNormConfig,
        BiLstm, BiLstmConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::data::batcher::SpikeBatch;
use crate::ml::loss::{categorical_crossentropy, pearson_loss, weighted_mean, LossKind};

/// Channels leaving every inception cell: 64 + 64 + 96 + 32
pub const INCEPTION_CHANNELS: usize = 256;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SpikeModelConfig {
    /// Window length the model is built for (100 Hz → 1 s)
    pub num_timesteps: usize,
    /// Distinct experiment ids accepted by the embedding
    #[config(default = 10)]
    pub num_datasets: usize,
    /// Spike-count classes per timestep
    #[config(default = 7)]
    pub num_bins: usize,
    /// Hidden units per LSTM direction
    #[config(default = 64)]
    pub lstm_hidden: usize,
    #[config(default = 3)]
    pub num_inception_cells: usize,
}

impl SpikeModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpikeModel<B> {
        let t = self.num_timesteps;

        let dataset_embedding = EmbeddingConfig::new(self.num_datasets, 1).init(device);
        let calcium_norm      = BatchNormConfig::new(t).init(device);

        // Calcium channel + embedding channel
        let mut channels = 2;
        let mut cells = Vec::with_capacity(self.num_inception_cells);
        for _ in 0..self.num_inception_cells {
            cells.push(InceptionCell::new(channels, t, device));
            channels = INCEPTION_CHANNELS;
        }

        let lstm   = BiLstmConfig::new(channels, self.lstm_hidden, true).init(device);
        let output = LinearConfig::new(2 * self.lstm_hidden, self.num_bins).init(device);

        SpikeModel {
            dataset_embedding,
            calcium_norm,
            cells,
            lstm,
            output,
            num_timesteps: t,
        }
    }
}

// ─── ConvBn ───────────────────────────────────────────────────────────────────
/// Same-padded Conv1d with ReLU, then BatchNorm across time.
#[derive(Module, Debug)]
pub struct ConvBn<B: Backend> {
    pub conv: Conv1d<B>,
    pub norm: BatchNorm<B, 1>,
}

impl<B: Backend> ConvBn<B> {
    pub fn new(
        channels_in:  usize,
        channels_out: usize,
        kernel_size:  usize,
        timesteps:    usize,
        device:       &B::Device,
    ) -> Self {
        let conv = Conv1dConfig::new(channels_in, channels_out, kernel_size)
            .with_padding(PaddingConfig1d::Same)
            .init(device);
        let norm = BatchNormConfig::new(timesteps).init(device);
        Self { conv, norm }
    }

    /// [B, T, C_in] → [B, T, C_out]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = self.conv.forward(x.swap_dims(1, 2));
        let x = relu(x).swap_dims(1, 2);
        self.norm.forward(x)
    }
}

// ─── InceptionCell ────────────────────────────────────────────────────────────
/// Four parallel branches with receptive fields 1, 5, 5 (3+3)
/// and a pooled 3, concatenated on the channel axis.
#[derive(Module, Debug)]
pub struct InceptionCell<B: Backend> {
    pub branch1x1:      ConvBn<B>,
    pub branch5x5_1:    ConvBn<B>,
    pub branch5x5_2:    ConvBn<B>,
    pub branch3x3dbl_1: ConvBn<B>,
    pub branch3x3dbl_2: ConvBn<B>,
    pub branch3x3dbl_3: ConvBn<B>,
    pub branch_pool:    AvgPool1d,
    pub branch_pool_1:  ConvBn<B>,
}

impl<B: Backend> InceptionCell<B> {
    pub fn new(channels_in: usize, timesteps: usize, device: &B::Device) -> Self {
        // Average over 3 neighbours, stride 1, length preserved.
        // Padded positions are excluded from the average.
        let branch_pool = AvgPool1dConfig::new(3)
            .with_stride(1)
            .with_padding(PaddingConfig1d::Explicit(1))
            .with_count_include_pad(false)
            .init();

        Self {
            branch1x1:      ConvBn::new(channels_in, 64, 1, timesteps, device),
            branch5x5_1:    ConvBn::new(channels_in, 48, 1, timesteps, device),
            branch5x5_2:    ConvBn::new(48, 64, 5, timesteps, device),
            branch3x3dbl_1: ConvBn::new(channels_in, 64, 1, timesteps, device),
            branch3x3dbl_2: ConvBn::new(64, 96, 3, timesteps, device),
            branch3x3dbl_3: ConvBn::new(96, 96, 3, timesteps, device),
            branch_pool,
            branch_pool_1:  ConvBn::new(channels_in, 32, 1, timesteps, device),
        }
    }

    /// [B, T, C_in] → [B, T, 256]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let b1 = self.branch1x1.forward(x.clone());

        let b5 = self.branch5x5_1.forward(x.clone());
        let b5 = self.branch5x5_2.forward(b5);

        let b3 = self.branch3x3dbl_1.forward(x.clone());
        let b3 = self.branch3x3dbl_2.forward(b3);
        let b3 = self.branch3x3dbl_3.forward(b3);

        let bp = self.branch_pool.forward(x.swap_dims(1, 2)).swap_dims(1, 2);
        let bp = self.branch_pool_1.forward(bp);

        Tensor::cat(vec![b1, b5, b3, bp], 2)
    }
}

// ─── SpikeModel ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SpikeModel<B: Backend> {
    pub dataset_embedding: Embedding<B>,
    pub calcium_norm:      BatchNorm<B, 1>,
    pub cells:             Vec<InceptionCell<B>>,
    pub lstm:              BiLstm<B>,
    pub output:            Linear<B>,
    pub num_timesteps:     usize,
}

/// Result of one training forward pass.
pub struct SpikeStepOutput<B: Backend> {
    /// Weighted objective plus L2 penalty — shape [1]
    pub loss:        Tensor<B, 1>,
    /// Predicted distributions — [batch, T, bins]
    pub predictions: Tensor<B, 3>,
}

impl<B: Backend> SpikeModel<B> {
    /// dataset: [batch] ids, calcium: [batch, T, 1] → [batch, T, bins]
    pub fn forward(&self, dataset: Tensor<B, 1, Int>, calcium: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, timesteps, _] = calcium.dims();

        let ids = dataset.reshape([batch, 1]).expand([batch, timesteps]);
        let emb = self.dataset_embedding.forward(ids); // [batch, T, 1]

        let calcium = self.calcium_norm.forward(calcium);

        let mut x = Tensor::cat(vec![calcium, emb], 2);
        for cell in &self.cells {
            x = cell.forward(x);
        }

        let (x, _) = self.lstm.forward(x, None);
        softmax(self.output.forward(x), 2)
    }

    /// Sum of squared output-kernel weights.
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        self.output.weight.val().powf_scalar(2.0).sum()
    }

    /// Forward pass plus the class-weighted objective.
    ///
    /// loss = Σ w_s · l_s / Σ w_s  +  l2 · ‖W_out‖²
    pub fn forward_loss(
        &self,
        batch: SpikeBatch<B>,
        kind:  LossKind,
        l2:    f64,
    ) -> SpikeStepOutput<B> {
        let predictions = self.forward(batch.dataset, batch.calcium);

        let per_sample = match kind {
            LossKind::Pearson      => pearson_loss(batch.targets, predictions.clone()),
            LossKind::CrossEntropy => categorical_crossentropy(batch.targets, predictions.clone()),
        };

        let loss = weighted_mean(per_sample, batch.weights) + self.l2_penalty().mul_scalar(l2);
        SpikeStepOutput { loss, predictions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataloader::batcher::Batcher;
    use crate::data::batcher::SpikeBatcher;
    use crate::domain::sample::SpikeSample;

    type TestBackend = burn::backend::NdArray;

    fn tiny_batch(device: &<TestBackend as Backend>::Device, t: usize) -> SpikeBatch<TestBackend> {
        batch_on::<TestBackend>(device, t)
    }

    fn batch_on<B: Backend>(device: &B::Device, t: usize) -> SpikeBatch<B> {
        let samples = (0..2)
            .map(|i| SpikeSample {
                dataset: i * 3,
                calcium: (0..t).map(|s| (s as f32 * 0.3 + i as f32).sin()).collect(),
                bins:    (0..t).map(|s| (s + i) % 3).collect(),
            })
            .collect();
        SpikeBatcher::<B>::new(device.clone(), 7).batch(samples)
    }

    #[test]
    fn test_output_shape_is_batch_time_bins() {
        let device = Default::default();
        let model: SpikeModel<TestBackend> = SpikeModelConfig::new(12).init(&device);
        let batch = tiny_batch(&device, 12);

        let out = model.forward(batch.dataset, batch.calcium);
        assert_eq!(out.dims(), [2, 12, 7]);
    }

    #[test]
    fn test_output_rows_are_distributions() {
        let device = Default::default();
        let model: SpikeModel<TestBackend> = SpikeModelConfig::new(6)
            .with_lstm_hidden(8)
            .init(&device);
        let batch = tiny_batch(&device, 6);

        let sums = model.forward(batch.dataset, batch.calcium)
            .sum_dim(2)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!(sums.iter().all(|s| (s - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_inception_cell_channel_count() {
        let device = Default::default();
        let cell = InceptionCell::<TestBackend>::new(2, 5, &device);
        let x = Tensor::<TestBackend, 3>::ones([3, 5, 2], &device);
        assert_eq!(cell.forward(x).dims(), [3, 5, INCEPTION_CHANNELS]);
    }

    #[test]
    fn test_forward_loss_is_finite_for_both_objectives() {
        let device = Default::default();
        let model: SpikeModel<TestBackend> = SpikeModelConfig::new(8)
            .with_lstm_hidden(4)
            .with_num_inception_cells(1)
            .init(&device);

        for kind in [LossKind::Pearson, LossKind::CrossEntropy] {
            let step = model.forward_loss(tiny_batch(&device, 8), kind, 0.01);
            let loss: f32 = step.loss.into_scalar();
            assert!(loss.is_finite(), "{kind:?} gave {loss}");
            assert_eq!(step.predictions.dims(), [2, 8, 7]);
        }
    }

    #[test]
    fn test_l2_term_is_added_and_output_kernel_gets_gradients() {
        type TrainBackend = burn::backend::Autodiff<TestBackend>;

        let device = Default::default();
        let model: SpikeModel<TrainBackend> = SpikeModelConfig::new(8)
            .with_lstm_hidden(4)
            .with_num_inception_cells(1)
            .init(&device);
        let batch = batch_on::<TrainBackend>(&device, 8);

        let plain: f32     = model.forward_loss(batch.clone(), LossKind::Pearson, 0.0).loss.into_scalar();
        let penalised: f32 = model.forward_loss(batch.clone(), LossKind::Pearson, 0.01).loss.into_scalar();
        let penalty: f32   = model.l2_penalty().into_scalar();

        assert!(penalty > 0.0);
        assert!(
            ((penalised - plain) - 0.01 * penalty).abs() < 1e-4,
            "penalised={penalised} plain={plain} penalty={penalty}"
        );

        let step  = model.forward_loss(batch, LossKind::Pearson, 0.0);
        let grads = step.loss.backward();
        let grad  = model.output.weight.grad(&grads).expect("output kernel has a gradient");
        let total: f32 = grad.abs().sum().into_scalar();
        assert!(total > 0.0, "output kernel gradient is zero");
    }
}
