// ============================================================
// Layer 4 — Spike Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<SpikeSample>
// into device tensors.
//
// Shapes produced for N samples of T timesteps and K bins:
//
//   dataset  [N]        Int    — experiment id per sample
//   calcium  [N, T, 1]  Float  — one input channel
//   targets  [N, T, K]  Float  — one-hot spike bins
//   labels   [N, T]     Int    — same bins as indices, for metrics
//   weights  [N]        Float  — mean class weight per sample
//
// All windows coming out of WindowGenerator share T, so no
// padding is needed here.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{class_weights, SpikeSample};

#[derive(Debug, Clone)]
pub struct SpikeBatch<B: Backend> {
    pub dataset: Tensor<B, 1, Int>,
    pub calcium: Tensor<B, 3>,
    pub targets: Tensor<B, 3>,
    pub labels:  Tensor<B, 2, Int>,
    pub weights: Tensor<B, 1>,
}

#[derive(Clone, Debug)]
pub struct SpikeBatcher<B: Backend> {
    pub device:        B::Device,
    pub num_bins:      usize,
    pub class_weights: Vec<f32>,
}

impl<B: Backend> SpikeBatcher<B> {
    pub fn new(device: B::Device, num_bins: usize) -> Self {
        Self { device, num_bins, class_weights: class_weights(num_bins) }
    }
}

impl<B: Backend> Batcher<SpikeSample, SpikeBatch<B>> for SpikeBatcher<B> {
    fn batch(&self, items: Vec<SpikeSample>) -> SpikeBatch<B> {
        let batch_size = items.len();
        let timesteps  = items[0].num_timesteps();
        let k          = self.num_bins;

        let ids: Vec<i32> = items.iter().map(|s| s.dataset as i32).collect();

        let calcium_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.calcium.iter().copied())
            .collect();

        let label_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.bins.iter().map(|&b| b as i32))
            .collect();

        // One-hot built on the host: cheaper than a scatter on device
        let mut onehot = vec![0.0f32; batch_size * timesteps * k];
        for (pos, &bin) in label_flat.iter().enumerate() {
            onehot[pos * k + bin as usize] = 1.0;
        }

        let weights: Vec<f32> = items
            .iter()
            .map(|s| s.sample_weight(&self.class_weights))
            .collect();

        let dataset = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device);

        let calcium = Tensor::<B, 1>::from_floats(calcium_flat.as_slice(), &self.device)
            .reshape([batch_size, timesteps, 1]);

        let targets = Tensor::<B, 1>::from_floats(onehot.as_slice(), &self.device)
            .reshape([batch_size, timesteps, k]);

        let labels = Tensor::<B, 1, Int>::from_ints(label_flat.as_slice(), &self.device)
            .reshape([batch_size, timesteps]);

        let weights = Tensor::<B, 1>::from_floats(weights.as_slice(), &self.device);

        SpikeBatch { dataset, calcium, targets, labels, weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::NUM_BINS;

    type TestBackend = burn::backend::NdArray;

    fn sample(dataset: usize, bins: Vec<usize>) -> SpikeSample {
        let calcium = bins.iter().map(|&b| b as f32 * 0.5).collect();
        SpikeSample { dataset, calcium, bins }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = SpikeBatcher::<TestBackend>::new(Default::default(), NUM_BINS);
        let batch = batcher.batch(vec![sample(1, vec![0, 1, 2, 0]), sample(3, vec![6, 0, 0, 0])]);

        assert_eq!(batch.dataset.dims(), [2]);
        assert_eq!(batch.calcium.dims(), [2, 4, 1]);
        assert_eq!(batch.targets.dims(), [2, 4, NUM_BINS]);
        assert_eq!(batch.labels.dims(), [2, 4]);
        assert_eq!(batch.weights.dims(), [2]);
    }

    #[test]
    fn test_targets_are_one_hot_of_labels() {
        let batcher = SpikeBatcher::<TestBackend>::new(Default::default(), NUM_BINS);
        let batch = batcher.batch(vec![sample(0, vec![0, 5, 2])]);

        // Every timestep has exactly one hot bin
        let row_sums = batch.targets.clone().sum_dim(2).into_data().to_vec::<f32>().unwrap();
        assert!(row_sums.iter().all(|&s| s == 1.0));

        let hot = batch.targets.argmax(2).reshape([3]).into_data().to_vec::<i64>().unwrap();
        assert_eq!(hot, vec![0, 5, 2]);
    }

    #[test]
    fn test_weights_follow_class_weights() {
        let batcher = SpikeBatcher::<TestBackend>::new(Default::default(), NUM_BINS);
        let batch = batcher.batch(vec![sample(0, vec![6, 6]), sample(0, vec![0, 0])]);
        let w = batch.weights.into_data().to_vec::<f32>().unwrap();
        assert_eq!(w, vec![0.5, 1.0 / 128.0]);
    }
}
