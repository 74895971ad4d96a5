// Copyright @yucwang 2026

use crate::math::constants::Vector3f;

use std::ops;

/// Dense per-pixel radiance accumulator.
///
/// Values live in one flat `Vec<f64>` with channel-minor layout
/// `(y * width + x) * 3 + channel`, so two buffers of equal size can be
/// compared element by element. Each pixel carries its own sample count,
/// which drives the running-average merge.
///
/// The buffer has no internal synchronization. The render manager keeps it
/// behind a lock and hands out disjoint tiles to workers.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    data: Vec<f64>,
    spp: Vec<u32>,
    width: usize,
    height: usize,
    generation: u64,
}

pub const CHANNELS: usize = 3;

impl ops::Index<(usize, usize, usize)> for SampleBuffer {
    type Output = f64;

    fn index(&self, index: (usize, usize, usize)) -> &f64 {
        &self.data[self.offset(index.0, index.1, index.2)]
    }
}

impl ops::IndexMut<(usize, usize, usize)> for SampleBuffer {
    fn index_mut(&mut self, index: (usize, usize, usize)) -> &mut f64 {
        let offset = self.offset(index.0, index.1, index.2);
        &mut self.data[offset]
    }
}

impl SampleBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_number = width * height;
        Self {
            data: vec![0.0; pixel_number * CHANNELS],
            spp: vec![0; pixel_number],
            width,
            height,
            generation: 0,
        }
    }

    pub fn with_generation(width: usize, height: usize, generation: u64) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.generation = generation;
        buffer
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Scene generation this buffer accumulates samples for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, channel: usize) -> usize {
        debug_assert!(x < self.width && y < self.height && channel < CHANNELS);
        (y * self.width + x) * CHANNELS + channel
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> f64 {
        self.data[self.offset(x, y, channel)]
    }

    pub fn get_linear(&self, index: usize) -> f64 {
        self.data[index]
    }

    pub fn number_of_doubles(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f64) {
        let offset = self.offset(x, y, channel);
        self.data[offset] = value;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Vector3f {
        let offset = self.offset(x, y, 0);
        Vector3f::new(self.data[offset], self.data[offset + 1], self.data[offset + 2])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: &Vector3f) {
        let offset = self.offset(x, y, 0);
        self.data[offset..offset + CHANNELS].copy_from_slice(rgb.as_slice());
    }

    pub fn pixel_spp(&self, x: usize, y: usize) -> u32 {
        self.spp[y * self.width + x]
    }

    /// Folds one radiance sample into the pixel mean:
    /// `new = old + (sample - old) / (n + 1)`.
    pub fn merge_sample(&mut self, x: usize, y: usize, sample: &Vector3f) {
        let pixel = y * self.width + x;
        let n = self.spp[pixel] as f64;
        let offset = pixel * CHANNELS;
        for c in 0..CHANNELS {
            let old = self.data[offset + c];
            self.data[offset + c] = old + (sample[c] - old) / (n + 1.0);
        }
        self.spp[pixel] += 1;
    }

    /// Smallest per-pixel sample count; the number of complete passes.
    pub fn spp(&self) -> u32 {
        self.spp.iter().copied().min().unwrap_or(0)
    }

    pub fn total_samples(&self) -> u64 {
        self.spp.iter().map(|&n| n as u64).sum()
    }

    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|v| *v = 0.0);
        self.spp.iter_mut().for_each(|n| *n = 0);
    }

    /// Reallocates for a new canvas size. All samples are dropped.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.data = vec![0.0; width * height * CHANNELS];
        self.spp = vec![0; width * height];
    }

    pub fn rebind(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Largest absolute per-channel difference, or `None` when the
    /// dimensions differ.
    pub fn max_abs_difference(&self, other: &SampleBuffer) -> Option<f64> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(self.data.iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    pub fn raw_copy(&self) -> Vec<(f32, f32, f32)> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| (px[0] as f32, px[1] as f32, px[2] as f32))
            .collect()
    }
}
