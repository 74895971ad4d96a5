// Copyright @yucwang 2026

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crate::core::integrator::TraceError;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f};
use crate::renderers::pass::{write, PassGate, PassJob, RenderShared, Tile};
use crate::renderers::render_manager::RenderManager;

/// Shuts the pass gate if the worker thread unwinds, so the manager stops
/// waiting for a pass this worker will never finish.
struct AbandonOnPanic<'a>(&'a PassGate);

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("Thread {} panicked; shutting down the pass gate.",
                        thread::current().name().unwrap_or("?"));
            self.0.shutdown();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        String::from(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("integrator panicked")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Sampling,
    Merging,
}

/// One thread of the render pool. Between pass boundaries it claims tiles,
/// samples every pixel of a tile into a private block, then folds the block
/// into the shared sample buffer.
pub struct RenderWorker {
    index: usize,
    rng: LcgRng,
    state: WorkerState,
    shared: Arc<RenderShared>,
}

impl RenderWorker {
    pub fn new(manager: &RenderManager, index: usize, seed: u64) -> Self {
        Self {
            index,
            rng: LcgRng::new(seed),
            state: WorkerState::Idle,
            shared: manager.shared(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Thread body: runs passes until the manager shuts the pool down.
    pub fn run(mut self) {
        log::debug!("Render worker {} started.", self.index);
        let shared = Arc::clone(&self.shared);
        let _abandon = AbandonOnPanic(&shared.gate);
        let mut seen = 0;
        while let Some(pass) = self.shared.gate.wait_for_pass(seen) {
            seen = pass;
            if let Some(job) = self.shared.current_job() {
                self.work(&job);
            }
            self.state = WorkerState::Idle;
            self.shared.gate.finish();
        }
        log::debug!("Render worker {} stopped.", self.index);
    }

    fn work(&mut self, job: &PassJob) {
        while let Some((index, tile)) = job.claim() {
            self.state = WorkerState::Sampling;
            let block = self.sample_tile(job, &tile);
            self.state = WorkerState::Merging;
            self.merge_tile(job, index, &tile, &block);
        }
    }

    /// Samples laid out pixel-major, `job.samples` consecutive entries per
    /// pixel.
    fn sample_tile(&mut self, job: &PassJob, tile: &Tile) -> Vec<Vector3f> {
        let samples = job.samples as usize;
        let mut block = Vec::with_capacity(tile.pixel_count() * samples);
        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                for _ in 0..samples {
                    block.push(self.sample_pixel(job, x, y));
                }
            }
        }
        block
    }

    fn sample_pixel(&mut self, job: &PassJob, x: usize, y: usize) -> Vector3f {
        let px = x as Float + self.rng.next_float();
        let py = y as Float + self.rng.next_float();
        let ray = match job.view.view_ray(px, py, Some(&mut self.rng)) {
            Some(ray) => ray,
            // Outside the projector's image.
            None => return Vector3f::zeros(),
        };
        if !ray.is_finite() {
            log::warn!("Worker {}: degenerate camera ray at pixel ({}, {}).", self.index, x, y);
            return Vector3f::zeros();
        }
        let integrator = &self.shared.integrator;
        let rng = &mut self.rng;
        let traced = panic::catch_unwind(AssertUnwindSafe(|| {
            integrator.trace_ray(&job.scene, &ray, rng)
        }));
        let result = traced
            .unwrap_or_else(|payload| Err(TraceError::Integrator(panic_message(payload.as_ref()))))
            .and_then(|radiance| {
                if radiance.iter().all(|v| v.is_finite()) {
                    Ok(radiance)
                } else {
                    Err(TraceError::NonFinite)
                }
            });
        match result {
            Ok(radiance) => radiance,
            Err(err) => {
                log::warn!("Worker {}: sample at pixel ({}, {}) dropped: {}.",
                           self.index, x, y, err);
                Vector3f::zeros()
            }
        }
    }

    fn merge_tile(&self, job: &PassJob, index: usize, tile: &Tile, block: &[Vector3f]) {
        let samples = job.samples as usize;
        let mut buffer = write(&self.shared.samples);
        if buffer.generation() != job.generation {
            log::debug!("Worker {}: discarding tile {} of stale generation {}.",
                        self.index, index, job.generation);
            return;
        }
        let first_merge = job.mark_merged(index);
        debug_assert!(first_merge, "tile {} merged twice in one pass", index);
        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                let offset = ((y - tile.y0) * tile.width() + (x - tile.x0)) * samples;
                for sample in &block[offset..offset + samples] {
                    buffer.merge_sample(x, y, sample);
                }
            }
        }
    }
}
