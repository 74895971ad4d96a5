// Copyright @yucwang 2026

use std::sync::Arc;

use crate::core::integrator::Integrator;
use crate::integrators::sky::SkyIntegrator;
use crate::renderers::render_manager::RenderManager;
use crate::renderers::render_worker::RenderWorker;

pub const DEFAULT_TILE_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Size of the worker pool. Zero is rejected when rendering starts.
    pub render_threads: usize,
    /// Fixed base seed. Only honoured with a single render thread, the one
    /// configuration whose output is reproducible bit for bit.
    pub seed: Option<u64>,
    pub tile_size: usize,
    pub spp_per_pass: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: None,
            tile_size: DEFAULT_TILE_SIZE,
            spp_per_pass: 1,
        }
    }
}

/// Builds the worker with the given pool index and seed.
pub type WorkerFactory = Arc<dyn Fn(&RenderManager, usize, u64) -> RenderWorker + Send + Sync>;

pub fn default_worker_factory() -> WorkerFactory {
    Arc::new(|manager: &RenderManager, index: usize, seed: u64| {
        RenderWorker::new(manager, index, seed)
    })
}

/// Progress callbacks, invoked on the manager thread.
pub trait RenderListener: Send + Sync {
    fn pass_completed(&self, _spp: u32, _target_spp: u32) {}
    fn render_completed(&self, _spp: u32) {}
}

pub struct RenderContext {
    pub config: RenderConfig,
    pub integrator: Arc<dyn Integrator>,
    pub worker_factory: WorkerFactory,
    pub listener: Option<Arc<dyn RenderListener>>,
}

impl RenderContext {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            integrator: Arc::new(SkyIntegrator::new()),
            worker_factory: default_worker_factory(),
            listener: None,
        }
    }

    pub fn with_integrator(mut self, integrator: Arc<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_worker_factory(mut self, worker_factory: WorkerFactory) -> Self {
        self.worker_factory = worker_factory;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RenderListener>) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
