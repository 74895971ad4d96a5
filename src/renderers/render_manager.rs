// Copyright @yucwang 2026

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::camera::CameraView;
use crate::core::rng::derive_seed;
use crate::core::sample_buffer::SampleBuffer;
use crate::core::scene::{RenderMode, Scene, MIN_CANVAS_HEIGHT, MIN_CANVAS_WIDTH};
use crate::core::scene_provider::SceneProvider;
use crate::renderers::pass::{read, write, PassJob, RenderShared};
use crate::renderers::render_context::{RenderConfig, RenderContext, RenderListener};

// How long an idle manager sleeps before polling the scene provider again.
const IDLE_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Stopped,
    Starting,
    Running,
    Paused,
    /// Target sample count reached; buffer reads are still served.
    Completed,
    Stopping,
}

#[derive(Debug)]
pub enum RenderError {
    Config(String),
    NotStopped,
    NoSceneProvider,
    ThreadSpawn(std::io::Error),
    ThreadPanicked(String),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::ThreadSpawn(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Config(msg) => write!(f, "invalid render configuration: {}", msg),
            RenderError::NotStopped => write!(f, "render manager is not stopped"),
            RenderError::NoSceneProvider => write!(f, "no scene provider set"),
            RenderError::ThreadSpawn(err) => write!(f, "failed to spawn render thread: {}", err),
            RenderError::ThreadPanicked(name) => write!(f, "render thread {} panicked", name),
        }
    }
}

impl std::error::Error for RenderError {}

/// Consistent copy of the scene configuration and its samples.
#[derive(Debug, Clone)]
pub struct BufferedScene {
    scene: Scene,
    samples: SampleBuffer,
}

impl BufferedScene {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn sample_buffer(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn into_sample_buffer(self) -> SampleBuffer {
        self.samples
    }
}

/// Drives a fixed pool of render workers against a scene provider.
///
/// `start` spawns the pool plus a manager thread. At every pass boundary the
/// manager thread checks the provider: a new scene generation resets (or
/// reallocates) the sample buffer before the next pass, a paused scene
/// idles the pool, and reaching the target sample count completes the
/// render. A headless manager stops once the render completes, so `join`
/// returns.
pub struct RenderManager {
    context: RenderContext,
    headless: bool,
    provider: Option<Arc<dyn SceneProvider>>,
    shared: Arc<RenderShared>,
    manager_thread: Option<JoinHandle<()>>,
    worker_threads: Vec<JoinHandle<()>>,
}

impl RenderManager {
    pub fn new(context: RenderContext, headless: bool) -> Self {
        let shared = Arc::new(RenderShared::new(Scene::new(),
                                                SampleBuffer::new(0, 0),
                                                context.integrator.clone()));
        Self {
            context,
            headless,
            provider: None,
            shared,
            manager_thread: None,
            worker_threads: Vec::new(),
        }
    }

    pub(crate) fn shared(&self) -> Arc<RenderShared> {
        Arc::clone(&self.shared)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.context.config
    }

    pub fn state(&self) -> ManagerState {
        self.shared.state()
    }

    /// Generation of the scene the sample buffer currently belongs to.
    pub fn generation(&self) -> u64 {
        read(&self.shared.samples).generation()
    }

    pub fn set_scene_provider<P>(&mut self, provider: P) -> Result<(), RenderError>
    where
        P: SceneProvider + 'static,
    {
        if self.state() != ManagerState::Stopped || self.manager_thread.is_some() {
            return Err(RenderError::NotStopped);
        }
        self.provider = Some(Arc::new(provider));
        Ok(())
    }

    fn validate(&self, scene: &Scene) -> Result<(), RenderError> {
        if self.context.config.render_threads == 0 {
            return Err(RenderError::Config(String::from("render thread count must be at least 1")));
        }
        if self.context.config.spp_per_pass == 0 {
            return Err(RenderError::Config(String::from("samples per pass must be at least 1")));
        }
        if scene.width() < MIN_CANVAS_WIDTH || scene.height() < MIN_CANVAS_HEIGHT {
            return Err(RenderError::Config(format!(
                "canvas {}x{} is smaller than the minimum {}x{}",
                scene.width(), scene.height(), MIN_CANVAS_WIDTH, MIN_CANVAS_HEIGHT)));
        }
        Ok(())
    }

    fn worker_seed(&self, index: usize) -> u64 {
        match self.context.config.seed {
            Some(base) if self.context.config.render_threads == 1 => derive_seed(base, index),
            _ => rand::random::<u64>(),
        }
    }

    pub fn start(&mut self) -> Result<(), RenderError> {
        if self.state() != ManagerState::Stopped || self.manager_thread.is_some() {
            return Err(RenderError::NotStopped);
        }
        let provider = self.provider.clone().ok_or(RenderError::NoSceneProvider)?;
        let scene = provider.scene();
        self.validate(&scene)?;

        let threads = self.context.config.render_threads;
        if self.context.config.seed.is_some() && threads > 1 {
            log::warn!("Fixed seed ignored: reproducible output needs one render thread, got {}.",
                       threads);
        }

        let generation = scene.generation();
        let samples = SampleBuffer::with_generation(scene.width(), scene.height(), generation);
        let paused = self.shared.control().pause;
        self.shared = Arc::new(RenderShared::new(scene.clone(),
                                                 samples,
                                                 self.context.integrator.clone()));
        self.shared.update_control(|control| control.pause = paused);
        self.shared.set_state(ManagerState::Starting);
        log::info!("Starting render of '{}' ({}x{}, {} spp) with {} thread(s).",
                   scene.name(), scene.width(), scene.height(), scene.target_spp(), threads);

        let factory = Arc::clone(&self.context.worker_factory);
        for index in 0..threads {
            let seed = self.worker_seed(index);
            let worker = factory(&*self, index, seed);
            let spawned = thread::Builder::new()
                .name(format!("render-worker-{}", index))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => self.worker_threads.push(handle),
                Err(err) => {
                    self.abort_start();
                    return Err(err.into());
                }
            }
        }

        let manager_loop = ManagerLoop {
            shared: Arc::clone(&self.shared),
            provider,
            listener: self.context.listener.clone(),
            tile_size: self.context.config.tile_size,
            spp_per_pass: self.context.config.spp_per_pass,
            workers: threads,
            headless: self.headless,
            bound: Bound::new(scene),
        };
        let spawned = thread::Builder::new()
            .name(String::from("render-manager"))
            .spawn(move || manager_loop.run());
        match spawned {
            Ok(handle) => self.manager_thread = Some(handle),
            Err(err) => {
                self.abort_start();
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn abort_start(&mut self) {
        self.shared.gate.shutdown();
        for handle in self.worker_threads.drain(..) {
            let _ = handle.join();
        }
        self.shared.set_state(ManagerState::Stopped);
    }

    /// Pauses sampling at the next pass boundary.
    pub fn pause(&self) {
        self.shared.update_control(|control| control.pause = true);
    }

    pub fn resume(&self) {
        self.shared.update_control(|control| control.pause = false);
    }

    /// Requests shutdown at the next pass boundary. In-flight samples
    /// complete.
    pub fn stop(&self) {
        self.shared.update_control(|control| control.stop = true);
    }

    /// Waits for the manager thread and all workers to exit.
    pub fn join(&mut self) -> Result<(), RenderError> {
        let mut result = Ok(());
        if let Some(handle) = self.manager_thread.take() {
            if handle.join().is_err() {
                // Workers would otherwise wait for a pass that never opens.
                self.shared.gate.shutdown();
                result = Err(RenderError::ThreadPanicked(String::from("render-manager")));
            }
        }
        for (index, handle) in self.worker_threads.drain(..).enumerate() {
            if handle.join().is_err() && result.is_ok() {
                result = Err(RenderError::ThreadPanicked(format!("render-worker-{}", index)));
            }
        }
        self.shared.set_state(ManagerState::Stopped);
        result
    }

    /// Snapshot of the bound scene and its samples. Both locks are held
    /// together, so the pair always belongs to the same generation.
    pub fn buffered_scene(&self) -> BufferedScene {
        let samples = read(&self.shared.samples);
        let scene = read(&self.shared.scene);
        BufferedScene { scene: scene.clone(), samples: samples.clone() }
    }

    /// Runs `f` against the live sample buffer. Samples from the current
    /// pass may be partially merged.
    pub fn with_sample_buffer<R, F: FnOnce(&SampleBuffer) -> R>(&self, f: F) -> R {
        f(&read(&self.shared.samples))
    }
}

impl Drop for RenderManager {
    fn drop(&mut self) {
        if self.manager_thread.is_some() || !self.worker_threads.is_empty() {
            self.stop();
            let _ = self.join();
        }
    }
}

/// Configuration the pool is currently rendering.
struct Bound {
    generation: u64,
    scene: Arc<Scene>,
    view: Arc<CameraView>,
}

impl Bound {
    fn new(scene: Scene) -> Self {
        let view = Arc::new(scene.camera().view(scene.width(), scene.height()));
        Self { generation: scene.generation(), scene: Arc::new(scene), view }
    }
}

/// Body of the manager thread. It is the only writer of the bound
/// generation and of the manager state.
struct ManagerLoop {
    shared: Arc<RenderShared>,
    provider: Arc<dyn SceneProvider>,
    listener: Option<Arc<dyn RenderListener>>,
    tile_size: usize,
    spp_per_pass: u32,
    workers: usize,
    headless: bool,
    bound: Bound,
}

impl ManagerLoop {
    fn run(mut self) {
        let mut completed = false;
        loop {
            let control = self.shared.control();
            if control.stop {
                break;
            }

            if self.provider.generation() != self.bound.generation {
                self.adopt(self.provider.scene());
                completed = false;
            }

            let mode = self.provider.render_mode();
            if control.pause || mode != RenderMode::Rendering {
                self.shared.set_state(ManagerState::Paused);
                self.shared.wait_control(IDLE_POLL);
                continue;
            }

            let target = self.provider.target_spp();
            let spp = read(&self.shared.samples).spp();
            if spp >= target {
                if !completed {
                    completed = true;
                    self.shared.set_state(ManagerState::Completed);
                    log::info!("Render completed at {} spp.", spp);
                    if let Some(listener) = &self.listener {
                        listener.render_completed(spp);
                    }
                }
                if self.headless {
                    break;
                }
                self.shared.wait_control(IDLE_POLL);
                continue;
            }
            completed = false;

            self.shared.set_state(ManagerState::Running);
            if !self.run_pass(self.spp_per_pass.min(target - spp)) {
                log::error!("Render pass aborted: a worker thread died.");
                break;
            }

            let spp = read(&self.shared.samples).spp();
            log::debug!("Pass finished: {}/{} spp.", spp, target);
            if let Some(listener) = &self.listener {
                listener.pass_completed(spp, target);
            }
        }

        self.shared.set_state(ManagerState::Stopping);
        self.shared.gate.shutdown();
        log::info!("Render manager stopped.");
    }

    /// Returns false if the pass gate shut down before the pass finished.
    fn run_pass(&self, samples: u32) -> bool {
        let job = Arc::new(PassJob::new(
            self.bound.generation,
            Arc::clone(&self.bound.scene),
            Arc::clone(&self.bound.view),
            self.tile_size,
            samples,
        ));
        *write(&self.shared.job) = Some(job);
        self.shared.gate.open(self.workers);
        let finished = self.shared.gate.wait_finished();
        *write(&self.shared.job) = None;
        finished
    }

    /// Switches the pool to a new scene configuration. Runs between passes,
    /// so no worker holds samples for the old one.
    fn adopt(&mut self, scene: Scene) {
        log::info!("Adopting scene generation {} (was {}).",
                   scene.generation(), self.bound.generation);
        {
            // Held until the scene is swapped so snapshots never mix the two.
            let mut samples = write(&self.shared.samples);
            if samples.width() != scene.width() || samples.height() != scene.height() {
                samples.resize(scene.width(), scene.height());
            } else {
                samples.reset();
            }
            samples.rebind(scene.generation());
            *write(&self.shared.scene) = scene.clone();
        }
        self.bound = Bound::new(scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use crate::core::camera::ProjectionMode;
    use crate::core::integrator::{Integrator, TraceError};
    use crate::core::rng::LcgRng;
    use crate::core::scene_provider::SharedSceneProvider;
    use crate::core::sky::{GradientStop, SkyMode};
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::renderers::render_context::WorkerFactory;
    use crate::renderers::render_worker::RenderWorker;

    const WIDTH: usize = if MIN_CANVAS_WIDTH > 10 { MIN_CANVAS_WIDTH } else { 10 };
    const HEIGHT: usize = if MIN_CANVAS_HEIGHT > 10 { MIN_CANVAS_HEIGHT } else { 10 };

    fn test_scene() -> Scene {
        let mut scene = Scene::new();
        scene.set_canvas_size(WIDTH, HEIGHT);
        scene.set_target_spp(2);
        scene.set_render_mode(RenderMode::Rendering);
        scene
    }

    fn context(threads: usize, seed: Option<u64>) -> RenderContext {
        RenderContext::new(RenderConfig {
            render_threads: threads,
            seed,
            ..RenderConfig::default()
        })
    }

    fn render(scene: Scene, threads: usize) -> BufferedScene {
        let factory: WorkerFactory = Arc::new(|manager: &RenderManager, index: usize, _seed: u64| {
            RenderWorker::new(manager, index, 0)
        });
        render_with(context(threads, Some(0)).with_worker_factory(factory), scene)
    }

    fn render_with(context: RenderContext, scene: Scene) -> BufferedScene {
        let mut manager = RenderManager::new(context, true);
        manager.set_scene_provider(SharedSceneProvider::new(scene)).unwrap();
        manager.start().unwrap();
        manager.join().unwrap();
        manager.buffered_scene()
    }

    fn assert_uniform(samples: &SampleBuffer, expected: &Vector3f, spp: u32) {
        for y in 0..samples.height() {
            for x in 0..samples.width() {
                assert_eq!(samples.pixel_spp(x, y), spp, "pixel ({}, {})", x, y);
                let diff = (samples.pixel(x, y) - expected).abs().max();
                assert!(diff < 1e-9, "pixel ({}, {}) = {:?}", x, y, samples.pixel(x, y));
            }
        }
    }

    fn wait_until<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_black_sky_renders_black() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::Black);
        let result = render(scene, 1);
        assert_eq!(result.sample_buffer().spp(), 2);
        assert_uniform(result.sample_buffer(), &Vector3f::zeros(), 2);
    }

    #[test]
    fn test_solid_sky_renders_solid_color() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::SolidColor);
        scene.sky_mut().set_color(Vector3f::new(0.9, 0.8, 1.0));
        let result = render(scene, 1);
        assert_uniform(result.sample_buffer(), &Vector3f::new(0.9, 0.8, 1.0), 2);
    }

    #[test]
    fn test_flat_gradient_renders_flat() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::Gradient);
        scene.sky_mut().set_gradient(vec![
            GradientStop::new(0.5, 0.5, 0.5, 0.0),
            GradientStop::new(0.5, 0.5, 0.5, 1.0),
        ]);
        let result = render(scene, 1);
        assert_uniform(result.sample_buffer(), &Vector3f::new(0.5, 0.5, 0.5), 2);
    }

    #[test]
    fn test_imported_gradient_scene_renders_flat() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::Gradient);
        scene.sky_mut().set_gradient(vec![
            GradientStop::new(0.5, 1.0, 0.25, 0.0),
            GradientStop::new(0.5, 1.0, 0.25, 1.0),
        ]);
        let xml = scene.to_xml().unwrap();

        let mut imported = Scene::new();
        imported.import_xml(&xml).unwrap();
        imported.set_render_mode(RenderMode::Rendering);
        let result = render(imported, 1);
        assert_uniform(result.sample_buffer(), &Vector3f::new(0.5, 1.0, 0.25), 2);
    }

    #[test]
    fn test_imported_simulated_sky_matches_exported_scene() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::Simulated);
        scene.camera_mut().set_projection_mode(ProjectionMode::Panoramic);
        scene.camera_mut().set_fov(100.0);
        let xml = scene.to_xml().unwrap();

        let mut imported = Scene::new();
        imported.import_xml(&xml).unwrap();
        imported.set_render_mode(RenderMode::Rendering);

        let exported = render(scene, 1);
        let copy = render(imported, 1);
        let diff = exported.sample_buffer().max_abs_difference(copy.sample_buffer()).unwrap();
        assert!(diff < 0.005, "max difference {}", diff);
    }

    #[test]
    fn test_fixed_seed_single_thread_is_reproducible() {
        let mut scene = test_scene();
        scene.set_target_spp(3);
        let first = render(scene.clone(), 1);
        let second = render(scene, 1);
        assert_eq!(first.sample_buffer(), second.sample_buffer());
    }

    #[test]
    fn test_many_workers_merge_every_pixel_once_per_pass() {
        let mut scene = test_scene();
        scene.set_canvas_size(45, 33);
        scene.set_target_spp(4);
        scene.sky_mut().set_sky_mode(SkyMode::SolidColor);
        scene.sky_mut().set_color(Vector3f::new(0.25, 0.5, 0.75));
        let result = render(scene, 4);
        assert_eq!(result.sample_buffer().total_samples(), 45 * 33 * 4);
        assert_uniform(result.sample_buffer(), &Vector3f::new(0.25, 0.5, 0.75), 4);
    }

    #[test]
    fn test_start_rejects_invalid_configuration() {
        let mut manager = RenderManager::new(context(1, None), true);
        assert!(matches!(manager.start(), Err(RenderError::NoSceneProvider)));

        let mut manager = RenderManager::new(context(0, None), true);
        manager.set_scene_provider(SharedSceneProvider::new(test_scene())).unwrap();
        assert!(matches!(manager.start(), Err(RenderError::Config(_))));

        let mut small = test_scene();
        small.set_canvas_size(MIN_CANVAS_WIDTH - 1, MIN_CANVAS_HEIGHT);
        let mut manager = RenderManager::new(context(1, None), true);
        manager.set_scene_provider(SharedSceneProvider::new(small)).unwrap();
        assert!(matches!(manager.start(), Err(RenderError::Config(_))));
        assert_eq!(manager.state(), ManagerState::Stopped);
    }

    #[test]
    fn test_provider_is_fixed_while_running() {
        let mut manager = RenderManager::new(context(2, None), false);
        manager.set_scene_provider(SharedSceneProvider::new(test_scene())).unwrap();
        manager.start().unwrap();
        assert!(matches!(manager.set_scene_provider(SharedSceneProvider::new(test_scene())),
                         Err(RenderError::NotStopped)));
        assert!(matches!(manager.start(), Err(RenderError::NotStopped)));
        manager.stop();
        manager.join().unwrap();
        assert_eq!(manager.state(), ManagerState::Stopped);
        assert!(manager.set_scene_provider(SharedSceneProvider::new(test_scene())).is_ok());
    }

    #[test]
    fn test_scene_change_resets_samples() {
        let mut scene = test_scene();
        scene.sky_mut().set_sky_mode(SkyMode::Black);
        let provider = SharedSceneProvider::new(scene);
        let mut manager = RenderManager::new(context(2, None), false);
        manager.set_scene_provider(provider.clone()).unwrap();
        manager.start().unwrap();
        wait_until(|| manager.state() == ManagerState::Completed);

        let generation = provider.update(|scene| {
            scene.sky_mut().set_sky_mode(SkyMode::SolidColor);
            scene.sky_mut().set_color(Vector3f::new(1.0, 0.5, 0.0));
            scene.set_canvas_size(WIDTH + 4, HEIGHT);
            scene.generation()
        });
        wait_until(|| {
            manager.with_sample_buffer(|samples| {
                samples.generation() == generation && samples.spp() == 2
            })
        });

        let result = manager.buffered_scene();
        assert_eq!(result.sample_buffer().width(), WIDTH + 4);
        assert_eq!(result.scene().generation(), generation);
        assert_uniform(result.sample_buffer(), &Vector3f::new(1.0, 0.5, 0.0), 2);
        manager.stop();
        manager.join().unwrap();
    }

    #[test]
    fn test_paused_scene_idles_until_rendering() {
        let mut scene = test_scene();
        scene.set_render_mode(RenderMode::Paused);
        let provider = SharedSceneProvider::new(scene);
        let mut manager = RenderManager::new(context(2, None), true);
        manager.set_scene_provider(provider.clone()).unwrap();
        manager.start().unwrap();
        wait_until(|| manager.state() == ManagerState::Paused);
        assert_eq!(manager.with_sample_buffer(|samples| samples.total_samples()), 0);

        provider.update(|scene| scene.set_render_mode(RenderMode::Rendering));
        manager.join().unwrap();
        assert_eq!(manager.buffered_scene().sample_buffer().spp(), 2);
    }

    #[test]
    fn test_manager_pause_holds_progress() {
        let mut scene = test_scene();
        scene.set_target_spp(u32::MAX);
        let mut manager = RenderManager::new(context(1, None), false);
        manager.set_scene_provider(SharedSceneProvider::new(scene)).unwrap();
        manager.pause();
        manager.start().unwrap();
        wait_until(|| manager.state() == ManagerState::Paused);
        assert_eq!(manager.with_sample_buffer(|samples| samples.spp()), 0);
        manager.resume();
        wait_until(|| manager.with_sample_buffer(|samples| samples.spp()) > 0);
        manager.stop();
        manager.join().unwrap();
    }

    struct CountingListener {
        passes: AtomicU32,
        completions: AtomicU32,
    }

    impl RenderListener for CountingListener {
        fn pass_completed(&self, _spp: u32, _target_spp: u32) {
            self.passes.fetch_add(1, Ordering::SeqCst);
        }

        fn render_completed(&self, _spp: u32) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_listener_sees_every_pass() {
        let mut scene = test_scene();
        scene.set_target_spp(3);
        let listener = Arc::new(CountingListener {
            passes: AtomicU32::new(0),
            completions: AtomicU32::new(0),
        });
        let context = context(2, None).with_listener(listener.clone());
        let mut manager = RenderManager::new(context, true);
        manager.set_scene_provider(SharedSceneProvider::new(scene)).unwrap();
        manager.start().unwrap();
        manager.join().unwrap();
        assert_eq!(listener.passes.load(Ordering::SeqCst), 3);
        assert_eq!(listener.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshots_pair_scene_with_its_samples() {
        let provider = SharedSceneProvider::new(test_scene());
        let mut manager = RenderManager::new(context(2, None), false);
        manager.set_scene_provider(provider.clone()).unwrap();
        manager.start().unwrap();
        for step in 0..40 {
            provider.update(|scene| scene.set_canvas_size(WIDTH + step % 7, HEIGHT + step % 3));
            for _ in 0..25 {
                let snapshot = manager.buffered_scene();
                assert_eq!(snapshot.scene().generation(), snapshot.sample_buffer().generation());
                assert_eq!(snapshot.scene().width(), snapshot.sample_buffer().width());
                assert_eq!(snapshot.scene().height(), snapshot.sample_buffer().height());
            }
        }
        manager.stop();
        manager.join().unwrap();
    }

    /// Fails on rays leaning towards +x, returns white elsewhere.
    struct HalfFailingIntegrator;

    impl Integrator for HalfFailingIntegrator {
        fn trace_ray(&self, _scene: &Scene, ray: &Ray3f, _rng: &mut LcgRng)
                     -> Result<Vector3f, TraceError> {
            if ray.dir().x > 0.0 {
                Err(TraceError::Integrator(String::from("no geometry on this side")))
            } else {
                Ok(Vector3f::new(1.0, 1.0, 1.0))
            }
        }
    }

    struct NanIntegrator;

    impl Integrator for NanIntegrator {
        fn trace_ray(&self, _scene: &Scene, _ray: &Ray3f, _rng: &mut LcgRng)
                     -> Result<Vector3f, TraceError> {
            Ok(Vector3f::new(Float::NAN, 0.5, 0.5))
        }
    }

    struct PanickingIntegrator;

    impl Integrator for PanickingIntegrator {
        fn trace_ray(&self, _scene: &Scene, _ray: &Ray3f, _rng: &mut LcgRng)
                     -> Result<Vector3f, TraceError> {
            panic!("integrator blew up")
        }
    }

    fn assert_column_range(samples: &SampleBuffer,
                           xs: std::ops::Range<usize>,
                           expected: &Vector3f) {
        for y in 0..samples.height() {
            for x in xs.clone() {
                assert_eq!(samples.pixel_spp(x, y), 2);
                assert_eq!(samples.pixel(x, y), *expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_trace_errors_record_zero_samples() {
        let context = context(2, None).with_integrator(Arc::new(HalfFailingIntegrator));
        let result = render_with(context, test_scene());
        let samples = result.sample_buffer();
        assert_eq!(samples.spp(), 2);
        assert_eq!(samples.total_samples(), (WIDTH * HEIGHT * 2) as u64);
        // The middle column straddles x = 0.
        assert_column_range(samples, 0..WIDTH / 2, &Vector3f::new(1.0, 1.0, 1.0));
        assert_column_range(samples, WIDTH / 2 + 1..WIDTH, &Vector3f::zeros());
    }

    #[test]
    fn test_non_finite_radiance_records_zero_samples() {
        let context = context(1, None).with_integrator(Arc::new(NanIntegrator));
        let result = render_with(context, test_scene());
        assert_uniform(result.sample_buffer(), &Vector3f::zeros(), 2);
    }

    #[test]
    fn test_panicking_integrator_does_not_stall_render() {
        let context = context(2, None).with_integrator(Arc::new(PanickingIntegrator));
        let (done, finished) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let result = render_with(context, test_scene());
            let _ = done.send(result);
        });
        let result = finished.recv_timeout(Duration::from_secs(30)).expect("render stalled");
        assert_uniform(result.sample_buffer(), &Vector3f::zeros(), 2);
    }

    #[test]
    fn test_default_factory_honours_fixed_seed() {
        let seeded = |seed: u64| render_with(context(1, Some(seed)), test_scene());
        let first = seeded(9);
        let second = seeded(9);
        assert_eq!(first.sample_buffer(), second.sample_buffer());
        assert_ne!(first.sample_buffer(), seeded(10).sample_buffer());
    }
}
