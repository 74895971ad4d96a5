// Copyright @yucwang 2026

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::camera::CameraView;
use crate::core::integrator::Integrator;
use crate::core::sample_buffer::SampleBuffer;
use crate::core::scene::Scene;
use crate::renderers::render_manager::ManagerState;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Rectangular pixel range `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Tile {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn pixel_count(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// One sampling pass over the whole canvas. Tiles are claimed through an
/// atomic counter, so each tile goes to exactly one worker.
pub(crate) struct PassJob {
    pub generation: u64,
    pub scene: Arc<Scene>,
    pub view: Arc<CameraView>,
    pub samples: u32,
    width: usize,
    height: usize,
    tile_size: usize,
    tiles_x: usize,
    total_tiles: usize,
    next_tile: AtomicUsize,
    merged: Vec<AtomicBool>,
}

impl PassJob {
    pub fn new(generation: u64,
               scene: Arc<Scene>,
               view: Arc<CameraView>,
               tile_size: usize,
               samples: u32) -> Self {
        let (width, height) = (scene.width(), scene.height());
        let tile_size = tile_size.max(1);
        let tiles_x = (width + tile_size - 1) / tile_size;
        let tiles_y = (height + tile_size - 1) / tile_size;
        let total_tiles = tiles_x * tiles_y;
        Self {
            generation,
            scene,
            view,
            samples,
            width,
            height,
            tile_size,
            tiles_x,
            total_tiles,
            next_tile: AtomicUsize::new(0),
            merged: (0..total_tiles).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn total_tiles(&self) -> usize {
        self.total_tiles
    }

    pub fn claim(&self) -> Option<(usize, Tile)> {
        let index = self.next_tile.fetch_add(1, Ordering::Relaxed);
        if index >= self.total_tiles {
            return None;
        }
        Some((index, self.tile(index)))
    }

    pub fn tile(&self, index: usize) -> Tile {
        let x0 = (index % self.tiles_x) * self.tile_size;
        let y0 = (index / self.tiles_x) * self.tile_size;
        Tile {
            x0,
            y0,
            x1: (x0 + self.tile_size).min(self.width),
            y1: (y0 + self.tile_size).min(self.height),
        }
    }

    /// Records that a tile's samples reached the buffer. Returns false if
    /// the tile was already merged during this pass.
    pub fn mark_merged(&self, index: usize) -> bool {
        !self.merged[index].swap(true, Ordering::AcqRel)
    }
}

struct GateState {
    pass: u64,
    active: usize,
    shutdown: bool,
}

/// Pass boundary shared by the manager and its workers. The manager opens
/// a pass and waits for every worker to finish it; workers block between
/// passes.
pub(crate) struct PassGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl PassGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState { pass: 0, active: 0, shutdown: false }),
            changed: Condvar::new(),
        }
    }

    pub fn open(&self, workers: usize) {
        let mut state = lock(&self.state);
        state.pass += 1;
        state.active = workers;
        self.changed.notify_all();
    }

    /// Blocks until every worker finished the open pass. Returns false if
    /// the gate was shut down instead, e.g. because a worker died mid-pass.
    pub fn wait_finished(&self) -> bool {
        let mut state = lock(&self.state);
        while state.active > 0 && !state.shutdown {
            state = self.changed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        !state.shutdown
    }

    /// Blocks until a pass newer than `seen` opens. `None` means shut down.
    pub fn wait_for_pass(&self, seen: u64) -> Option<u64> {
        let mut state = lock(&self.state);
        loop {
            if state.shutdown {
                return None;
            }
            if state.pass > seen {
                return Some(state.pass);
            }
            state = self.changed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn finish(&self) {
        let mut state = lock(&self.state);
        state.active = state.active.saturating_sub(1);
        if state.active == 0 {
            self.changed.notify_all();
        }
    }

    pub fn shutdown(&self) {
        lock(&self.state).shutdown = true;
        self.changed.notify_all();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Control {
    pub stop: bool,
    pub pause: bool,
}

/// State shared between a render manager, its manager thread and workers.
///
/// Lock order is `samples` before `scene`; writers that replace both hold
/// the samples guard until the scene is swapped.
pub(crate) struct RenderShared {
    pub samples: RwLock<SampleBuffer>,
    pub scene: RwLock<Scene>,
    pub job: RwLock<Option<Arc<PassJob>>>,
    pub gate: PassGate,
    pub integrator: Arc<dyn Integrator>,
    pub state: Mutex<ManagerState>,
    pub control: Mutex<Control>,
    pub control_changed: Condvar,
}

impl RenderShared {
    pub fn new(scene: Scene, samples: SampleBuffer, integrator: Arc<dyn Integrator>) -> Self {
        Self {
            samples: RwLock::new(samples),
            scene: RwLock::new(scene),
            job: RwLock::new(None),
            gate: PassGate::new(),
            integrator,
            state: Mutex::new(ManagerState::Stopped),
            control: Mutex::new(Control::default()),
            control_changed: Condvar::new(),
        }
    }

    pub fn current_job(&self) -> Option<Arc<PassJob>> {
        read(&self.job).clone()
    }

    pub fn state(&self) -> ManagerState {
        *lock(&self.state)
    }

    pub fn set_state(&self, state: ManagerState) {
        *lock(&self.state) = state;
    }

    pub fn control(&self) -> Control {
        *lock(&self.control)
    }

    pub fn update_control<F: FnOnce(&mut Control)>(&self, f: F) {
        f(&mut lock(&self.control));
        self.control_changed.notify_all();
    }

    /// Sleeps until a control change or the timeout, whichever is first.
    pub fn wait_control(&self, timeout: std::time::Duration) {
        let guard = lock(&self.control);
        let _ = self.control_changed.wait_timeout(guard, timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use std::collections::HashSet;

    fn job(width: usize, height: usize, tile_size: usize) -> PassJob {
        let mut scene = Scene::new();
        scene.set_canvas_size(width, height);
        let view = Arc::new(Camera::default().view(width, height));
        PassJob::new(scene.generation(), Arc::new(scene), view, tile_size, 1)
    }

    #[test]
    fn test_tiles_cover_canvas_exactly_once() {
        let job = job(37, 21, 8);
        let mut seen = HashSet::new();
        let mut pixels = 0;
        while let Some((_, tile)) = job.claim() {
            pixels += tile.pixel_count();
            for y in tile.y0..tile.y1 {
                for x in tile.x0..tile.x1 {
                    assert!(seen.insert((x, y)));
                }
            }
        }
        assert_eq!(pixels, 37 * 21);
        assert_eq!(job.total_tiles(), 5 * 3);
    }

    #[test]
    fn test_tile_merges_are_tracked() {
        let job = job(20, 20, 16);
        assert!(job.mark_merged(1));
        assert!(!job.mark_merged(1));
        assert!(job.mark_merged(0));
    }

    #[test]
    fn test_gate_reports_shutdown_during_pass() {
        let gate = Arc::new(PassGate::new());
        gate.open(2);
        gate.finish();
        let dying = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.shutdown())
        };
        assert!(!gate.wait_finished());
        dying.join().unwrap();
        assert_eq!(gate.wait_for_pass(0), None);
    }

    #[test]
    fn test_gate_releases_workers_on_shutdown() {
        let gate = Arc::new(PassGate::new());
        let worker = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || {
                let mut passes = 0;
                let mut seen = 0;
                while let Some(pass) = gate.wait_for_pass(seen) {
                    seen = pass;
                    passes += 1;
                    gate.finish();
                }
                passes
            })
        };
        for _ in 0..3 {
            gate.open(1);
            assert!(gate.wait_finished());
        }
        gate.shutdown();
        assert_eq!(worker.join().unwrap(), 3);
    }
}
