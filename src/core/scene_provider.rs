// Copyright @yucwang 2026

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::scene::{RenderMode, Scene};

/// Supplies the scene configuration to a render manager. The manager polls
/// it at pass boundaries and reacts to generation changes.
pub trait SceneProvider: Send + Sync {
    /// Snapshot of the current scene.
    fn scene(&self) -> Scene;
    fn generation(&self) -> u64;
    fn render_mode(&self) -> RenderMode;
    fn target_spp(&self) -> u32;
}

/// In-process provider around a mutex-guarded scene. Clones share the scene.
#[derive(Clone)]
pub struct SharedSceneProvider {
    scene: Arc<Mutex<Scene>>,
}

impl SharedSceneProvider {
    pub fn new(scene: Scene) -> Self {
        Self { scene: Arc::new(Mutex::new(scene)) }
    }

    fn lock(&self) -> MutexGuard<'_, Scene> {
        // A panic while holding the lock leaves the scene itself intact.
        match self.scene.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn update<R, F: FnOnce(&mut Scene) -> R>(&self, f: F) -> R {
        f(&mut self.lock())
    }
}

impl SceneProvider for SharedSceneProvider {
    fn scene(&self) -> Scene {
        self.lock().clone()
    }

    fn generation(&self) -> u64 {
        self.lock().generation()
    }

    fn render_mode(&self) -> RenderMode {
        self.lock().render_mode()
    }

    fn target_spp(&self) -> u32 {
        self.lock().target_spp()
    }
}
