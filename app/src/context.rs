//! Per-run application context.

use quasar_scene::Scene;

/// Context handed to every [`AppHandler`](crate::AppHandler) callback.
pub struct AppContext {
    pub(crate) scene: Scene,
    /// Frames completed so far.
    pub(crate) frame_number: u64,
    /// Seconds of simulated time per frame.
    pub(crate) delta_time: f32,
    /// Simulated seconds since the run started.
    pub(crate) elapsed_time: f32,
}

impl AppContext {
    pub(crate) fn new(scene: Scene, delta_time: f32) -> Self {
        Self {
            scene,
            frame_number: 0,
            delta_time,
            elapsed_time: 0.0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}
