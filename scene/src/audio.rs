//! Audio engine seam.
//!
//! The scene manages source lifetimes and pushes positions; mixing and
//! playback belong to the engine behind [`AudioEngine`].

use quasar_core::math::Vec3;

use crate::components::AudioSource;

/// Engine-side identifier of a playing or paused source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioSourceId(pub u64);

pub trait AudioEngine {
    /// Creates an engine source for `source`. Returns `None` if the clip
    /// cannot be loaded.
    fn create_source(&mut self, source: &AudioSource) -> Option<AudioSourceId>;

    fn destroy_source(&mut self, id: AudioSourceId);

    fn set_source_position(&mut self, id: AudioSourceId, position: Vec3);

    fn set_listener_pose(&mut self, position: Vec3, forward: Vec3, up: Vec3);

    fn play(&mut self, id: AudioSourceId);
}
