use quasar_ecs::Component;

use crate::audio::AudioSourceId;

/// Positional sound emitter.
#[derive(Debug, Component)]
pub struct AudioSource {
    pub clip: String,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub play_on_awake: bool,
    #[runtime]
    pub source: Option<AudioSourceId>,
}

impl AudioSource {
    pub fn new(clip: &str) -> Self {
        Self {
            clip: clip.to_string(),
            ..Self::default()
        }
    }
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            clip: String::new(),
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            play_on_awake: false,
            source: None,
        }
    }
}

/// Copies have no engine source.
impl Clone for AudioSource {
    fn clone(&self) -> Self {
        Self {
            clip: self.clip.clone(),
            volume: self.volume,
            pitch: self.pitch,
            looping: self.looping,
            play_on_awake: self.play_on_awake,
            source: None,
        }
    }
}

/// Marks the entity whose pose is the listener pose.
#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct AudioListener {
    pub active: bool,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self { active: true }
    }
}
