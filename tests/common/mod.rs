//! Shared test doubles: a scripted media backend and audio library.
#![allow(dead_code)]

use narrator_engine::errors::MediaError;
use narrator_engine::media::{AudioHandle, MediaBackend, MediaMetadata, MediaPlayer};
use narrator_engine::scene::{MediaRef, Scene, SelectionWindow};
use narrator_engine::voice::AudioLibrary;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const DEFAULT_METADATA: MediaMetadata = MediaMetadata {
    duration_sec: 10.0,
    width: 640,
    height: 360,
};

/// Observable state of one fake player, shared with the test body.
pub struct PlayerState {
    pub metadata: MediaMetadata,
    /// Pumps remaining before metadata is reported.
    pub meta_delay: u32,
    /// Pumps between a seek and the frame becoming paintable.
    pub frame_delay: u32,
    pending_frame: u32,
    pub frame_at: Option<f64>,
    pub position: f64,
    pub paused: bool,
    pub seeks: Vec<f64>,
    pub pumps: u32,
}

impl PlayerState {
    fn new(metadata: MediaMetadata, meta_delay: u32, frame_delay: u32) -> Self {
        Self {
            metadata,
            meta_delay,
            frame_delay,
            pending_frame: 0,
            frame_at: None,
            position: 0.0,
            paused: true,
            seeks: Vec::new(),
            pumps: 0,
        }
    }
}

pub struct FakePlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl MediaPlayer for FakePlayer {
    fn metadata(&self) -> Option<MediaMetadata> {
        let state = self.state.lock().unwrap();
        (state.meta_delay == 0).then_some(state.metadata)
    }

    fn seek(&mut self, time_sec: f64) {
        let mut state = self.state.lock().unwrap();
        state.position = time_sec;
        state.seeks.push(time_sec);
        if state.frame_delay == 0 {
            state.frame_at = Some(time_sec);
        } else {
            state.pending_frame = state.frame_delay;
        }
    }

    fn play(&mut self) {
        self.state.lock().unwrap().paused = false;
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn pump(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.pumps += 1;
        if state.meta_delay > 0 {
            state.meta_delay -= 1;
        } else if state.pending_frame > 0 {
            state.pending_frame -= 1;
            if state.pending_frame == 0 {
                state.frame_at = Some(state.position);
            }
        }
    }

    fn frame_ready(&self) -> bool {
        let state = self.state.lock().unwrap();
        state
            .frame_at
            .map_or(false, |f| (f - state.position).abs() < 0.08)
    }
}

/// A media backend producing scripted players, keyed by media ref.
#[derive(Default)]
pub struct FakeBackend {
    states: Mutex<HashMap<String, Arc<Mutex<PlayerState>>>>,
    fail: Mutex<HashSet<String>>,
    meta_delays: Mutex<HashMap<String, u32>>,
    frame_delays: Mutex<HashMap<String, u32>>,
    metadata: Mutex<HashMap<String, MediaMetadata>>,
    opens: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `open` fail for this ref.
    pub fn set_fail(&self, media: &str) {
        self.fail.lock().unwrap().insert(media.to_string());
    }

    /// Delays metadata for this ref by `pumps` pump calls.
    pub fn set_meta_delay(&self, media: &str, pumps: u32) {
        self.meta_delays
            .lock()
            .unwrap()
            .insert(media.to_string(), pumps);
    }

    /// Delays frame readiness after each seek by `pumps` pump calls.
    pub fn set_frame_delay(&self, media: &str, pumps: u32) {
        self.frame_delays
            .lock()
            .unwrap()
            .insert(media.to_string(), pumps);
    }

    pub fn set_metadata(&self, media: &str, metadata: MediaMetadata) {
        self.metadata
            .lock()
            .unwrap()
            .insert(media.to_string(), metadata);
    }

    /// The state of the most recently opened player for this ref.
    pub fn state(&self, media: &str) -> Arc<Mutex<PlayerState>> {
        self.states
            .lock()
            .unwrap()
            .get(media)
            .cloned()
            .unwrap_or_else(|| panic!("no player opened for {}", media))
    }

    pub fn opened(&self, media: &str) -> usize {
        self.opens
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == media)
            .count()
    }
}

impl MediaBackend for FakeBackend {
    fn open(&self, media: &MediaRef) -> Result<Box<dyn MediaPlayer>, MediaError> {
        self.opens.lock().unwrap().push(media.as_str().to_string());
        if self.fail.lock().unwrap().contains(media.as_str()) {
            return Err(MediaError::OpenFailed(media.as_str().to_string()));
        }
        let metadata = self
            .metadata
            .lock()
            .unwrap()
            .get(media.as_str())
            .copied()
            .unwrap_or(DEFAULT_METADATA);
        let meta_delay = self
            .meta_delays
            .lock()
            .unwrap()
            .get(media.as_str())
            .copied()
            .unwrap_or(0);
        let frame_delay = self
            .frame_delays
            .lock()
            .unwrap()
            .get(media.as_str())
            .copied()
            .unwrap_or(0);
        let state = Arc::new(Mutex::new(PlayerState::new(metadata, meta_delay, frame_delay)));
        self.states
            .lock()
            .unwrap()
            .insert(media.as_str().to_string(), state.clone());
        Ok(Box::new(FakePlayer { state }))
    }
}

/// Builds a playable scene over `media` with the given selection window.
pub fn media_scene(media: &str, start_sec: f64, end_sec: f64) -> Scene {
    let mut scene = Scene::new("", SelectionWindow::new(start_sec, end_sec));
    scene.media = Some(MediaRef::new(media));
    scene
}

/// Builds a scene with no media (non-playable).
pub fn blank_scene() -> Scene {
    Scene::new("", SelectionWindow::new(0.0, 0.0))
}

// --- Audio doubles ---

pub struct AudioState {
    pub name: String,
    pub position: f64,
    pub paused: bool,
    pub duration: Option<f64>,
}

pub struct FakeAudio {
    state: Arc<Mutex<AudioState>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl FakeAudio {
    fn log(&self, event: &str) {
        let name = self.state.lock().unwrap().name.clone();
        self.events.lock().unwrap().push(format!("{name}:{event}"));
    }
}

impl AudioHandle for FakeAudio {
    fn play_from(&mut self, offset_sec: f64) {
        self.log(&format!("play@{offset_sec:.2}"));
        let mut state = self.state.lock().unwrap();
        state.position = offset_sec;
        state.paused = false;
    }

    fn pause(&mut self) {
        self.log("pause");
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&mut self) {
        self.log("resume");
        self.state.lock().unwrap().paused = false;
    }

    fn stop(&mut self) {
        self.log("stop");
        let mut state = self.state.lock().unwrap();
        state.paused = true;
        state.position = 0.0;
    }

    fn position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().unwrap().duration
    }
}

/// An audio library with a configurable set of available clips and a shared
/// event log recording handle operations in order.
#[derive(Default)]
pub struct FakeLibrary {
    pub events: Arc<Mutex<Vec<String>>>,
    pub available_voices: HashSet<(usize, usize)>,
    pub music_duration: Option<f64>,
    pub has_music: bool,
    pub effects: HashSet<usize>,
    states: HashMap<String, Arc<Mutex<AudioState>>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: &[(usize, usize)]) -> Self {
        Self {
            available_voices: voices.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn state(&self, name: &str) -> Arc<Mutex<AudioState>> {
        self.states
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("no handle opened for {}", name))
    }

    fn open(&mut self, name: String, duration: Option<f64>) -> Box<dyn AudioHandle> {
        let state = Arc::new(Mutex::new(AudioState {
            name: name.clone(),
            position: 0.0,
            paused: true,
            duration,
        }));
        self.states.insert(name, state.clone());
        Box::new(FakeAudio {
            state,
            events: self.events.clone(),
        })
    }
}

impl AudioLibrary for FakeLibrary {
    fn voice(&mut self, scene_index: usize, part_index: usize) -> Option<Box<dyn AudioHandle>> {
        if !self.available_voices.contains(&(scene_index, part_index)) {
            return None;
        }
        Some(self.open(format!("v{scene_index}p{part_index}"), None))
    }

    fn music(&mut self) -> Option<Box<dyn AudioHandle>> {
        if !self.has_music {
            return None;
        }
        let duration = self.music_duration;
        Some(self.open("music".to_string(), duration))
    }

    fn effect(&mut self, scene_index: usize) -> Option<Box<dyn AudioHandle>> {
        if !self.effects.contains(&scene_index) {
            return None;
        }
        Some(self.open(format!("fx{scene_index}"), None))
    }
}
