use crate::assets::AnimationLibrary;
use crate::blendspace::advance_play_time;
use crate::pose::Pose;
use std::sync::Arc;

/// Anything that can step its own playback and produce a pose: a single clip
/// player or a blend space. The library is passed in per call; sources hold
/// clip keys, never clip data.
pub trait PoseSource {
    /// Advances playback by `dt` seconds and writes the evaluated pose into
    /// `out`. When nothing can be evaluated the pose is left untouched.
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose);

    /// Play length of whatever currently drives playback, if known.
    fn play_length(&self, library: &AnimationLibrary) -> Option<f32>;

    /// Key of the clip that currently owns playback (the dominant blend
    /// sample, or the player's clip).
    fn dominant_clip(&self) -> Option<Arc<str>>;

    fn current_play_time(&self) -> f32;

    fn previous_play_time(&self) -> f32;

    fn looping(&self) -> bool;
}

/// Plays a single clip by key.
pub struct ClipPlayer {
    clip: Arc<str>,
    time: f32,
    previous_time: f32,
    play_rate: f32,
    pub looped: bool,
}

impl ClipPlayer {
    pub fn new(clip: impl Into<Arc<str>>) -> Self {
        Self { clip: clip.into(), time: 0.0, previous_time: 0.0, play_rate: 1.0, looped: true }
    }

    pub fn clip_key(&self) -> &str {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
        self.previous_time = time;
    }

    pub fn set_play_rate(&mut self, rate: f32) {
        self.play_rate = rate;
    }

    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    /// Evaluates the clip at an arbitrary time without touching the play
    /// head. `false` when the clip or its skeleton is missing.
    pub fn sample_at(&self, time: f32, library: &AnimationLibrary, out: &mut Pose) -> bool {
        let Some((clip, skeleton)) = library.resolve_clip(&self.clip) else {
            return false;
        };
        clip.sample_pose(&skeleton, time, true, out);
        true
    }
}

impl PoseSource for ClipPlayer {
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        self.previous_time = self.time;
        match library.resolve_clip(&self.clip) {
            Some((clip, skeleton)) => {
                self.time = advance_play_time(
                    self.time,
                    dt * self.play_rate,
                    self.looped,
                    Some(clip.play_length),
                );
                clip.sample_pose(&skeleton, self.time, true, out);
            }
            None => {
                self.time = advance_play_time(self.time, dt * self.play_rate, self.looped, None);
            }
        }
    }

    fn play_length(&self, library: &AnimationLibrary) -> Option<f32> {
        Some(library.clip(&self.clip)?.play_length)
    }

    fn dominant_clip(&self) -> Option<Arc<str>> {
        Some(self.clip.clone())
    }

    fn current_play_time(&self) -> f32 {
        self.time
    }

    fn previous_play_time(&self) -> f32 {
        self.previous_time
    }

    fn looping(&self) -> bool {
        self.looped
    }
}
