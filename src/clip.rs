use crate::pose::{blend_transforms, JointTransform, Pose};
use crate::skeleton::Skeleton;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

/// Time-stamped marker fired when playback crosses it (footsteps and similar
/// gameplay cues). Times are in seconds from the clip start.
#[derive(Clone, Debug)]
pub struct ClipNotify {
    pub time: f32,
    pub name: Arc<str>,
}

/// Per-bone keyframe data. Key index doubles as frame index; the three
/// channels may have different lengths and each clamps to its own last key.
/// Immutable once the owning clip is built.
#[derive(Clone)]
pub struct BoneTrack {
    pub bone: Arc<str>,
    pub positions: Arc<[Vec3]>,
    pub rotations: Arc<[Quat]>,
    pub scales: Arc<[Vec3]>,
}

impl BoneTrack {
    pub fn new(bone: Arc<str>, positions: Vec<Vec3>, rotations: Vec<Quat>, scales: Vec<Vec3>) -> Self {
        Self {
            bone,
            positions: Arc::from(positions.into_boxed_slice()),
            rotations: Arc::from(rotations.into_boxed_slice()),
            scales: Arc::from(scales.into_boxed_slice()),
        }
    }

    pub fn max_key_count(&self) -> usize {
        self.positions.len().max(self.rotations.len()).max(self.scales.len())
    }

    fn position_key(&self, frame: usize) -> Vec3 {
        match self.positions.len() {
            0 => Vec3::ZERO,
            len => self.positions[frame.min(len - 1)],
        }
    }

    fn rotation_key(&self, frame: usize) -> Quat {
        match self.rotations.len() {
            0 => Quat::IDENTITY,
            len => self.rotations[frame.min(len - 1)],
        }
    }

    fn scale_key(&self, frame: usize) -> Vec3 {
        match self.scales.len() {
            0 => Vec3::ONE,
            len => self.scales[frame.min(len - 1)],
        }
    }

    /// Raw keyed transform at `frame`, clamped into each channel. Channels
    /// with no keys at all fall back to identity components.
    pub fn transform_key(&self, frame: usize) -> JointTransform {
        JointTransform {
            translation: self.position_key(frame),
            rotation: self.rotation_key(frame),
            scale: self.scale_key(frame),
        }
    }
}

/// A set of bone tracks sharing one frame rate and nominal frame count.
/// Read-only during evaluation; owned by the `AnimationLibrary`.
#[derive(Clone)]
pub struct AnimationClip {
    pub name: Arc<str>,
    pub skeleton: Arc<str>,
    pub frame_rate: u32,
    pub frame_count: u32,
    pub play_length: f32,
    pub notifies: Arc<[ClipNotify]>,
    tracks: Arc<[BoneTrack]>,
    track_index: HashMap<Arc<str>, usize>,
}

impl AnimationClip {
    pub fn new(
        name: Arc<str>,
        skeleton: Arc<str>,
        frame_rate: u32,
        frame_count: u32,
        tracks: Vec<BoneTrack>,
    ) -> Self {
        let play_length = if frame_rate == 0 { 0.0 } else { frame_count as f32 / frame_rate as f32 };
        Self::with_play_length(name, skeleton, frame_rate, frame_count, play_length, tracks)
    }

    pub fn with_play_length(
        name: Arc<str>,
        skeleton: Arc<str>,
        frame_rate: u32,
        frame_count: u32,
        play_length: f32,
        tracks: Vec<BoneTrack>,
    ) -> Self {
        let mut track_index = HashMap::with_capacity(tracks.len());
        for (index, track) in tracks.iter().enumerate() {
            track_index.insert(Arc::clone(&track.bone), index);
        }
        Self {
            name,
            skeleton,
            frame_rate,
            frame_count,
            play_length,
            notifies: Arc::from([]),
            tracks: Arc::from(tracks.into_boxed_slice()),
            track_index,
        }
    }

    pub fn with_notifies(mut self, mut notifies: Vec<ClipNotify>) -> Self {
        notifies.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.notifies = Arc::from(notifies.into_boxed_slice());
        self
    }

    pub fn tracks(&self) -> &[BoneTrack] {
        &self.tracks
    }

    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.track_index.get(bone).map(|&index| &self.tracks[index])
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Samples the track for `bone` at `time` seconds.
    ///
    /// `time` maps to a fractional frame (`time * frame_rate`); both bracketing
    /// frames clamp into `[0, frame_count - 1]`, so out-of-range times hold the
    /// first or last frame. Returns `None` when the clip carries no track for
    /// `bone`; callers substitute the joint's rest transform.
    pub fn sample_bone(&self, bone: &str, time: f32, interpolate: bool) -> Option<JointTransform> {
        let track = self.track(bone)?;
        Some(self.sample_track(track, time, interpolate))
    }

    pub fn sample_track(&self, track: &BoneTrack, time: f32, interpolate: bool) -> JointTransform {
        if self.frame_count == 0 {
            return track.transform_key(0);
        }
        let frame_time = time * self.frame_rate as f32;
        if !frame_time.is_finite() {
            return track.transform_key(0);
        }
        let base = frame_time.floor();
        let alpha = frame_time - base;
        let last = (self.frame_count - 1) as i64;
        let frame0 = (base as i64).clamp(0, last) as usize;
        let frame1 = (base as i64).saturating_add(1).clamp(0, last) as usize;
        let from = track.transform_key(frame0);
        if !interpolate || frame1 == frame0 || alpha <= f32::EPSILON {
            return from;
        }
        let to = track.transform_key(frame1);
        blend_transforms(&from, &to, alpha)
    }

    /// Evaluates a full pose for `skeleton`, resizing `out` to its joint
    /// count. Joints without a track take their rest transform.
    pub fn sample_pose(&self, skeleton: &Skeleton, time: f32, interpolate: bool, out: &mut Pose) {
        out.resize(skeleton.joint_count());
        for (index, joint) in skeleton.joints.iter().enumerate() {
            let transform = match self.track(&joint.name) {
                Some(track) => self.sample_track(track, time, interpolate),
                None => joint.rest_transform(),
            };
            out.joints_mut()[index] = transform;
        }
    }
}
