use crate::blendspace::data::{QuatData, Vec3Data};
use crate::clip::{AnimationClip, BoneTrack, ClipNotify};
use crate::skeleton::{Skeleton, SkeletonJoint};
use anyhow::{anyhow, Context, Result};
use glam::{Quat, Vec3};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;

/// Shared store for clips and skeletons. Entries are handed out as `Arc`
/// clones; runtime code holds keys, not clip data, so a re-inserted clip is
/// picked up on the next resolve.
pub struct AnimationLibrary {
    clips: HashMap<String, Arc<AnimationClip>>,
    skeletons: HashMap<String, Arc<Skeleton>>,
    clip_sources: HashMap<String, String>,
    clip_refs: HashMap<String, usize>,
    skeleton_sources: HashMap<String, String>,
    skeleton_refs: HashMap<String, usize>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
            skeletons: HashMap::new(),
            clip_sources: HashMap::new(),
            clip_refs: HashMap::new(),
            skeleton_sources: HashMap::new(),
            skeleton_refs: HashMap::new(),
        }
    }

    /// Registers a clip built in code. Replaces any existing entry under `key`.
    pub fn insert_clip(&mut self, key: &str, clip: AnimationClip) {
        self.clips.insert(key.to_string(), Arc::new(clip));
        self.clip_refs.insert(key.to_string(), 1);
    }

    pub fn insert_skeleton(&mut self, key: &str, skeleton: Skeleton) {
        self.skeletons.insert(key.to_string(), Arc::new(skeleton));
        self.skeleton_refs.insert(key.to_string(), 1);
    }

    pub fn retain_clip(&mut self, key: &str, json_path: Option<&str>) -> Result<()> {
        if self.clips.contains_key(key) {
            *self.clip_refs.entry(key.to_string()).or_insert(0) += 1;
            return Ok(());
        }
        let path_owned: String = match json_path {
            Some(p) => p.to_string(),
            None => self
                .clip_sources
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow!("Clip '{}' is not loaded and no JSON path was provided", key))?,
        };
        self.load_clip_internal(key, &path_owned)?;
        self.clip_sources.insert(key.to_string(), path_owned);
        self.clip_refs.insert(key.to_string(), 1);
        Ok(())
    }

    pub fn release_clip(&mut self, key: &str) -> bool {
        let Some(count) = self.clip_refs.get_mut(key) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.clip_refs.remove(key);
            self.clips.remove(key);
        }
        true
    }

    pub fn clip(&self, key: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(key).cloned()
    }

    pub fn clip_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.clips.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clip_source(&self, key: &str) -> Option<&str> {
        self.clip_sources.get(key).map(|s| s.as_str())
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn retain_skeleton(&mut self, key: &str, json_path: Option<&str>) -> Result<()> {
        if self.skeletons.contains_key(key) {
            *self.skeleton_refs.entry(key.to_string()).or_insert(0) += 1;
            return Ok(());
        }
        let path_owned: String = match json_path {
            Some(p) => p.to_string(),
            None => self
                .skeleton_sources
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow!("Skeleton '{}' is not loaded and no JSON path was provided", key))?,
        };
        self.load_skeleton_internal(key, &path_owned)?;
        self.skeleton_sources.insert(key.to_string(), path_owned);
        self.skeleton_refs.insert(key.to_string(), 1);
        Ok(())
    }

    pub fn release_skeleton(&mut self, key: &str) -> bool {
        let Some(count) = self.skeleton_refs.get_mut(key) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.skeleton_refs.remove(key);
            self.skeletons.remove(key);
        }
        true
    }

    pub fn skeleton(&self, key: &str) -> Option<Arc<Skeleton>> {
        self.skeletons.get(key).cloned()
    }

    pub fn skeleton_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.skeletons.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn skeleton_source(&self, key: &str) -> Option<&str> {
        self.skeleton_sources.get(key).map(|s| s.as_str())
    }

    pub fn skeleton_count(&self) -> usize {
        self.skeletons.len()
    }

    /// Looks up a clip together with the skeleton it animates. `None` when
    /// either half is missing; callers skip the sample rather than fail.
    pub fn resolve_clip(&self, key: &str) -> Option<(Arc<AnimationClip>, Arc<Skeleton>)> {
        let clip = self.clips.get(key)?;
        let skeleton = self.skeletons.get(clip.skeleton.as_ref())?;
        Some((clip.clone(), skeleton.clone()))
    }

    pub fn clip_keys_for(&self, skeleton: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .clips
            .iter()
            .filter(|(_, clip)| clip.skeleton.as_ref() == skeleton)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn load_clip_from_path(&mut self, key: &str, path: &str) -> Result<()> {
        self.load_clip_internal(key, path)?;
        self.clip_sources.insert(key.to_string(), path.to_string());
        self.clip_refs.insert(key.to_string(), 1);
        Ok(())
    }

    pub fn load_skeleton_from_path(&mut self, key: &str, path: &str) -> Result<()> {
        self.load_skeleton_internal(key, path)?;
        self.skeleton_sources.insert(key.to_string(), path.to_string());
        self.skeleton_refs.insert(key.to_string(), 1);
        Ok(())
    }

    fn load_clip_internal(&mut self, key: &str, path: &str) -> Result<()> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read animation clip JSON at {}", path))?;
        let clip = parse_animation_clip_bytes(&bytes, key, path)?;
        self.clips.insert(key.to_string(), Arc::new(clip));
        Ok(())
    }

    fn load_skeleton_internal(&mut self, key: &str, path: &str) -> Result<()> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read skeleton JSON at {}", path))?;
        let skeleton = parse_skeleton_bytes(&bytes, key, path)?;
        self.skeletons.insert(key.to_string(), Arc::new(skeleton));
        Ok(())
    }
}

impl Default for AnimationLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Deserialize)]
struct ClipFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    name: Option<String>,
    skeleton: String,
    frame_rate: u32,
    frame_count: u32,
    #[serde(default)]
    play_length: Option<f32>,
    tracks: Vec<ClipTrackFile>,
    #[serde(default)]
    notifies: Vec<ClipNotifyFile>,
}

#[derive(Deserialize)]
struct ClipTrackFile {
    bone: String,
    #[serde(default)]
    positions: Vec<Vec3Data>,
    #[serde(default)]
    rotations: Vec<QuatData>,
    #[serde(default)]
    scales: Vec<Vec3Data>,
}

#[derive(Deserialize)]
struct ClipNotifyFile {
    time: f32,
    name: String,
}

#[derive(Deserialize)]
struct SkeletonFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    name: Option<String>,
    joints: Vec<SkeletonJointFile>,
}

fn default_joint_rotation() -> QuatData {
    QuatData { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
}

fn default_joint_scale() -> Vec3Data {
    Vec3Data { x: 1.0, y: 1.0, z: 1.0 }
}

#[derive(Deserialize)]
struct SkeletonJointFile {
    name: String,
    #[serde(default)]
    parent: Option<u32>,
    #[serde(default)]
    translation: Vec3Data,
    #[serde(default = "default_joint_rotation")]
    rotation: QuatData,
    #[serde(default = "default_joint_scale")]
    scale: Vec3Data,
}

fn build_bone_track(raw: ClipTrackFile, frame_count: u32, source_label: &str) -> Result<BoneTrack> {
    let bone: Arc<str> = Arc::from(raw.bone.as_str());
    let mut positions = Vec::with_capacity(raw.positions.len());
    for value in raw.positions {
        let v = Vec3::from(value);
        if !v.is_finite() {
            return Err(anyhow!("Track '{}' contains a non-finite position key", bone));
        }
        positions.push(v);
    }
    let mut rotations = Vec::with_capacity(raw.rotations.len());
    for value in raw.rotations {
        let q = Quat::from(value);
        if !q.is_finite() || q.length_squared() <= f32::EPSILON {
            return Err(anyhow!("Track '{}' contains an invalid rotation key", bone));
        }
        rotations.push(q.normalize());
    }
    let mut scales = Vec::with_capacity(raw.scales.len());
    for value in raw.scales {
        let v = Vec3::from(value);
        if !v.is_finite() {
            return Err(anyhow!("Track '{}' contains a non-finite scale key", bone));
        }
        scales.push(v);
    }
    let track = BoneTrack::new(bone, positions, rotations, scales);
    // Frame keys plus one boundary key is the densest supported layout.
    if track.max_key_count() > frame_count as usize + 1 {
        eprintln!(
            "[assets] track '{}' in {} has {} keys for {} frames; extra keys are unreachable",
            track.bone,
            source_label,
            track.max_key_count(),
            frame_count
        );
    }
    Ok(track)
}

pub fn parse_animation_clip_bytes(bytes: &[u8], key_hint: &str, source_label: &str) -> Result<AnimationClip> {
    let file: ClipFile = serde_json::from_slice(bytes)
        .with_context(|| format!("Failed to parse animation clip JSON from {}", source_label))?;
    if file.version == 0 {
        return Err(anyhow!("Animation clip version must be >= 1"));
    }
    if file.frame_rate == 0 {
        return Err(anyhow!("Animation clip frame_rate must be >= 1"));
    }
    if file.skeleton.is_empty() {
        return Err(anyhow!("Animation clip must name a skeleton"));
    }
    let mut tracks = Vec::with_capacity(file.tracks.len());
    let mut seen_bones: HashSet<String> = HashSet::with_capacity(file.tracks.len());
    for raw in file.tracks {
        if !seen_bones.insert(raw.bone.clone()) {
            eprintln!(
                "[assets] clip {} has duplicate track for bone '{}'; the later track wins",
                source_label, raw.bone
            );
        }
        tracks.push(build_bone_track(raw, file.frame_count, source_label)?);
    }
    let mut notifies = Vec::with_capacity(file.notifies.len());
    for raw in file.notifies {
        if !raw.time.is_finite() || raw.time < 0.0 {
            return Err(anyhow!("Notify '{}' has an invalid time", raw.name));
        }
        notifies.push(ClipNotify { time: raw.time, name: Arc::from(raw.name.as_str()) });
    }
    let name: Arc<str> = Arc::from(file.name.as_deref().unwrap_or(key_hint));
    let skeleton: Arc<str> = Arc::from(file.skeleton.as_str());
    let clip = match file.play_length {
        Some(length) if length.is_finite() && length >= 0.0 => AnimationClip::with_play_length(
            name,
            skeleton,
            file.frame_rate,
            file.frame_count,
            length,
            tracks,
        ),
        Some(_) => return Err(anyhow!("Animation clip play_length must be finite and >= 0")),
        None => AnimationClip::new(name, skeleton, file.frame_rate, file.frame_count, tracks),
    };
    Ok(clip.with_notifies(notifies))
}

pub fn parse_skeleton_bytes(bytes: &[u8], key_hint: &str, source_label: &str) -> Result<Skeleton> {
    let file: SkeletonFile = serde_json::from_slice(bytes)
        .with_context(|| format!("Failed to parse skeleton JSON from {}", source_label))?;
    if file.version == 0 {
        return Err(anyhow!("Skeleton version must be >= 1"));
    }
    if file.joints.is_empty() {
        return Err(anyhow!("Skeleton must contain at least one joint"));
    }
    let joint_count = file.joints.len() as u32;
    let mut joints = Vec::with_capacity(file.joints.len());
    for (index, raw) in file.joints.into_iter().enumerate() {
        if let Some(parent) = raw.parent {
            if parent >= joint_count || parent as usize == index {
                return Err(anyhow!("Joint '{}' has an invalid parent index {}", raw.name, parent));
            }
        }
        let translation = Vec3::from(raw.translation);
        let scale = Vec3::from(raw.scale);
        let rotation = Quat::from(raw.rotation);
        if !translation.is_finite() || !scale.is_finite() || !rotation.is_finite() {
            return Err(anyhow!("Joint '{}' has non-finite rest transform values", raw.name));
        }
        let rotation = if rotation.length_squared() > f32::EPSILON {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        joints.push(SkeletonJoint {
            name: Arc::from(raw.name.as_str()),
            parent: raw.parent,
            rest_translation: translation,
            rest_rotation: rotation,
            rest_scale: scale,
        });
    }
    let name: Arc<str> = Arc::from(file.name.as_deref().unwrap_or(key_hint));
    Ok(Skeleton::new(name, joints))
}
