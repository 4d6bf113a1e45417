use crate::assets::{parse_animation_clip_bytes, parse_skeleton_bytes};
use crate::blendspace::data::{BlendSpace1dData, BlendSpace2dData};
use crate::clip::AnimationClip;
use crate::skeleton::Skeleton;
use glam::Vec2;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendValidationSeverity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for BlendValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendValidationSeverity::Info => write!(f, "info"),
            BlendValidationSeverity::Warning => write!(f, "warning"),
            BlendValidationSeverity::Error => write!(f, "error"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlendValidationEvent {
    pub severity: BlendValidationSeverity,
    pub path: PathBuf,
    pub message: String,
}

/// Document family a JSON asset belongs to, judged by its fields (with the
/// parent directory name as a tie-breaker for sparse documents).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonAssetKind {
    Clip,
    Skeleton,
    Blend1d,
    Blend2d,
    Unknown,
}

pub struct BlendValidator;

impl BlendValidator {
    /// Validate the asset at `path` and return any validation events.
    pub fn validate_path(path: &Path) -> Vec<BlendValidationEvent> {
        if !path.exists() {
            return vec![Self::event(
                path,
                BlendValidationSeverity::Warning,
                "File not found (it may have been removed).",
            )];
        }
        let ext = path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase());
        if ext.as_deref() != Some("json") {
            return vec![Self::event(
                path,
                BlendValidationSeverity::Info,
                "No validators available for this file type.",
            )];
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return vec![Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Failed to read JSON: {err}"),
                )];
            }
        };
        let value = match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(err) => {
                return vec![Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Malformed JSON: {err}"),
                )];
            }
        };
        match Self::classify_document(path, &value) {
            JsonAssetKind::Clip => Self::validate_clip_bytes(path, &bytes),
            JsonAssetKind::Skeleton => Self::validate_skeleton_bytes(path, &bytes),
            JsonAssetKind::Blend1d => Self::validate_blend1d_bytes(path, &bytes),
            JsonAssetKind::Blend2d => Self::validate_blend2d_bytes(path, &bytes),
            JsonAssetKind::Unknown => vec![Self::event(
                path,
                BlendValidationSeverity::Info,
                "No validators available for this JSON file.",
            )],
        }
    }

    fn validate_clip_bytes(path: &Path, bytes: &[u8]) -> Vec<BlendValidationEvent> {
        let key_hint = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("animation_clip");
        let source_label = path.display().to_string();
        match parse_animation_clip_bytes(bytes, key_hint, &source_label) {
            Ok(clip) => Self::clip_success_events(path, &clip),
            Err(err) => {
                vec![Self::event(path, BlendValidationSeverity::Error, format!("{err:#}"))]
            }
        }
    }

    fn clip_success_events(path: &Path, clip: &AnimationClip) -> Vec<BlendValidationEvent> {
        let mut events = Vec::new();
        if clip.tracks().is_empty() {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                format!("Clip '{}' does not define any tracks.", clip.name),
            ));
        }
        if clip.frame_count == 0 {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Clip has zero frames; playback will hold the first key.",
            ));
        }
        if clip.play_length <= 0.0 {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Clip play length is zero.",
            ));
        }
        for track in clip.tracks() {
            if track.max_key_count() > clip.frame_count as usize + 1 {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!(
                        "Track '{}' has {} keys for {} frames; extra keys are unreachable.",
                        track.bone,
                        track.max_key_count(),
                        clip.frame_count
                    ),
                ));
            }
        }
        for notify in clip.notifies.iter() {
            if notify.time > clip.play_length {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!(
                        "Notify '{}' at {:.3}s lies past the end of the clip ({:.3}s).",
                        notify.name, notify.time, clip.play_length
                    ),
                ));
            }
        }
        events.push(Self::event(
            path,
            BlendValidationSeverity::Info,
            format!(
                "Clip '{}' OK: {} tracks, {} frames at {} fps, length {:.3}s",
                clip.name,
                clip.track_count(),
                clip.frame_count,
                clip.frame_rate,
                clip.play_length
            ),
        ));
        events
    }

    fn validate_skeleton_bytes(path: &Path, bytes: &[u8]) -> Vec<BlendValidationEvent> {
        let key_hint = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("skeleton");
        let source_label = path.display().to_string();
        match parse_skeleton_bytes(bytes, key_hint, &source_label) {
            Ok(skeleton) => Self::skeleton_success_events(path, &skeleton),
            Err(err) => {
                vec![Self::event(path, BlendValidationSeverity::Error, format!("{err:#}"))]
            }
        }
    }

    fn skeleton_success_events(path: &Path, skeleton: &Skeleton) -> Vec<BlendValidationEvent> {
        let mut events = Vec::new();
        for (index, joint) in skeleton.joints.iter().enumerate() {
            let first = skeleton
                .joints
                .iter()
                .position(|other| other.name == joint.name)
                .unwrap_or(index);
            if first < index {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!(
                        "Joints {} and {} share the name '{}'; clip tracks bind to the first.",
                        first, index, joint.name
                    ),
                ));
            }
        }
        events.push(Self::event(
            path,
            BlendValidationSeverity::Info,
            format!(
                "Skeleton '{}' OK: {} joints, {} roots",
                skeleton.name,
                skeleton.joint_count(),
                skeleton.roots.len()
            ),
        ));
        events
    }

    fn validate_blend1d_bytes(path: &Path, bytes: &[u8]) -> Vec<BlendValidationEvent> {
        let data = match serde_json::from_slice::<BlendSpace1dData>(bytes) {
            Ok(data) => data,
            Err(err) => {
                return vec![Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Failed to parse blend space: {err}"),
                )];
            }
        };
        if let Err(err) = data.validate() {
            return vec![Self::event(path, BlendValidationSeverity::Error, format!("{err:#}"))];
        }
        let mut events = Vec::new();
        if data.max_parameter < data.min_parameter {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "max_parameter is below min_parameter; the range collapses on load.",
            ));
        } else if data.max_parameter == data.min_parameter {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Parameter range has zero width.",
            ));
        }
        for (index, sample) in data.samples.iter().enumerate() {
            if sample.clip.is_none() {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!("Sample {} has no animation assigned.", index),
                ));
            }
        }
        for (index, sample) in data.samples.iter().enumerate() {
            let first = data
                .samples
                .iter()
                .position(|other| other.position == sample.position)
                .unwrap_or(index);
            if first < index {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!(
                        "Samples {} and {} share position {:.3}.",
                        first, index, sample.position
                    ),
                ));
            }
        }
        let name = Self::display_name(path, data.name.as_deref());
        events.push(Self::event(
            path,
            BlendValidationSeverity::Info,
            format!(
                "Blend space '{}' OK: {} samples covering [{:.3}, {:.3}]",
                name,
                data.samples.len(),
                data.min_parameter,
                data.max_parameter.max(data.min_parameter)
            ),
        ));
        events
    }

    fn validate_blend2d_bytes(path: &Path, bytes: &[u8]) -> Vec<BlendValidationEvent> {
        let data = match serde_json::from_slice::<BlendSpace2dData>(bytes) {
            Ok(data) => data,
            Err(err) => {
                return vec![Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Failed to parse blend space: {err}"),
                )];
            }
        };
        if let Err(err) = data.validate() {
            return vec![Self::event(path, BlendValidationSeverity::Error, format!("{err:#}"))];
        }
        let mut events = Vec::new();
        for (index, sample) in data.samples.iter().enumerate() {
            if sample.clip.is_none() {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!("Sample {} has no animation assigned.", index),
                ));
            }
        }
        let sample_count = data.samples.len();
        for (index, triangle) in data.triangles.iter().enumerate() {
            if triangle.a < 0 || triangle.b < 0 || triangle.c < 0 {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Warning,
                    format!("Triangle {} has unset corners and will be dropped on load.", index),
                ));
                continue;
            }
            let (a, b, c) = (triangle.a as usize, triangle.b as usize, triangle.c as usize);
            if a >= sample_count || b >= sample_count || c >= sample_count {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Triangle {} references samples outside the list.", index),
                ));
            } else if a == b || b == c || a == c {
                events.push(Self::event(
                    path,
                    BlendValidationSeverity::Error,
                    format!("Triangle {} repeats a corner.", index),
                ));
            }
        }
        let animated: Vec<Vec2> = data
            .samples
            .iter()
            .filter(|sample| sample.clip.is_some())
            .map(|sample| Vec2::new(sample.position.x, sample.position.y))
            .collect();
        if animated.len() < 3 {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Fewer than three animated samples; evaluation always falls back to the nearest sample.",
            ));
        } else if points_are_collinear(&animated) {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Animated samples are collinear; no triangles can be built.",
            ));
        }
        if !data.auto_triangulate && data.triangles.is_empty() {
            events.push(Self::event(
                path,
                BlendValidationSeverity::Warning,
                "Manual triangulation with no triangles; evaluation always falls back to the nearest sample.",
            ));
        }
        let name = Self::display_name(path, data.name.as_deref());
        let mode = if data.auto_triangulate { "auto" } else { "manual" };
        events.push(Self::event(
            path,
            BlendValidationSeverity::Info,
            format!(
                "Blend space '{}' OK: {} samples, {} triangles ({} mode)",
                name,
                data.samples.len(),
                data.triangles.len(),
                mode
            ),
        ));
        events
    }

    fn display_name(path: &Path, name: Option<&str>) -> String {
        match name {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("blend_space")
                .to_string(),
        }
    }

    /// Classifies an already parsed JSON document without validating it.
    pub fn classify_document(path: &Path, value: &Value) -> JsonAssetKind {
        if path_contains_segment(path, "clips") {
            return JsonAssetKind::Clip;
        }
        if path_contains_segment(path, "skeletons") {
            return JsonAssetKind::Skeleton;
        }
        let Value::Object(map) = value else {
            return JsonAssetKind::Unknown;
        };
        if map.contains_key("joints") {
            return JsonAssetKind::Skeleton;
        }
        if map.get("tracks").map(|tracks| tracks.is_array()).unwrap_or(false)
            || map.contains_key("frame_rate")
        {
            return JsonAssetKind::Clip;
        }
        if let Some(samples) = map.get("samples") {
            let two_dimensional = map.contains_key("triangles")
                || map.contains_key("auto_triangulate")
                || samples
                    .as_array()
                    .and_then(|list| list.first())
                    .map(|sample| sample.get("position").map(|p| p.is_object()).unwrap_or(false))
                    .unwrap_or(false);
            return if two_dimensional { JsonAssetKind::Blend2d } else { JsonAssetKind::Blend1d };
        }
        JsonAssetKind::Unknown
    }

    fn event(
        path: &Path,
        severity: BlendValidationSeverity,
        message: impl Into<String>,
    ) -> BlendValidationEvent {
        BlendValidationEvent { severity, path: path.to_path_buf(), message: message.into() }
    }
}

fn path_contains_segment(path: &Path, needle: &str) -> bool {
    let needle = needle.to_ascii_lowercase();
    path.iter().any(|component| component.to_string_lossy().eq_ignore_ascii_case(&needle))
}

fn points_are_collinear(points: &[Vec2]) -> bool {
    let Some((&first, rest)) = points.split_first() else {
        return true;
    };
    let Some(second) = rest.iter().find(|&&p| p.distance_squared(first) > f32::EPSILON) else {
        return true;
    };
    let axis = *second - first;
    points.iter().all(|&p| axis.perp_dot(p - first).abs() < 1.0e-4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_display_formats() {
        assert_eq!(BlendValidationSeverity::Info.to_string(), "info");
        assert_eq!(BlendValidationSeverity::Warning.to_string(), "warning");
        assert_eq!(BlendValidationSeverity::Error.to_string(), "error");
    }

    #[test]
    fn validator_reports_missing_file() {
        let events = BlendValidator::validate_path(Path::new("foo/bar.json"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, BlendValidationSeverity::Warning);
        assert!(events[0].message.contains("not found"));
    }

    #[test]
    fn validator_succeeds_on_fixture_clip() {
        let path = Path::new("fixtures/clips/idle.json");
        let events = BlendValidator::validate_path(path);
        assert!(!events.is_empty());
        assert!(events
            .iter()
            .any(|event| event.severity == BlendValidationSeverity::Info
                && event.message.contains("OK")));
    }

    #[test]
    fn validator_classifies_fixture_blend_space() {
        let path = Path::new("fixtures/blend/strafe_2d.json");
        let events = BlendValidator::validate_path(path);
        assert!(events
            .iter()
            .any(|event| event.severity == BlendValidationSeverity::Info
                && event.message.contains("Blend space")));
    }

    #[test]
    fn classifier_separates_document_kinds() {
        use serde_json::json;
        let path = Path::new("docs/asset.json");
        let skeleton = json!({ "joints": [] });
        assert_eq!(BlendValidator::classify_document(path, &skeleton), JsonAssetKind::Skeleton);
        let clip = json!({ "frame_rate": 30, "tracks": [] });
        assert_eq!(BlendValidator::classify_document(path, &clip), JsonAssetKind::Clip);
        let blend1d = json!({ "samples": [ { "clip": "walk", "position": 0.5 } ] });
        assert_eq!(BlendValidator::classify_document(path, &blend1d), JsonAssetKind::Blend1d);
        let blend2d = json!({ "samples": [], "auto_triangulate": true });
        assert_eq!(BlendValidator::classify_document(path, &blend2d), JsonAssetKind::Blend2d);
        let sparse = json!({});
        assert_eq!(
            BlendValidator::classify_document(Path::new("fixtures/clips/walk.json"), &sparse),
            JsonAssetKind::Clip,
            "directory name backs up sparse documents"
        );
        assert_eq!(
            BlendValidator::classify_document(path, &json!({ "stuff": 1 })),
            JsonAssetKind::Unknown
        );
    }
}
