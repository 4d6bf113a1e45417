use crate::assets::AnimationLibrary;
use crate::blendspace::triangulation::{delaunay, triangle_contains};
use crate::blendspace::{advance_play_time, prune_triangles_for_removed_sample, BlendSample2d};
use crate::clip::AnimationClip;
use crate::player::PoseSource;
use crate::pose::Pose;
use crate::skeleton::Skeleton;
use glam::Vec2;
use std::sync::Arc;

struct Corner {
    sample: usize,
    clip: Arc<AnimationClip>,
    skeleton: Arc<Skeleton>,
}

struct TriangleHit {
    corners: [Corner; 3],
    weights: (f32, f32, f32),
}

/// Blends clips across a 2D parameter plane (strafe direction, aim yaw and
/// pitch). Sample indices are stable: samples append at the end and removal
/// renumbers the triangle list instead of the samples.
///
/// Triangles come from either automatic Delaunay triangulation or manual
/// authoring. Any triangle edit switches the space to manual mode; only a
/// `triangulate()` call returns it to automatic.
pub struct BlendSpace2D {
    samples: Vec<BlendSample2d>,
    triangles: Vec<[usize; 3]>,
    min_parameter: Vec2,
    max_parameter: Vec2,
    parameter: Vec2,
    play_rate: f32,
    looping: bool,
    current_play_time: f32,
    previous_play_time: f32,
    dominant: Option<usize>,
    auto_triangulate: bool,
    triangulation_dirty: bool,
    scratch_a: Pose,
    scratch_b: Pose,
    scratch_c: Pose,
}

impl BlendSpace2D {
    pub fn new(min_parameter: Vec2, max_parameter: Vec2) -> Self {
        let mut space = Self {
            samples: Vec::new(),
            triangles: Vec::new(),
            min_parameter: Vec2::ZERO,
            max_parameter: Vec2::ZERO,
            parameter: Vec2::ZERO,
            play_rate: 1.0,
            looping: true,
            current_play_time: 0.0,
            previous_play_time: 0.0,
            dominant: None,
            auto_triangulate: true,
            triangulation_dirty: false,
            scratch_a: Pose::default(),
            scratch_b: Pose::default(),
            scratch_c: Pose::default(),
        };
        space.set_parameter_range(min_parameter, max_parameter);
        space.parameter = space.min_parameter;
        space
    }

    fn mark_samples_mutated(&mut self) {
        self.dominant = None;
        if self.auto_triangulate {
            self.triangulation_dirty = true;
        }
    }

    /// Appends a sample and returns its index. Indices are stable until a
    /// removal compacts the list.
    pub fn add_sample(&mut self, clip: Option<&str>, position: Vec2) -> usize {
        self.samples.push(BlendSample2d { clip: clip.map(Arc::from), position });
        self.mark_samples_mutated();
        self.samples.len() - 1
    }

    /// Removes the sample and rewrites the triangle list: triangles touching
    /// it are dropped and higher indices shift down by one. Applies in manual
    /// mode too, so authored triangles stay valid.
    pub fn remove_sample(&mut self, index: usize) -> bool {
        if index >= self.samples.len() {
            return false;
        }
        self.samples.remove(index);
        prune_triangles_for_removed_sample(&mut self.triangles, index);
        self.mark_samples_mutated();
        true
    }

    pub fn set_sample_position(&mut self, index: usize, position: Vec2) -> bool {
        let Some(sample) = self.samples.get_mut(index) else {
            return false;
        };
        sample.position = position;
        self.mark_samples_mutated();
        true
    }

    pub fn set_sample_animation(&mut self, index: usize, clip: Option<&str>) -> bool {
        let Some(sample) = self.samples.get_mut(index) else {
            return false;
        };
        sample.clip = clip.map(Arc::from);
        // Clip presence decides which samples triangulate, so this is a
        // geometry change as far as auto mode is concerned.
        self.mark_samples_mutated();
        true
    }

    pub fn samples(&self) -> &[BlendSample2d] {
        &self.samples
    }

    pub fn sample(&self, index: usize) -> Option<&BlendSample2d> {
        self.samples.get(index)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Adds a manually authored triangle and switches to manual mode. Rejects
    /// out-of-range or repeated corner indices.
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) -> bool {
        let count = self.samples.len();
        if a >= count || b >= count || c >= count {
            return false;
        }
        if a == b || b == c || a == c {
            return false;
        }
        self.auto_triangulate = false;
        self.dominant = None;
        self.triangles.push([a, b, c]);
        true
    }

    pub fn remove_triangle(&mut self, index: usize) -> bool {
        if index >= self.triangles.len() {
            return false;
        }
        self.auto_triangulate = false;
        self.dominant = None;
        self.triangles.remove(index);
        true
    }

    pub fn clear_triangles(&mut self) {
        self.auto_triangulate = false;
        self.dominant = None;
        self.triangles.clear();
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Rebuilds the triangle list from every sample that carries a clip and
    /// returns the space to automatic mode. This is the only call that clears
    /// the dirty flag.
    pub fn triangulate(&mut self) {
        let points: Vec<(usize, Vec2)> = self
            .samples
            .iter()
            .enumerate()
            .filter(|(_, sample)| sample.clip.is_some())
            .map(|(index, sample)| (index, sample.position))
            .collect();
        self.triangles = delaunay(&points);
        self.auto_triangulate = true;
        self.triangulation_dirty = false;
    }

    pub fn auto_triangulate(&self) -> bool {
        self.auto_triangulate
    }

    pub fn triangulation_dirty(&self) -> bool {
        self.triangulation_dirty
    }

    pub fn set_parameter_range(&mut self, min: Vec2, max: Vec2) {
        self.min_parameter = min;
        self.max_parameter = max.max(min);
        self.parameter = self.parameter.clamp(self.min_parameter, self.max_parameter);
    }

    pub fn min_parameter(&self) -> Vec2 {
        self.min_parameter
    }

    pub fn max_parameter(&self) -> Vec2 {
        self.max_parameter
    }

    pub fn set_parameter(&mut self, parameter: Vec2) {
        self.parameter = parameter.clamp(self.min_parameter, self.max_parameter);
    }

    pub fn parameter(&self) -> Vec2 {
        self.parameter
    }

    pub fn set_play_rate(&mut self, rate: f32) {
        self.play_rate = rate;
    }

    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_play_time(&mut self, time: f32) {
        self.current_play_time = time;
        self.previous_play_time = time;
    }

    pub fn dominant_sample(&self) -> Option<usize> {
        self.dominant
    }

    pub fn update(&mut self, parameter: Vec2, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        self.set_parameter(parameter);
        self.advance(dt, library, out);
    }

    fn advance_time(&mut self, dt: f32, length: Option<f32>) {
        self.previous_play_time = self.current_play_time;
        self.current_play_time =
            advance_play_time(self.current_play_time, dt * self.play_rate, self.looping, length);
    }

    /// Outside the triangulated hull, or when no triangle is usable, playback
    /// snaps to the closest sample and plays it unblended.
    fn advance_nearest(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose, point: Vec2) {
        let mut nearest: Option<(f32, usize, Arc<AnimationClip>, Arc<Skeleton>)> = None;
        for (index, sample) in self.samples.iter().enumerate() {
            let Some(key) = sample.clip.as_deref() else {
                continue;
            };
            let Some((clip, skeleton)) = library.resolve_clip(key) else {
                continue;
            };
            let distance = sample.position.distance_squared(point);
            let closer = match &nearest {
                Some((best, _, _, _)) => distance < *best,
                None => true,
            };
            if closer {
                nearest = Some((distance, index, clip, skeleton));
            }
        }
        match nearest {
            Some((_, index, clip, skeleton)) => {
                self.dominant = Some(index);
                self.advance_time(dt, Some(clip.play_length));
                clip.sample_pose(&skeleton, self.current_play_time, true, out);
            }
            None => {
                self.dominant = None;
                self.advance_time(dt, None);
            }
        }
    }
}

impl PoseSource for BlendSpace2D {
    /// Steps the shared play head and writes the blended pose into `out`.
    ///
    /// A stale automatic triangulation is rebuilt first. The parameter point
    /// is matched against the triangle list; a containing triangle with three
    /// resolvable corners produces a barycentric three-way blend, anything
    /// else falls back to the nearest usable sample.
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        if self.auto_triangulate && self.triangulation_dirty {
            self.triangulate();
        }
        let point = self.parameter;
        let mut hit: Option<TriangleHit> = None;
        for triangle in &self.triangles {
            let (Some(a), Some(b), Some(c)) = (
                self.samples.get(triangle[0]),
                self.samples.get(triangle[1]),
                self.samples.get(triangle[2]),
            ) else {
                continue;
            };
            let Some(weights) = triangle_contains(a.position, b.position, c.position, point) else {
                continue;
            };
            let resolved = (
                a.clip.as_deref().and_then(|key| library.resolve_clip(key)),
                b.clip.as_deref().and_then(|key| library.resolve_clip(key)),
                c.clip.as_deref().and_then(|key| library.resolve_clip(key)),
            );
            let (Some((clip_a, skel_a)), Some((clip_b, skel_b)), Some((clip_c, skel_c))) = resolved
            else {
                continue;
            };
            hit = Some(TriangleHit {
                corners: [
                    Corner { sample: triangle[0], clip: clip_a, skeleton: skel_a },
                    Corner { sample: triangle[1], clip: clip_b, skeleton: skel_b },
                    Corner { sample: triangle[2], clip: clip_c, skeleton: skel_c },
                ],
                weights,
            });
            break;
        }

        let Some(hit) = hit else {
            self.advance_nearest(dt, library, out, point);
            return;
        };

        let (u, v, w) = hit.weights;
        // Ties favor the earlier corner so the owner stays stable on edges.
        let dominant = if u >= v && u >= w {
            0
        } else if v >= w {
            1
        } else {
            2
        };
        self.dominant = Some(hit.corners[dominant].sample);
        self.advance_time(dt, Some(hit.corners[dominant].clip.play_length));

        let time = self.current_play_time;
        let [a, b, c] = &hit.corners;
        a.clip.sample_pose(&a.skeleton, time, true, &mut self.scratch_a);
        b.clip.sample_pose(&b.skeleton, time, true, &mut self.scratch_b);
        c.clip.sample_pose(&c.skeleton, time, true, &mut self.scratch_c);
        out.blend_barycentric(&self.scratch_a, &self.scratch_b, &self.scratch_c, u, v, w);
    }

    fn play_length(&self, library: &AnimationLibrary) -> Option<f32> {
        let index = self.dominant?;
        let key = self.samples.get(index)?.clip.as_deref()?;
        Some(library.clip(key)?.play_length)
    }

    fn dominant_clip(&self) -> Option<Arc<str>> {
        let index = self.dominant?;
        self.samples.get(index)?.clip.clone()
    }

    fn current_play_time(&self) -> f32 {
        self.current_play_time
    }

    fn previous_play_time(&self) -> f32 {
        self.previous_play_time
    }

    fn looping(&self) -> bool {
        self.looping
    }
}
