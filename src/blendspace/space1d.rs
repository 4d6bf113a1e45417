use crate::assets::AnimationLibrary;
use crate::blendspace::{advance_play_time, BlendSample1d};
use crate::clip::AnimationClip;
use crate::player::PoseSource;
use crate::pose::Pose;
use crate::skeleton::Skeleton;
use smallvec::SmallVec;
use std::sync::Arc;

struct ResolvedSample1d {
    index: usize,
    position: f32,
    clip: Arc<AnimationClip>,
    skeleton: Arc<Skeleton>,
}

/// Blends clips along one scalar axis (speed, lean, aim pitch). Samples stay
/// sorted by position; evaluation brackets the parameter between the two
/// nearest samples and blends between their poses at a shared play time.
pub struct BlendSpace1D {
    samples: Vec<BlendSample1d>,
    min_parameter: f32,
    max_parameter: f32,
    parameter: f32,
    play_rate: f32,
    looping: bool,
    current_play_time: f32,
    previous_play_time: f32,
    dominant: Option<usize>,
    scratch_a: Pose,
    scratch_b: Pose,
}

impl BlendSpace1D {
    pub fn new(min_parameter: f32, max_parameter: f32) -> Self {
        let mut space = Self {
            samples: Vec::new(),
            min_parameter: 0.0,
            max_parameter: 0.0,
            parameter: 0.0,
            play_rate: 1.0,
            looping: true,
            current_play_time: 0.0,
            previous_play_time: 0.0,
            dominant: None,
            scratch_a: Pose::default(),
            scratch_b: Pose::default(),
        };
        space.set_parameter_range(min_parameter, max_parameter);
        space.parameter = space.min_parameter;
        space
    }

    /// Inserts a sample and re-sorts by position. Sorting is stable, so
    /// samples sharing a position keep their insertion order.
    pub fn add_sample(&mut self, clip: Option<&str>, position: f32) {
        self.samples.push(BlendSample1d { clip: clip.map(Arc::from), position });
        self.sort_samples();
        self.dominant = None;
    }

    pub fn remove_sample(&mut self, index: usize) -> bool {
        if index >= self.samples.len() {
            return false;
        }
        self.samples.remove(index);
        self.dominant = None;
        true
    }

    pub fn set_sample_position(&mut self, index: usize, position: f32) -> bool {
        let Some(sample) = self.samples.get_mut(index) else {
            return false;
        };
        sample.position = position;
        self.sort_samples();
        self.dominant = None;
        true
    }

    pub fn set_sample_animation(&mut self, index: usize, clip: Option<&str>) -> bool {
        let Some(sample) = self.samples.get_mut(index) else {
            return false;
        };
        sample.clip = clip.map(Arc::from);
        self.dominant = None;
        true
    }

    fn sort_samples(&mut self) {
        self.samples.sort_by(|a, b| a.position.total_cmp(&b.position));
    }

    pub fn samples(&self) -> &[BlendSample1d] {
        &self.samples
    }

    pub fn sample(&self, index: usize) -> Option<&BlendSample1d> {
        self.samples.get(index)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Sets the parameter range. A max below min collapses the range to the
    /// min; the current parameter re-clamps into the new range.
    pub fn set_parameter_range(&mut self, min: f32, max: f32) {
        self.min_parameter = min;
        self.max_parameter = max.max(min);
        self.parameter = self.parameter.clamp(self.min_parameter, self.max_parameter);
    }

    pub fn min_parameter(&self) -> f32 {
        self.min_parameter
    }

    pub fn max_parameter(&self) -> f32 {
        self.max_parameter
    }

    pub fn set_parameter(&mut self, parameter: f32) {
        self.parameter = parameter.clamp(self.min_parameter, self.max_parameter);
    }

    pub fn parameter(&self) -> f32 {
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

    /// Convenience wrapper: set the parameter, then advance and evaluate.
    pub fn update(&mut self, parameter: f32, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        self.set_parameter(parameter);
        self.advance(dt, library, out);
    }

    fn advance_time(&mut self, dt: f32, length: Option<f32>) {
        self.previous_play_time = self.current_play_time;
        self.current_play_time =
            advance_play_time(self.current_play_time, dt * self.play_rate, self.looping, length);
    }
}

impl PoseSource for BlendSpace1D {
    /// Steps the shared play head and writes the blended pose into `out`.
    /// Samples without a clip, or whose clip or skeleton is missing from the
    /// library, are skipped. With no usable sample the pose is left untouched.
    fn advance(&mut self, dt: f32, library: &AnimationLibrary, out: &mut Pose) {
        let mut usable: SmallVec<[ResolvedSample1d; 8]> = SmallVec::new();
        for (index, sample) in self.samples.iter().enumerate() {
            let Some(key) = sample.clip.as_deref() else {
                continue;
            };
            let Some((clip, skeleton)) = library.resolve_clip(key) else {
                continue;
            };
            usable.push(ResolvedSample1d { index, position: sample.position, clip, skeleton });
        }
        if usable.is_empty() {
            self.dominant = None;
            self.advance_time(dt, None);
            return;
        }

        let parameter = self.parameter;
        let first = &usable[0];
        let last = &usable[usable.len() - 1];
        let (lower, upper, alpha) = if parameter <= first.position {
            (0, 0, 0.0)
        } else if parameter >= last.position {
            (usable.len() - 1, usable.len() - 1, 0.0)
        } else {
            let mut found = (0, 0, 0.0);
            for window in 0..usable.len() - 1 {
                let a = &usable[window];
                let b = &usable[window + 1];
                if parameter >= a.position && parameter <= b.position {
                    let span = b.position - a.position;
                    let alpha = if span <= f32::EPSILON {
                        0.0
                    } else {
                        ((parameter - a.position) / span).clamp(0.0, 1.0)
                    };
                    found = (window, window + 1, alpha);
                    break;
                }
            }
            found
        };

        // Ties favor the lower sample so a 50/50 blend keeps a stable owner.
        let dominant = if alpha > 0.5 { upper } else { lower };
        self.dominant = Some(usable[dominant].index);
        self.advance_time(dt, Some(usable[dominant].clip.play_length));

        let time = self.current_play_time;
        if lower == upper || alpha <= f32::EPSILON {
            let sample = &usable[lower];
            sample.clip.sample_pose(&sample.skeleton, time, true, out);
        } else if alpha >= 1.0 - f32::EPSILON {
            let sample = &usable[upper];
            sample.clip.sample_pose(&sample.skeleton, time, true, out);
        } else {
            let a = &usable[lower];
            let b = &usable[upper];
            a.clip.sample_pose(&a.skeleton, time, true, &mut self.scratch_a);
            b.clip.sample_pose(&b.skeleton, time, true, &mut self.scratch_b);
            out.blend_from(&self.scratch_a, &self.scratch_b, alpha);
        }
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
