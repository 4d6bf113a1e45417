use glam::Vec2;
use std::sync::Arc;

pub mod data;
pub mod triangulation;

mod space1d;
mod space2d;

pub use space1d::BlendSpace1D;
pub use space2d::BlendSpace2D;

/// One entry in a blend space: a clip key pinned to a parameter-space
/// position. `clip` may be `None` while an author is still placing samples;
/// such entries keep their index but never contribute to a blend.
#[derive(Clone, Debug)]
pub struct BlendSample<P> {
    pub clip: Option<Arc<str>>,
    pub position: P,
}

pub type BlendSample1d = BlendSample<f32>;
pub type BlendSample2d = BlendSample<Vec2>;

/// Drops every triangle touching `removed` and renumbers the survivors so
/// they index the compacted sample list. Shared by both removal paths so
/// manual and auto triangulations stay consistent.
pub(crate) fn prune_triangles_for_removed_sample(triangles: &mut Vec<[usize; 3]>, removed: usize) {
    triangles.retain(|triangle| !triangle.contains(&removed));
    for triangle in triangles.iter_mut() {
        for corner in triangle.iter_mut() {
            if *corner > removed {
                *corner -= 1;
            }
        }
    }
}

/// Steps a play head by `step` seconds. Looping wraps into `[0, length)`,
/// one-shot playback clamps, and an unknown length leaves the head free.
pub(crate) fn advance_play_time(current: f32, step: f32, looping: bool, length: Option<f32>) -> f32 {
    let advanced = current + step;
    match length {
        Some(len) if looping => advanced.rem_euclid(len.max(f32::EPSILON)),
        Some(len) => advanced.clamp(0.0, len.max(0.0)),
        None => advanced,
    }
}
