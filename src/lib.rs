pub mod assets;
pub mod blendspace;
pub mod clip;
pub mod ecs;
pub mod events;
pub mod player;
pub mod pose;
pub mod skeleton;
pub mod validation;

pub use assets::AnimationLibrary;
pub use blendspace::{BlendSample, BlendSample1d, BlendSample2d, BlendSpace1D, BlendSpace2D};
pub use clip::{AnimationClip, BoneTrack, ClipNotify};
pub use player::{ClipPlayer, PoseSource};
pub use pose::{JointTransform, Pose};
pub use skeleton::{Skeleton, SkeletonJoint};
