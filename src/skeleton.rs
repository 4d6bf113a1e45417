use crate::pose::{JointTransform, Pose};
use glam::{Quat, Vec3};
use std::sync::Arc;

#[derive(Clone)]
pub struct SkeletonJoint {
    pub name: Arc<str>,
    pub parent: Option<u32>,
    pub rest_translation: Vec3,
    pub rest_rotation: Quat,
    pub rest_scale: Vec3,
}

impl SkeletonJoint {
    pub fn rest_transform(&self) -> JointTransform {
        JointTransform {
            translation: self.rest_translation,
            rotation: self.rest_rotation,
            scale: self.rest_scale,
        }
    }
}

/// Ordered joint array. Joint index is the identity that poses and bone
/// tracks are aligned against.
#[derive(Clone)]
pub struct Skeleton {
    pub name: Arc<str>,
    pub joints: Arc<[SkeletonJoint]>,
    pub roots: Arc<[u32]>,
}

impl Skeleton {
    pub fn new(name: Arc<str>, joints: Vec<SkeletonJoint>) -> Self {
        let mut roots: Vec<u32> = joints
            .iter()
            .enumerate()
            .filter(|(_, joint)| joint.parent.is_none())
            .map(|(index, _)| index as u32)
            .collect();
        roots.sort_unstable();
        roots.dedup();
        Self {
            name,
            joints: Arc::from(joints.into_boxed_slice()),
            roots: Arc::from(roots.into_boxed_slice()),
        }
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|joint| joint.name.as_ref() == name)
    }

    /// Writes the rest transforms into `out`, resizing it to the joint count.
    pub fn write_rest_pose(&self, out: &mut Pose) {
        out.resize(self.joints.len());
        for (index, joint) in self.joints.iter().enumerate() {
            out.joints_mut()[index] = joint.rest_transform();
        }
    }

    pub fn rest_pose(&self) -> Pose {
        let mut pose = Pose::default();
        self.write_rest_pose(&mut pose);
        pose
    }
}
