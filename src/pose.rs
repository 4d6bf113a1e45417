use glam::{Quat, Vec3};

/// Local-space transform of a single joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl JointTransform {
    pub const IDENTITY: Self =
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Two-way transform blend: translation and scale lerp, rotation slerps.
pub fn blend_transforms(a: &JointTransform, b: &JointTransform, alpha: f32) -> JointTransform {
    JointTransform {
        translation: a.translation.lerp(b.translation, alpha),
        rotation: a.rotation.slerp(b.rotation, alpha),
        scale: a.scale.lerp(b.scale, alpha),
    }
}

/// Three-way transform blend with barycentric weights `(u, v, w)`.
///
/// Rotation uses two sequential slerps: `a` toward `b` at `v / (u + v)`, then
/// toward `c` at `w`. The result is re-normalized so the output rotation stays
/// a unit quaternion under accumulated float error.
pub fn blend_transforms_barycentric(
    a: &JointTransform,
    b: &JointTransform,
    c: &JointTransform,
    u: f32,
    v: f32,
    w: f32,
) -> JointTransform {
    let translation = a.translation * u + b.translation * v + c.translation * w;
    let scale = a.scale * u + b.scale * v + c.scale * w;
    let ab_weight = if u + v <= f32::EPSILON { 0.0 } else { (v / (u + v)).clamp(0.0, 1.0) };
    let ab = a.rotation.slerp(b.rotation, ab_weight);
    let rotation = ab.slerp(c.rotation, w.clamp(0.0, 1.0)).normalize();
    JointTransform { translation, rotation, scale }
}

/// Array of per-joint local transforms, index-aligned with the owning
/// skeleton's joint order. Buffers are transient: every evaluation entry point
/// rewrites the destination in full, so instances can be reused freely.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    joints: Vec<JointTransform>,
}

impl Pose {
    pub fn with_joint_count(count: usize) -> Self {
        Self { joints: vec![JointTransform::IDENTITY; count] }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[JointTransform] {
        &self.joints
    }

    pub fn joints_mut(&mut self) -> &mut [JointTransform] {
        &mut self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&JointTransform> {
        self.joints.get(index)
    }

    /// Resizes to `count` joints; new slots start at identity.
    pub fn resize(&mut self, count: usize) {
        self.joints.resize(count, JointTransform::IDENTITY);
    }

    pub fn set_identity(&mut self) {
        for joint in &mut self.joints {
            *joint = JointTransform::IDENTITY;
        }
    }

    pub fn copy_from(&mut self, other: &Pose) {
        self.joints.clear();
        self.joints.extend_from_slice(&other.joints);
    }

    /// Two-way blend of `a` and `b` into `self`.
    ///
    /// The destination is resized to the shorter input; blending never indexes
    /// past either source.
    pub fn blend_from(&mut self, a: &Pose, b: &Pose, alpha: f32) {
        let count = a.joints.len().min(b.joints.len());
        self.joints.resize(count, JointTransform::IDENTITY);
        for index in 0..count {
            self.joints[index] = blend_transforms(&a.joints[index], &b.joints[index], alpha);
        }
    }

    /// Three-way barycentric blend of `a`, `b` and `c` into `self`.
    pub fn blend_barycentric(&mut self, a: &Pose, b: &Pose, c: &Pose, u: f32, v: f32, w: f32) {
        let count = a.joints.len().min(b.joints.len()).min(c.joints.len());
        self.joints.resize(count, JointTransform::IDENTITY);
        for index in 0..count {
            self.joints[index] = blend_transforms_barycentric(
                &a.joints[index],
                &b.joints[index],
                &c.joints[index],
                u,
                v,
                w,
            );
        }
    }
}
