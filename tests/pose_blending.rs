use glam::{Quat, Vec3};
use plumage::pose::{blend_transforms, blend_transforms_barycentric, JointTransform, Pose};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

fn transform_at(x: f32) -> JointTransform {
    JointTransform { translation: Vec3::new(x, 0.0, 0.0), ..JointTransform::IDENTITY }
}

fn pose_at(xs: &[f32]) -> Pose {
    let mut pose = Pose::with_joint_count(xs.len());
    for (joint, &x) in pose.joints_mut().iter_mut().zip(xs) {
        joint.translation.x = x;
    }
    pose
}

#[test]
fn two_way_blend_lerps_translation_and_scale() {
    let a = JointTransform::IDENTITY;
    let b = JointTransform {
        translation: Vec3::new(2.0, 0.0, 0.0),
        rotation: Quat::IDENTITY,
        scale: Vec3::splat(3.0),
    };
    let blended = blend_transforms(&a, &b, 0.25);
    assert!((blended.translation.x - 0.5).abs() < 1.0e-6);
    assert!((blended.scale.x - 1.5).abs() < 1.0e-6);
}

#[test]
fn two_way_blend_slerps_rotation() {
    let a = JointTransform::IDENTITY;
    let b = JointTransform { rotation: Quat::from_rotation_z(FRAC_PI_2), ..JointTransform::IDENTITY };
    let blended = blend_transforms(&a, &b, 0.5);
    assert!(blended.rotation.angle_between(Quat::from_rotation_z(FRAC_PI_4)) < 1.0e-4);
}

#[test]
fn barycentric_corner_weights_recover_inputs() {
    let a = transform_at(1.0);
    let b = transform_at(3.0);
    let c = transform_at(5.0);
    let at_a = blend_transforms_barycentric(&a, &b, &c, 1.0, 0.0, 0.0);
    assert!((at_a.translation.x - 1.0).abs() < 1.0e-5);
    let at_b = blend_transforms_barycentric(&a, &b, &c, 0.0, 1.0, 0.0);
    assert!((at_b.translation.x - 3.0).abs() < 1.0e-5);
    let at_c = blend_transforms_barycentric(&a, &b, &c, 0.0, 0.0, 1.0);
    assert!((at_c.translation.x - 5.0).abs() < 1.0e-5);
}

#[test]
fn barycentric_translation_is_weighted_sum() {
    let a = transform_at(1.0);
    let b = transform_at(3.0);
    let c = transform_at(5.0);
    let blended = blend_transforms_barycentric(&a, &b, &c, 0.25, 0.25, 0.5);
    assert!((blended.translation.x - 3.5).abs() < 1.0e-5);
}

#[test]
fn barycentric_rotation_stays_normalized() {
    let a = JointTransform { rotation: Quat::from_rotation_z(0.3), ..JointTransform::IDENTITY };
    let b = JointTransform { rotation: Quat::from_rotation_x(1.2), ..JointTransform::IDENTITY };
    let c = JointTransform { rotation: Quat::from_rotation_y(-0.7), ..JointTransform::IDENTITY };
    let third = 1.0 / 3.0;
    let blended = blend_transforms_barycentric(&a, &b, &c, third, third, third);
    assert!((blended.rotation.length() - 1.0).abs() < 1.0e-4);
}

#[test]
fn barycentric_corner_rotations_pass_through() {
    let a = JointTransform { rotation: Quat::from_rotation_z(0.4), ..JointTransform::IDENTITY };
    let b = JointTransform { rotation: Quat::from_rotation_z(1.0), ..JointTransform::IDENTITY };
    let c = JointTransform { rotation: Quat::from_rotation_z(-1.3), ..JointTransform::IDENTITY };
    let at_c = blend_transforms_barycentric(&a, &b, &c, 0.0, 0.0, 1.0);
    assert!(at_c.rotation.angle_between(c.rotation) < 1.0e-4);
    let at_b = blend_transforms_barycentric(&a, &b, &c, 0.0, 1.0, 0.0);
    assert!(at_b.rotation.angle_between(b.rotation) < 1.0e-4);
}

#[test]
fn pose_blend_endpoints_match_inputs() {
    let a = pose_at(&[1.0, 2.0]);
    let b = pose_at(&[5.0, 6.0]);
    let mut out = Pose::default();
    out.blend_from(&a, &b, 0.0);
    assert!((out.joint(0).unwrap().translation.x - 1.0).abs() < 1.0e-6);
    out.blend_from(&a, &b, 1.0);
    assert!((out.joint(1).unwrap().translation.x - 6.0).abs() < 1.0e-6);
}

#[test]
fn pose_blend_resizes_to_shorter_input() {
    let a = pose_at(&[1.0, 2.0, 3.0]);
    let b = pose_at(&[5.0, 6.0]);
    let mut out = Pose::with_joint_count(7);
    out.blend_from(&a, &b, 0.5);
    assert_eq!(out.len(), 2);
    assert!((out.joint(0).unwrap().translation.x - 3.0).abs() < 1.0e-6);
}

#[test]
fn pose_barycentric_blend_covers_three_inputs() {
    let a = pose_at(&[0.0]);
    let b = pose_at(&[3.0]);
    let c = pose_at(&[6.0]);
    let mut out = Pose::default();
    out.blend_barycentric(&a, &b, &c, 0.5, 0.25, 0.25);
    assert_eq!(out.len(), 1);
    assert!((out.joint(0).unwrap().translation.x - 2.25).abs() < 1.0e-5);
}

#[test]
fn identity_transform_is_neutral() {
    let identity = JointTransform::default();
    assert!((identity.translation - Vec3::ZERO).length() < 1.0e-6);
    assert!((identity.scale - Vec3::ONE).length() < 1.0e-6);
    assert!(identity.rotation.angle_between(Quat::IDENTITY) < 1.0e-6);
    assert!(identity.is_finite());
}
