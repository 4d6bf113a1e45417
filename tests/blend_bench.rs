use glam::{Quat, Vec3};
use plumage::assets::AnimationLibrary;
use plumage::blendspace::BlendSpace1D;
use plumage::clip::{AnimationClip, BoneTrack};
use plumage::ecs::{AnimSource, AnimWorld};
use plumage::skeleton::{Skeleton, SkeletonJoint};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;

#[test]
#[ignore = "manual profiling harness"]
fn blend_bench_snapshot() {
    let count = std::env::var("BLEND_BENCH_COUNT")
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(10_000);
    let steps =
        std::env::var("BLEND_BENCH_STEPS").ok().and_then(|raw| raw.parse::<u32>().ok()).unwrap_or(240);
    let warmup =
        std::env::var("BLEND_BENCH_WARMUP").ok().and_then(|raw| raw.parse::<u32>().ok()).unwrap_or(16);
    let dt = std::env::var("BLEND_BENCH_DT")
        .ok()
        .and_then(|raw| raw.parse::<f32>().ok())
        .unwrap_or(1.0 / 60.0);

    let library = seed_bench_library();
    let mut world = AnimWorld::new();
    let players = world.spawn_profiling_rig(&library, "bench_walk", count / 2);
    let blended = seed_blend_animators(&mut world, &library, count - players);
    assert_eq!(players + blended, count);

    for _ in 0..warmup {
        world.update(dt, &library);
        world.drain_events();
    }

    let mut per_step = Vec::with_capacity(steps as usize);
    for _ in 0..steps {
        let start = Instant::now();
        world.update(dt, &library);
        per_step.push(start.elapsed().as_secs_f64() * 1_000.0);
        world.drain_events();
    }

    let metrics = world.metrics();
    assert_eq!(metrics.evaluated, count);

    println!("[blend_bench] animators={count} steps={steps} dt={:.6}", dt);
    println!(
        "[blend_bench] last frame: evaluated={} notifies={} finished={}",
        metrics.evaluated, metrics.notifies, metrics.finished
    );

    if !per_step.is_empty() {
        let step_count = per_step.len() as f64;
        let mean_step = per_step.iter().sum::<f64>() / step_count;
        let max_step =
            per_step.iter().copied().fold(0.0_f64, |acc, value| if value > acc { value } else { acc });
        let mut sorted = per_step.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let p95_index = ((sorted.len() as f64) * 0.95).floor() as usize;
        let p95_value = sorted[p95_index.min(sorted.len() - 1)];
        println!(
            "[blend_bench] per-step stats: mean={:.4} ms p95={:.4} ms max={:.4} ms",
            mean_step, p95_value, max_step
        );

        let mut per_step_with_index: Vec<(usize, f64)> = per_step.into_iter().enumerate().collect();
        per_step_with_index.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        println!("[blend_bench] top step costs:");
        for (index, value) in per_step_with_index.into_iter().take(6) {
            println!("[blend_bench]   step {:>4} -> {:>8.4} ms", index, value);
        }
    }
}

fn seed_bench_library() -> AnimationLibrary {
    let joint_count = 16;
    let mut joints = Vec::with_capacity(joint_count);
    for index in 0..joint_count {
        joints.push(SkeletonJoint {
            name: Arc::from(format!("bone_{index}").as_str()),
            parent: if index == 0 { None } else { Some(index as u32 - 1) },
            rest_translation: Vec3::new(0.0, 0.4, 0.0),
            rest_rotation: Quat::IDENTITY,
            rest_scale: Vec3::ONE,
        });
    }
    let skeleton = Skeleton::new(Arc::from("bench_rig"), joints);

    let mut library = AnimationLibrary::new();
    library.insert_clip("bench_walk", bench_clip("bench_walk", joint_count, 0.1));
    library.insert_clip("bench_run", bench_clip("bench_run", joint_count, 0.25));
    library.insert_skeleton("bench_rig", skeleton);
    library
}

/// One-second cycle with a full position and rotation key set per bone.
fn bench_clip(name: &str, joint_count: usize, stride: f32) -> AnimationClip {
    let frame_count = 30;
    let mut tracks = Vec::with_capacity(joint_count);
    for joint in 0..joint_count {
        let mut positions = Vec::with_capacity(frame_count + 1);
        let mut rotations = Vec::with_capacity(frame_count + 1);
        for key in 0..=frame_count {
            let phase = key as f32 / frame_count as f32;
            positions.push(Vec3::new(phase * stride, 0.4, joint as f32 * 0.01));
            rotations.push(Quat::from_rotation_z((phase * std::f32::consts::TAU).sin() * 0.2));
        }
        tracks.push(BoneTrack::new(
            Arc::from(format!("bone_{joint}").as_str()),
            positions,
            rotations,
            Vec::new(),
        ));
    }
    AnimationClip::new(Arc::from(name), Arc::from("bench_rig"), 30, frame_count as u32, tracks)
}

fn seed_blend_animators(world: &mut AnimWorld, library: &AnimationLibrary, count: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut spawned = 0;
    for _ in 0..count {
        let mut space = BlendSpace1D::new(0.0, 100.0);
        space.add_sample(Some("bench_walk"), 0.0);
        space.add_sample(Some("bench_run"), 100.0);
        space.set_parameter(rng.gen_range(0.0..100.0));
        space.set_play_time(rng.gen_range(0.0..1.0));
        if world.spawn_animator(library, "bench_rig", AnimSource::Blend1d(space)).is_some() {
            spawned += 1;
        }
    }
    spawned
}
