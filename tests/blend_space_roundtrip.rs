use glam::Vec2;
use plumage::blendspace::data::{BlendSpace1dData, BlendSpace2dData};
use plumage::blendspace::{BlendSpace1D, BlendSpace2D};
use std::fs;

#[test]
fn blend_space_1d_roundtrips_sorted_samples() {
    let mut space = BlendSpace1D::new(0.0, 200.0);
    space.add_sample(Some("run"), 200.0);
    space.add_sample(Some("idle"), 0.0);
    space.add_sample(Some("walk"), 100.0);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("blend").join("locomotion.json");
    let data = BlendSpace1dData::from_runtime(&space, Some("locomotion".into()));
    data.save_to_path(&path).expect("save blend space");

    let loaded = BlendSpace1dData::load_from_path(&path).expect("load blend space");
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.name.as_deref(), Some("locomotion"));

    let restored = loaded.to_runtime();
    assert_eq!(restored.sample_count(), 3);
    let positions: Vec<f32> = restored.samples().iter().map(|sample| sample.position).collect();
    assert_eq!(positions, vec![0.0, 100.0, 200.0]);
    let clips: Vec<&str> =
        restored.samples().iter().filter_map(|sample| sample.clip.as_deref()).collect();
    assert_eq!(clips, vec!["idle", "walk", "run"]);
    assert!((restored.min_parameter() - 0.0).abs() < 1.0e-6);
    assert!((restored.max_parameter() - 200.0).abs() < 1.0e-6);
}

#[test]
fn blend_space_2d_manual_triangles_survive_roundtrip() {
    let mut space = BlendSpace2D::new(Vec2::splat(-100.0), Vec2::splat(100.0));
    space.add_sample(Some("idle"), Vec2::new(0.0, 0.0));
    space.add_sample(Some("walk"), Vec2::new(100.0, 0.0));
    space.add_sample(Some("run"), Vec2::new(0.0, 100.0));
    space.add_sample(Some("strafe"), Vec2::new(-100.0, 0.0));
    assert!(space.add_triangle(0, 1, 2));
    assert!(space.add_triangle(0, 2, 3));

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("strafe.json");
    BlendSpace2dData::from_runtime(&space, None).save_to_path(&path).expect("save blend space");

    let restored = BlendSpace2dData::load_from_path(&path).expect("load blend space").to_runtime();
    assert!(!restored.auto_triangulate());
    assert_eq!(restored.triangles(), &[[0, 1, 2], [0, 2, 3]]);
    assert_eq!(restored.sample_count(), 4);
}

#[test]
fn blend_space_2d_auto_mode_rederives_triangles() {
    let mut space = BlendSpace2D::new(Vec2::splat(-100.0), Vec2::splat(100.0));
    space.add_sample(Some("idle"), Vec2::new(0.0, 0.0));
    space.add_sample(Some("east"), Vec2::new(100.0, 0.0));
    space.add_sample(Some("west"), Vec2::new(-100.0, 0.0));
    space.add_sample(Some("north"), Vec2::new(0.0, 100.0));
    space.add_sample(Some("south"), Vec2::new(0.0, -100.0));
    space.triangulate();
    let expected: Vec<[usize; 3]> = space.triangles().to_vec();
    assert_eq!(expected.len(), 4);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("plus.json");
    BlendSpace2dData::from_runtime(&space, Some("plus".into()))
        .save_to_path(&path)
        .expect("save blend space");

    let restored = BlendSpace2dData::load_from_path(&path).expect("load blend space").to_runtime();
    assert!(restored.auto_triangulate());
    assert_eq!(restored.triangles(), expected.as_slice());
}

#[test]
fn unset_and_invalid_triangles_are_dropped_on_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("authored.json");
    let json = r#"{
        "version": 1,
        "min_parameter": { "x": -100.0, "y": -100.0 },
        "max_parameter": { "x": 100.0, "y": 100.0 },
        "samples": [
            { "clip": "idle", "position": { "x": 0.0, "y": 0.0 } },
            { "clip": "walk", "position": { "x": 100.0, "y": 0.0 } },
            { "clip": "run", "position": { "x": 0.0, "y": 100.0 } }
        ],
        "triangles": [
            { "a": -1, "b": 1, "c": 2 },
            { "a": 0, "b": 1, "c": 9 },
            { "a": 0, "b": 1, "c": 2 }
        ],
        "auto_triangulate": false
    }"#;
    fs::write(&path, json).expect("write fixture");

    let restored = BlendSpace2dData::load_from_path(&path).expect("load blend space").to_runtime();
    assert!(!restored.auto_triangulate());
    assert_eq!(restored.triangles(), &[[0, 1, 2]]);
}

#[test]
fn repo_fixtures_load_into_runtime_spaces() {
    let locomotion = BlendSpace1dData::load_from_path("fixtures/blend/locomotion_1d.json")
        .expect("load locomotion fixture");
    let space = locomotion.to_runtime();
    assert_eq!(space.sample_count(), 3);
    assert!((space.max_parameter() - 200.0).abs() < 1.0e-6);

    let strafe = BlendSpace2dData::load_from_path("fixtures/blend/strafe_2d.json")
        .expect("load strafe fixture");
    let space = strafe.to_runtime();
    assert_eq!(space.sample_count(), 5);
    assert!(space.auto_triangulate());
    assert_eq!(space.triangle_count(), 4);
}

#[test]
fn malformed_documents_are_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");

    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, b"{ not json").expect("write fixture");
    assert!(BlendSpace1dData::load_from_path(&garbled).is_err());

    let stale = dir.path().join("stale.json");
    fs::write(&stale, br#"{ "version": 0, "min_parameter": 0.0, "max_parameter": 1.0 }"#)
        .expect("write fixture");
    assert!(BlendSpace1dData::load_from_path(&stale).is_err());

    assert!(BlendSpace2dData::load_from_path(dir.path().join("missing.json")).is_err());
}
