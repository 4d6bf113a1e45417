use crate::blendspace::{BlendSpace1D, BlendSpace2D};
use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuatData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl From<glam::Vec2> for Vec2Data {
    fn from(value: glam::Vec2) -> Self {
        Self { x: value.x, y: value.y }
    }
}

impl From<Vec2Data> for glam::Vec2 {
    fn from(value: Vec2Data) -> Self {
        glam::Vec2::new(value.x, value.y)
    }
}

impl From<glam::Vec3> for Vec3Data {
    fn from(value: glam::Vec3) -> Self {
        Self { x: value.x, y: value.y, z: value.z }
    }
}

impl From<Vec3Data> for glam::Vec3 {
    fn from(value: Vec3Data) -> Self {
        glam::Vec3::new(value.x, value.y, value.z)
    }
}

impl From<glam::Quat> for QuatData {
    fn from(value: glam::Quat) -> Self {
        let v = value.normalize();
        Self { x: v.x, y: v.y, z: v.z, w: v.w }
    }
}

impl From<QuatData> for glam::Quat {
    fn from(value: QuatData) -> Self {
        glam::Quat::from_xyzw(value.x, value.y, value.z, value.w)
    }
}

fn default_version() -> u32 {
    1
}

const fn default_auto_triangulate() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendSample1dData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    pub position: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendSpace1dData {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub min_parameter: f32,
    pub max_parameter: f32,
    #[serde(default)]
    pub samples: Vec<BlendSample1dData>,
}

/// Triangle corners as signed sample indices. `-1` marks an unset corner in
/// hand-authored files; such triangles are skipped on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendTriangleData {
    pub a: i32,
    pub b: i32,
    pub c: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendSample2dData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    pub position: Vec2Data,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendSpace2dData {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub min_parameter: Vec2Data,
    pub max_parameter: Vec2Data,
    #[serde(default)]
    pub samples: Vec<BlendSample2dData>,
    #[serde(default)]
    pub triangles: Vec<BlendTriangleData>,
    #[serde(default = "default_auto_triangulate")]
    pub auto_triangulate: bool,
}

impl BlendSpace1dData {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Reading blend space file {}", path.display()))?;
        let data = serde_json::from_slice::<BlendSpace1dData>(&bytes)
            .with_context(|| format!("Parsing blend space file {}", path.display()))?;
        data.validate()?;
        Ok(data)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating blend space directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing blend space file {}", path.display()))?;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(anyhow!("Blend space version must be >= 1"));
        }
        if !self.min_parameter.is_finite() || !self.max_parameter.is_finite() {
            return Err(anyhow!("Blend space parameter range must be finite"));
        }
        for (index, sample) in self.samples.iter().enumerate() {
            if !sample.position.is_finite() {
                return Err(anyhow!("Blend space sample {} has a non-finite position", index));
            }
        }
        Ok(())
    }

    pub fn to_runtime(&self) -> BlendSpace1D {
        let mut space = BlendSpace1D::new(self.min_parameter, self.max_parameter);
        for sample in &self.samples {
            space.add_sample(sample.clip.as_deref(), sample.position);
        }
        space
    }

    pub fn from_runtime(space: &BlendSpace1D, name: Option<String>) -> Self {
        Self {
            version: 1,
            name,
            min_parameter: space.min_parameter(),
            max_parameter: space.max_parameter(),
            samples: space
                .samples()
                .iter()
                .map(|sample| BlendSample1dData {
                    clip: sample.clip.as_deref().map(str::to_string),
                    position: sample.position,
                })
                .collect(),
        }
    }
}

impl BlendSpace2dData {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Reading blend space file {}", path.display()))?;
        let data = serde_json::from_slice::<BlendSpace2dData>(&bytes)
            .with_context(|| format!("Parsing blend space file {}", path.display()))?;
        data.validate()?;
        Ok(data)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating blend space directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing blend space file {}", path.display()))?;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(anyhow!("Blend space version must be >= 1"));
        }
        let min = Vec2::new(self.min_parameter.x, self.min_parameter.y);
        let max = Vec2::new(self.max_parameter.x, self.max_parameter.y);
        if !min.is_finite() || !max.is_finite() {
            return Err(anyhow!("Blend space parameter range must be finite"));
        }
        for (index, sample) in self.samples.iter().enumerate() {
            let position = Vec2::new(sample.position.x, sample.position.y);
            if !position.is_finite() {
                return Err(anyhow!("Blend space sample {} has a non-finite position", index));
            }
        }
        Ok(())
    }

    pub fn to_runtime(&self) -> BlendSpace2D {
        let min = Vec2::new(self.min_parameter.x, self.min_parameter.y);
        let max = Vec2::new(self.max_parameter.x, self.max_parameter.y);
        let mut space = BlendSpace2D::new(min, max);
        for sample in &self.samples {
            let position = Vec2::new(sample.position.x, sample.position.y);
            space.add_sample(sample.clip.as_deref(), position);
        }
        if self.auto_triangulate {
            space.triangulate();
        } else {
            // Entering manual mode first keeps a triangle-free document manual.
            space.clear_triangles();
            for (index, triangle) in self.triangles.iter().enumerate() {
                let corners = (
                    usize::try_from(triangle.a),
                    usize::try_from(triangle.b),
                    usize::try_from(triangle.c),
                );
                let (Ok(a), Ok(b), Ok(c)) = corners else {
                    eprintln!(
                        "[assets] blend space triangle {} has unset corners and was dropped",
                        index
                    );
                    continue;
                };
                if !space.add_triangle(a, b, c) {
                    eprintln!(
                        "[assets] blend space triangle {} references invalid samples and was dropped",
                        index
                    );
                }
            }
        }
        space
    }

    pub fn from_runtime(space: &BlendSpace2D, name: Option<String>) -> Self {
        Self {
            version: 1,
            name,
            min_parameter: Vec2Data::from(space.min_parameter()),
            max_parameter: Vec2Data::from(space.max_parameter()),
            samples: space
                .samples()
                .iter()
                .map(|sample| BlendSample2dData {
                    clip: sample.clip.as_deref().map(str::to_string),
                    position: Vec2Data::from(sample.position),
                })
                .collect(),
            triangles: space
                .triangles()
                .iter()
                .map(|triangle| BlendTriangleData {
                    a: triangle[0] as i32,
                    b: triangle[1] as i32,
                    c: triangle[2] as i32,
                })
                .collect(),
            auto_triangulate: space.auto_triangulate(),
        }
    }
}
