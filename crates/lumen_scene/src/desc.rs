//! Serde scene descriptions.
//!
//! The JSON surface mirrors the renderer's component tree: one tagged
//! enum per polymorphic slot, `#[serde(default)]` for every optional
//! property, required properties left without defaults so a missing
//! one fails at parse time rather than being silently filled in.
//! `build` validates the parsed description and assembles the
//! immutable render scene.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SceneError, SceneResult};
use lumen_math::{Aabb, Vec2, Vec3};
use lumen_render::{
    AmbientOcclusion, AreaEmitter, Bsdf, Camera, DensityProfile, Dielectric, Diffuse,
    DirectLighting, DirectSamplingMode, IndependentSampler, Integrator, IntersectionsIntegrator,
    IsotropicPhase, Medium, Microfacet, NormalsIntegrator, Parallelogram, PathSamplingMode,
    PathTracer, Primitive, Scene, Texture, TriangleMesh, VolumePathTracer,
};

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDesc {
    pub camera: CameraDesc,
    #[serde(default)]
    pub sampler: SamplerDesc,
    pub integrator: IntegratorDesc,
    #[serde(default)]
    pub medium: Option<MediumDesc>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveDesc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraDesc {
    pub resolution: [u32; 2],
    pub eye: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default)]
    pub aperture_radius: f32,
    #[serde(default = "default_focus")]
    pub focus_distance: f32,
}

fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fov() -> f32 {
    30.0
}

fn default_focus() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerDesc {
    #[serde(default = "default_spp")]
    pub sample_count: u32,
    #[serde(default)]
    pub seed: u64,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            sample_count: default_spp(),
            seed: 0,
        }
    }
}

fn default_spp() -> u32 {
    32
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum IntegratorDesc {
    Normals,
    Intersections {
        max_tests: u32,
    },
    AmbientOcclusion {
        #[serde(default)]
        cosine: bool,
    },
    DirectLighting {
        #[serde(default)]
        surface_sampling: bool,
        #[serde(default)]
        mis_sampling: bool,
    },
    Path {
        #[serde(default)]
        rr: bool,
        #[serde(default)]
        nee: bool,
        #[serde(default)]
        mis: bool,
    },
    VolumePath {
        #[serde(default)]
        rr: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BsdfDesc {
    Diffuse {
        #[serde(default = "default_albedo")]
        albedo: [f32; 3],
        #[serde(default)]
        use_cosine: bool,
        #[serde(default)]
        texture: Option<String>,
    },
    Dielectric {
        #[serde(default = "default_int_ior")]
        int_ior: f32,
        #[serde(default = "default_ext_ior")]
        ext_ior: f32,
    },
    Microfacet {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_int_ior")]
        int_ior: f32,
        #[serde(default = "default_ext_ior")]
        ext_ior: f32,
        #[serde(default = "default_albedo")]
        kd: [f32; 3],
    },
}

fn default_albedo() -> [f32; 3] {
    [0.5; 3]
}

fn default_int_ior() -> f32 {
    1.5046
}

fn default_ext_ior() -> f32 {
    1.000277
}

fn default_alpha() -> f32 {
    0.1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum PrimitiveDesc {
    Parallelogram {
        origin: [f32; 3],
        u: [f32; 3],
        v: [f32; 3],
        bsdf: BsdfDesc,
        #[serde(default)]
        radiance: Option<[f32; 3]>,
    },
    Mesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
        #[serde(default)]
        normals: Option<Vec<[f32; 3]>>,
        #[serde(default)]
        uvs: Option<Vec<[f32; 2]>>,
        bsdf: BsdfDesc,
        #[serde(default)]
        radiance: Option<[f32; 3]>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediumDesc {
    #[serde(default = "default_sigma")]
    pub sigma_a: [f32; 3],
    #[serde(default = "default_sigma")]
    pub sigma_s: [f32; 3],
    #[serde(default)]
    pub origin: [f32; 3],
    #[serde(default = "default_dimensions")]
    pub dimensions: [f32; 3],
    #[serde(default = "default_max_density")]
    pub max_density: f32,
    #[serde(default)]
    pub exponential_falloff: bool,
}

fn default_sigma() -> [f32; 3] {
    [0.2; 3]
}

fn default_dimensions() -> [f32; 3] {
    [0.4; 3]
}

fn default_max_density() -> f32 {
    1.0
}

impl CameraDesc {
    fn build(&self) -> SceneResult<Camera> {
        if self.resolution[0] == 0 || self.resolution[1] == 0 {
            return Err(SceneError::invalid(
                "camera",
                format!("resolution {}x{} must be positive", self.resolution[0], self.resolution[1]),
            ));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(SceneError::invalid(
                "camera",
                format!("fov {} must lie in (0, 180)", self.fov),
            ));
        }
        let eye = vec3(self.eye);
        let target = vec3(self.target);
        if (target - eye).length_squared() == 0.0 {
            return Err(SceneError::invalid("camera", "eye and target coincide"));
        }
        if self.aperture_radius < 0.0 {
            return Err(SceneError::invalid(
                "camera",
                format!("aperture_radius {} must not be negative", self.aperture_radius),
            ));
        }
        if self.aperture_radius > 0.0 && self.focus_distance <= 0.0 {
            return Err(SceneError::invalid(
                "camera",
                format!("focus_distance {} must be positive", self.focus_distance),
            ));
        }
        Ok(Camera::new(
            (self.resolution[0], self.resolution[1]),
            eye,
            target,
            vec3(self.up),
            self.fov,
            self.aperture_radius,
            self.focus_distance,
        ))
    }
}

impl IntegratorDesc {
    fn build(&self) -> SceneResult<Box<dyn Integrator>> {
        Ok(match *self {
            IntegratorDesc::Normals => Box::new(NormalsIntegrator),
            IntegratorDesc::Intersections { max_tests } => {
                if max_tests == 0 {
                    return Err(SceneError::invalid("integrator", "max_tests must be positive"));
                }
                Box::new(IntersectionsIntegrator { max_tests })
            }
            IntegratorDesc::AmbientOcclusion { cosine } => Box::new(AmbientOcclusion { cosine }),
            IntegratorDesc::DirectLighting {
                surface_sampling,
                mis_sampling,
            } => Box::new(DirectLighting {
                // The two explicit-light-sampling flags are aliases
                // for the same estimator
                mode: if surface_sampling || mis_sampling {
                    DirectSamplingMode::Surface
                } else {
                    DirectSamplingMode::Hemisphere
                },
            }),
            IntegratorDesc::Path { rr, nee, mis } => Box::new(PathTracer {
                mode: if nee || mis {
                    PathSamplingMode::Mis
                } else {
                    PathSamplingMode::Hemisphere
                },
                rr,
            }),
            IntegratorDesc::VolumePath { rr } => Box::new(VolumePathTracer { rr }),
        })
    }
}

impl BsdfDesc {
    fn build(&self, base_dir: Option<&Path>) -> SceneResult<Box<dyn Bsdf>> {
        match self {
            BsdfDesc::Diffuse {
                albedo,
                use_cosine,
                texture,
            } => {
                let albedo = vec3(*albedo);
                if albedo.min_element() < 0.0 || albedo.max_element() > 1.0 {
                    return Err(SceneError::invalid(
                        "bsdf",
                        format!("diffuse albedo {albedo} must lie in [0, 1]"),
                    ));
                }
                let mut diffuse = Diffuse::new(albedo, *use_cosine);
                if let Some(path) = texture {
                    let resolved = match base_dir {
                        Some(dir) => dir.join(path),
                        None => path.into(),
                    };
                    let texture = Texture::load(&resolved).map_err(|e| SceneError::Texture {
                        path: resolved.display().to_string(),
                        message: e.to_string(),
                    })?;
                    diffuse = diffuse.with_texture(texture);
                }
                Ok(Box::new(diffuse))
            }
            BsdfDesc::Dielectric { int_ior, ext_ior } => {
                if *int_ior <= 0.0 || *ext_ior <= 0.0 {
                    return Err(SceneError::invalid(
                        "bsdf",
                        format!("dielectric IORs {int_ior}/{ext_ior} must be positive"),
                    ));
                }
                Ok(Box::new(Dielectric::new(*int_ior, *ext_ior)))
            }
            BsdfDesc::Microfacet {
                alpha,
                int_ior,
                ext_ior,
                kd,
            } => {
                if *alpha <= 0.0 {
                    return Err(SceneError::invalid(
                        "bsdf",
                        format!("microfacet alpha {alpha} must be positive"),
                    ));
                }
                if *int_ior <= 0.0 || *ext_ior <= 0.0 {
                    return Err(SceneError::invalid(
                        "bsdf",
                        format!("microfacet IORs {int_ior}/{ext_ior} must be positive"),
                    ));
                }
                let kd = vec3(*kd);
                // ks = 1 - max(kd) must stay non-negative
                if kd.min_element() < 0.0 || kd.max_element() > 1.0 {
                    return Err(SceneError::invalid(
                        "bsdf",
                        format!("microfacet kd {kd} must lie in [0, 1]"),
                    ));
                }
                Ok(Box::new(Microfacet::new(*alpha, *int_ior, *ext_ior, kd)))
            }
        }
    }
}

fn attach_emitter(radiance: &Option<[f32; 3]>) -> SceneResult<Option<AreaEmitter>> {
    match radiance {
        None => Ok(None),
        Some(radiance) => {
            let radiance = vec3(*radiance);
            if !radiance.is_finite() || radiance.min_element() < 0.0 {
                return Err(SceneError::invalid(
                    "emitter",
                    format!("radiance {radiance} must be finite and non-negative"),
                ));
            }
            Ok(Some(AreaEmitter::new(radiance)))
        }
    }
}

impl PrimitiveDesc {
    fn build(&self, base_dir: Option<&Path>) -> SceneResult<Box<dyn Primitive>> {
        match self {
            PrimitiveDesc::Parallelogram {
                origin,
                u,
                v,
                bsdf,
                radiance,
            } => {
                let u = vec3(*u);
                let v = vec3(*v);
                if u.cross(v).length_squared() == 0.0 {
                    return Err(SceneError::invalid(
                        "primitive",
                        format!("parallelogram edges {u} and {v} are degenerate"),
                    ));
                }
                let quad = Parallelogram::new(vec3(*origin), u, v, bsdf.build(base_dir)?);
                Ok(match attach_emitter(radiance)? {
                    Some(emitter) => Box::new(quad.with_emitter(Box::new(emitter))),
                    None => Box::new(quad),
                })
            }
            PrimitiveDesc::Mesh {
                vertices,
                indices,
                normals,
                uvs,
                bsdf,
                radiance,
            } => {
                if indices.is_empty() {
                    return Err(SceneError::invalid("primitive", "mesh has no triangles"));
                }
                let count = vertices.len() as u32;
                for tri in indices {
                    if tri.iter().any(|&i| i >= count) {
                        return Err(SceneError::invalid(
                            "primitive",
                            format!("mesh index {tri:?} exceeds {count} vertices"),
                        ));
                    }
                }
                for attr in [normals.as_ref().map(Vec::len), uvs.as_ref().map(Vec::len)]
                    .into_iter()
                    .flatten()
                {
                    if attr != vertices.len() {
                        return Err(SceneError::invalid(
                            "primitive",
                            format!("mesh attribute count {attr} does not match {} vertices", vertices.len()),
                        ));
                    }
                }
                let mesh = TriangleMesh::new(
                    vertices.iter().map(|&v| vec3(v)).collect(),
                    indices.clone(),
                    normals
                        .as_ref()
                        .map(|ns| ns.iter().map(|&n| vec3(n).normalize()).collect()),
                    uvs.as_ref()
                        .map(|ts| ts.iter().map(|&t| Vec2::from_array(t)).collect()),
                    bsdf.build(base_dir)?,
                );
                Ok(match attach_emitter(radiance)? {
                    Some(emitter) => Box::new(mesh.with_emitter(Box::new(emitter))),
                    None => Box::new(mesh),
                })
            }
        }
    }
}

impl MediumDesc {
    fn build(&self) -> SceneResult<Medium> {
        let sigma_a = vec3(self.sigma_a);
        let sigma_s = vec3(self.sigma_s);
        if sigma_a.min_element() < 0.0 || sigma_s.min_element() < 0.0 {
            return Err(SceneError::invalid(
                "medium",
                format!("coefficients {sigma_a}/{sigma_s} must be non-negative"),
            ));
        }
        if self.max_density < 0.0 {
            return Err(SceneError::invalid(
                "medium",
                format!("max_density {} must be non-negative", self.max_density),
            ));
        }
        let dims = vec3(self.dimensions).abs();
        if dims.min_element() == 0.0 {
            return Err(SceneError::invalid(
                "medium",
                format!("dimensions {dims} must span a volume"),
            ));
        }
        Ok(Medium::new(
            sigma_a,
            sigma_s,
            Aabb::from_center(vec3(self.origin), dims),
            self.max_density,
            if self.exponential_falloff {
                DensityProfile::ExponentialVertical
            } else {
                DensityProfile::Constant
            },
            Box::new(IsotropicPhase),
        ))
    }
}

impl SceneDesc {
    /// Validate and assemble the renderable scene. `base_dir` anchors
    /// relative texture paths, usually the scene file's directory.
    pub fn build(&self, base_dir: Option<&Path>) -> SceneResult<Scene> {
        if self.sampler.sample_count == 0 {
            return Err(SceneError::invalid("sampler", "sample_count must be positive"));
        }
        let camera = self.camera.build()?;
        let sampler = Box::new(IndependentSampler::new(
            self.sampler.seed,
            self.sampler.sample_count,
        ));
        let integrator = self.integrator.build()?;

        let mut scene = Scene::new(camera, sampler, integrator);
        for desc in &self.primitives {
            scene.add_primitive(desc.build(base_dir)?);
        }
        if let Some(medium) = &self.medium {
            scene.set_medium(medium.build()?);
        }

        if matches!(self.integrator, IntegratorDesc::VolumePath { .. }) && self.medium.is_none() {
            log::warn!("volume_path integrator configured without a medium");
        }
        if scene.emitter_count() == 0 {
            log::warn!("scene has no emitters; transport integrators will render black");
        }
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(extra: &str) -> String {
        format!(
            r#"{{
                "camera": {{
                    "resolution": [32, 24],
                    "eye": [0, 1, 4],
                    "target": [0, 0, 0]
                }},
                "integrator": {{ "type": "normals" }}{extra}
            }}"#
        )
    }

    #[test]
    fn test_minimal_scene_parses_with_defaults() {
        let desc: SceneDesc = serde_json::from_str(&minimal("")).expect("parse");
        assert_eq!(desc.sampler.sample_count, 32);
        assert_eq!(desc.sampler.seed, 0);
        assert_eq!(desc.camera.fov, 30.0);
        let scene = desc.build(None).expect("build");
        assert_eq!(scene.camera().resolution(), (32, 24));
        assert_eq!(scene.emitter_count(), 0);
    }

    #[test]
    fn test_missing_required_property_fails() {
        let json = r#"{
            "camera": { "resolution": [32, 24], "eye": [0, 1, 4] },
            "integrator": { "type": "normals" }
        }"#;
        assert!(serde_json::from_str::<SceneDesc>(json).is_err());
    }

    #[test]
    fn test_unknown_property_rejected() {
        let json = minimal(r#", "integrator_mode": 3"#);
        assert!(serde_json::from_str::<SceneDesc>(&json).is_err());
    }

    #[test]
    fn test_full_scene_builds() {
        let json = minimal(
            r#",
            "sampler": { "sample_count": 4, "seed": 9 },
            "medium": { "sigma_a": [0.1, 0.1, 0.1], "max_density": 0.5 },
            "primitives": [
                {
                    "type": "parallelogram",
                    "origin": [-1, -1, 0], "u": [2, 0, 0], "v": [0, 2, 0],
                    "bsdf": { "type": "diffuse", "albedo": [0.7, 0.7, 0.7], "use_cosine": true }
                },
                {
                    "type": "parallelogram",
                    "origin": [-0.5, 0.5, 2], "u": [1, 0, 0], "v": [0, -1, 0],
                    "bsdf": { "type": "diffuse", "albedo": [0, 0, 0] },
                    "radiance": [5, 5, 5]
                },
                {
                    "type": "mesh",
                    "vertices": [[0, 0, 1], [1, 0, 1], [0, 1, 1]],
                    "indices": [[0, 1, 2]],
                    "bsdf": { "type": "microfacet", "alpha": 0.2 }
                }
            ]"#,
        );
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        let scene = desc.build(None).expect("build");
        assert_eq!(scene.primitives().len(), 3);
        assert_eq!(scene.emitter_count(), 1);
        assert!(scene.medium().is_some());
    }

    #[test]
    fn test_bad_fov_rejected() {
        let json = minimal("").replace("\"target\": [0, 0, 0]", "\"target\": [0, 0, 0], \"fov\": 200.0");
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        let err = desc.build(None).err().expect("fov out of range");
        assert!(matches!(err, SceneError::Invalid { component: "camera", .. }));
    }

    #[test]
    fn test_degenerate_parallelogram_rejected() {
        let json = minimal(
            r#",
            "primitives": [{
                "type": "parallelogram",
                "origin": [0, 0, 0], "u": [1, 0, 0], "v": [2, 0, 0],
                "bsdf": { "type": "diffuse" }
            }]"#,
        );
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        let err = desc.build(None).err().expect("parallel edges");
        assert!(matches!(err, SceneError::Invalid { component: "primitive", .. }));
    }

    #[test]
    fn test_microfacet_kd_out_of_range_rejected() {
        let json = minimal(
            r#",
            "primitives": [{
                "type": "parallelogram",
                "origin": [0, 0, 0], "u": [1, 0, 0], "v": [0, 1, 0],
                "bsdf": { "type": "microfacet", "kd": [1.5, 1.5, 1.5] }
            }]"#,
        );
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        let err = desc.build(None).err().expect("kd above one");
        assert!(matches!(err, SceneError::Invalid { component: "bsdf", .. }));
    }

    #[test]
    fn test_mesh_index_out_of_range_rejected() {
        let json = minimal(
            r#",
            "primitives": [{
                "type": "mesh",
                "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
                "indices": [[0, 1, 3]],
                "bsdf": { "type": "diffuse" }
            }]"#,
        );
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        assert!(desc.build(None).is_err());
    }

    #[test]
    fn test_dielectric_defaults() {
        let json = r#"{ "type": "dielectric" }"#;
        let desc: BsdfDesc = serde_json::from_str(json).expect("parse");
        match desc {
            BsdfDesc::Dielectric { int_ior, ext_ior } => {
                assert!((int_ior - 1.5046).abs() < 1e-6);
                assert!((ext_ior - 1.000277).abs() < 1e-6);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let json = minimal(r#", "medium": { "sigma_a": [-0.1, 0.1, 0.1] }"#);
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        assert!(matches!(
            desc.build(None),
            Err(SceneError::Invalid { component: "medium", .. })
        ));
    }

    #[test]
    fn test_missing_texture_file_reported() {
        let json = minimal(
            r#",
            "primitives": [{
                "type": "parallelogram",
                "origin": [0, 0, 0], "u": [1, 0, 0], "v": [0, 1, 0],
                "bsdf": { "type": "diffuse", "texture": "does-not-exist.png" }
            }]"#,
        );
        let desc: SceneDesc = serde_json::from_str(&json).expect("parse");
        assert!(matches!(desc.build(None), Err(SceneError::Texture { .. })));
    }
}
