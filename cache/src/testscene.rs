//! Analytic scenes backing the cache tests: axis aligned rooms, diffuse
//! walls, an optional refracting sphere and point lights, all implementing
//! the oracle interfaces the cache consumes.

use photongi_core::bsdf::*;
use photongi_core::common::*;
use photongi_core::geometry::*;
use photongi_core::light::{ArcLight, Light, LightEmission};
use photongi_core::scene::{Scene, SurfaceHit, VolumeInfo};
use photongi_core::spectrum::*;
use std::sync::Arc;

/// Material of a test surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TestMaterial {
    /// Lambertian reflector with the given albedo.
    Matte(Spectrum),

    /// Refracting dielectric with the given index of refraction.
    Glass(Float),
}

/// Analytic test shapes.
#[derive(Copy, Clone)]
pub enum TestShapeKind {
    /// An axis aligned rectangle at `offset` along `axis`; `normal_sign`
    /// selects which side the surface normal faces. The rectangle spans
    /// `[min0, max0] x [min1, max1]` over the remaining two axes in XYZ
    /// order.
    Rect {
        axis: Axis,
        offset: Float,
        normal_sign: Float,
        min0: Float,
        max0: Float,
        min1: Float,
        max1: Float,
    },

    /// A sphere.
    Sphere { center: Point3f, radius: Float },
}

/// A shape paired with its material.
pub struct TestShape {
    pub kind: TestShapeKind,
    pub material: TestMaterial,
}

impl TestShape {
    /// Intersects a ray with the shape, returning the hit parameter and the
    /// surface normal.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<(Float, Normal3f)> {
        match self.kind {
            TestShapeKind::Rect {
                axis,
                offset,
                normal_sign,
                min0,
                max0,
                min1,
                max1,
            } => {
                let denom = ray.d[axis];
                if denom.abs() < 1e-9 {
                    return None;
                }
                let t = (offset - ray.o[axis]) / denom;
                if t <= ray.t_min || t >= ray.t_max {
                    return None;
                }

                let p = ray.at(t);
                let (a0, a1) = other_axes(axis);
                if p[a0] < min0 || p[a0] > max0 || p[a1] < min1 || p[a1] > max1 {
                    return None;
                }

                let mut normal = Normal3f::new(0.0, 0.0, 0.0);
                match axis {
                    Axis::X => normal.x = normal_sign,
                    Axis::Y => normal.y = normal_sign,
                    Axis::Z => normal.z = normal_sign,
                }
                Some((t, normal))
            }
            TestShapeKind::Sphere { center, radius } => {
                let oc = ray.o - center;
                let a = ray.d.length_squared();
                let half_b = oc.dot(&ray.d);
                let c = oc.length_squared() - radius * radius;
                let discriminant = half_b * half_b - a * c;
                if discriminant < 0.0 {
                    return None;
                }

                let sqrt_d = discriminant.sqrt();
                let mut t = (-half_b - sqrt_d) / a;
                if t <= ray.t_min || t >= ray.t_max {
                    t = (-half_b + sqrt_d) / a;
                    if t <= ray.t_min || t >= ray.t_max {
                        return None;
                    }
                }

                let p = ray.at(t);
                Some((t, Normal3f::from((p - center) * (1.0 / radius))))
            }
        }
    }
}

/// Returns the two axes spanning the plane orthogonal to the given one, in
/// XYZ order.
fn other_axes(axis: Axis) -> (Axis, Axis) {
    match axis {
        Axis::X => (Axis::Y, Axis::Z),
        Axis::Y => (Axis::X, Axis::Z),
        Axis::Z => (Axis::X, Axis::Y),
    }
}

/// Builds an orthonormal basis around a unit vector.
fn coordinate_system(v1: Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(&v2);
    (v2, v3)
}

/// Cosine weighted hemisphere sample around +Z.
fn cosine_sample_hemisphere(u0: Float, u1: Float) -> Vector3f {
    let r = u0.sqrt();
    let phi = 2.0 * PI * u1;
    Vector3f::new(r * phi.cos(), r * phi.sin(), max(0.0, 1.0 - u0).sqrt())
}

/// Refracts a direction through an interface, or returns `None` on total
/// internal reflection. The normal faces against the incoming direction.
fn refract(d: Vector3f, n: Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_i = -n.dot(&d);
    let sin2_t = eta * eta * max(0.0, 1.0 - cos_i * cos_i);
    if sin2_t >= 1.0 {
        None
    } else {
        let cos_t = (1.0 - sin2_t).sqrt();
        Some(d * eta + n * (eta * cos_i - cos_t))
    }
}

/// Mirror reflection of a direction; the normal faces against it.
fn reflect(d: Vector3f, n: Vector3f) -> Vector3f {
    d - n * (2.0 * n.dot(&d))
}

/// The surface interaction of a test scene.
pub struct TestBsdf {
    hit: HitPoint,
    material: TestMaterial,
    /// Incoming ray direction.
    d: Vector3f,
}

/// Builds a standalone matte interaction for querying the cache.
///
/// * `p`      - Query position.
/// * `n`      - Query normal.
/// * `albedo` - Surface albedo.
pub fn matte_bsdf(p: Point3f, n: Normal3f, albedo: Spectrum) -> TestBsdf {
    TestBsdf {
        hit: HitPoint {
            p,
            shade_n: n,
            into_object: true,
        },
        material: TestMaterial::Matte(albedo),
        d: -Vector3f::from(n),
    }
}

/// Builds a standalone specular interaction, which never participates in
/// photon based global illumination.
///
/// * `p` - Query position.
/// * `n` - Query normal.
pub fn glass_bsdf(p: Point3f, n: Normal3f) -> TestBsdf {
    TestBsdf {
        hit: HitPoint {
            p,
            shade_n: n,
            into_object: true,
        },
        material: TestMaterial::Glass(1.5),
        d: -Vector3f::from(n),
    }
}

impl Bsdf for TestBsdf {
    fn hit_point(&self) -> &HitPoint {
        &self.hit
    }

    fn is_photon_gi_enabled(&self) -> bool {
        matches!(self.material, TestMaterial::Matte(_))
    }

    fn material_type(&self) -> MaterialType {
        match self.material {
            TestMaterial::Matte(_) => MaterialType::Matte,
            TestMaterial::Glass(_) => MaterialType::Glass,
        }
    }

    fn sample(&self, u0: Float, u1: Float) -> BsdfSample {
        match self.material {
            TestMaterial::Matte(albedo) => {
                let n = self.hit.shade_n.face_forward(&-self.d);
                let local = cosine_sample_hemisphere(u0, u1);
                let (tangent, bitangent) = coordinate_system(Vector3f::from(n));
                let d = tangent * local.x + bitangent * local.y + Vector3f::from(n) * local.z;
                BsdfSample {
                    d,
                    pdf: local.z * INV_PI,
                    event: BSDFEvent::DIFFUSE | BSDFEvent::REFLECT,
                    // f cos / pdf for a Lambertian surface under cosine
                    // sampling.
                    value: albedo,
                }
            }
            TestMaterial::Glass(ior) => {
                let n = Vector3f::from(self.hit.shade_n.face_forward(&-self.d));
                let eta = if self.hit.into_object { 1.0 / ior } else { ior };
                match refract(self.d, n, eta) {
                    Some(d) => BsdfSample {
                        d,
                        pdf: 1.0,
                        event: BSDFEvent::SPECULAR | BSDFEvent::TRANSMIT,
                        value: Spectrum::new(1.0),
                    },
                    None => BsdfSample {
                        d: reflect(self.d, n),
                        pdf: 1.0,
                        event: BSDFEvent::SPECULAR | BSDFEvent::REFLECT,
                        value: Spectrum::new(1.0),
                    },
                }
            }
        }
    }

    fn evaluate(&self, wi: &Vector3f) -> (Spectrum, BSDFEvent) {
        match self.material {
            TestMaterial::Matte(albedo) => {
                let n = self.hit.shade_n.face_forward(&-self.d);
                let cos = max(0.0, n.dot_vec(wi));
                (albedo * INV_PI * cos, BSDFEvent::DIFFUSE | BSDFEvent::REFLECT)
            }
            TestMaterial::Glass(_) => (Spectrum::ZERO, BSDFEvent::SPECULAR | BSDFEvent::REFLECT),
        }
    }

    fn evaluate_total(&self) -> Spectrum {
        match self.material {
            TestMaterial::Matte(albedo) => albedo,
            TestMaterial::Glass(_) => Spectrum::ZERO,
        }
    }
}

/// An isotropic point light.
pub struct TestPointLight {
    pub p: Point3f,
    pub intensity: Spectrum,
}

impl Light for TestPointLight {
    fn emit(&self, _scene: &dyn Scene, u: [Float; 5]) -> LightEmission {
        // Uniform direction over the sphere.
        let z = 1.0 - 2.0 * u[0];
        let r = max(0.0, 1.0 - z * z).sqrt();
        let phi = 2.0 * PI * u[1];
        let d = Vector3f::new(r * phi.cos(), r * phi.sin(), z);

        LightEmission {
            ray: Ray::new(self.p, d, 0.0),
            pdf_w: 1.0 / (4.0 * PI),
            value: self.intensity,
        }
    }
}

/// A scene of analytic shapes with a pinhole camera.
pub struct TestScene {
    pub shapes: Vec<TestShape>,
    pub lights: Vec<ArcLight>,
    camera_position: Point3f,
    film_lower_left: Point3f,
    film_horizontal: Vector3f,
    film_vertical: Vector3f,
    bound: Bounds3f,
}

impl Scene for TestScene {
    fn intersect(&self, ray: &Ray, _vol: &mut VolumeInfo, _u: Float) -> Option<SurfaceHit> {
        let mut nearest: Option<(Float, Normal3f, &TestShape)> = None;
        for shape in self.shapes.iter() {
            if let Some((t, n)) = shape.intersect(ray) {
                if nearest.map_or(true, |(nearest_t, _, _)| t < nearest_t) {
                    nearest = Some((t, n, shape));
                }
            }
        }

        nearest.map(|(t, n, shape)| {
            let p = ray.at(t);
            let into_object = ray.d.dot(&Vector3f::from(n)) < 0.0;
            SurfaceHit {
                bsdf: Box::new(TestBsdf {
                    hit: HitPoint {
                        p,
                        shade_n: n,
                        into_object,
                    },
                    material: shape.material,
                    d: ray.d,
                }),
                throughput: Spectrum::new(1.0),
            }
        })
    }

    fn camera_ray_time(&self, _u: Float) -> Float {
        0.0
    }

    fn generate_camera_ray(&self, u0: Float, u1: Float, time: Float) -> Option<Ray> {
        let target = self.film_lower_left + self.film_horizontal * u0 + self.film_vertical * u1;
        let d = (target - self.camera_position).normalize();
        Some(Ray::new(self.camera_position, d, time))
    }

    fn sample_light(&self, u: Float) -> Option<(ArcLight, Float)> {
        if self.lights.is_empty() {
            return None;
        }
        let count = self.lights.len();
        let index = min((u * count as Float) as usize, count - 1);
        Some((Arc::clone(&self.lights[index]), 1.0 / count as Float))
    }

    fn world_bound(&self) -> Bounds3f {
        self.bound
    }
}

/// The six inward facing walls of the `[-1, 1]^3` room.
fn room_walls(albedo: Spectrum) -> Vec<TestShape> {
    let rect = |axis, offset: Float, normal_sign: Float| TestShape {
        kind: TestShapeKind::Rect {
            axis,
            offset,
            normal_sign,
            min0: -1.0,
            max0: 1.0,
            min1: -1.0,
            max1: 1.0,
        },
        material: TestMaterial::Matte(albedo),
    };

    vec![
        rect(Axis::Y, -1.0, 1.0),  // floor
        rect(Axis::Y, 1.0, -1.0),  // ceiling
        rect(Axis::Z, -1.0, 1.0),  // back wall
        rect(Axis::Z, 1.0, -1.0),  // front wall
        rect(Axis::X, -1.0, 1.0),  // left wall
        rect(Axis::X, 1.0, -1.0),  // right wall
    ]
}

/// A closed diffuse room with a point light near the ceiling and a camera
/// just inside the front wall.
pub fn cornell_box() -> TestScene {
    TestScene {
        shapes: room_walls(Spectrum::new(0.7)),
        lights: vec![Arc::new(TestPointLight {
            p: Point3f::new(0.0, 0.8, 0.0),
            intensity: Spectrum::new(1.0),
        })],
        camera_position: Point3f::new(0.0, 0.0, 0.9),
        film_lower_left: Point3f::new(-1.0, -1.0, -1.0),
        film_horizontal: Vector3f::new(2.0, 0.0, 0.0),
        film_vertical: Vector3f::new(0.0, 2.0, 0.0),
        bound: Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0)),
    }
}

/// The diffuse room with a refracting sphere between a point light and the
/// back wall, focusing a caustic around the wall point on the light axis.
pub fn cornell_box_with_glass_sphere() -> TestScene {
    let mut scene = cornell_box();
    scene.shapes.push(TestShape {
        kind: TestShapeKind::Sphere {
            center: Point3f::new(0.0, 0.0, 0.0),
            radius: 0.45,
        },
        material: TestMaterial::Glass(1.5),
    });
    scene.lights = vec![Arc::new(TestPointLight {
        p: Point3f::new(0.0, 0.0, 0.8),
        intensity: Spectrum::new(1.0),
    })];
    scene
}

/// An unbounded floor under a point light; roughly half of all emitted
/// photons escape upward without depositing anything.
pub fn open_floor_scene() -> TestScene {
    TestScene {
        shapes: vec![TestShape {
            kind: TestShapeKind::Rect {
                axis: Axis::Y,
                offset: -1.0,
                normal_sign: 1.0,
                min0: -8.0,
                max0: 8.0,
                min1: -8.0,
                max1: 8.0,
            },
            material: TestMaterial::Matte(Spectrum::new(0.7)),
        }],
        lights: vec![Arc::new(TestPointLight {
            p: Point3f::new(0.0, 0.0, 0.0),
            intensity: Spectrum::new(1.0),
        })],
        camera_position: Point3f::new(0.0, 2.0, 0.0),
        film_lower_left: Point3f::new(-4.0, -1.0, -4.0),
        film_horizontal: Vector3f::new(8.0, 0.0, 0.0),
        film_vertical: Vector3f::new(0.0, 0.0, 8.0),
        bound: Bounds3f::new(Point3f::new(-8.0, -1.1, -8.0), Point3f::new(8.0, 2.1, 8.0)),
    }
}

/// A scene with a light but no geometry at all; no light path can ever
/// deposit a photon.
pub fn empty_scene() -> TestScene {
    TestScene {
        shapes: vec![],
        lights: vec![Arc::new(TestPointLight {
            p: Point3f::new(0.0, 0.0, 0.0),
            intensity: Spectrum::new(1.0),
        })],
        camera_position: Point3f::new(0.0, 0.0, 0.9),
        film_lower_left: Point3f::new(-1.0, -1.0, -1.0),
        film_horizontal: Vector3f::new(2.0, 0.0, 0.0),
        film_vertical: Vector3f::new(0.0, 2.0, 0.0),
        bound: Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0)),
    }
}
