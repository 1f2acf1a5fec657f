// Copyright @yucwang 2023

use super::constants::{Float, INV_FOUR_PI, INV_PI, INV_TWO_PI, PI, Vector2f, Vector3f};

// Warps map a canonical uniform sample in [0,1)^2 to a target domain.
// Every warp comes with the analytic density of its output, expressed
// over the output point itself. Densities are exactly zero outside the
// support so callers can treat a zero pdf as "skip this contribution".

const NORM_TOLERANCE: Float = 1e-6;

pub fn sample_uniform_square(u: &Vector2f) -> Vector2f {
    *u
}

pub fn sample_uniform_square_pdf(p: &Vector2f) -> Float {
    if p.x >= 0.0 && p.x <= 1.0 && p.y >= 0.0 && p.y <= 1.0 {
        1.0
    } else {
        0.0
    }
}

fn invert_tent_1d(u: Float) -> Float {
    if u < 0.5 {
        -1.0 + (2.0 * u).sqrt()
    } else {
        1.0 - (2.0 * (1.0 - u)).sqrt()
    }
}

fn tent_1d_pdf(t: Float) -> Float {
    if t >= -1.0 && t <= 1.0 {
        1.0 - t.abs()
    } else {
        0.0
    }
}

/// Tent distribution on [-1,1]^2, sampled by per-axis CDF inversion.
pub fn sample_tent(u: &Vector2f) -> Vector2f {
    Vector2f::new(invert_tent_1d(u.x), invert_tent_1d(u.y))
}

pub fn sample_tent_pdf(p: &Vector2f) -> Float {
    tent_1d_pdf(p.x) * tent_1d_pdf(p.y)
}

pub fn sample_uniform_disk(u: &Vector2f) -> Vector2f {
    let r = u.x.sqrt();
    let theta = 2.0 * PI * u.y;
    Vector2f::new(r * theta.cos(), r * theta.sin())
}

pub fn sample_uniform_disk_pdf(p: &Vector2f) -> Float {
    if p.x * p.x + p.y * p.y <= 1.0 {
        INV_PI
    } else {
        0.0
    }
}

/// Uniform point on the unit right triangle (0,0), (1,0), (0,1). The
/// fold keeps the result inside x >= 0, y >= 0, x + y <= 1.
pub fn sample_uniform_triangle(u: &Vector2f) -> Vector2f {
    let mut s = u.x;
    let mut t = u.y;
    if s + t > 1.0 {
        s = 1.0 - s;
        t = 1.0 - t;
    }
    Vector2f::new(s, t)
}

pub fn sample_uniform_triangle_pdf(p: &Vector2f) -> Float {
    if p.x < 0.0 || p.y < 0.0 || p.x + p.y > 1.0 {
        return 0.0;
    }
    // 1 / area of the unit right triangle
    2.0
}

pub fn sample_uniform_sphere(u: &Vector2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_sphere_pdf(v: &Vector3f) -> Float {
    if (v.norm() - 1.0).abs() < NORM_TOLERANCE {
        INV_FOUR_PI
    } else {
        0.0
    }
}

pub fn sample_uniform_hemisphere(u: &Vector2f) -> Vector3f {
    let z = u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_hemisphere_pdf(v: &Vector3f) -> Float {
    if v.z < 0.0 || (v.norm() - 1.0).abs() >= NORM_TOLERANCE {
        0.0
    } else {
        INV_TWO_PI
    }
}

/// Cosine-weighted hemisphere direction, the importance distribution
/// matched to Lambertian scattering.
pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let cos_theta = u.x.sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

pub fn sample_cosine_hemisphere_pdf(v: &Vector3f) -> Float {
    if v.z < 0.0 || (v.norm() - 1.0).abs() >= NORM_TOLERANCE {
        0.0
    } else {
        v.z * INV_PI
    }
}

/// Beckmann-distributed microfacet normal for roughness alpha.
pub fn sample_beckmann(u: &Vector2f, alpha: Float) -> Vector3f {
    let phi = 2.0 * PI * u.y;
    let theta = (alpha * (-(1.0 - u.x).ln()).sqrt()).atan();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Density of `sample_beckmann` over the sampled normal itself. Callers
/// sampling an outgoing direction still owe the half-vector Jacobian.
pub fn sample_beckmann_pdf(m: &Vector3f, alpha: Float) -> Float {
    if m.z <= 0.0 {
        return 0.0;
    }
    let cos_theta = m.z;
    let tan_theta2 = (1.0 - cos_theta * cos_theta) / (cos_theta * cos_theta);
    let alpha2 = alpha * alpha;
    (-tan_theta2 / alpha2).exp() / (PI * alpha2 * cos_theta * cos_theta * cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::{IndependentSampler, Sampler};

    const SAMPLE_COUNT: usize = 200_000;

    fn grid_inputs(resolution: usize) -> Vec<Vector2f> {
        let mut inputs = Vec::with_capacity(resolution * resolution);
        for i in 0..resolution {
            for j in 0..resolution {
                inputs.push(Vector2f::new(
                    (i as Float + 0.5) / resolution as Float,
                    (j as Float + 0.5) / resolution as Float,
                ));
            }
        }
        inputs
    }

    #[test]
    fn test_warp_outputs_stay_in_support() {
        for u in grid_inputs(64) {
            let p = sample_uniform_square(&u);
            assert!(p.x >= 0.0 && p.x <= 1.0 && p.y >= 0.0 && p.y <= 1.0);

            let p = sample_tent(&u);
            assert!(p.x >= -1.0 - 1e-5 && p.x <= 1.0 + 1e-5);
            assert!(p.y >= -1.0 - 1e-5 && p.y <= 1.0 + 1e-5);

            let p = sample_uniform_disk(&u);
            assert!(p.x * p.x + p.y * p.y <= 1.0 + 1e-5);

            let p = sample_uniform_triangle(&u);
            assert!(p.x >= 0.0 && p.y >= 0.0 && p.x + p.y <= 1.0 + 1e-5);

            let v = sample_uniform_sphere(&u);
            assert!((v.norm() - 1.0).abs() < 1e-5);

            let v = sample_uniform_hemisphere(&u);
            assert!(v.z >= 0.0 && (v.norm() - 1.0).abs() < 1e-5);

            let v = sample_cosine_hemisphere(&u);
            assert!(v.z >= 0.0 && (v.norm() - 1.0).abs() < 1e-5);

            let m = sample_beckmann(&u, 0.5);
            assert!(m.z > 0.0 && (m.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pdfs_vanish_outside_support() {
        assert_eq!(sample_uniform_square_pdf(&Vector2f::new(1.2, 0.5)), 0.0);
        assert_eq!(sample_tent_pdf(&Vector2f::new(-1.5, 0.0)), 0.0);
        assert_eq!(sample_uniform_disk_pdf(&Vector2f::new(0.9, 0.9)), 0.0);
        assert_eq!(sample_uniform_triangle_pdf(&Vector2f::new(0.8, 0.5)), 0.0);
        assert_eq!(sample_uniform_sphere_pdf(&Vector3f::new(0.0, 0.0, 0.5)), 0.0);
        assert_eq!(sample_uniform_hemisphere_pdf(&Vector3f::new(0.0, 0.0, -1.0)), 0.0);
        assert_eq!(sample_cosine_hemisphere_pdf(&Vector3f::new(0.6, 0.0, -0.8)), 0.0);
        assert_eq!(sample_beckmann_pdf(&Vector3f::new(0.0, 0.6, -0.8), 0.3), 0.0);
    }

    // Integrate each pdf over its domain with an independent proposal
    // distribution; the estimate must converge to 1.
    #[test]
    fn test_pdfs_integrate_to_one() {
        let mut sampler = IndependentSampler::new(42);

        let mut tent = 0.0f64;
        let mut disk = 0.0f64;
        let mut triangle = 0.0f64;
        let mut cosine = 0.0f64;
        let mut beckmann = 0.0f64;
        for _ in 0..SAMPLE_COUNT {
            let u = sampler.next_2d();

            // Proposals on [-1,1]^2 (area 4) for the planar warps.
            let p = Vector2f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0);
            tent += (sample_tent_pdf(&p) * 4.0) as f64;
            disk += (sample_uniform_disk_pdf(&p) * 4.0) as f64;
            triangle += sample_uniform_triangle_pdf(&sample_uniform_square(&u)) as f64;

            // Uniform hemisphere proposal for the directional warps.
            let v = sample_uniform_hemisphere(&u);
            cosine += (sample_cosine_hemisphere_pdf(&v) / sample_uniform_hemisphere_pdf(&v)) as f64;
            beckmann += (sample_beckmann_pdf(&v, 0.5) / sample_uniform_hemisphere_pdf(&v)) as f64;
        }
        let n = SAMPLE_COUNT as f64;
        assert!((tent / n - 1.0).abs() < 0.02, "tent integral = {}", tent / n);
        assert!((disk / n - 1.0).abs() < 0.02, "disk integral = {}", disk / n);
        assert!((triangle / n - 1.0).abs() < 0.02, "triangle integral = {}", triangle / n);
        assert!((cosine / n - 1.0).abs() < 0.02, "cosine integral = {}", cosine / n);
        assert!((beckmann / n - 1.0).abs() < 0.04, "beckmann integral = {}", beckmann / n);
    }

    // First moments of the sampled distributions against closed forms.
    #[test]
    fn test_sample_moments() {
        let mut sampler = IndependentSampler::new(7);

        let mut tent_x = 0.0f64;
        let mut disk_r2 = 0.0f64;
        let mut triangle_x = 0.0f64;
        let mut sphere_z = 0.0f64;
        let mut hemisphere_z = 0.0f64;
        let mut cosine_z = 0.0f64;
        for _ in 0..SAMPLE_COUNT {
            let u = sampler.next_2d();
            tent_x += sample_tent(&u).x as f64;
            let d = sample_uniform_disk(&u);
            disk_r2 += (d.x * d.x + d.y * d.y) as f64;
            triangle_x += sample_uniform_triangle(&u).x as f64;
            sphere_z += sample_uniform_sphere(&u).z as f64;
            hemisphere_z += sample_uniform_hemisphere(&u).z as f64;
            cosine_z += sample_cosine_hemisphere(&u).z as f64;
        }
        let n = SAMPLE_COUNT as f64;
        assert!((tent_x / n).abs() < 0.01);
        assert!((disk_r2 / n - 0.5).abs() < 0.01);
        assert!((triangle_x / n - 1.0 / 3.0).abs() < 0.01);
        assert!((sphere_z / n).abs() < 0.01);
        assert!((hemisphere_z / n - 0.5).abs() < 0.01);
        assert!((cosine_z / n - 2.0 / 3.0).abs() < 0.01);
    }
}
