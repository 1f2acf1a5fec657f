// Copyright @yucwang 2026

use crate::math::constants::{Float, PI, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::RgbSpectrum;

/// Beckmann normal distribution, evaluated for a microfacet normal in
/// the local frame. Zero below the horizon.
pub fn beckmann_ndf(m: &Vector3f, alpha: Float) -> Float {
    let cos_theta = Frame::cos_theta(m);
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let cos2 = cos_theta * cos_theta;
    let tan2 = (1.0 - cos2) / cos2;
    let alpha2 = alpha * alpha;
    (-tan2 / alpha2).exp() / (PI * alpha2 * cos2 * cos2)
}

/// Smith shadowing-masking for one direction under the Beckmann
/// distribution (rational approximation).
pub fn smith_beckmann_g1(v: &Vector3f, m: &Vector3f, alpha: Float) -> Float {
    let cos_theta = Frame::cos_theta(v);
    if cos_theta <= 0.0 || v.dot(m) / cos_theta <= 0.0 {
        return 0.0;
    }
    let tan_theta = Frame::tan_theta(v).abs();
    if tan_theta == 0.0 {
        return 1.0;
    }
    let b = 1.0 / (alpha * tan_theta);
    if b >= 1.6 {
        return 1.0;
    }
    (3.535 * b + 2.181 * b * b) / (1.0 + 2.276 * b + 2.577 * b * b)
}

/// Anisotropic GGX distribution with separate roughness along the
/// local tangent and bitangent axes.
pub fn ggx_aniso_ndf(m: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    let cos_theta = Frame::cos_theta(m);
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let cos2 = cos_theta * cos_theta;
    let cos4 = cos2 * cos2;
    let tan2 = (1.0 - cos2) / cos2;
    let cos_phi2 = Frame::cos_phi2(m);
    let sin_phi2 = Frame::sin_phi2(m);
    let exponent = (cos_phi2 / (alpha_u * alpha_u) + sin_phi2 / (alpha_v * alpha_v)) * tan2;
    let denom = PI * alpha_u * alpha_v * cos4 * (1.0 + exponent) * (1.0 + exponent);
    1.0 / denom
}

/// GGX Lambda term, with the roughness projected onto the azimuth of
/// the queried direction.
pub fn ggx_aniso_lambda(v: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    if Frame::cos_theta(v) <= 0.0 {
        return 0.0;
    }
    let tan_theta = Frame::tan_theta(v).abs();
    if tan_theta == 0.0 {
        return 0.0;
    }
    let cos_phi2 = Frame::cos_phi2(v);
    let sin_phi2 = Frame::sin_phi2(v);
    let alpha2 = cos_phi2 * alpha_u * alpha_u + sin_phi2 * alpha_v * alpha_v;
    0.5 * (-1.0 + (1.0 + alpha2 * tan_theta * tan_theta).sqrt())
}

pub fn smith_aniso_g1(v: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    1.0 / (1.0 + ggx_aniso_lambda(v, alpha_u, alpha_v))
}

pub fn smith_aniso_g(wi: &Vector3f, wo: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    1.0 / (1.0 + ggx_aniso_lambda(wi, alpha_u, alpha_v) + ggx_aniso_lambda(wo, alpha_u, alpha_v))
}

/// Sample a microfacet normal from the distribution of normals visible
/// from `wi`: stretch to unit roughness, pick a point on the projected
/// tangent disk, reproject onto the hemisphere, unstretch.
pub fn sample_visible_normal(wi: &Vector3f, u: &Vector2f,
                             alpha_u: Float, alpha_v: Float) -> Vector3f {
    let mut wh = Vector3f::new(alpha_u * wi.x, alpha_v * wi.y, wi.z).normalize();
    if wh.z < 0.0 {
        wh = -wh;
    }

    let t1 = if wh.z.abs() < 0.999 {
        wh.cross(&Vector3f::new(0.0, 0.0, 1.0)).normalize()
    } else {
        Vector3f::new(1.0, 0.0, 0.0)
    };
    let t2 = wh.cross(&t1);

    let r = u.x.sqrt();
    let phi = 2.0 * PI * u.y;
    let p1 = r * phi.cos();
    let mut p2 = r * phi.sin();
    let s = 0.5 * (1.0 + wh.z);
    p2 = (1.0 - s) * (1.0 - p1 * p1).max(0.0).sqrt() + s * p2;

    let pz = (1.0 - p1 * p1 - p2 * p2).max(0.0).sqrt();
    let nh = t1 * p1 + t2 * p2 + wh * pz;
    Vector3f::new(alpha_u * nh.x, alpha_v * nh.y, nh.z.max(1e-6)).normalize()
}

/// Density of `sample_visible_normal` over the microfacet normal.
pub fn visible_normal_pdf(wi: &Vector3f, m: &Vector3f,
                          alpha_u: Float, alpha_v: Float) -> Float {
    let cos_theta = Frame::cos_theta(wi);
    if cos_theta <= 0.0 || Frame::cos_theta(m) <= 0.0 {
        return 0.0;
    }
    let d = ggx_aniso_ndf(m, alpha_u, alpha_v);
    let g1 = smith_aniso_g1(wi, alpha_u, alpha_v);
    g1 * d * wi.dot(m).max(0.0) / cos_theta
}

/// Unpolarized Fresnel reflectance at a dielectric boundary.
pub fn fresnel_dielectric(cos_theta_i: Float, ext_ior: Float, int_ior: Float) -> Float {
    if ext_ior == int_ior {
        return 0.0;
    }
    let (eta_i, eta_t, cos_i) = if cos_theta_i >= 0.0 {
        (ext_ior, int_ior, cos_theta_i.min(1.0))
    } else {
        (int_ior, ext_ior, (-cos_theta_i).min(1.0))
    };

    let eta = eta_i / eta_t;
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i);
    if sin2_t > 1.0 {
        // total internal reflection
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_s = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    let r_p = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    0.5 * (r_s * r_s + r_p * r_p)
}

/// Schlick's approximation with reflectance `r0` at normal incidence.
pub fn fresnel_schlick(r0: RgbSpectrum, cos_theta: Float) -> RgbSpectrum {
    let cos_theta = cos_theta.max(0.0).min(1.0);
    let one_minus = (1.0 - cos_theta).powi(5);
    r0 + (RgbSpectrum::from_float(1.0) - r0) * one_minus
}

/// Exact Fresnel reflectance for a conductor with complex refractive
/// index eta + i*k, per color channel.
pub fn fresnel_conductor(cos_theta_i: Float, eta: RgbSpectrum, k: RgbSpectrum) -> RgbSpectrum {
    let cos_theta_i = cos_theta_i.max(0.0).min(1.0);
    let cos2 = cos_theta_i * cos_theta_i;
    let sin2 = 1.0 - cos2;

    let mut result = RgbSpectrum::black();
    for c in 0..3 {
        let eta2 = eta[c] * eta[c];
        let k2 = k[c] * k[c];
        let t0 = eta2 - k2 - sin2;
        let a2plusb2 = (t0 * t0 + 4.0 * eta2 * k2).sqrt();
        let t1 = a2plusb2 + cos2;
        let a = (0.5 * (a2plusb2 + t0)).max(0.0).sqrt();
        let t2 = 2.0 * a * cos_theta_i;
        let r_s = (t1 - t2) / (t1 + t2);
        let t3 = cos2 * a2plusb2 + sin2 * sin2;
        let t4 = t2 * sin2;
        let r_p = r_s * (t3 - t4) / (t3 + t4);
        result[c] = 0.5 * (r_s + r_p);
    }
    result
}

pub fn reflect(wi: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * wi.dot(m) * m - wi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sampler::{IndependentSampler, Sampler};
    use crate::math::warp;

    #[test]
    fn test_fresnel_dielectric_limits() {
        // Normal incidence: ((n1 - n2)/(n1 + n2))^2
        let f0 = fresnel_dielectric(1.0, 1.0, 1.5);
        assert!((f0 - 0.04).abs() < 1e-3, "f0 = {}", f0);

        // Grazing incidence approaches total reflection.
        let fg = fresnel_dielectric(1e-4, 1.0, 1.5);
        assert!(fg > 0.98, "fg = {}", fg);

        // Matched media never reflect.
        assert_eq!(fresnel_dielectric(0.7, 1.5, 1.5), 0.0);

        // From the dense side, shallow angles are totally reflected.
        assert_eq!(fresnel_dielectric(-0.2, 1.0, 1.5), 1.0);
    }

    #[test]
    fn test_fresnel_schlick_limits() {
        let r0 = RgbSpectrum::new(0.2, 0.4, 0.6);
        let at_normal = fresnel_schlick(r0, 1.0);
        assert!((at_normal[0] - 0.2).abs() < 1e-6);

        let grazing = fresnel_schlick(r0, 0.0);
        assert!((grazing.max_coeff() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fresnel_conductor_is_bounded() {
        let eta = RgbSpectrum::new(0.17, 0.35, 1.5);
        let k = RgbSpectrum::new(3.1, 2.7, 1.9);
        for i in 1..=10 {
            let f = fresnel_conductor(i as Float / 10.0, eta, k);
            for c in 0..3 {
                assert!(f[c] >= 0.0 && f[c] <= 1.0, "f[{}] = {}", c, f[c]);
            }
        }
    }

    #[test]
    fn test_aniso_ndf_matches_isotropic_ggx() {
        let alpha = 0.35;
        let m = Vector3f::new(0.3, -0.2, 0.9).normalize();
        let aniso = ggx_aniso_ndf(&m, alpha, alpha);

        let a2 = alpha * alpha;
        let cos2 = m.z * m.z;
        let denom = cos2 * (a2 - 1.0) + 1.0;
        let iso = a2 / (PI * denom * denom);
        assert!((iso - aniso).abs() / iso < 1e-4, "iso {} aniso {}", iso, aniso);
    }

    #[test]
    fn test_smith_g1_bounds() {
        let alpha = 0.25;
        let m = Vector3f::new(0.0, 0.0, 1.0);
        for i in 1..=9 {
            let z = i as Float / 10.0;
            let v = Vector3f::new((1.0 - z * z).sqrt(), 0.0, z);
            let g1 = smith_beckmann_g1(&v, &m, alpha);
            assert!(g1 >= 0.0 && g1 <= 1.0);
            let g1_aniso = smith_aniso_g1(&v, alpha, alpha);
            assert!(g1_aniso >= 0.0 && g1_aniso <= 1.0);
        }
        // Near-normal view is essentially unshadowed.
        assert!(smith_beckmann_g1(&Vector3f::new(0.05, 0.0, 0.999), &m, alpha) > 0.99);
    }

    #[test]
    fn test_visible_normals_stay_above_horizon() {
        let mut sampler = IndependentSampler::new(11);
        let wi = Vector3f::new(0.6, -0.3, 0.5).normalize();
        for _ in 0..2000 {
            let u = sampler.next_2d();
            let m = sample_visible_normal(&wi, &u, 0.3, 0.15);
            assert!(m.z > 0.0);
            assert!((m.norm() - 1.0).abs() < 1e-5);
            assert!(visible_normal_pdf(&wi, &m, 0.3, 0.15) > 0.0);
        }
    }

    // The visible-normal density integrates to 1 over the hemisphere.
    #[test]
    fn test_visible_normal_pdf_normalization() {
        let mut sampler = IndependentSampler::new(23);
        let wi = Vector3f::new(0.4, 0.2, 0.8).normalize();
        let (alpha_u, alpha_v) = (0.4, 0.3);
        let mut integral = 0.0f64;
        let count = 200_000;
        for _ in 0..count {
            let u = sampler.next_2d();
            let m = warp::sample_uniform_hemisphere(&u);
            let q = warp::sample_uniform_hemisphere_pdf(&m);
            if q > 0.0 {
                integral += (visible_normal_pdf(&wi, &m, alpha_u, alpha_v) / q) as f64;
            }
        }
        let integral = integral / count as f64;
        assert!((integral - 1.0).abs() < 0.05, "integral = {}", integral);
    }
}
