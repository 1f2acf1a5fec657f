// Copyright @yucwang 2023

use super::constants::{Float, Vector3f};

/// Orthonormal shading basis. Local directions use the convention that
/// the surface normal is the +z axis.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub s: Vector3f,
    pub t: Vector3f,
    pub n: Vector3f,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            s: Vector3f::new(1.0, 0.0, 0.0),
            t: Vector3f::new(0.0, 1.0, 0.0),
            n: Vector3f::new(0.0, 0.0, 1.0),
        }
    }
}

impl Frame {
    pub fn new(s: Vector3f, t: Vector3f, n: Vector3f) -> Self {
        Frame { s, t, n }
    }

    /// Complete a unit normal into an orthonormal basis.
    pub fn from_normal(n: &Vector3f) -> Self {
        let up = if n.z.abs() < 0.999 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let s = n.cross(&up).normalize();
        let t = n.cross(&s);
        Frame { s, t, n: *n }
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.s * v.x + self.t * v.y + self.n * v.z
    }

    pub fn cos_theta(v: &Vector3f) -> Float {
        v.z
    }

    pub fn sin_theta2(v: &Vector3f) -> Float {
        (1.0 - v.z * v.z).max(0.0)
    }

    pub fn sin_theta(v: &Vector3f) -> Float {
        Self::sin_theta2(v).sqrt()
    }

    pub fn tan_theta(v: &Vector3f) -> Float {
        let sin2 = Self::sin_theta2(v);
        if sin2 <= 0.0 {
            0.0
        } else {
            sin2.sqrt() / v.z
        }
    }

    pub fn cos_phi2(v: &Vector3f) -> Float {
        let sin2 = Self::sin_theta2(v);
        if sin2 <= 0.0 {
            1.0
        } else {
            (v.x * v.x / sin2).min(1.0)
        }
    }

    pub fn sin_phi2(v: &Vector3f) -> Float {
        let sin2 = Self::sin_theta2(v);
        if sin2 <= 0.0 {
            0.0
        } else {
            (v.y * v.y / sin2).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, Vector3f};

    #[test]
    fn test_frame_orthonormal() {
        let n = Vector3f::new(1.0, 2.0, -0.5).normalize();
        let frame = Frame::from_normal(&n);

        assert!((frame.s.norm() - 1.0).abs() < 1e-5);
        assert!((frame.t.norm() - 1.0).abs() < 1e-5);
        assert!(frame.s.dot(&frame.t).abs() < 1e-5);
        assert!(frame.s.dot(&frame.n).abs() < 1e-5);
        assert!(frame.t.dot(&frame.n).abs() < 1e-5);
    }

    #[test]
    fn test_frame_round_trip() {
        let n = Vector3f::new(0.3, -0.4, 0.8).normalize();
        let frame = Frame::from_normal(&n);

        let v = Vector3f::new(0.2, 0.7, -0.3);
        let back = frame.to_world(&frame.to_local(&v));
        assert!((back - v).norm() < 1e-5);

        let local_n = frame.to_local(&n);
        assert!((local_n - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_frame_trig_helpers() {
        let v = Vector3f::new(0.48, 0.36, 0.8);
        assert!((Frame::cos_theta(&v) - 0.8).abs() < 1e-6);
        assert!((Frame::sin_theta(&v) - 0.6).abs() < 1e-5);
        assert!((Frame::tan_theta(&v) - 0.75).abs() < 1e-5);
        assert!((Frame::cos_phi2(&v) - 0.64).abs() < 1e-4);
        assert!((Frame::sin_phi2(&v) - 0.36).abs() < 1e-4);
    }
}
