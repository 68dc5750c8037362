use auto_ops::impl_op_ex;
use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::iter::Sum;

use crate::Float;

/// A three-momentum backed by a [`nalgebra::Vector3`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3(pub(crate) Vector3<Float>);

impl Default for Vec3 {
    fn default() -> Self {
        Self(Vector3::zeros())
    }
}

impl Vec3 {
    /// Construct a three-momentum from its Cartesian components.
    pub fn new(px: Float, py: Float, pz: Float) -> Self {
        Self(Vector3::new(px, py, pz))
    }
    pub fn px(&self) -> Float {
        self.0.x
    }
    pub fn py(&self) -> Float {
        self.0.y
    }
    pub fn pz(&self) -> Float {
        self.0.z
    }
    pub fn dot(&self, other: &Self) -> Float {
        self.0.dot(&other.0)
    }
    /// The squared magnitude of the momentum.
    pub fn mag2(&self) -> Float {
        self.0.norm_squared()
    }
    /// The magnitude of the momentum.
    pub fn mag(&self) -> Float {
        self.0.norm()
    }
    /// The momentum component transverse to the beam ($`z`$) axis.
    pub fn pt(&self) -> Float {
        self.0.x.hypot(self.0.y)
    }
    /// Promote to a four-momentum with the given invariant mass.
    pub fn with_mass(&self, mass: Float) -> Vec4 {
        let e = (mass * mass + self.mag2()).sqrt();
        self.with_energy(e)
    }
    /// Promote to a four-momentum with the given energy.
    pub fn with_energy(&self, energy: Float) -> Vec4 {
        Vec4::new(self.px(), self.py(), self.pz(), energy)
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3(a.0 + b.0) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3(a.0 - b.0) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3(-a.0) });
impl_op_ex!(*|a: &Vec3, b: &Float| -> Vec3 { Vec3(a.0 * *b) });
impl_op_ex!(/ |a: &Vec3, b: &Float| -> Vec3 { Vec3(a.0 / *b) });

impl Sum for Vec3 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, v| acc + v)
    }
}

/// A four-momentum backed by a [`nalgebra::Vector4`], stored as
/// $`(p_x, p_y, p_z, E)`$ with the $`+---`$ metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec4(pub(crate) Vector4<Float>);

impl Default for Vec4 {
    fn default() -> Self {
        Self(Vector4::zeros())
    }
}

impl Vec4 {
    /// Construct a four-momentum from its Cartesian components and energy.
    pub fn new(px: Float, py: Float, pz: Float, e: Float) -> Self {
        Self(Vector4::new(px, py, pz, e))
    }
    /// Construct a massless four-momentum from cylindrical coordinates
    /// $`(p_T, \eta, \phi)`$.
    pub fn massless_from_cylindrical(pt: Float, eta: Float, phi: Float) -> Self {
        Self::new(
            pt * phi.cos(),
            pt * phi.sin(),
            pt * eta.sinh(),
            pt * eta.cosh(),
        )
    }
    pub fn px(&self) -> Float {
        self.0.x
    }
    pub fn py(&self) -> Float {
        self.0.y
    }
    pub fn pz(&self) -> Float {
        self.0.z
    }
    pub fn e(&self) -> Float {
        self.0.w
    }
    /// The spatial part of the four-momentum.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.0.x, self.0.y, self.0.z)
    }
    /// The momentum component transverse to the beam ($`z`$) axis.
    pub fn pt(&self) -> Float {
        self.0.x.hypot(self.0.y)
    }
    /// The invariant mass squared, $`E^2 - |\vec{p}|^2`$. May be negative for
    /// non-physical (spacelike) vectors.
    pub fn mag2(&self) -> Float {
        self.e() * self.e() - self.vec3().mag2()
    }
    /// The invariant mass. Yields NaN when [`Vec4::mag2`] is negative; callers
    /// which need to distinguish non-physical reconstructions must not clip
    /// this away.
    pub fn mag(&self) -> Float {
        self.mag2().sqrt()
    }
    /// Format as `[px, py, pz; e]` for display output.
    pub fn to_p4_string(&self) -> String {
        format!(
            "[{:.5}, {:.5}, {:.5}; {:.5}]",
            self.px(),
            self.py(),
            self.pz(),
            self.e()
        )
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4(a.0 + b.0) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { Vec4(a.0 - b.0) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4(-a.0) });
impl_op_ex!(*|a: &Vec4, b: &Float| -> Vec4 { Vec4(a.0 * *b) });
impl_op_ex!(/ |a: &Vec4, b: &Float| -> Vec4 { Vec4(a.0 / *b) });

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, v| acc + v)
    }
}
