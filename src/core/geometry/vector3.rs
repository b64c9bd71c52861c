use std::ops::*;
use std::fmt;
use num;
use super::super::mc::Float;
use super::Point3;

pub type Vector3f = Vector3<Float>;
pub type Vector3i = Vector3<i32>;

/// Representation of a 3D Vector.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl<T> Vector3<T> {
    #[inline]
    pub fn new(x: T, y: T, z: T) -> Vector3<T> {
        Vector3::<T>{x, y, z}
    }

    #[inline]
    pub fn zero() -> Vector3<T>
    where
    T: num::Zero
    {
        Vector3::<T>{x: T::zero(), y: T::zero(), z: T::zero()}
    }

    /// Calculate the squared length of the Vector3.
    #[inline]
    pub fn length_squared(&self) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Calculate the length of the Vector3.
    #[inline]
    pub fn length(&self) -> Float
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T> + Into<Float> {
        Float::sqrt((self.x * self.x + self.y * self.y + self.z * self.z).into())
    }

    /// Calculate the dot product of two Vector3.
    #[inline]
    pub fn dot(&self, o: &Vector3<T>) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Calculate the cross product of two Vector3
    pub fn cross(&self, o: &Vector3<T>) -> Vector3<Float>
    where
    T: Copy + Into<Float>
    {
        let v1x: Float = self.x.into();
        let v1y: Float = self.y.into();
        let v1z: Float = self.z.into();
        let v2x: Float = o.x.into();
        let v2y: Float = o.y.into();
        let v2z: Float = o.z.into();
        Vector3::<Float>{
            x: (v1y * v2z) - (v1z * v2y),
            y: (v1z * v2x) - (v1x * v2z),
            z: (v1x * v2y) - (v1y * v2x)
        }
    }

    /// Returns the Vector3 normalized to unit length.
    pub fn normalize(&self) -> Vector3<Float>
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T> + Into<Float>
    {
        let length: Float = 1.0 as Float / self.length();
        Vector3::<Float>{
            x: self.x.into() * length,
            y: self.y.into() * length,
            z: self.z.into() * length,
        }
    }
}

impl Vector3<Float> {
    /// Test whether the vector has unit length to within `tolerance`.
    pub fn is_unit(&self, tolerance: Float) -> bool {
        (self.length_squared() - 1.0).abs() <= tolerance
    }
}

impl<T> Index<usize> for Vector3<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Index out of range for Vector3"),
        }
    }
}

impl<T> IndexMut<usize> for Vector3<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Index out of range for Vector3"),
        }
    }
}

impl<T> Neg for Vector3<T>
where
T: Neg<Output = T>
{
    type Output = Self;

    fn neg(self) -> Vector3<T> {
        Vector3::<T>{
            x: -self.x,
            y: -self.y,
            z: -self.z
        }
    }
}

impl Div<Float> for Vector3<Float>
{
    type Output = Self;
    #[inline]
    fn div(self, rhs: Float) -> Self {
        let inv = 1.0 / rhs;
        Vector3::<Float>{
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv
        }
    }
}

impl<T> Mul<T> for Vector3<T>
where
T: Copy + Mul<T, Output = T>
{
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Vector3::<T>{
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs
        }
    }
}

reverse_mul_scalar!(Vector3, {x, y, z});

impl<T> MulAssign<T> for Vector3<T>
where
T: Copy + MulAssign
{
    #[inline]
    fn mul_assign(&mut self, rhs: T) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl<T> Add<Vector3<T>> for Vector3<T>
where
T: Add<T, Output = T>
{
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vector3::<T>{
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z
        }
    }
}

impl<T> AddAssign<Vector3<T>> for Vector3<T>
where
T: AddAssign
{
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl<T> Sub<Vector3<T>> for Vector3<T>
where
T: Sub<T, Output = T>
{
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vector3::<T>{
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z
        }
    }
}

impl<T> From<[T; 3]> for Vector3<T>
where
T: Copy
{
    fn from(v: [T; 3]) -> Vector3<T> {
        Vector3::<T>{
            x: v[0],
            y: v[1],
            z: v[2]
        }
    }
}

impl<T> From<Point3<T>> for Vector3<T> {
    fn from(p: Point3<T>) -> Vector3<T> {
        Vector3::<T>{
            x: p.x,
            y: p.y,
            z: p.z
        }
    }
}

impl<T: fmt::Display> fmt::Display for Vector3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}

/// Construct a local coordinate system given only a single 3D vector.
/// Expects v1 to be normalized.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        let length = (v1.x * v1.x + v1.z * v1.z).sqrt();
        Vector3f{
            x: -v1.z / length,
            y: 0.0,
            z: v1.x / length
        }
    }
    else {
        let length = (v1.y * v1.y + v1.z * v1.z).sqrt();
        Vector3f{
            x: 0.0,
            y: v1.z / length,
            z: -v1.y / length
        }
    };
    let v3 = v1.cross(&v2);
    (v2, v3)
}
