use std::ops::*;
use std::fmt;
use num;
use super::super::mc::Float;
use super::Vector3;

pub type Point3f = Point3<Float>;
pub type Point3i = Point3<i32>;

/// A 3D Point.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Point3<T> {
    pub x: T,
    pub y: T,
    pub z: T
}

impl<T> Point3<T> {
    pub fn new(x: T, y: T, z: T) -> Point3<T> {
        Point3::<T>{x, y, z}
    }

    /// Create a new Point3 with all components 0.
    pub fn zero() -> Point3<T>
    where
    T: num::Zero
    {
        Point3::<T>{
            x: T::zero(),
            y: T::zero(),
            z: T::zero()
        }
    }

    /// Calculate the squared distance between two Point3.
    #[inline]
    pub fn distance_squared(&self, o: &Point3<T>) -> T
    where
    T: Copy + Add<T, Output = T> + Sub<T, Output = T> + Mul<T, Output = T>
    {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        let dz = self.z - o.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Calculate the distance between two Point3.
    #[inline]
    pub fn distance(&self, o: &Point3<T>) -> Float
    where
    T: Copy + Add<T, Output = T> + Sub<T, Output = T> + Mul<T, Output = T> + Into<Float> {
        Float::sqrt(self.distance_squared(o).into())
    }

    /// Returns a component wise minimum.
    #[inline]
    pub fn min(&self, other: &Point3<T>) -> Point3<T>
    where
    T: Copy + PartialOrd
    {
        Point3::<T>{
            x: if self.x < other.x { self.x } else { other.x },
            y: if self.y < other.y { self.y } else { other.y },
            z: if self.z < other.z { self.z } else { other.z }
        }
    }

    /// Returns a component wise maximum.
    #[inline]
    pub fn max(&self, other: &Point3<T>) -> Point3<T>
    where
    T: Copy + PartialOrd
    {
        Point3::<T>{
            x: if self.x > other.x { self.x } else { other.x },
            y: if self.y > other.y { self.y } else { other.y },
            z: if self.z > other.z { self.z } else { other.z }
        }
    }
}

impl Point3<Float> {
    /// Distance of the point from the z axis through `(cx, cy)`.
    #[inline]
    pub fn radial_distance(&self, cx: Float, cy: Float) -> Float {
        ((self.x - cx) * (self.x - cx) + (self.y - cy) * (self.y - cy)).sqrt()
    }
}

impl<T> Index<usize> for Point3<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Index out of range for Point3"),
        }
    }
}

impl<T> IndexMut<usize> for Point3<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("Index out of range for Point3"),
        }
    }
}

impl<T> Add<Vector3<T>> for Point3<T>
where
T: Add<T, Output = T>
{
    type Output = Point3<T>;
    #[inline]
    fn add(self, rhs: Vector3<T>) -> Point3<T> {
        Point3::<T>{
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z
        }
    }
}

impl<T> AddAssign<Vector3<T>> for Point3<T>
where
T: AddAssign
{
    #[inline]
    fn add_assign(&mut self, rhs: Vector3<T>) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl<T> Sub<Point3<T>> for Point3<T>
where
T: Sub<T, Output = T>
{
    type Output = Vector3<T>;
    #[inline]
    fn sub(self, rhs: Point3<T>) -> Vector3<T> {
        Vector3::<T>{
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z
        }
    }
}

impl<T> Sub<Vector3<T>> for Point3<T>
where
T: Sub<T, Output = T>
{
    type Output = Point3<T>;
    #[inline]
    fn sub(self, rhs: Vector3<T>) -> Point3<T> {
        Point3::<T>{
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z
        }
    }
}

impl<T> From<[T; 3]> for Point3<T>
where
T: Copy
{
    fn from(v: [T; 3]) -> Point3<T> {
        Point3::<T>{
            x: v[0],
            y: v[1],
            z: v[2]
        }
    }
}

impl<T: fmt::Display> fmt::Display for Point3<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {} ]", self.x, self.y, self.z)
    }
}
