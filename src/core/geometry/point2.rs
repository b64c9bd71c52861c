use std::ops::*;
use num;
use super::super::mc::Float;

pub type Point2f = Point2<Float>;

/// A 2D Point. Also used to carry a pair of canonical uniform samples.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Point2<T> {
    pub x: T,
    pub y: T
}

impl<T> Point2<T> {
    pub fn new(x: T, y: T) -> Point2<T> {
        Point2::<T>{x, y}
    }

    /// Create a new Point2 with both components 0.
    pub fn zero() -> Point2<T>
    where
    T: num::Zero
    {
        Point2::<T>{
            x: T::zero(),
            y: T::zero()
        }
    }

    /// Squared distance from the origin.
    #[inline]
    pub fn length_squared(&self) -> T
    where
    T: Copy + Add<T, Output = T> + Mul<T, Output = T>
    {
        self.x * self.x + self.y * self.y
    }
}

impl<T> Index<usize> for Point2<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Index out of range for Point2"),
        }
    }
}

impl<T> Mul<T> for Point2<T>
where
T: Copy + Mul<T, Output = T>
{
    type Output = Self;
    #[inline]
    fn mul(self, rhs: T) -> Self {
        Point2::<T>{
            x: self.x * rhs,
            y: self.y * rhs
        }
    }
}

reverse_mul_scalar!(Point2, {x, y});
