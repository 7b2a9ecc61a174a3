//! The fractal address space.
//!
//! An address is a base-3 string. Reading it left to right narrows the unit
//! triangle A=(0,0), B=(1,0), C=(0.5, sqrt(3)/2) one Sierpinski level per
//! digit: `0` keeps the corner at A, `1` the corner at B, `2` the corner at C.
//! The same strings name grammar symbols.

use crate::error::{GlyphError, Result};
use serde::{Deserialize, Serialize};

/// Deepest address the allocator will hand out.
pub const MAX_ADDRESS_DEPTH: usize = 20;

/// Barycentric slack for the containment test.
const CONTAINMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl Triangle {
    /// The root triangle every address subdivides.
    pub fn unit() -> Self {
        Self {
            a: Point::new(0.0, 0.0),
            b: Point::new(1.0, 0.0),
            c: Point::new(0.5, 3f64.sqrt() / 2.0),
        }
    }

    /// One level of Sierpinski subdivision.
    ///
    /// # Panics
    ///
    /// Panics if `digit > 2`.
    pub(crate) fn child(&self, digit: u8) -> Triangle {
        let ab = self.a.midpoint(self.b);
        let bc = self.b.midpoint(self.c);
        let ca = self.c.midpoint(self.a);
        match digit {
            0 => Triangle { a: self.a, b: ab, c: ca },
            1 => Triangle { a: ab, b: self.b, c: bc },
            2 => Triangle { a: ca, b: bc, c: self.c },
            _ => panic!("base-3 digit out of range: {digit}"),
        }
    }

    /// Centre of mass of the three corners.
    pub fn centroid(&self) -> Point {
        Point::new(
            (self.a.x + self.b.x + self.c.x) / 3.0,
            (self.a.y + self.b.y + self.c.y) / 3.0,
        )
    }

    /// Barycentric containment, inclusive of the edges.
    pub fn contains(&self, p: Point) -> bool {
        let v0 = (self.c.x - self.a.x, self.c.y - self.a.y);
        let v1 = (self.b.x - self.a.x, self.b.y - self.a.y);
        let v2 = (p.x - self.a.x, p.y - self.a.y);

        let dot00 = v0.0 * v0.0 + v0.1 * v0.1;
        let dot01 = v0.0 * v1.0 + v0.1 * v1.1;
        let dot02 = v0.0 * v2.0 + v0.1 * v2.1;
        let dot11 = v1.0 * v1.0 + v1.1 * v1.1;
        let dot12 = v1.0 * v2.0 + v1.1 * v2.1;

        let denom = dot00 * dot11 - dot01 * dot01;
        if denom == 0.0 {
            return false;
        }
        let u = (dot11 * dot02 - dot01 * dot12) / denom;
        let v = (dot00 * dot12 - dot01 * dot02) / denom;

        u >= -CONTAINMENT_EPSILON && v >= -CONTAINMENT_EPSILON && u + v <= 1.0 + CONTAINMENT_EPSILON
    }
}

/// `3^depth`, or `None` on overflow.
pub fn pow3(depth: usize) -> Option<u64> {
    3u64.checked_pow(u32::try_from(depth).ok()?)
}

/// Smallest depth `D` with `3^D >= slots`.
pub fn min_depth_for_slots(slots: u64) -> usize {
    let mut depth = 0;
    let mut capacity: u128 = 1;
    while capacity < slots as u128 {
        capacity *= 3;
        depth += 1;
    }
    depth
}

/// Base-3 digits of `value`, zero-padded to `width`.
pub fn to_base3(value: u64, width: usize) -> Result<String> {
    if pow3(width).is_some_and(|cap| value >= cap) {
        return Err(GlyphError::InvalidAddress(format!(
            "{value} does not fit in {width} base-3 digits"
        )));
    }

    let mut digits = vec![b'0'; width];
    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = b'0' + (rest % 3) as u8;
        rest /= 3;
    }
    if rest != 0 {
        return Err(GlyphError::InvalidAddress(format!(
            "{value} does not fit in {width} base-3 digits"
        )));
    }
    Ok(digits.into_iter().map(char::from).collect())
}

/// Integer value of a base-3 string.
pub fn from_base3(code: &str) -> Result<u64> {
    code.bytes().try_fold(0u64, |acc, byte| {
        let digit = base3_digit(byte, code)?;
        acc.checked_mul(3)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| GlyphError::InvalidAddress(format!("{code} overflows u64")))
    })
}

fn base3_digit(byte: u8, code: &str) -> Result<u8> {
    match byte {
        b'0'..=b'2' => Ok(byte - b'0'),
        _ => Err(GlyphError::InvalidAddress(format!(
            "{code:?} is not a base-3 string"
        ))),
    }
}

/// The sub-triangle selected by `code`.
pub fn address_triangle(code: &str) -> Result<Triangle> {
    code.bytes().try_fold(Triangle::unit(), |tri, byte| {
        Ok(tri.child(base3_digit(byte, code)?))
    })
}

/// Centroid of the sub-triangle selected by `code`.
pub fn address_to_point(code: &str) -> Result<Point> {
    Ok(address_triangle(code)?.centroid())
}

/// Exact inverse of [`address_to_point`] for addresses of width `depth`.
///
/// At every level the first of the sub-triangles `0, 1, 2` containing the
/// point gives the digit. A point outside the triangle, or inside a centre
/// hole of the subdivision, has no address.
pub fn point_to_address(point: Point, depth: usize) -> Result<String> {
    let mut tri = Triangle::unit();
    if !tri.contains(point) {
        return Err(off_lattice(point, 0));
    }

    let mut code = String::with_capacity(depth);
    for level in 0..depth {
        let (digit, child) = (0u8..3)
            .map(|d| (d, tri.child(d)))
            .find(|(_, child)| child.contains(point))
            .ok_or_else(|| off_lattice(point, level))?;
        code.push(char::from(b'0' + digit));
        tri = child;
    }
    Ok(code)
}

fn off_lattice(point: Point, level: usize) -> GlyphError {
    GlyphError::OffLattice {
        x: point.x,
        y: point.y,
        level,
    }
}

/// Half-open interval of width-`depth` addresses that start with `prefix`.
pub fn prefix_range(prefix: &str, depth: usize) -> Result<(u64, u64)> {
    if prefix.len() > depth {
        return Err(GlyphError::InvalidAddress(format!(
            "prefix {prefix:?} is longer than depth {depth}"
        )));
    }
    let span = pow3(depth - prefix.len())
        .ok_or_else(|| GlyphError::InvalidAddress(format!("depth {depth} overflows u64")))?;
    let lo = from_base3(prefix)?
        .checked_mul(span)
        .ok_or_else(|| GlyphError::InvalidAddress(format!("depth {depth} overflows u64")))?;
    Ok((lo, lo + span))
}
