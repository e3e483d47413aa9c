//! 2D affine transforms and orientation normalization.
//!
//! Matrices follow the `[a b c d tx ty]` convention used by video track
//! metadata:
//!
//! ```text
//! x' = a*x + c*y + tx
//! y' = b*x + d*y + ty
//! ```

use serde::{Deserialize, Serialize};

/// Matrix entries closer than this are treated as equal
const EPSILON: f64 = 1e-6;

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Apply `self` first, then `other`
    pub fn then(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: other.a * self.a + other.c * self.b,
            b: other.b * self.a + other.d * self.b,
            c: other.a * self.c + other.c * self.d,
            d: other.b * self.c + other.d * self.d,
            tx: other.a * self.tx + other.c * self.ty + other.tx,
            ty: other.b * self.tx + other.d * self.ty + other.ty,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Same matrix with the translation removed
    pub fn linear(&self) -> AffineTransform {
        AffineTransform {
            tx: 0.0,
            ty: 0.0,
            ..*self
        }
    }

    /// Bounding box of a `size` rectangle at the origin after this transform
    pub fn bounds(&self, size: Size) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(size.width, 0.0),
            self.apply(0.0, size.height),
            self.apply(size.width, size.height),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Displayed size of a track with this orientation
    pub fn oriented_size(&self, natural: Size) -> Size {
        let (min_x, min_y, max_x, max_y) = self.linear().bounds(natural);
        Size::new(max_x - min_x, max_y - min_y)
    }

    pub fn approx_eq(&self, other: &AffineTransform, tolerance: f64) -> bool {
        [
            (self.a, other.a),
            (self.b, other.b),
            (self.c, other.c),
            (self.d, other.d),
            (self.tx, other.tx),
            (self.ty, other.ty),
        ]
        .iter()
        .all(|(x, y)| (x - y).abs() <= tolerance)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Orientation encoded in a track transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Upright,
    /// 90° clockwise, typical of portrait phone capture
    Clockwise90,
    CounterClockwise90,
    UpsideDown,
    /// Skew, mirror or any other angle
    Arbitrary,
}

impl Rotation {
    /// Classify the linear part of `transform`
    pub fn detect(transform: &AffineTransform) -> Rotation {
        let is = |value: f64, expected: f64| (value - expected).abs() < EPSILON;
        let t = transform;

        if is(t.a, 1.0) && is(t.b, 0.0) && is(t.c, 0.0) && is(t.d, 1.0) {
            Rotation::Upright
        } else if is(t.a, 0.0) && is(t.b, 1.0) && is(t.c, -1.0) && is(t.d, 0.0) {
            Rotation::Clockwise90
        } else if is(t.a, 0.0) && is(t.b, -1.0) && is(t.c, 1.0) && is(t.d, 0.0) {
            Rotation::CounterClockwise90
        } else if is(t.a, -1.0) && is(t.b, 0.0) && is(t.c, 0.0) && is(t.d, -1.0) {
            Rotation::UpsideDown
        } else {
            Rotation::Arbitrary
        }
    }
}

/// Orientation-correcting transform whose output lands at the origin
///
/// Source files often carry translations that are wrong or missing for
/// rotated tracks, so the translation is rebuilt from the rotation.
pub fn orient(source: &AffineTransform, natural: Size) -> AffineTransform {
    let (w, h) = (natural.width, natural.height);
    let linear = source.linear();

    match Rotation::detect(source) {
        Rotation::Upright => linear,
        Rotation::Clockwise90 => AffineTransform { tx: h, ..linear },
        Rotation::CounterClockwise90 => AffineTransform { ty: w, ..linear },
        Rotation::UpsideDown => AffineTransform { tx: w, ty: h, ..linear },
        Rotation::Arbitrary => {
            let (min_x, min_y, _, _) = linear.bounds(natural);
            AffineTransform {
                tx: -min_x,
                ty: -min_y,
                ..linear
            }
        }
    }
}

/// Place a track into the render canvas
///
/// Orients the track, scales it uniformly to fit `render` and centers it.
/// Never crops and never stretches one axis more than the other.
pub fn normalize(source: &AffineTransform, natural: Size, render: Size) -> AffineTransform {
    let oriented = orient(source, natural);
    let displayed = source.oriented_size(natural);

    let scale = if displayed.is_empty() || render.is_empty() {
        1.0
    } else {
        (render.width / displayed.width).min(render.height / displayed.height)
    };

    let offset_x = (render.width - displayed.width * scale) / 2.0;
    let offset_y = (render.height - displayed.height * scale) / 2.0;

    oriented
        .then(&AffineTransform::scale(scale, scale))
        .then(&AffineTransform::translation(offset_x, offset_y))
}
