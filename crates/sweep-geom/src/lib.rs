//! Unbounded world coordinates and partition keys.
//!
//! World positions on the infinite canvas are exact integers of arbitrary
//! magnitude. Narrowing to machine integers only happens through the
//! saturating helpers below, and only at call sites where the true value is
//! known to be small (camera-relative screen offsets, report deltas).
#![forbid(unsafe_code)]

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use core::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use num_bigint;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseCoordError {
    #[error("invalid integer literal {0:?}")]
    InvalidInteger(String),
}

/// Parses a decimal integer of any length (leading `+`/`-` allowed).
pub fn parse_bigint(s: &str) -> Result<BigInt, ParseCoordError> {
    let trimmed = s.trim();
    BigInt::from_str(trimmed).map_err(|_| ParseCoordError::InvalidInteger(s.to_string()))
}

/// Narrows to `i64`, clamping to the nearest bound instead of wrapping.
#[inline]
pub fn saturating_i64(v: &BigInt) -> i64 {
    v.to_i64().unwrap_or(match v.sign() {
        Sign::Minus => i64::MIN,
        _ => i64::MAX,
    })
}

/// An exact 2D integer position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: BigInt,
    pub y: BigInt,
}

impl Coordinate {
    #[inline]
    pub fn new(x: impl Into<BigInt>, y: impl Into<BigInt>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_decimal(x: &str, y: &str) -> Result<Self, ParseCoordError> {
        Ok(Self {
            x: parse_bigint(x)?,
            y: parse_bigint(y)?,
        })
    }

    /// Per-axis decimal strings, the transport encoding.
    pub fn to_decimal(&self) -> (String, String) {
        (self.x.to_string(), self.y.to_string())
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Component-wise product.
    pub fn mul_components(&self, rhs: &Coordinate) -> Coordinate {
        Coordinate {
            x: &self.x * &rhs.x,
            y: &self.y * &rhs.y,
        }
    }

    /// Floor modulo on both axes; every component lands in `[0, m)` for positive `m`.
    pub fn mod_floor(&self, m: i64) -> Coordinate {
        debug_assert!(m != 0);
        let m = BigInt::from(m);
        Coordinate {
            x: self.x.mod_floor(&m),
            y: self.y.mod_floor(&m),
        }
    }

    /// Floor division on both axes.
    pub fn div_floor(&self, d: i64) -> Coordinate {
        debug_assert!(d != 0);
        let d = BigInt::from(d);
        Coordinate {
            x: self.x.div_floor(&d),
            y: self.y.div_floor(&d),
        }
    }

    /// Per-axis absolute difference, narrowed with saturation.
    pub fn abs_delta(&self, other: &Coordinate) -> (i64, i64) {
        (
            saturating_i64(&(&self.x - &other.x).abs()),
            saturating_i64(&(&self.y - &other.y).abs()),
        )
    }

    #[inline]
    pub fn saturating_i64(&self) -> (i64, i64) {
        (saturating_i64(&self.x), saturating_i64(&self.y))
    }

    #[inline]
    pub fn offset(&self, dx: i64, dy: i64) -> Coordinate {
        Coordinate {
            x: &self.x + dx,
            y: &self.y + dy,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

impl From<(i64, i64)> for Coordinate {
    fn from(value: (i64, i64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl<'a> Add<&'a Coordinate> for &'a Coordinate {
    type Output = Coordinate;
    #[inline]
    fn add(self, rhs: &'a Coordinate) -> Coordinate {
        Coordinate {
            x: &self.x + &rhs.x,
            y: &self.y + &rhs.y,
        }
    }
}

impl Add for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign<&Coordinate> for Coordinate {
    #[inline]
    fn add_assign(&mut self, rhs: &Coordinate) {
        self.x += &rhs.x;
        self.y += &rhs.y;
    }
}

impl<'a> Sub<&'a Coordinate> for &'a Coordinate {
    type Output = Coordinate;
    #[inline]
    fn sub(self, rhs: &'a Coordinate) -> Coordinate {
        Coordinate {
            x: &self.x - &rhs.x,
            y: &self.y - &rhs.y,
        }
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl SubAssign<&Coordinate> for Coordinate {
    #[inline]
    fn sub_assign(&mut self, rhs: &Coordinate) {
        self.x -= &rhs.x;
        self.y -= &rhs.y;
    }
}

impl Mul<i64> for &Coordinate {
    type Output = Coordinate;
    #[inline]
    fn mul(self, rhs: i64) -> Coordinate {
        Coordinate {
            x: &self.x * rhs,
            y: &self.y * rhs,
        }
    }
}

impl Mul<i64> for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn mul(self, rhs: i64) -> Coordinate {
        &self * rhs
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn neg(self) -> Coordinate {
        Coordinate {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct DecimalRepr {
    x: String,
    y: String,
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (x, y) = self.to_decimal();
        DecimalRepr { x, y }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DecimalRepr::deserialize(deserializer)?;
        Coordinate::from_decimal(&repr.x, &repr.y).map_err(serde::de::Error::custom)
    }
}

/// Chunk origin in chunk units. Two keys are equal iff both components are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(pub Coordinate);

impl PartitionKey {
    #[inline]
    pub fn new(x: impl Into<BigInt>, y: impl Into<BigInt>) -> Self {
        Self(Coordinate::new(x, y))
    }

    #[inline]
    pub fn coord(&self) -> &Coordinate {
        &self.0
    }

    /// World pixel origin of this partition, given the pixel span of one key unit.
    #[inline]
    pub fn pixel_origin(&self, span_px: i64) -> Coordinate {
        &self.0 * span_px
    }

    /// Absolute tile coordinate of a local cell.
    pub fn tile_at(&self, partition_size: usize, lx: i64, ly: i64) -> Coordinate {
        (&self.0 * partition_size as i64).offset(lx, ly)
    }

    /// Key of the partition containing a world pixel.
    pub fn containing(world_px: &Coordinate, span_px: i64) -> Self {
        Self(world_px.div_floor(span_px))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Coordinate> for PartitionKey {
    fn from(value: Coordinate) -> Self {
        Self(value)
    }
}
