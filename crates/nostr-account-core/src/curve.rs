//! secp256k1 arithmetic: modular field/scalar operations, point operations,
//! and x-only point lifting.
//!
//! The curve is `y^2 = x^3 + 7` over the prime field `p`, with generator `G`
//! of prime order `n`. Values are `BigUint`s; nothing here is constant time.
//! Verification only touches public data, so that is acceptable.
//!
//! Point arithmetic runs in Jacobian coordinates `(X, Y, Z)` representing the
//! affine point `(X/Z^2, Y/Z^3)`, with `Z = 0` as the point at infinity. Only
//! the conversion back to affine pays for a field inversion.

use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Field prime `p = 2^256 - 2^32 - 977`.
const P_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xfc, 0x2f,
];

/// Group order `n`.
const N_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// Generator x-coordinate.
pub const GENERATOR_X: [u8; 32] = [
    0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce, 0x87, 0x0b, 0x07,
    0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17, 0x98,
];

/// Generator y-coordinate (even).
pub const GENERATOR_Y: [u8; 32] = [
    0x48, 0x3a, 0xda, 0x77, 0x26, 0xa3, 0xc4, 0x65, 0x5d, 0xa4, 0xfb, 0xfc, 0x0e, 0x11, 0x08, 0xa8,
    0xfd, 0x17, 0xb4, 0x48, 0xa6, 0x85, 0x54, 0x19, 0x9c, 0x47, 0xd0, 0x8f, 0xfb, 0x10, 0xd4, 0xb8,
];

/// The curve constant `b` in `y^2 = x^3 + b`.
pub const CURVE_B: u32 = 7;

struct Constants {
    p: BigUint,
    n: BigUint,
    b: BigUint,
    /// `(p + 1) / 4`, the square-root exponent (valid because `p ≡ 3 mod 4`).
    sqrt_exp: BigUint,
    g: AffinePoint,
}

fn constants() -> &'static Constants {
    static CONSTANTS: OnceLock<Constants> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        let p = BigUint::from_bytes_be(&P_BYTES);
        let sqrt_exp = (&p + 1u32) >> 2;
        Constants {
            n: BigUint::from_bytes_be(&N_BYTES),
            b: BigUint::from(CURVE_B),
            sqrt_exp,
            g: AffinePoint {
                x: BigUint::from_bytes_be(&GENERATOR_X),
                y: BigUint::from_bytes_be(&GENERATOR_Y),
            },
            p,
        }
    })
}

/// The field prime `p`.
pub fn field_prime() -> &'static BigUint {
    &constants().p
}

/// The group order `n`.
pub fn curve_order() -> &'static BigUint {
    &constants().n
}

/// The generator point `G`.
pub fn generator() -> &'static AffinePoint {
    &constants().g
}

/// Interpret 32 big-endian bytes as an integer.
pub fn to_biguint(bytes: &[u8; 32]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Encode an integer as 32 big-endian bytes, zero padded.
///
/// Values wider than 256 bits keep their low 256 bits.
pub fn to_bytes32(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    if bytes.len() >= 32 {
        out.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        out[32 - bytes.len()..].copy_from_slice(&bytes);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Modular arithmetic
// ─────────────────────────────────────────────────────────────────────────────

/// `(a + b) mod m`.
pub fn mod_add(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a + b) % m
}

/// `(a - b) mod m`, always non-negative.
pub fn mod_sub(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    let a = a % m;
    let b = b % m;
    if a >= b {
        a - b
    } else {
        m - (b - a)
    }
}

/// `(a * b) mod m`.
pub fn mod_mul(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// `base^exp mod m`. Panics if `m` is zero.
pub fn mod_pow(base: &BigUint, exp: &BigUint, m: &BigUint) -> BigUint {
    base.modpow(exp, m)
}

/// Multiplicative inverse modulo a prime `m`, via Fermat: `a^(m-2)`.
///
/// Returns `None` when `a ≡ 0 (mod m)`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = a % m;
    if a.is_zero() {
        return None;
    }
    let exp = m - 2u32;
    Some(a.modpow(&exp, m))
}

// ─────────────────────────────────────────────────────────────────────────────
// Points
// ─────────────────────────────────────────────────────────────────────────────

/// An affine point `(x, y)` with both coordinates reduced mod `p`.
#[derive(Clone, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: BigUint,
    pub y: BigUint,
}

impl AffinePoint {
    /// Build from big-endian coordinates.
    pub fn from_bytes(x: &[u8; 32], y: &[u8; 32]) -> Self {
        Self {
            x: to_biguint(x),
            y: to_biguint(y),
        }
    }

    /// True if `y` is even (the BIP340 x-only convention).
    pub fn has_even_y(&self) -> bool {
        self.y.is_even()
    }

    /// True if the point satisfies `y^2 = x^3 + 7 (mod p)`.
    pub fn is_on_curve(&self) -> bool {
        let p = field_prime();
        if &self.x >= p || &self.y >= p {
            return false;
        }
        let lhs = mod_mul(&self.y, &self.y, p);
        lhs == curve_rhs(&self.x)
    }

    /// The x-coordinate as 32 big-endian bytes.
    pub fn x_bytes(&self) -> [u8; 32] {
        to_bytes32(&self.x)
    }
}

impl fmt::Debug for AffinePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AffinePoint(0x{:x}, 0x{:x})", self.x, self.y)
    }
}

/// A curve point: either the point at infinity or a finite affine point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine(AffinePoint),
}

impl Point {
    /// The generator as a `Point`.
    pub fn generator() -> Self {
        Point::Affine(generator().clone())
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    /// The affine coordinates, if finite.
    pub fn affine(&self) -> Option<&AffinePoint> {
        match self {
            Point::Infinity => None,
            Point::Affine(a) => Some(a),
        }
    }
}

impl From<AffinePoint> for Point {
    fn from(p: AffinePoint) -> Self {
        Point::Affine(p)
    }
}

/// `x^3 + 7 mod p`.
fn curve_rhs(x: &BigUint) -> BigUint {
    let c = constants();
    let x3 = mod_mul(&mod_mul(x, x, &c.p), x, &c.p);
    mod_add(&x3, &c.b, &c.p)
}

/// Jacobian representation used internally by the ladder.
#[derive(Clone)]
struct Jacobian {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Jacobian {
    fn infinity() -> Self {
        Self {
            x: BigUint::one(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    fn from_point(point: &Point) -> Self {
        match point {
            Point::Infinity => Self::infinity(),
            Point::Affine(a) => Self {
                x: a.x.clone(),
                y: a.y.clone(),
                z: BigUint::one(),
            },
        }
    }

    fn to_point(&self) -> Point {
        let p = field_prime();
        let z_inv = match mod_inverse(&self.z, p) {
            Some(inv) => inv,
            None => return Point::Infinity,
        };
        let z_inv2 = mod_mul(&z_inv, &z_inv, p);
        let z_inv3 = mod_mul(&z_inv2, &z_inv, p);
        Point::Affine(AffinePoint {
            x: mod_mul(&self.x, &z_inv2, p),
            y: mod_mul(&self.y, &z_inv3, p),
        })
    }

    /// `2P` with `a = 0`.
    fn double(&self) -> Self {
        let p = field_prime();
        if self.is_infinity() || self.y.is_zero() {
            return Self::infinity();
        }

        let ysq = mod_mul(&self.y, &self.y, p);
        let s = mod_mul(&BigUint::from(4u32), &mod_mul(&self.x, &ysq, p), p);
        let m = mod_mul(&BigUint::from(3u32), &mod_mul(&self.x, &self.x, p), p);

        let x3 = mod_sub(&mod_mul(&m, &m, p), &mod_add(&s, &s, p), p);
        let ysq2 = mod_mul(&ysq, &ysq, p);
        let y3 = mod_sub(
            &mod_mul(&m, &mod_sub(&s, &x3, p), p),
            &mod_mul(&BigUint::from(8u32), &ysq2, p),
            p,
        );
        let yz = mod_mul(&self.y, &self.z, p);
        let z3 = mod_add(&yz, &yz, p);

        Self { x: x3, y: y3, z: z3 }
    }

    /// `P + Q`, falling back to doubling when the inputs coincide.
    fn add(&self, other: &Self) -> Self {
        let p = field_prime();
        if self.is_infinity() {
            return other.clone();
        }
        if other.is_infinity() {
            return self.clone();
        }

        let z1sq = mod_mul(&self.z, &self.z, p);
        let z2sq = mod_mul(&other.z, &other.z, p);
        let u1 = mod_mul(&self.x, &z2sq, p);
        let u2 = mod_mul(&other.x, &z1sq, p);
        let s1 = mod_mul(&self.y, &mod_mul(&other.z, &z2sq, p), p);
        let s2 = mod_mul(&other.y, &mod_mul(&self.z, &z1sq, p), p);

        if u1 == u2 {
            return if s1 == s2 {
                self.double()
            } else {
                Self::infinity()
            };
        }

        let h = mod_sub(&u2, &u1, p);
        let h2 = mod_add(&h, &h, p);
        let i = mod_mul(&h2, &h2, p);
        let j = mod_mul(&h, &i, p);
        let diff = mod_sub(&s2, &s1, p);
        let r = mod_add(&diff, &diff, p);
        let v = mod_mul(&u1, &i, p);

        let x3 = mod_sub(
            &mod_sub(&mod_mul(&r, &r, p), &j, p),
            &mod_add(&v, &v, p),
            p,
        );
        let s1j = mod_mul(&s1, &j, p);
        let y3 = mod_sub(
            &mod_mul(&r, &mod_sub(&v, &x3, p), p),
            &mod_add(&s1j, &s1j, p),
            p,
        );
        let z1z2 = mod_mul(&self.z, &other.z, p);
        let z3 = mod_mul(&mod_add(&z1z2, &z1z2, p), &h, p);

        Self { x: x3, y: y3, z: z3 }
    }

    /// `k * P`, left-to-right double-and-add.
    fn mul(&self, k: &BigUint) -> Self {
        let mut acc = Self::infinity();
        if k.is_zero() || self.is_infinity() {
            return acc;
        }
        for i in (0..k.bits()).rev() {
            acc = acc.double();
            if k.bit(i) {
                acc = acc.add(self);
            }
        }
        acc
    }
}

/// `a + b`.
pub fn point_add(a: &Point, b: &Point) -> Point {
    Jacobian::from_point(a)
        .add(&Jacobian::from_point(b))
        .to_point()
}

/// `2a`.
pub fn point_double(a: &Point) -> Point {
    Jacobian::from_point(a).double().to_point()
}

/// `-a`, i.e. `(x, p - y)`.
pub fn point_neg(a: &Point) -> Point {
    match a {
        Point::Infinity => Point::Infinity,
        Point::Affine(pt) => Point::Affine(AffinePoint {
            x: pt.x.clone(),
            y: mod_sub(&BigUint::zero(), &pt.y, field_prime()),
        }),
    }
}

/// `a - b`.
pub fn point_sub(a: &Point, b: &Point) -> Point {
    point_add(a, &point_neg(b))
}

/// `k * a`.
pub fn point_mul_scalar(k: &BigUint, a: &Point) -> Point {
    Jacobian::from_point(a).mul(k).to_point()
}

/// `k * G`.
pub fn mul_generator(k: &BigUint) -> Point {
    point_mul_scalar(k, &Point::generator())
}

/// `a*P - b*Q`, with a single conversion back to affine.
pub fn mul_sub(a: &BigUint, p: &Point, b: &BigUint, q: &Point) -> Point {
    let ap = Jacobian::from_point(p).mul(a);
    let bq = Jacobian::from_point(&point_neg(q)).mul(b);
    ap.add(&bq).to_point()
}

// ─────────────────────────────────────────────────────────────────────────────
// x-only lifting
// ─────────────────────────────────────────────────────────────────────────────

/// How strictly [`lift_x_with`] treats x-coordinates with no curve point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiftPolicy {
    /// Re-square the candidate root and reject non-residues.
    #[default]
    Strict,
    /// Accept the candidate root unchecked. For x-values that are not on the
    /// curve this yields a meaningless point; verification against it will
    /// fail, but not with `PointLiftFailure`.
    Permissive,
}

/// Lift an x-coordinate to the curve point with even y.
///
/// Returns `None` if `x >= p` or if `x^3 + 7` is not a quadratic residue.
pub fn lift_x(x: &BigUint) -> Option<AffinePoint> {
    lift_x_with(x, LiftPolicy::Strict)
}

/// Lift without the residue check; `None` only when `x >= p`.
pub fn lift_x_unchecked(x: &BigUint) -> Option<AffinePoint> {
    lift_x_with(x, LiftPolicy::Permissive)
}

/// Lift an x-coordinate under the given policy.
pub fn lift_x_with(x: &BigUint, policy: LiftPolicy) -> Option<AffinePoint> {
    let c = constants();
    if x >= &c.p {
        return None;
    }

    let y2 = curve_rhs(x);
    let y = y2.modpow(&c.sqrt_exp, &c.p);

    if policy == LiftPolicy::Strict && mod_mul(&y, &y, &c.p) != y2 {
        return None;
    }

    let y = if y.is_even() { y } else { &c.p - y };
    Some(AffinePoint { x: x.clone(), y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn from_hex(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            field_prime(),
            &from_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f")
        );
        assert_eq!(
            curve_order(),
            &from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
        );
        assert_eq!(field_prime() % 4u32, BigUint::from(3u32));
    }

    #[test]
    fn test_generator_on_curve() {
        assert!(generator().is_on_curve());
        assert!(generator().has_even_y());
    }

    #[test]
    fn test_mod_sub_wraps() {
        let m = BigUint::from(7u32);
        let r = mod_sub(&BigUint::from(2u32), &BigUint::from(5u32), &m);
        assert_eq!(r, BigUint::from(4u32));
    }

    #[test]
    fn test_mod_inverse() {
        let p = field_prime();
        let a = from_hex("deadbeef");
        let inv = mod_inverse(&a, p).unwrap();
        assert_eq!(mod_mul(&a, &inv, p), BigUint::one());
        assert!(mod_inverse(&BigUint::zero(), p).is_none());
        assert!(mod_inverse(p, p).is_none());
    }

    #[test]
    fn test_mod_pow_small() {
        let m = BigUint::from(13u32);
        assert_eq!(
            mod_pow(&BigUint::from(2u32), &BigUint::from(10u32), &m),
            BigUint::from(1024u32 % 13)
        );
    }

    #[test]
    fn test_double_generator() {
        let two_g = point_double(&Point::generator());
        let expected = AffinePoint {
            x: from_hex("c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"),
            y: from_hex("1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a"),
        };
        assert_eq!(two_g, Point::Affine(expected));
        assert_eq!(two_g, point_add(&Point::generator(), &Point::generator()));
        assert_eq!(two_g, mul_generator(&BigUint::from(2u32)));
    }

    #[test]
    fn test_order_times_generator_is_infinity() {
        assert!(mul_generator(curve_order()).is_infinity());
    }

    #[test]
    fn test_order_minus_one_is_negated_generator() {
        let n_minus_1 = curve_order() - 1u32;
        let pt = mul_generator(&n_minus_1);
        assert_eq!(pt, point_neg(&Point::generator()));
    }

    #[test]
    fn test_add_inverse_is_infinity() {
        let g = Point::generator();
        assert!(point_sub(&g, &g).is_infinity());
        assert_eq!(point_add(&g, &Point::Infinity), g);
        assert_eq!(point_add(&Point::Infinity, &g), g);
    }

    #[test]
    fn test_scalar_mul_distributes() {
        // (a + b)G == aG + bG
        let a = from_hex("1234567890abcdef");
        let b = from_hex("fedcba0987654321");
        let lhs = mul_generator(&(&a + &b));
        let rhs = point_add(&mul_generator(&a), &mul_generator(&b));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_mul_sub_matches_separate_ops() {
        let g = Point::generator();
        let q = mul_generator(&BigUint::from(5u32));
        let a = BigUint::from(11u32);
        let b = BigUint::from(2u32);
        // 11G - 2*5G = G
        assert_eq!(mul_sub(&a, &g, &b, &q), g);
    }

    #[test]
    fn test_lift_generator_x() {
        let lifted = lift_x(&generator().x).unwrap();
        assert_eq!(&lifted, generator());
    }

    #[test]
    fn test_lift_picks_even_y() {
        // x(6G) has an odd-y point; lifting must return its negation.
        let six_g = mul_generator(&BigUint::from(6u32));
        let six_g = six_g.affine().unwrap();
        assert!(!six_g.has_even_y());
        let lifted = lift_x(&six_g.x).unwrap();
        assert!(lifted.has_even_y());
        assert_eq!(Point::Affine(lifted), point_neg(&Point::Affine(six_g.clone())));
    }

    #[test]
    fn test_lift_rejects_out_of_field() {
        assert!(lift_x(field_prime()).is_none());
        assert!(lift_x_unchecked(field_prime()).is_none());
        assert!(lift_x_unchecked(&(field_prime() + 1u32)).is_none());
    }

    #[test]
    fn test_lift_non_residue_strict_vs_permissive() {
        // 5^3 + 7 = 132 is not a square mod p.
        let x = BigUint::from(5u32);
        assert!(lift_x(&x).is_none());

        let bogus = lift_x_unchecked(&x).unwrap();
        assert!(bogus.has_even_y());
        assert!(!bogus.is_on_curve());
    }

    #[test]
    fn test_lift_zero_has_no_point() {
        assert!(lift_x(&BigUint::zero()).is_none());
    }

    #[test]
    fn test_bytes32_roundtrip() {
        let bytes = GENERATOR_X;
        assert_eq!(to_bytes32(&to_biguint(&bytes)), bytes);
        assert_eq!(to_bytes32(&BigUint::one())[31], 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_lift_x_valid_points_are_even_and_on_curve(bytes in any::<[u8; 32]>()) {
            let x = to_biguint(&bytes) % field_prime();
            let first = lift_x(&x);
            let second = lift_x(&x);
            prop_assert_eq!(&first, &second);
            if let Some(pt) = first {
                prop_assert!(pt.has_even_y());
                prop_assert!(pt.is_on_curve());
                prop_assert_eq!(pt.x, x);
            }
        }

        #[test]
        fn prop_strict_and_permissive_agree_on_residues(bytes in any::<[u8; 32]>()) {
            let x = to_biguint(&bytes) % field_prime();
            if let Some(strict) = lift_x(&x) {
                prop_assert_eq!(Some(strict), lift_x_unchecked(&x));
            }
        }
    }
}
