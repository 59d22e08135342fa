//! secp256k1 scalar and point arithmetic
//!
//! All operations go through an explicit [`Curve`] value which owns the
//! precomputed secp256k1 context. Create one and share it by reference; it is
//! immutable after construction and safe to use from many threads.

use std::fmt;

use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};

use crate::constants::GENERATOR_POINT;
use crate::error::{ConsensusError, Result};

/// Scalar: 32-byte big-endian integer, valid iff 0 < x < n
pub type EcSecret = [u8; 32];

/// Compressed point: 0x02/0x03 ‖ X
pub type EcCompressed = [u8; 33];

/// Uncompressed point: 0x04 ‖ X ‖ Y
pub type EcUncompressed = [u8; 65];

pub const EC_SECRET_SIZE: usize = 32;
pub const EC_COMPRESSED_SIZE: usize = 33;
pub const EC_UNCOMPRESSED_SIZE: usize = 65;

/// True iff `secret` is a valid private key (0 < secret < n).
pub fn verify_secret(secret: &EcSecret) -> bool {
    SecretKey::from_slice(secret).is_ok()
}

/// True iff `point` is a compressed or uncompressed encoding of a curve point.
pub fn verify_point(point: &[u8]) -> bool {
    PublicKey::from_slice(point).is_ok()
}

pub(crate) fn to_secret_key(secret: &EcSecret) -> Result<SecretKey> {
    SecretKey::from_slice(secret)
        .map_err(|_| ConsensusError::InvalidFieldElement("Invalid secret".into()))
}

pub(crate) fn to_scalar(value: &EcSecret) -> Result<Scalar> {
    Scalar::from_be_bytes(*value)
        .map_err(|_| ConsensusError::InvalidFieldElement("Scalar out of range".into()))
}

pub(crate) fn to_public_key(point: &[u8]) -> Result<PublicKey> {
    PublicKey::from_slice(point)
        .map_err(|_| ConsensusError::InvalidFieldElement("Invalid point".into()))
}

/// The secp256k1 group.
#[derive(Clone)]
pub struct Curve {
    secp: Secp256k1<All>,
}

impl Curve {
    pub fn new() -> Self {
        Curve {
            secp: Secp256k1::new(),
        }
    }

    pub(crate) fn context(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// The generator point G, compressed.
    pub fn generator(&self) -> EcCompressed {
        GENERATOR_POINT
    }

    /// (a + b) mod n. Fails if `a` is not a valid secret, `b ≥ n`, or the sum is zero.
    pub fn add_scalars(&self, a: &EcSecret, b: &EcSecret) -> Result<EcSecret> {
        let sum = to_secret_key(a)?
            .add_tweak(&to_scalar(b)?)
            .map_err(|_| ConsensusError::InvalidFieldElement("Scalar sum is zero".into()))?;
        Ok(sum.secret_bytes())
    }

    /// (a × b) mod n. Both operands must be valid secrets.
    pub fn multiply_scalars(&self, a: &EcSecret, b: &EcSecret) -> Result<EcSecret> {
        to_secret_key(b)?;
        let product = to_secret_key(a)?
            .mul_tweak(&to_scalar(b)?)
            .map_err(|_| ConsensusError::InvalidFieldElement("Invalid scalar product".into()))?;
        Ok(product.secret_bytes())
    }

    /// scalar · point
    pub fn multiply_point(&self, point: &EcCompressed, scalar: &EcSecret) -> Result<EcCompressed> {
        to_secret_key(scalar)?;
        let product = to_public_key(point)?
            .mul_tweak(&self.secp, &to_scalar(scalar)?)
            .map_err(|_| ConsensusError::InvalidFieldElement("Invalid point product".into()))?;
        Ok(product.serialize())
    }

    /// a + b. Fails if the sum is the point at infinity.
    pub fn add_points(&self, a: &EcCompressed, b: &EcCompressed) -> Result<EcCompressed> {
        let sum = to_public_key(a)?
            .combine(&to_public_key(b)?)
            .map_err(|_| ConsensusError::InvalidFieldElement("Point sum is infinity".into()))?;
        Ok(sum.serialize())
    }

    /// Σ points. An empty slice or an infinite sum fails.
    pub fn sum_points(&self, points: &[EcCompressed]) -> Result<EcCompressed> {
        let keys = points
            .iter()
            .map(|point| to_public_key(point))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&PublicKey> = keys.iter().collect();
        let sum = PublicKey::combine_keys(&refs)
            .map_err(|_| ConsensusError::InvalidFieldElement("Invalid point sum".into()))?;
        Ok(sum.serialize())
    }

    pub fn decompress(&self, point: &EcCompressed) -> Result<EcUncompressed> {
        Ok(to_public_key(point)?.serialize_uncompressed())
    }

    pub fn compress(&self, point: &EcUncompressed) -> Result<EcCompressed> {
        Ok(to_public_key(point)?.serialize())
    }

    /// secret · G, compressed
    pub fn secret_to_public(&self, secret: &EcSecret) -> Result<EcCompressed> {
        let key = to_secret_key(secret)?;
        Ok(PublicKey::from_secret_key(&self.secp, &key).serialize())
    }

    /// secret · G, uncompressed
    pub fn secret_to_public_uncompressed(&self, secret: &EcSecret) -> Result<EcUncompressed> {
        let key = to_secret_key(secret)?;
        Ok(PublicKey::from_secret_key(&self.secp, &key).serialize_uncompressed())
    }
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Curve(secp256k1)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CURVE_ORDER;

    fn secret(hex_str: &str) -> EcSecret {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(hex_str).unwrap());
        out
    }

    fn scalar_from_u8(value: u8) -> EcSecret {
        let mut out = [0u8; 32];
        out[31] = value;
        out
    }

    #[test]
    fn test_secret_to_public_vector() {
        let curve = Curve::new();
        let s = secret("f3c8f9a6198cca98f481edde13bcc031b1470a81e367b838fe9e0a9db0f5993d");
        let public = curve.secret_to_public(&s).unwrap();
        assert_eq!(
            hex::encode(public),
            "02b974a3e9fe9ce1ca7f9bb86c114567a51cd8deb7157aeabcce46eb6138c3a1b3"
        );
    }

    #[test]
    fn test_generator_is_one_times_g() {
        let curve = Curve::new();
        assert_eq!(curve.secret_to_public(&scalar_from_u8(1)).unwrap(), curve.generator());
    }

    #[test]
    fn test_two_g() {
        let curve = Curve::new();
        let two_g = curve.add_points(&curve.generator(), &curve.generator()).unwrap();
        assert_eq!(
            hex::encode(two_g),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
        assert_eq!(curve.secret_to_public(&scalar_from_u8(2)).unwrap(), two_g);
    }

    #[test]
    fn test_decompress_generator() {
        let curve = Curve::new();
        let full = curve.decompress(&curve.generator()).unwrap();
        assert_eq!(
            hex::encode(full),
            "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(curve.compress(&full).unwrap(), curve.generator());
    }

    #[test]
    fn test_verify_secret_bounds() {
        assert!(!verify_secret(&[0u8; 32]));
        assert!(!verify_secret(&CURVE_ORDER));
        assert!(verify_secret(&scalar_from_u8(1)));
        let mut below_order = CURVE_ORDER;
        below_order[31] -= 1;
        assert!(verify_secret(&below_order));
    }

    #[test]
    fn test_verify_point() {
        assert!(verify_point(&GENERATOR_POINT));
        assert!(!verify_point(&[0u8; 33]));
        assert!(!verify_point(&[0u8; 65]));
        assert!(!verify_point(&[0x02; 10]));
    }

    #[test]
    fn test_add_scalars_wraps_modulo_order() {
        let curve = Curve::new();
        let mut n_minus_one = CURVE_ORDER;
        n_minus_one[31] -= 1;
        let sum = curve.add_scalars(&n_minus_one, &scalar_from_u8(2)).unwrap();
        assert_eq!(sum, scalar_from_u8(1));
        assert!(curve.add_scalars(&n_minus_one, &scalar_from_u8(1)).is_err());
    }

    #[test]
    fn test_multiply_scalars() {
        let curve = Curve::new();
        let product = curve
            .multiply_scalars(&scalar_from_u8(6), &scalar_from_u8(7))
            .unwrap();
        assert_eq!(product, scalar_from_u8(42));
        assert!(curve.multiply_scalars(&scalar_from_u8(6), &[0u8; 32]).is_err());
    }

    #[test]
    fn test_point_multiplication_matches_scalar_multiplication() {
        let curve = Curve::new();
        let a = secret("b7423c94ab99d3295c1af7e7bbea47c75d298f7190ca2077b53bae61299b70a5");
        let b = secret("d977e2ce0f744dc3432cde9813a99360a3f79f7c8035ef82310d54c57332b2cc");
        let ab = curve.multiply_scalars(&a, &b).unwrap();
        let a_g = curve.secret_to_public(&a).unwrap();
        assert_eq!(
            curve.multiply_point(&a_g, &b).unwrap(),
            curve.secret_to_public(&ab).unwrap()
        );
    }

    #[test]
    fn test_sum_points() {
        let curve = Curve::new();
        let g = curve.generator();
        let three_g = curve.sum_points(&[g, g, g]).unwrap();
        assert_eq!(three_g, curve.secret_to_public(&scalar_from_u8(3)).unwrap());
        assert!(curve.sum_points(&[]).is_err());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let curve = Curve::new();
        assert!(matches!(
            curve.secret_to_public(&[0u8; 32]),
            Err(ConsensusError::InvalidFieldElement(_))
        ));
        assert!(curve.multiply_point(&[0u8; 33], &scalar_from_u8(1)).is_err());
        assert!(curve.decompress(&[0x05; 33]).is_err());
    }
}
