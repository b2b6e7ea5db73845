//! ECDSA signatures over secp256k1 in the form consensus requires.
//!
//! Signing uses RFC6979 deterministic nonces and always yields a canonical
//! (low-S) signature. Verification is split into a pure curve check
//! ([`Signature::verify`]) and a policy check on top of it
//! ([`Signature::verify_canonical`]) so callers can tell a mathematically
//! invalid signature apart from a malleated one.
//!
//! DER handling is strict by default: [`Signature::from_der`] rejects
//! anything that is not the unique minimal encoding. [`Signature::from_der_lax`]
//! exists for scripts evaluated without strict-encoding flags.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::error::{Component, DerError};
use crate::PrimitivesError;

/// The secp256k1 group order N.
pub const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// floor(N / 2). A canonical signature has `s <= HALF_ORDER`.
pub const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// Smallest possible DER signature: two one-byte integers.
const MIN_DER_LEN: usize = 8;
/// Largest possible DER signature: two 33-byte integers.
const MAX_DER_LEN: usize = 72;

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;

/// An ECDSA signature as two 32-byte big-endian integers.
///
/// The pair is stored exactly as produced or decoded. Canonical form is an
/// explicit step ([`Signature::to_canonical`]), never applied implicitly by
/// encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Build a signature from raw R and S values.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// The R component.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The S component.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    // -----------------------------------------------------------------
    // Signing and verification
    // -----------------------------------------------------------------

    /// Sign a 32-byte digest with RFC6979 deterministic nonces.
    ///
    /// If the raw signature has `s > N/2` it is replaced by `N - s`, so the
    /// result always satisfies [`Signature::is_canonical`].
    pub fn sign(digest: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let (k256_sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(digest)
            .map_err(|e| PrimitivesError::SigningFailed(e.to_string()))?;

        let (r_bytes, s_bytes) = k256_sig.split_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        s.copy_from_slice(&s_bytes);

        Ok(Signature { r, s }.to_canonical())
    }

    /// Check the curve equation for `digest` and `pub_key`.
    ///
    /// This is the pure correctness check: a signature and its negation
    /// `(r, N - s)` both pass. Use [`Signature::verify_canonical`] to also
    /// reject the high-S form.
    pub fn verify(&self, digest: &[u8; 32], pub_key: &PublicKey) -> bool {
        // (r, s) and (r, N - s) verify identically; checking the low form
        // keeps the result independent of the backend's malleability policy.
        let low = self.to_canonical();
        let k256_sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(low.r),
            k256::FieldBytes::from(low.s),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };

        pub_key
            .verifying_key()
            .verify_prehash(digest, &k256_sig)
            .is_ok()
    }

    /// [`Signature::verify`] restricted to canonical signatures.
    pub fn verify_canonical(&self, digest: &[u8; 32], pub_key: &PublicKey) -> bool {
        self.is_canonical() && self.verify(digest, pub_key)
    }

    // -----------------------------------------------------------------
    // Canonical form
    // -----------------------------------------------------------------

    /// True if `r` and `s` lie in `[1, N)` and `s <= N/2`.
    pub fn is_canonical(&self) -> bool {
        !is_zero(&self.r)
            && !is_zero(&self.s)
            && self.r < CURVE_ORDER
            && self.s < CURVE_ORDER
            && !self.has_high_s()
    }

    /// True if `s > N/2`.
    pub fn has_high_s(&self) -> bool {
        self.s > HALF_ORDER
    }

    /// Return the low-S twin of this signature.
    ///
    /// Signatures with `s > N/2` get `s' = N - s`; all others are returned
    /// unchanged. Values of `s` at or above N are left alone since they do
    /// not name a group element.
    pub fn to_canonical(&self) -> Self {
        if self.has_high_s() && self.s < CURVE_ORDER {
            Signature {
                r: self.r,
                s: subtract_from_order(&self.s),
            }
        } else {
            self.clone()
        }
    }

    // -----------------------------------------------------------------
    // DER
    // -----------------------------------------------------------------

    /// Encode as `0x30 len 0x02 len R 0x02 len S` with minimal integers.
    pub fn to_der(&self) -> Vec<u8> {
        let rb = minimal_der_int(&self.r);
        let sb = minimal_der_int(&self.s);

        let body_len = 4 + rb.len() + sb.len();
        let mut out = Vec::with_capacity(2 + body_len);
        out.push(SEQUENCE_TAG);
        out.push(body_len as u8);
        out.push(INTEGER_TAG);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(INTEGER_TAG);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Decode a strictly encoded DER signature.
    ///
    /// Rejects every deviation from the minimal encoding (see
    /// [`check_der_encoding`]) plus zero values and values not below N.
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let (r_bytes, s_bytes) = split_strict_der(bytes)?;
        let r = int_to_32(r_bytes, Component::R)?;
        let s = int_to_32(s_bytes, Component::S)?;
        check_scalar(&r, Component::R)?;
        check_scalar(&s, Component::S)?;
        Ok(Signature { r, s })
    }

    /// Decode a DER signature the way consensus does without strict
    /// encoding flags.
    ///
    /// Tolerated: BER long-form lengths (`0x81 0x44`), excess zero padding
    /// in integers and in long-form length octets, a sequence length that
    /// disagrees with the buffer, and trailing bytes after S. The tags and
    /// in-bounds integer lengths are still required.
    ///
    /// # Arguments
    /// * `bytes` - The signature without its sighash byte.
    ///
    /// # Returns
    /// The decoded signature, or `MalformedSignature` when the tags or
    /// lengths are unusable or a value does not fit 32 bytes. Range checks
    /// are left to verification, which fails for zero or out-of-range values.
    pub fn from_der_lax(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.first() != Some(&SEQUENCE_TAG) {
            return Err(if bytes.is_empty() {
                DerError::TooShort
            } else {
                DerError::InvalidSequenceTag
            }
            .into());
        }
        let mut pos = 1;
        // The sequence length is read and ignored, long form included.
        let seq_len = *bytes.get(pos).ok_or(DerError::TooShort)?;
        pos += 1;
        if seq_len & 0x80 != 0 {
            let octets = (seq_len & 0x7f) as usize;
            if octets > bytes.len() - pos {
                return Err(DerError::SequenceLengthMismatch.into());
            }
            pos += octets;
        }
        let r_bytes = read_lax_int(bytes, &mut pos, Component::R)?;
        let s_bytes = read_lax_int(bytes, &mut pos, Component::S)?;
        Ok(Signature {
            r: int_to_32(r_bytes, Component::R)?,
            s: int_to_32(s_bytes, Component::S)?,
        })
    }
}

/// Check the structural DER rules without decoding the values.
///
/// Rules, for a signature without its trailing sighash byte:
/// - total length in `8..=72`, SEQUENCE tag, sequence length covering exactly
///   the rest of the buffer;
/// - two INTEGERs, each with a nonzero in-bounds length;
/// - neither integer negative, neither padded with a superfluous `0x00`.
pub fn check_der_encoding(bytes: &[u8]) -> Result<(), DerError> {
    split_strict_der(bytes).map(|_| ())
}

fn split_strict_der(bytes: &[u8]) -> Result<(&[u8], &[u8]), DerError> {
    if bytes.len() < MIN_DER_LEN {
        return Err(DerError::TooShort);
    }
    if bytes.len() > MAX_DER_LEN {
        return Err(DerError::TooLong);
    }
    if bytes[0] != SEQUENCE_TAG {
        return Err(DerError::InvalidSequenceTag);
    }
    let seq_end = 2 + bytes[1] as usize;
    if seq_end > bytes.len() {
        return Err(DerError::SequenceLengthMismatch);
    }
    if seq_end < bytes.len() {
        return Err(DerError::TrailingBytes);
    }

    let (r, after_r) = read_strict_int(bytes, 2, Component::R)?;
    let (s, after_s) = read_strict_int(bytes, after_r, Component::S)?;
    if after_s != bytes.len() {
        return Err(DerError::TrailingBytes);
    }
    Ok((r, s))
}

fn read_strict_int(bytes: &[u8], pos: usize, which: Component) -> Result<(&[u8], usize), DerError> {
    if pos + 2 > bytes.len() {
        return Err(DerError::IntegerLengthOverflow(which));
    }
    if bytes[pos] != INTEGER_TAG {
        return Err(DerError::MissingIntegerTag(which));
    }
    let len = bytes[pos + 1] as usize;
    if len == 0 {
        return Err(DerError::ZeroLengthInteger(which));
    }
    let start = pos + 2;
    let end = start + len;
    if end > bytes.len() {
        return Err(DerError::IntegerLengthOverflow(which));
    }
    let int = &bytes[start..end];
    if int[0] & 0x80 != 0 {
        return Err(DerError::NegativeInteger(which));
    }
    if int.len() > 1 && int[0] == 0x00 && int[1] & 0x80 == 0 {
        return Err(DerError::ExcessivePadding(which));
    }
    Ok((int, end))
}

fn read_lax_int<'a>(bytes: &'a [u8], pos: &mut usize, which: Component) -> Result<&'a [u8], DerError> {
    if bytes.get(*pos) != Some(&INTEGER_TAG) {
        return Err(DerError::MissingIntegerTag(which));
    }
    *pos += 1;
    let len = read_lax_len(bytes, pos, which)?;
    if len > bytes.len() - *pos {
        return Err(DerError::IntegerLengthOverflow(which));
    }
    let start = *pos;
    *pos += len;
    Ok(&bytes[start..*pos])
}

/// Read a BER length at `pos`: one short-form byte, or `0x80 | n` followed
/// by `n` big-endian octets. Leading zero octets do not count towards the
/// width limit.
fn read_lax_len(bytes: &[u8], pos: &mut usize, which: Component) -> Result<usize, DerError> {
    let first = *bytes.get(*pos).ok_or(DerError::IntegerLengthOverflow(which))?;
    *pos += 1;
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }
    let mut octets = (first & 0x7f) as usize;
    if octets > bytes.len() - *pos {
        return Err(DerError::IntegerLengthOverflow(which));
    }
    while octets > 0 && bytes[*pos] == 0 {
        *pos += 1;
        octets -= 1;
    }
    if octets >= std::mem::size_of::<usize>() {
        return Err(DerError::IntegerLengthOverflow(which));
    }
    let mut len = 0usize;
    for _ in 0..octets {
        len = (len << 8) | bytes[*pos] as usize;
        *pos += 1;
    }
    Ok(len)
}

/// Left-pad a big-endian integer to 32 bytes after dropping leading zeros.
fn int_to_32(bytes: &[u8], which: Component) -> Result<[u8; 32], DerError> {
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[first_nonzero..];
    if trimmed.len() > 32 {
        return Err(DerError::IntegerTooLarge(which));
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Ok(out)
}

fn check_scalar(value: &[u8; 32], which: Component) -> Result<(), DerError> {
    if is_zero(value) {
        return Err(DerError::ZeroValue(which));
    }
    if *value >= CURVE_ORDER {
        return Err(DerError::OutOfRange(which));
    }
    Ok(())
}

/// Minimal DER integer body: no leading zeros, one `0x00` if the high bit
/// would otherwise read as a sign bit.
fn minimal_der_int(val: &[u8; 32]) -> Vec<u8> {
    let start = val.iter().position(|b| *b != 0).unwrap_or(31);
    let trimmed = &val[start..];
    let mut out = Vec::with_capacity(trimmed.len() + 1);
    if trimmed[0] & 0x80 != 0 {
        out.push(0x00);
    }
    out.extend_from_slice(trimmed);
    out
}

fn is_zero(val: &[u8; 32]) -> bool {
    val.iter().all(|&b| b == 0)
}

/// N - val for `val < N`.
fn subtract_from_order(val: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - val[i] as i16 - borrow;
        borrow = 0;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        }
        result[i] = diff as u8;
    }
    result
}
