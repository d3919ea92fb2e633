//! Image fingerprints: perceptual difference hash with a checksum fallback.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
#[cfg(feature = "perceptual-hash")]
use tracing::warn;

use super::similarity::hash_similarity;

/// Hex length of a 256-bit perceptual hash.
pub const PERCEPTUAL_HEX_LEN: usize = 64;

/// Whether this build computes perceptual hashes (otherwise checksums).
pub const PERCEPTUAL_HASH_AVAILABLE: bool = cfg!(feature = "perceptual-hash");

const CHECKSUM_PREFIX: &str = "checksum:";

#[cfg(feature = "perceptual-hash")]
const HASH_WIDTH: u32 = 16;
#[cfg(feature = "perceptual-hash")]
const HASH_HEIGHT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFingerprintKind {
    /// 256-bit difference hash; Hamming similarity is meaningful.
    Perceptual,
    /// Byte digest; only exact equality is meaningful.
    Checksum,
}

/// A tagged image fingerprint.
///
/// Stored as a string: perceptual hashes as bare 64-char hex, checksums as `checksum:<hex>`.
/// A bare hex string of any other length reads back as a checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageFingerprint {
    pub kind: ImageFingerprintKind,
    pub hex: String,
}

impl ImageFingerprint {
    pub fn perceptual(hex: impl Into<String>) -> Self {
        Self {
            kind: ImageFingerprintKind::Perceptual,
            hex: hex.into(),
        }
    }

    pub fn checksum(hex: impl Into<String>) -> Self {
        Self {
            kind: ImageFingerprintKind::Checksum,
            hex: hex.into(),
        }
    }

    /// Similarity in `[0, 1]`, or `None` when the kinds differ.
    ///
    /// Perceptual hashes compare by Hamming distance. Checksums are all-or-nothing: equal
    /// digests score 1.0, anything else 0.0.
    pub fn similarity(&self, other: &ImageFingerprint) -> Option<f32> {
        if self.kind != other.kind {
            return None;
        }
        match self.kind {
            ImageFingerprintKind::Perceptual => Some(hash_similarity(&self.hex, &other.hex)),
            ImageFingerprintKind::Checksum => {
                Some(if self.hex.eq_ignore_ascii_case(&other.hex) { 1.0 } else { 0.0 })
            }
        }
    }

    /// Parses the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix(CHECKSUM_PREFIX) {
            return is_hex(hex).then(|| Self::checksum(hex.to_ascii_lowercase()));
        }
        if !is_hex(s) {
            return None;
        }
        let hex = s.to_ascii_lowercase();
        if s.len() == PERCEPTUAL_HEX_LEN {
            Some(Self::perceptual(hex))
        } else {
            Some(Self::checksum(hex))
        }
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

impl fmt::Display for ImageFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ImageFingerprintKind::Perceptual => f.write_str(&self.hex),
            ImageFingerprintKind::Checksum => write!(f, "{}{}", CHECKSUM_PREFIX, self.hex),
        }
    }
}

impl Serialize for ImageFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ImageFingerprint::parse(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid image fingerprint: {:?}", s)))
    }
}

/// SHA-256 of the raw bytes.
pub fn checksum_fingerprint(bytes: &[u8]) -> ImageFingerprint {
    ImageFingerprint::checksum(hex::encode(Sha256::digest(bytes)))
}

/// Difference hash: grayscale, resize to 17x16, one bit per horizontal neighbour pair
/// (set when the left pixel is brighter), rows top to bottom, most significant bit first.
#[cfg(feature = "perceptual-hash")]
pub fn perceptual_fingerprint(bytes: &[u8]) -> Result<ImageFingerprint, ::image::ImageError> {
    use ::image::imageops::FilterType;

    let img = ::image::load_from_memory(bytes)?;
    let gray = img
        .grayscale()
        .resize_exact(HASH_WIDTH + 1, HASH_HEIGHT, FilterType::Lanczos3)
        .to_luma8();

    let mut bits = [0u8; (HASH_WIDTH * HASH_HEIGHT / 8) as usize];
    for y in 0..HASH_HEIGHT {
        for x in 0..HASH_WIDTH {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            if left > right {
                let i = (y * HASH_WIDTH + x) as usize;
                bits[i / 8] |= 1 << (7 - i % 8);
            }
        }
    }
    Ok(ImageFingerprint::perceptual(hex::encode(bits)))
}

/// Fingerprints image bytes. Empty input or an undecodable image gives `None`.
pub fn image_fingerprint(bytes: &[u8]) -> Option<ImageFingerprint> {
    if bytes.is_empty() {
        return None;
    }
    #[cfg(feature = "perceptual-hash")]
    {
        match perceptual_fingerprint(bytes) {
            Ok(fp) => Some(fp),
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "Image decode failed, no image fingerprint");
                None
            }
        }
    }
    #[cfg(not(feature = "perceptual-hash"))]
    {
        Some(checksum_fingerprint(bytes))
    }
}
