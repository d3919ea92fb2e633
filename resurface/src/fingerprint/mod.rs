//! Fingerprint codec: turns content into comparable fingerprints.
//!
//! - [`TextFingerprint`]: an embedding vector from the configured
//!   [`embedding::EmbeddingService`].
//! - [`ImageFingerprint`]: a 256-bit perceptual difference hash, or a SHA-256 checksum when
//!   the crate is built without `perceptual-hash`. The kind is tagged and never compared across.

mod image_hash;
mod similarity;
mod text;

pub use image_hash::{
    checksum_fingerprint, image_fingerprint, ImageFingerprint, ImageFingerprintKind,
    PERCEPTUAL_HASH_AVAILABLE, PERCEPTUAL_HEX_LEN,
};
#[cfg(feature = "perceptual-hash")]
pub use image_hash::perceptual_fingerprint;
pub use similarity::{cosine_similarity, hash_similarity};
pub use text::{text_fingerprint, TextFingerprint};
