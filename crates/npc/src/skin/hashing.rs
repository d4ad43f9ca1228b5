use sha2::{Digest, Sha256};

use super::types::SkinDescriptor;

pub(crate) fn fingerprint_skin(skin: &SkinDescriptor) -> String {
    let mut hasher = Sha256::new();
    hasher.update(skin.width().to_le_bytes());
    hasher.update(skin.height().to_le_bytes());
    hasher.update((skin.pixels().len() as u64).to_le_bytes());
    hasher.update(skin.pixels());
    hasher.update((skin.model_data().len() as u64).to_le_bytes());
    hasher.update(skin.model_data());
    hasher.update(skin.model_identifier().as_bytes());
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
