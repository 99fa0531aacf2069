use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Compute SHA-256 of an in-memory byte slice.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Lowercased extension of an uploaded file name, or `bin` when it has none
/// or it contains anything but ASCII letters and digits.
pub fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

/// Derive the content-addressed storage path for an uploaded image.
/// Layout: `<base>/<first_2_hex_chars>/<full_hex>.<ext>`
///
/// The client-supplied file name never reaches the path, only its extension.
/// A hash too short to shard lands in `00/`.
pub fn upload_path(uploads_dir: &Path, hash_hex: &str, ext: &str) -> PathBuf {
    let shard = hash_hex.get(..2).filter(|s| s.len() == 2).unwrap_or("00");
    uploads_dir.join(shard).join(format!("{hash_hex}.{ext}"))
}
