use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::Rng;
use base64::{Engine, engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD}};

type HmacSha256 = Hmac<Sha256>;

const ITERATIONS: u32 = 260000;
const KEY_LENGTH: usize = 32;

/// Hash a password in the Werkzeug format:
/// PBKDF2-HMAC-SHA256, 260000 iterations, 16 byte salt
pub fn hash_password(password: &str) -> Result<String, String> {
    hash_password_with(password, ITERATIONS)
}

pub(crate) fn hash_password_with(password: &str, iterations: u32) -> Result<String, String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);

    let key = derive_key(password, &salt, iterations, KEY_LENGTH)?;

    let salt_b64 = URL_SAFE_NO_PAD.encode(salt);
    let hash_b64 = URL_SAFE_NO_PAD.encode(key);

    // pbkdf2:sha256:iterations$salt$hash
    Ok(format!("pbkdf2:sha256:{}${}${}", iterations, salt_b64, hash_b64))
}

/// Check a password against a stored Werkzeug hash (base64 or hex encoded parts)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parts: Vec<&str> = stored_hash.split('$').collect();
    let [header, salt_str, hash_str] = parts.as_slice() else {
        return Err("Invalid hash format".to_string());
    };

    let header_parts: Vec<&str> = header.split(':').collect();
    let [_, _, iterations] = header_parts.as_slice() else {
        return Err("Invalid header".to_string());
    };

    let iterations = iterations
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let salt = decode_flexible(salt_str)?;
    let expected_hash = decode_flexible(hash_str)?;

    let computed = derive_key(password, &salt, iterations, expected_hash.len())?;

    Ok(computed == expected_hash)
}

fn derive_key(password: &str, salt: &[u8], iterations: u32, length: usize) -> Result<Vec<u8>, String> {
    let mut key = vec![0u8; length];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt, iterations, &mut key)
        .map_err(|e| format!("PBKDF2 failed: {}", e))?;
    Ok(key)
}

/// Decode a base64 (any alphabet, padded or not) or hex string
fn decode_flexible(input: &str) -> Result<Vec<u8>, String> {
    // 64 hex chars = 32 bytes
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input)
            .map_err(|e| format!("Hex decode failed: {}", e));
    }

    let padded = add_base64_padding(input);

    if let Ok(decoded) = STANDARD.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input) {
        return Ok(decoded);
    }
    if let Ok(decoded) = STANDARD_NO_PAD.decode(input) {
        return Ok(decoded);
    }

    hex::decode(input)
        .map_err(|_| "Failed to decode".to_string())
}

fn add_base64_padding(input: &str) -> String {
    let padding_needed = (4 - (input.len() % 4)) % 4;
    format!("{}{}", input, "=".repeat(padding_needed))
}
