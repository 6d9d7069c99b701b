use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}

/// 16-char hex id for catalog entries.
pub fn file_id() -> String {
    hex::encode(random_bytes::<8>())
}

/// 24-char hex id for accounts.
pub fn account_id() -> String {
    hex::encode(random_bytes::<12>())
}

/// 48-char hex long-lived API credential.
pub fn api_credential() -> String {
    hex::encode(random_bytes::<24>())
}

/// 96-bit share token, base64url without padding (16 chars).
pub fn share_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<12>())
}
