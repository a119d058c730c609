//! base64url and HMAC-SHA256 primitives used by the token service

use crate::error::DecodeError;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// URL-safe alphabet; emits no padding, accepts input with or without it.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded base64url
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(data)
}

/// Decode base64url (padded or not) into raw bytes
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_LENIENT
        .decode(input)
        .map_err(|e| DecodeError(e.to_string()))
}

/// Decode base64url into a UTF-8 string
pub fn decode_str(input: &str) -> Result<String, DecodeError> {
    String::from_utf8(decode(input)?).map_err(|e| DecodeError(e.to_string()))
}

fn mac(secret: &[u8]) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts keys of any length")
}

/// HMAC-SHA256 of `data` keyed by `secret`
pub fn sign(secret: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = mac(secret);
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time check of `signature` against the HMAC of `data`
pub fn verify(secret: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let mut mac = mac(secret);
    mac.update(data);
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_url_safe_and_unpadded() {
        // 0xfb 0xff produces '+' and '/' in the standard alphabet
        let encoded = encode([0xfbu8, 0xff, 0xbf]);
        assert_eq!(encoded, "-_-_");

        let encoded = encode("a");
        assert_eq!(encoded, "YQ");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        assert_eq!(decode_str("YQ").unwrap(), "a");
        assert_eq!(decode_str("YQ==").unwrap(), "a");
    }

    #[test]
    fn test_decode_round_trip_unicode() {
        let text = "Socios del club ⚽ - ñandú";
        assert_eq!(decode_str(&encode(text)).unwrap(), text);
    }

    #[test]
    fn test_decode_rejects_invalid_input() {
        assert!(decode("not base64!").is_err());
        assert!(decode("a").is_err());
        assert!(decode_str(&encode([0xffu8, 0xfe])).is_err());
    }

    #[test]
    fn test_sign_matches_known_vector() {
        // RFC 4231 test case 2
        let signature = sign(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(signature),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify() {
        let signature = sign(b"secret", b"payload");
        assert!(verify(b"secret", b"payload", &signature));
        assert!(!verify(b"other", b"payload", &signature));
        assert!(!verify(b"secret", b"payload2", &signature));
        assert!(!verify(b"secret", b"payload", &signature[..16]));
    }
}
