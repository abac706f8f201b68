//! RFC 6238 time-based one-time passwords (HMAC-SHA1, 6 digits, 30 s).

use super::{AuthError, CredentialVerifier};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use log::warn;
use sha1::Sha1;
use std::fmt::{Debug, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

const STEP_SECONDS: u64 = 30;
const DIGITS: usize = 6;
const MODULUS: u32 = 1_000_000;

pub struct TotpVerifier {
    key: Vec<u8>,
    secret: String,
    window: u64,
}

impl Debug for TotpVerifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpVerifier")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl TotpVerifier {
    /// Builds a verifier from a base32 secret. Case, spaces and `=` padding
    /// are ignored.
    pub fn from_base32(secret: &str) -> Result<Self, AuthError> {
        let normalized: String = secret
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '=')
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        if normalized.is_empty() {
            return Err(AuthError::InvalidSecret("secret is empty".to_string()));
        }
        let key = BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map_err(|err| AuthError::InvalidSecret(err.to_string()))?;

        Ok(Self {
            key,
            secret: normalized,
            window: 0,
        })
    }

    /// Accepts codes up to `steps` periods before or after the current one.
    pub fn with_window(mut self, steps: u64) -> Self {
        self.window = steps;
        self
    }

    /// Code valid during the period containing `unix_secs`.
    pub fn code_at(&self, unix_secs: u64) -> Result<String, AuthError> {
        self.code_for_counter(unix_secs / STEP_SECONDS)
    }

    pub fn verify_at(&self, token: &str, unix_secs: u64) -> Result<bool, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if token.len() != DIGITS || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }

        let counter = unix_secs / STEP_SECONDS;
        let first = counter.saturating_sub(self.window);
        let last = counter.saturating_add(self.window);
        for candidate in first..=last {
            if self.code_for_counter(candidate)? == token {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `otpauth://` URI for enrolling the secret in an authenticator app.
    pub fn provisioning_uri(&self, account: &str, issuer: &str) -> String {
        format!(
            "otpauth://totp/{}:{}?secret={}&period={}&digits={}&algorithm=SHA1&issuer={}",
            encode_component(issuer),
            encode_component(account),
            self.secret,
            STEP_SECONDS,
            DIGITS,
            encode_component(issuer)
        )
    }

    fn code_for_counter(&self, counter: u64) -> Result<String, AuthError> {
        let mut mac = HmacSha1::new_from_slice(&self.key)
            .map_err(|err| AuthError::InvalidSecret(err.to_string()))?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let offset = usize::from(digest[digest.len() - 1] & 0x0f);
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        Ok(format!("{:0width$}", binary % MODULUS, width = DIGITS))
    }
}

impl CredentialVerifier for TotpVerifier {
    fn verify(&self, token: &str) -> Result<bool, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Clock)?
            .as_secs();
        let verified = self.verify_at(token, now)?;
        if !verified {
            warn!("event=otp_verify module=auth status=error reason=mismatch");
        }
        Ok(verified)
    }
}

fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'@') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::TotpVerifier;
    use crate::auth::AuthError;

    // Base32 of the RFC 6238 SHA1 seed "12345678901234567890".
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc6238_sha1_vectors() {
        let verifier = TotpVerifier::from_base32(RFC_SECRET).expect("valid secret");
        assert_eq!(verifier.code_at(59).expect("code"), "287082");
        assert_eq!(verifier.code_at(1_111_111_109).expect("code"), "081804");
        assert_eq!(verifier.code_at(1_111_111_111).expect("code"), "050471");
        assert_eq!(verifier.code_at(1_234_567_890).expect("code"), "005924");
        assert_eq!(verifier.code_at(2_000_000_000).expect("code"), "279037");
    }

    #[test]
    fn secret_normalization_ignores_case_spaces_and_padding() {
        let verifier =
            TotpVerifier::from_base32("gezd gnbv gy3t qojq gezd gnbv gy3t qojq==").expect("secret");
        assert_eq!(verifier.code_at(59).expect("code"), "287082");
    }

    #[test]
    fn rejects_unusable_secrets() {
        assert!(matches!(
            TotpVerifier::from_base32("  "),
            Err(AuthError::InvalidSecret(_))
        ));
        assert!(matches!(
            TotpVerifier::from_base32("not base32!"),
            Err(AuthError::InvalidSecret(_))
        ));
    }

    #[test]
    fn verify_accepts_current_code_only_without_window() {
        let verifier = TotpVerifier::from_base32(RFC_SECRET).expect("secret");
        assert!(verifier.verify_at("287082", 59).expect("verify"));
        assert!(!verifier.verify_at("287082", 90).expect("verify"));
        assert!(!verifier.verify_at("28708", 59).expect("verify"));
        assert!(!verifier.verify_at("abcdef", 59).expect("verify"));
        assert_eq!(verifier.verify_at("  ", 59), Err(AuthError::MissingToken));
    }

    #[test]
    fn window_tolerates_adjacent_periods() {
        let verifier = TotpVerifier::from_base32(RFC_SECRET)
            .expect("secret")
            .with_window(1);
        assert!(verifier.verify_at("287082", 89).expect("verify"));
        assert!(!verifier.verify_at("287082", 120).expect("verify"));
    }

    #[test]
    fn provisioning_uri_encodes_labels() {
        let verifier = TotpVerifier::from_base32(RFC_SECRET).expect("secret");
        let uri = verifier.provisioning_uri("admin@ppgee.ufam.edu.br", "PPGEE Dashboard");
        assert_eq!(
            uri,
            format!(
                "otpauth://totp/PPGEE%20Dashboard:admin@ppgee.ufam.edu.br?secret={RFC_SECRET}\
                 &period=30&digits=6&algorithm=SHA1&issuer=PPGEE%20Dashboard"
            )
        );
    }
}
