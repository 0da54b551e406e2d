use crate::core::errors::QuoterError;
use base64::{engine::general_purpose, Engine as _};
use ed25519_dalek::{Signer as Ed25519SignerTrait, SigningKey, VerifyingKey};
use pkcs8::DecodePrivateKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// Signer trait for session authentication
///
/// Produces the raw signature bytes for the credential the gateway verifies
/// at connect time. Deterministic for fixed inputs; the timestamp is the only
/// freshness source.
pub trait Signer: Send + Sync {
    /// Sign exactly `market_maker_id || decimal(timestamp_ms)`, no delimiter.
    fn sign(&self, market_maker_id: &str, timestamp_ms: u64) -> Result<Vec<u8>, QuoterError>;
}

/// Ed25519-based signer over the market maker's private key
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    /// Create a signer from a base64-encoded 32-byte seed
    pub fn from_base64_seed(seed: &str) -> Result<Self, QuoterError> {
        let mut decoded = general_purpose::STANDARD
            .decode(seed.trim())
            .map_err(|e| QuoterError::Signing(format!("Invalid base64 signing key: {}", e)))?;

        let key_bytes: Result<[u8; 32], _> = decoded.as_slice().try_into();
        let Ok(mut key_bytes) = key_bytes else {
            decoded.zeroize();
            return Err(QuoterError::Signing(
                "Signing key must be 32 bytes".to_string(),
            ));
        };

        let signing_key = SigningKey::from_bytes(&key_bytes);
        decoded.zeroize();
        key_bytes.zeroize();

        Ok(Self { signing_key })
    }

    /// Create a signer from a PKCS#8 PEM document, decrypting it when a
    /// password is supplied
    pub fn from_pem(pem: &str, password: Option<&str>) -> Result<Self, QuoterError> {
        let signing_key = match password {
            Some(password) => SigningKey::from_pkcs8_encrypted_pem(pem, password.as_bytes())
                .map_err(|e| QuoterError::Signing(format!("Cannot decrypt signing key: {}", e)))?,
            None => SigningKey::from_pkcs8_pem(pem)
                .map_err(|e| QuoterError::Signing(format!("Invalid PKCS#8 signing key: {}", e)))?,
        };

        Ok(Self { signing_key })
    }

    /// Create a signer from configured key material
    ///
    /// PEM documents are detected by their armor; anything else is treated as
    /// a base64 seed. A password on a non-PEM key is a configuration mistake
    /// and fails before any network I/O.
    pub fn from_key_material(material: &str, password: Option<&str>) -> Result<Self, QuoterError> {
        if material.contains("-----BEGIN") {
            Self::from_pem(material, password)
        } else if password.is_some() {
            Err(QuoterError::Signing(
                "A key password was supplied but the signing key is not an encrypted PKCS#8 document"
                    .to_string(),
            ))
        } else {
            Self::from_base64_seed(material)
        }
    }

    /// Public counterpart of the signing key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Base64 form of the public key, as registered with the gateway
    pub fn public_key_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.verifying_key().to_bytes())
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, market_maker_id: &str, timestamp_ms: u64) -> Result<Vec<u8>, QuoterError> {
        if market_maker_id.is_empty() {
            return Err(QuoterError::Signing(
                "market_maker_id must not be empty".to_string(),
            ));
        }

        let mut message = market_maker_id.as_bytes().to_vec();
        message.extend_from_slice(timestamp_ms.to_string().as_bytes());

        let signature = Ed25519SignerTrait::sign(&self.signing_key, &message);
        Ok(signature.to_bytes().to_vec())
    }
}

/// Generate a fresh Ed25519 key pair
///
/// Returns `(base64 seed, base64 public key)`. The seed goes into the quoter
/// configuration; the public key is what the gateway operator registers.
pub fn generate_signing_key() -> (String, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    (
        general_purpose::STANDARD.encode(signing_key.to_bytes()),
        general_purpose::STANDARD.encode(signing_key.verifying_key().to_bytes()),
    )
}
