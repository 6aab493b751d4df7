//! # Signing Keys
//!
//! `SigningKey` binds private key material to the issuer it signs for and the
//! key id published in token headers.
//!
//! ## Security Invariants
//!
//! - Private key material is never serialized or logged. `Debug` prints the
//!   issuer, algorithm, kid and a public key prefix only.
//! - Secret bytes decoded from configuration are held in `Zeroizing`
//!   buffers; the dalek and p256 key types zeroize themselves on drop.
//! - A `SigningKey` is immutable once constructed. Rotation replaces the
//!   whole key in the [`KeyStore`](crate::KeyStore).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credvault_core::encoding::{bytes_to_hex, hex_prefix, hex_to_bytes};
use credvault_core::{IssuerId, KeyId};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::algorithm::KeyAlgorithm;
use crate::error::CryptoError;
use crate::jwk::Jwk;

enum KeyMaterial {
    Ed25519(ed25519_dalek::SigningKey),
    P256(p256::ecdsa::SigningKey),
}

/// Private signing key for one issuer.
pub struct SigningKey {
    issuer: IssuerId,
    kid: KeyId,
    material: KeyMaterial,
}

impl SigningKey {
    /// Build a key from a raw 32-byte Ed25519 seed or P-256 scalar.
    ///
    /// When `kid` is `None` the RFC 7638 thumbprint of the public JWK is used.
    pub fn from_secret_bytes(
        issuer: IssuerId,
        algorithm: KeyAlgorithm,
        secret: &[u8],
        kid: Option<KeyId>,
    ) -> Result<Self, CryptoError> {
        let malformed = |reason: String| CryptoError::MalformedKey {
            issuer: issuer.to_string(),
            algorithm: algorithm.as_str(),
            reason,
        };
        if secret.is_empty() {
            return Err(malformed("key material is empty".to_string()));
        }
        if secret.len() != algorithm.secret_len() {
            return Err(malformed(format!(
                "expected {} bytes, got {}",
                algorithm.secret_len(),
                secret.len()
            )));
        }
        let material = match algorithm {
            KeyAlgorithm::EdDsa => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(secret);
                KeyMaterial::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed))
            }
            KeyAlgorithm::Es256 => p256::ecdsa::SigningKey::from_slice(secret)
                .map(KeyMaterial::P256)
                .map_err(|_| malformed("scalar is zero or not below the P-256 group order".to_string()))?,
        };
        Self::assemble(issuer, material, kid)
    }

    /// Build a key from hex-encoded secret bytes, as found in configuration.
    pub fn from_secret_hex(
        issuer: IssuerId,
        algorithm: KeyAlgorithm,
        hex: &str,
        kid: Option<KeyId>,
    ) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(hex_to_bytes(hex).map_err(|e| CryptoError::MalformedKey {
            issuer: issuer.to_string(),
            algorithm: algorithm.as_str(),
            reason: e.to_string(),
        })?);
        Self::from_secret_bytes(issuer, algorithm, &bytes, kid)
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate(issuer: IssuerId, algorithm: KeyAlgorithm) -> Result<Self, CryptoError> {
        let material = match algorithm {
            KeyAlgorithm::EdDsa => KeyMaterial::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            KeyAlgorithm::Es256 => KeyMaterial::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
        };
        Self::assemble(issuer, material, None)
    }

    fn assemble(issuer: IssuerId, material: KeyMaterial, kid: Option<KeyId>) -> Result<Self, CryptoError> {
        let kid = match kid {
            Some(kid) => kid,
            None => {
                let thumbprint = public_jwk_of(&material).thumbprint()?;
                KeyId::new(thumbprint).map_err(|e| CryptoError::MalformedKey {
                    issuer: issuer.to_string(),
                    algorithm: algorithm_of(&material).as_str(),
                    reason: e.to_string(),
                })?
            }
        };
        Ok(Self { issuer, kid, material })
    }

    /// Fail with `PublicKeyMismatch` unless `hex` encodes this key's public key.
    ///
    /// P-256 public keys may be given in compressed or uncompressed SEC1 form.
    pub fn check_public_hex(&self, hex: &str) -> Result<(), CryptoError> {
        let bytes = hex_to_bytes(hex).map_err(|e| CryptoError::MalformedKey {
            issuer: self.issuer.to_string(),
            algorithm: self.algorithm().as_str(),
            reason: format!("public key: {e}"),
        })?;
        let matches = match &self.material {
            KeyMaterial::Ed25519(k) => bytes.as_slice() == k.verifying_key().as_bytes(),
            KeyMaterial::P256(k) => p256::PublicKey::from_sec1_bytes(&bytes)
                .map(|pk| pk == p256::PublicKey::from(k.verifying_key()))
                .unwrap_or(false),
        };
        if matches {
            Ok(())
        } else {
            Err(CryptoError::PublicKeyMismatch {
                issuer: self.issuer.to_string(),
            })
        }
    }

    /// Issuer this key signs for.
    pub fn issuer(&self) -> &IssuerId {
        &self.issuer
    }

    /// Key id carried in token headers.
    pub fn kid(&self) -> &KeyId {
        &self.kid
    }

    /// Signature algorithm.
    pub fn algorithm(&self) -> KeyAlgorithm {
        algorithm_of(&self.material)
    }

    /// Public key bytes: 32-byte Ed25519 key or 65-byte uncompressed SEC1 point.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match &self.material {
            KeyMaterial::Ed25519(k) => k.verifying_key().to_bytes().to_vec(),
            KeyMaterial::P256(k) => p256::PublicKey::from(k.verifying_key())
                .to_encoded_point(false)
                .as_bytes()
                .to_vec(),
        }
    }

    /// Public key as lowercase hex.
    pub fn public_key_hex(&self) -> String {
        bytes_to_hex(&self.public_key_bytes())
    }

    /// Secret key as lowercase hex, for writing key files. Zeroized on drop.
    pub fn secret_key_hex(&self) -> Zeroizing<String> {
        match &self.material {
            KeyMaterial::Ed25519(k) => {
                let bytes = Zeroizing::new(k.to_bytes());
                Zeroizing::new(bytes_to_hex(bytes.as_slice()))
            }
            KeyMaterial::P256(k) => {
                let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(k.to_bytes().into());
                Zeroizing::new(bytes_to_hex(bytes.as_slice()))
            }
        }
    }

    /// Public JWK with `alg`, `use` and `kid` set.
    pub fn public_jwk(&self) -> Jwk {
        Jwk {
            kid: Some(self.kid.to_string()),
            ..public_jwk_of(&self.material)
        }
    }

    /// Sign a message, returning the raw JWS signature bytes
    /// (64-byte Ed25519 signature or 64-byte fixed-size r||s).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match &self.material {
            KeyMaterial::Ed25519(k) => ed25519_dalek::Signer::try_sign(k, message)
                .map(|sig| sig.to_bytes().to_vec())
                .map_err(|e| CryptoError::Signing(e.to_string())),
            KeyMaterial::P256(k) => {
                let sig: p256::ecdsa::Signature = p256::ecdsa::signature::Signer::try_sign(k, message)
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }
}

fn algorithm_of(material: &KeyMaterial) -> KeyAlgorithm {
    match material {
        KeyMaterial::Ed25519(_) => KeyAlgorithm::EdDsa,
        KeyMaterial::P256(_) => KeyAlgorithm::Es256,
    }
}

fn public_jwk_of(material: &KeyMaterial) -> Jwk {
    let (kty, crv, x, y) = match material {
        KeyMaterial::Ed25519(k) => (
            "OKP",
            "Ed25519",
            URL_SAFE_NO_PAD.encode(k.verifying_key().as_bytes()),
            None,
        ),
        KeyMaterial::P256(k) => {
            let point = p256::PublicKey::from(k.verifying_key()).to_encoded_point(false);
            (
                "EC",
                "P-256",
                point.x().map(|x| URL_SAFE_NO_PAD.encode(x)).unwrap_or_default(),
                point.y().map(|y| URL_SAFE_NO_PAD.encode(y)),
            )
        }
    };
    Jwk {
        kty: kty.to_string(),
        crv: crv.to_string(),
        x,
        y,
        alg: Some(algorithm_of(material).as_str().to_string()),
        key_use: Some("sig".to_string()),
        kid: None,
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm())
            .field("kid", &self.kid)
            .field("public_key", &format!("{}...", hex_prefix(&self.public_key_bytes())))
            .finish_non_exhaustive()
    }
}
