//! # Key Store
//!
//! Holds the active signing key of every configured issuer.
//!
//! Readers take a short read lock and clone an `Arc<SigningKey>`; the key
//! they hold stays valid for the whole issuance even if a rotation happens
//! meanwhile. [`KeyStore::rotate()`] swaps the active key under the write
//! lock, so later readers see either the old key or the new one, never a
//! mix. Replaced keys move to a retired list and remain published through
//! [`KeyStore::jwks()`] so tokens they signed stay verifiable.

use std::collections::HashMap;
use std::sync::Arc;

use credvault_core::IssuerId;
use parking_lot::RwLock;

use crate::error::CryptoError;
use crate::jwk::JwkSet;
use crate::key::SigningKey;

#[derive(Default)]
struct Keys {
    active: HashMap<IssuerId, Arc<SigningKey>>,
    retired: Vec<Arc<SigningKey>>,
}

/// Issuer → active signing key, with rotation.
pub struct KeyStore {
    keys: RwLock<Keys>,
}

impl KeyStore {
    /// Build a store from already-validated keys.
    ///
    /// Fails on an empty key set or on two keys for the same issuer.
    pub fn new(keys: impl IntoIterator<Item = SigningKey>) -> Result<Self, CryptoError> {
        let mut active = HashMap::new();
        for key in keys {
            let issuer = key.issuer().clone();
            if active.contains_key(&issuer) {
                return Err(CryptoError::DuplicateIssuer(issuer.to_string()));
            }
            active.insert(issuer, Arc::new(key));
        }
        if active.is_empty() {
            return Err(CryptoError::EmptyKeySet);
        }
        Ok(Self {
            keys: RwLock::new(Keys {
                active,
                retired: Vec::new(),
            }),
        })
    }

    /// Active key for `issuer`, or `None` when none is configured.
    pub fn current_key(&self, issuer: &IssuerId) -> Option<Arc<SigningKey>> {
        self.keys.read().active.get(issuer).cloned()
    }

    /// Replace the active key of `key.issuer()` and return the retired key.
    ///
    /// The issuer must already have an active key, and the new kid must not
    /// collide with any active or retired kid of that issuer.
    pub fn rotate(&self, key: SigningKey) -> Result<Arc<SigningKey>, CryptoError> {
        let mut keys = self.keys.write();
        let issuer = key.issuer().clone();
        let kid_taken = keys
            .active
            .get(&issuer)
            .into_iter()
            .chain(keys.retired.iter().filter(|k| k.issuer() == &issuer))
            .any(|k| k.kid() == key.kid());
        if !keys.active.contains_key(&issuer) {
            return Err(CryptoError::UnknownIssuer(issuer.to_string()));
        }
        if kid_taken {
            return Err(CryptoError::DuplicateKeyId {
                issuer: issuer.to_string(),
                kid: key.kid().to_string(),
            });
        }
        let new_kid = key.kid().to_string();
        let previous = keys
            .active
            .insert(issuer.clone(), Arc::new(key))
            .ok_or_else(|| CryptoError::UnknownIssuer(issuer.to_string()))?;
        keys.retired.push(Arc::clone(&previous));
        tracing::info!(
            issuer = %issuer,
            retired_kid = %previous.kid(),
            active_kid = %new_kid,
            "rotated signing key"
        );
        Ok(previous)
    }

    /// Public keys for `issuer` (or every issuer), active keys first.
    pub fn jwks(&self, issuer: Option<&IssuerId>) -> JwkSet {
        let keys = self.keys.read();
        let wanted = |k: &&Arc<SigningKey>| issuer.map_or(true, |i| k.issuer() == i);
        let mut active: Vec<&Arc<SigningKey>> = keys.active.values().filter(wanted).collect();
        active.sort_by(|a, b| a.issuer().cmp(b.issuer()));
        JwkSet {
            keys: active
                .into_iter()
                .chain(keys.retired.iter().rev().filter(wanted))
                .map(|k| k.public_jwk())
                .collect(),
        }
    }

    /// Issuers with an active key, sorted.
    pub fn issuers(&self) -> Vec<IssuerId> {
        let mut issuers: Vec<IssuerId> = self.keys.read().active.keys().cloned().collect();
        issuers.sort();
        issuers
    }

    /// Number of issuers with an active key.
    pub fn len(&self) -> usize {
        self.keys.read().active.len()
    }

    /// Always false for a constructed store.
    pub fn is_empty(&self) -> bool {
        self.keys.read().active.is_empty()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.keys.read();
        f.debug_struct("KeyStore")
            .field("active", &keys.active.len())
            .field("retired", &keys.retired.len())
            .finish()
    }
}
