//! # credvault-core: Foundational Types for credvault
//!
//! The leaf crate of the workspace. It defines the primitives that every
//! other crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every signed token payload flows through
//!    `CanonicalBytes::new()` (RFC 8785 JCS). No raw `serde_json::to_vec()`
//!    on a signing path.
//!
//! 2. **Newtype wrappers for identifiers.** `IssuerId`, `CredentialId` and
//!    `KeyId` are distinct types with validated constructors, so an issuer
//!    identity can never be passed where a key id is expected.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC, truncated to seconds,
//!    which is exactly the precision of JWT NumericDate claims.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `credvault-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CoreError};
pub use identity::{CredentialId, IssuerId, KeyId};
pub use temporal::Timestamp;
