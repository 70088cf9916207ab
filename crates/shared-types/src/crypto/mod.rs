// Cryptographic module
// Hashing, signing, and verification functionality

pub mod keys;

pub use keys::{sha256, sha256_hex, EphemeralIdentity, SigningIdentity};
