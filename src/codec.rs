//! Per-file authenticated encryption
//!
//! Every managed file is sealed on its own with AES-256-GCM. The key is derived
//! with scrypt from the password, using the file's relative path as salt, so a
//! key is a deterministic function of `(password, identifier)`. A renamed
//! ciphertext therefore fails to open under its new identity, the same way a
//! tampered one does.
//!
//! ## Blob Layout
//!
//! ```text
//! +-----------+----------------------+-----------+
//! | nonce 12B | ciphertext (n bytes) | tag 16B   |
//! +-----------+----------------------+-----------+
//! ```
//!
//! There is no header or version byte. A blob is independently decryptable
//! given the password and the identifier it was sealed with.
//!
//! ## Example
//!
//! ```rust,no_run
//! use obsidian_vault::codec::Codec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = Codec::new();
//! let blob = codec.encrypt(b"hello", "pw", "note1.md")?;
//! assert_eq!(codec.decrypt(&blob, "pw", "note1.md")?, b"hello");
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, VaultError};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// scrypt cost parameter, log2(N) with N = 32768
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// scrypt work factors
///
/// The defaults are fixed and deliberately expensive. Changing them makes
/// every existing blob undecryptable, so [`Codec::new`] always uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl KdfParams {
    /// Create validated scrypt parameters
    ///
    /// # Errors
    ///
    /// - [`VaultError::KeyDerivation`] if scrypt rejects the combination
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        scrypt::Params::new(log_n, r, p, KEY_SIZE)
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
        Ok(Self { log_n, r, p })
    }

    /// log2 of the CPU/memory cost
    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    fn to_scrypt(self) -> Result<scrypt::Params> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_SIZE)
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: SCRYPT_LOG_N,
            r: SCRYPT_R,
            p: SCRYPT_P,
        }
    }
}

/// A 256-bit file key, wiped on drop
pub struct DerivedKey(Zeroizing<[u8; KEY_SIZE]>);

impl DerivedKey {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Authenticated encryption of single files keyed by `(password, identifier)`
///
/// The codec is stateless apart from its KDF parameters and can be shared
/// across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    params: KdfParams,
}

impl Codec {
    /// Codec with the fixed production parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with custom KDF parameters
    ///
    /// Blobs written with non-default parameters can only be opened by a codec
    /// configured the same way.
    pub fn with_params(params: KdfParams) -> Self {
        Self { params }
    }

    /// KDF parameters in use
    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive the key for a file
    ///
    /// The identifier is used verbatim as the scrypt salt. Same inputs always
    /// yield the same key.
    ///
    /// # Errors
    ///
    /// - [`VaultError::KeyDerivation`] if the parameters are rejected
    pub fn derive_key(&self, password: &str, identifier: &str) -> Result<DerivedKey> {
        let params = self.params.to_scrypt()?;
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        scrypt::scrypt(
            password.as_bytes(),
            identifier.as_bytes(),
            &params,
            key.as_mut(),
        )
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
        Ok(DerivedKey(key))
    }

    /// Encrypt a file's bytes
    ///
    /// Draws a fresh random nonce from the OS on every call, so two encryptions
    /// of the same input never produce the same blob.
    ///
    /// # Returns
    ///
    /// `nonce || ciphertext || tag`
    pub fn encrypt(&self, plaintext: &[u8], password: &str, identifier: &str) -> Result<Vec<u8>> {
        let key = self.derive_key(password, identifier)?;
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let sealed = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`Codec::encrypt`]
    ///
    /// # Errors
    ///
    /// - [`VaultError::Authentication`] if the blob is truncated or tampered, or
    ///   the password or identifier differ from the ones it was sealed with
    /// - [`VaultError::KeyDerivation`] if the parameters are rejected
    pub fn decrypt(&self, blob: &[u8], password: &str, identifier: &str) -> Result<Vec<u8>> {
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::Authentication {
                identifier: identifier.to_string(),
            });
        }

        let key = self.derive_key(password, identifier)?;
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let (nonce, sealed) = blob.split_at(NONCE_SIZE);

        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VaultError::Authentication {
                identifier: identifier.to_string(),
            })
    }
}
