//! Message encryption for Web Push (RFC 8291), `aes128gcm` content coding
//! (RFC 8188) with a single record.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use hkdf::Hkdf;
use p256::{ecdh::diffie_hellman, elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;

pub const RECORD_SIZE: u32 = 4096;

/// Record size minus the 86-byte header, the 16-byte tag and the delimiter.
pub const MAX_PLAINTEXT_LEN: usize = 3993;

pub const SALT_LEN: usize = 16;
const AUTH_SECRET_LEN: usize = 16;

const KEY_INFO_PREFIX: &[u8] = b"WebPush: info\0";
const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";
const LAST_RECORD_DELIMITER: u8 = 0x02;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("client public key is not a valid P-256 point")]
    InvalidPublicKey,

    #[error("client auth secret must be 16 bytes, got {0}")]
    InvalidAuthSecret(usize),

    #[error("payload of {0} bytes exceeds the 3993 byte limit")]
    PayloadTooLarge(usize),

    #[error("key derivation failure")]
    KeyDerivation,

    #[error("content cipher failure")]
    Cipher,
}

/// Encrypts `plaintext` for the user agent identified by `ua_public`
/// (uncompressed point) and `auth_secret`, with a fresh sender key and salt.
pub fn encrypt(
    plaintext: &[u8],
    ua_public: &[u8],
    auth_secret: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let sender = SecretKey::random(&mut OsRng);
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    encrypt_with(plaintext, ua_public, auth_secret, &sender, &salt)
}

pub(crate) fn encrypt_with(
    plaintext: &[u8],
    ua_public: &[u8],
    auth_secret: &[u8],
    sender: &SecretKey,
    salt: &[u8; SALT_LEN],
) -> Result<Vec<u8>, EncryptionError> {
    if plaintext.len() > MAX_PLAINTEXT_LEN {
        return Err(EncryptionError::PayloadTooLarge(plaintext.len()));
    }
    if auth_secret.len() != AUTH_SECRET_LEN {
        return Err(EncryptionError::InvalidAuthSecret(auth_secret.len()));
    }

    let ua_key = PublicKey::from_sec1_bytes(ua_public).map_err(|_| EncryptionError::InvalidPublicKey)?;
    let ua_point = ua_key.to_encoded_point(false);
    let as_point = sender.public_key().to_encoded_point(false);

    let shared = diffie_hellman(sender.to_nonzero_scalar(), ua_key.as_affine());
    let (cek, nonce) = derive_content_keys(
        shared.raw_secret_bytes().as_slice(),
        auth_secret,
        ua_point.as_bytes(),
        as_point.as_bytes(),
        salt,
    )?;

    let mut record = Vec::with_capacity(plaintext.len() + 1);
    record.extend_from_slice(plaintext);
    record.push(LAST_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&cek).map_err(|_| EncryptionError::Cipher)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), record.as_slice())
        .map_err(|_| EncryptionError::Cipher)?;

    let keyid = as_point.as_bytes();
    let mut body = Vec::with_capacity(SALT_LEN + 5 + keyid.len() + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(keyid.len() as u8);
    body.extend_from_slice(keyid);
    body.extend_from_slice(&ciphertext);

    Ok(body)
}

/// Derives the content encryption key and nonce shared by both sides.
pub(crate) fn derive_content_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    as_public: &[u8],
    salt: &[u8],
) -> Result<([u8; 16], [u8; 12]), EncryptionError> {
    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(auth_secret), ecdh_secret)
        .expand_multi_info(&[KEY_INFO_PREFIX, ua_public, as_public], &mut ikm)
        .map_err(|_| EncryptionError::KeyDerivation)?;

    let content = Hkdf::<Sha256>::new(Some(salt), &ikm);

    let mut cek = [0u8; 16];
    content
        .expand(CEK_INFO, &mut cek)
        .map_err(|_| EncryptionError::KeyDerivation)?;
    let mut nonce = [0u8; 12];
    content
        .expand(NONCE_INFO, &mut nonce)
        .map_err(|_| EncryptionError::KeyDerivation)?;

    Ok((cek, nonce))
}
