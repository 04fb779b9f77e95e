// [libs/core-vault/src/codec.rs]
//! Sealed-artifact codec (component B). The algorithm contract is bit-exact
//! and must never change shape: PBKDF2-HMAC-SHA256 over the fingerprint
//! bytes with the fixed literal salt below, 100 000 iterations, 48 bytes of
//! output split into a 32-byte AES key and a 16-byte IV; AES-256-CBC with
//! PKCS#7 padding; raw ciphertext on disk, no header, no MAC.

use aes::Aes256;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::errors::VaultError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const PBKDF2_SALT: &[u8] = b"YourSuperSalt!@#";
const PBKDF2_ITERATIONS: u32 = 100_000;
const DERIVED_KEY_MATERIAL_LEN: usize = 48;

fn derive_key_and_iv(fingerprint: &str) -> ([u8; 32], [u8; 16]) {
    let mut derived = [0u8; DERIVED_KEY_MATERIAL_LEN];
    pbkdf2_hmac::<Sha256>(
        fingerprint.as_bytes(),
        PBKDF2_SALT,
        PBKDF2_ITERATIONS,
        &mut derived,
    );
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    key.copy_from_slice(&derived[0..32]);
    iv.copy_from_slice(&derived[32..48]);
    (key, iv)
}

/// Encrypts `plaintext` under a key derived from `fingerprint`.
pub fn seal(plaintext: &[u8], fingerprint: &str) -> Vec<u8> {
    let (key, iv) = derive_key_and_iv(fingerprint);
    let key = GenericArray::from_slice(&key);
    let iv = GenericArray::from_slice(&iv);
    Aes256CbcEnc::new(key, iv).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypts `ciphertext` under a key derived from `fingerprint`. Any
/// decryption or padding failure is reported as `CorruptOrTampered` — the
/// integrity check is implicit in padding validity (spec.md §3).
pub fn open(ciphertext: &[u8], fingerprint: &str) -> Result<Vec<u8>, VaultError> {
    let (key, iv) = derive_key_and_iv(fingerprint);
    let key = GenericArray::from_slice(&key);
    let iv = GenericArray::from_slice(&iv);
    Aes256CbcDec::new(key, iv)
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| VaultError::CorruptOrTampered)
}
