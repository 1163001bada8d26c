//! AES payload encryption for `biz_content`.
//!
//! The gateway's content-encryption protocol is `AES/CBC/PKCS5Padding` with a
//! 128-bit key and a fixed all-zero IV. The IV is not randomized because the
//! counterparty decrypts with the same fixed IV; identical plaintexts
//! therefore produce identical ciphertexts. This is a protocol constraint.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Algorithm identifier the gateway uses for this cipher.
pub const AES_ALGORITHM: &str = "AES/CBC/PKCS5Padding";

/// Value of the `encrypt_type` request field.
pub const ENCRYPT_TYPE_AES: &str = "AES";

const KEY_LEN: usize = 16;

/// Fixed by the gateway protocol.
const ZERO_IV: [u8; 16] = [0u8; 16];

/// A 128-bit AES content key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesKey([u8; KEY_LEN]);

impl AesKey {
    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode the base64 key string issued by the developer console.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let mut raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidSymmetricKey(e.to_string()))?;

        let result = <[u8; KEY_LEN]>::try_from(raw.as_slice())
            .map(Self)
            .map_err(|_| {
                CryptoError::InvalidSymmetricKey(format!(
                    "expected {} bytes, got {}",
                    KEY_LEN,
                    raw.len()
                ))
            });
        raw.zeroize();
        result
    }

    /// Encrypt UTF-8 plaintext, returning base64 ciphertext.
    ///
    /// # Example
    /// ```
    /// use alipay_crypto::AesKey;
    ///
    /// let key = AesKey::from_bytes([7u8; 16]);
    /// let ciphertext = key.encrypt(r#"{"out_trade_no":"1"}"#);
    /// assert_eq!(key.decrypt(&ciphertext).unwrap(), r#"{"out_trade_no":"1"}"#);
    /// ```
    pub fn encrypt(&self, plaintext: &str) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.0.into(), &ZERO_IV.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        STANDARD.encode(ciphertext)
    }

    /// Decrypt base64 ciphertext back to UTF-8 plaintext.
    pub fn decrypt(&self, ciphertext: &str) -> CryptoResult<String> {
        let compact: String = ciphertext.split_whitespace().collect();
        let raw = STANDARD
            .decode(compact)
            .map_err(|e| CryptoError::Decryption(format!("ciphertext is not base64: {}", e)))?;

        let plaintext = Aes128CbcDec::new(&self.0.into(), &ZERO_IV.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&raw)
            .map_err(|_| CryptoError::Decryption("bad block length or padding".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption("plaintext is not UTF-8".to_string()))
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesKey([REDACTED])")
    }
}
