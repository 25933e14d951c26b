//! Ed25519 keypairs and the signing capability the assembler consumes.
//!
//! Secret material only ever lives inside an `ed25519_dalek::SigningKey`
//! (zeroized on drop) or a `Zeroizing` buffer while it is being decoded.

use std::fmt;

use ed25519_dalek::Signer as _;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::error::TxError;

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    pub const LEN: usize = 64;

    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Check this signature over `message` against `pubkey`.
    pub fn verify(&self, pubkey: &Address, message: &[u8]) -> bool {
        let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(pubkey.as_bytes()) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify_strict(message, &sig).is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

/// Anything that can sign a transaction message for one address.
pub trait Signer {
    fn pubkey(&self) -> Address;

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, TxError>;
}

/// An Ed25519 keypair held in memory for the duration of a call.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    /// Build a keypair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Build a keypair from raw secret bytes.
    ///
    /// Accepts a 32-byte seed or the 64-byte `seed || public key` layout
    /// wallets export. For the latter the public half must match the seed.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        match bytes.len() {
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(bytes);
                Ok(Self::from_seed(&seed))
            }
            64 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(&bytes[..32]);
                let keypair = Self::from_seed(&seed);
                if keypair.pubkey().as_bytes()[..] != bytes[32..] {
                    return Err(TxError::ContractViolation(
                        "public half of secret key does not match its seed".into(),
                    ));
                }
                Ok(keypair)
            }
            n => Err(TxError::InvalidPrivateKey(format!(
                "expected 32 or 64 bytes, got {n}"
            ))),
        }
    }

    /// Decode a Base58 secret key (the format most wallets export).
    pub fn from_base58_string(encoded: &str) -> Result<Self, TxError> {
        let bytes = Zeroizing::new(
            bs58::decode(encoded)
                .into_vec()
                .map_err(|e| TxError::InvalidPrivateKey(format!("base58 decode failed: {e}")))?,
        );
        Self::from_secret_bytes(&bytes)
    }

    /// Generate a fresh keypair from a cryptographic RNG.
    pub fn generate<R: rand_core::CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(rng),
        }
    }

    pub fn pubkey(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Address {
        Keypair::pubkey(self)
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, TxError> {
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| TxError::Signing(e.to_string()))?;
        Ok(Signature::new(signature.to_bytes()))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
