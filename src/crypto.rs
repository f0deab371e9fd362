//! Signature collaborator: ECDSA over secp256k1
//!
//! The ledger core only needs `sign`, `verify`, the compressed public key and
//! its hash. `Signer` is the seam; `KeyPair` is the secp256k1 implementation.

use secp256k1::{ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey};

use crate::error::{ConsensusError, Result};
use crate::hashing::sha256;
use crate::types::*;

/// Anything able to sign a 32-byte digest on behalf of one public key
pub trait Signer {
    /// 33-byte compressed public key
    fn public_key(&self) -> ByteString;

    /// DER-encoded signature over `digest`
    fn sign(&self, digest: &Hash) -> Result<ByteString>;

    /// Hash outputs are locked to
    fn public_key_hash(&self) -> Hash {
        hash_public_key(&self.public_key())
    }
}

/// secp256k1 key pair
pub struct KeyPair {
    secp: Secp256k1<All>,
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Build a key pair from a 32-byte secret scalar
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self> {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(secret)
            .map_err(|e| ConsensusError::InvalidSignature(format!("invalid secret key: {}", e)))?;
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self { secp, secret, public })
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> ByteString {
        self.public.serialize().to_vec()
    }

    fn sign(&self, digest: &Hash) -> Result<ByteString> {
        let message = Message::from_digest_slice(digest)
            .map_err(|e| ConsensusError::InvalidSignature(format!("invalid digest: {}", e)))?;
        let signature = self.secp.sign_ecdsa(&message, &self.secret);
        Ok(signature.serialize_der().to_vec())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Verify a DER signature over `digest`; malformed keys or signatures are `false`
pub fn verify_signature(public_key: &[u8], signature: &[u8], digest: &Hash) -> bool {
    let secp = Secp256k1::verification_only();

    let public_key = match PublicKey::from_slice(public_key) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = match Message::from_digest_slice(digest) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}

/// Hash of a compressed public key
pub fn hash_public_key(public_key: &[u8]) -> Hash {
    sha256(public_key)
}
