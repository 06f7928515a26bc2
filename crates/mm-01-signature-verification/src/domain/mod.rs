//! # Domain Layer
//!
//! Pure signature logic: typed-data hashing, recovery, the action tuples.

pub mod actions;
pub mod errors;
pub mod recovery;
pub mod typed_data;

use shared_types::Address;

use actions::TypedAction;
use errors::SignatureError;
use recovery::{recover_address, Signature65};
use typed_data::signing_digest;

/// Stateless typed-data signature verifier.
///
/// Deterministic, pure, no I/O, no mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Recover the signer address for `action` from `signature`.
    pub fn recover<T: TypedAction>(
        &self,
        action: &T,
        signature: &Signature65,
    ) -> Result<Address, SignatureError> {
        let digest = signing_digest(action);
        recover_address(&digest, signature)
    }

    /// Recover the signer and require it to equal the claimed wallet address.
    ///
    /// This is the mandatory authentication gate: callers reject the request
    /// on `SignerMismatch` before persisting anything.
    pub fn verify<T: TypedAction>(
        &self,
        action: &T,
        claimed: &Address,
        signature: &Signature65,
    ) -> Result<Address, SignatureError> {
        let recovered = self.recover(action, signature)?;
        if &recovered != claimed {
            return Err(SignatureError::SignerMismatch {
                expected: *claimed,
                actual: recovered,
            });
        }
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{address_of, generate_keypair, sign_typed};

    fn sample_login(member: Address) -> actions::MemberLogin {
        actions::MemberLogin {
            chain_id: 1,
            verifying_contract: [0x11; 20],
            member,
            logged_in: 42,
            timestamp: 1_700_000_000_000_000_000,
            member_email: "alice@example.com".into(),
            client_pubkey: [0x22; 32],
        }
    }

    #[test]
    fn test_verify_accepts_matching_signer() {
        let (sk, vk) = generate_keypair();
        let member = address_of(&vk);
        let action = sample_login(member);
        let sig = sign_typed(&action, &sk);

        let recovered = SignatureVerifier::new()
            .verify(&action, &member, &sig)
            .unwrap();
        assert_eq!(recovered, member);
    }

    #[test]
    fn test_verify_rejects_wrong_claimed_address() {
        let (sk, vk) = generate_keypair();
        let member = address_of(&vk);
        let action = sample_login(member);
        let sig = sign_typed(&action, &sk);

        let other: Address = [0x99; 20];
        let err = SignatureVerifier::new()
            .verify(&action, &other, &sig)
            .unwrap_err();
        assert!(matches!(err, SignatureError::SignerMismatch { .. }));
    }

    #[test]
    fn test_verify_rejects_tampered_field() {
        let (sk, vk) = generate_keypair();
        let member = address_of(&vk);
        let action = sample_login(member);
        let sig = sign_typed(&action, &sk);

        let mut tampered = action.clone();
        tampered.member_email = "mallory@example.com".into();

        // Recovery still succeeds but yields a different address.
        let result = SignatureVerifier::new().verify(&tampered, &member, &sig);
        assert!(result.is_err());
    }

    #[test]
    fn test_verification_deterministic() {
        let (sk, vk) = generate_keypair();
        let member = address_of(&vk);
        let action = sample_login(member);
        let sig = sign_typed(&action, &sk);

        let verifier = SignatureVerifier::new();
        let a = verifier.recover(&action, &sig).unwrap();
        let b = verifier.recover(&action, &sig).unwrap();
        assert_eq!(a, b);
    }
}
