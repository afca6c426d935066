//! State and proof-of-possession generation for the authorization request
//!
//! Produces the anti-replay state nonce and the code verifier/challenge
//! pair. The challenge derivation policy is explicit: the deployed MonArt
//! backend verifies the challenge as an opaque string (`plain`), while
//! `S256` implements the RFC 7636 digest for backends that verify a hash.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use monart_domain::ChallengeMethod;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a random URL-safe token of 32 bytes (43 characters)
///
/// Used for both the state nonce and the code verifier. Within the
/// RFC 7636 verifier length bounds (43-128 characters).
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate the anti-replay state nonce for the authorization request
#[must_use]
pub fn generate_state() -> String {
    generate_token()
}

/// Derive the code challenge from a verifier under the given policy
#[must_use]
pub fn derive_challenge(verifier: &str, method: ChallengeMethod) -> String {
    match method {
        ChallengeMethod::Plain => verifier.to_string(),
        ChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(hasher.finalize())
        }
    }
}

/// Verifier/challenge pair proving the token requester started the flow
///
/// The verifier stays client-side until token exchange; the challenge is
/// sent with the authorization request.
#[derive(Debug, Clone)]
pub struct ProofOfPossession {
    pub verifier: String,
    pub challenge: String,
    pub method: ChallengeMethod,
}

impl ProofOfPossession {
    /// Generate a fresh verifier and derive its challenge
    #[must_use]
    pub fn generate(method: ChallengeMethod) -> Self {
        let verifier = generate_token();
        let challenge = derive_challenge(&verifier, method);
        Self { verifier, challenge, method }
    }

    /// Value of the `code_challenge_method` authorization parameter
    #[must_use]
    pub fn method_param(&self) -> &'static str {
        self.method.as_param()
    }
}
