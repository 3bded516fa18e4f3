//! Ordered verification chain
//!
//! Schemes are tried in registration order and the first one that accepts
//! wins. The order is policy: if a credential ever verified under more than
//! one scheme, the earlier scheme is recorded. Default order is Substrate,
//! then Ethereum; new schemes append to the end.

use tracing::debug;

use super::{AccountVerifier, EthereumVerifier, SchemeId, SubstrateVerifier};
use crate::auth::Credential;
use crate::types::{GatewayError, Result};

/// Result of running a credential through the chain.
///
/// Produced fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub valid: bool,
    pub scheme_used: Option<SchemeId>,
    /// Per-scheme failure notes when nothing accepted
    pub diagnostic: Option<String>,
}

impl VerificationOutcome {
    pub fn accepted(scheme: SchemeId) -> Self {
        Self {
            valid: true,
            scheme_used: Some(scheme),
            diagnostic: None,
        }
    }

    pub fn rejected(diagnostic: impl Into<String>) -> Self {
        Self {
            valid: false,
            scheme_used: None,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Ordered list of account verifiers, fixed at startup
pub struct VerificationChain {
    verifiers: Vec<Box<dyn AccountVerifier>>,
}

impl VerificationChain {
    /// Build a chain from an explicit, ordered list of verifiers.
    ///
    /// An empty list is a configuration error.
    pub fn new(verifiers: Vec<Box<dyn AccountVerifier>>) -> Result<Self> {
        if verifiers.is_empty() {
            return Err(GatewayError::Config(
                "at least one verification scheme must be registered".to_string(),
            ));
        }
        Ok(Self { verifiers })
    }

    /// Substrate first, then Ethereum
    pub fn with_default_schemes() -> Self {
        Self {
            verifiers: vec![
                Box::new(SubstrateVerifier::new()),
                Box::new(EthereumVerifier::new()),
            ],
        }
    }

    /// Append a scheme with the lowest priority
    pub fn register(mut self, verifier: impl AccountVerifier + 'static) -> Self {
        self.verifiers.push(Box::new(verifier));
        self
    }

    /// Registered schemes in priority order
    pub fn schemes(&self) -> Vec<SchemeId> {
        self.verifiers.iter().map(|v| v.scheme()).collect()
    }

    pub fn verify(&self, credential: &Credential) -> VerificationOutcome {
        let mut failures = Vec::with_capacity(self.verifiers.len());

        for verifier in &self.verifiers {
            let scheme = verifier.scheme();
            match verifier.verify(&credential.address, &credential.signature) {
                Ok(true) => return VerificationOutcome::accepted(scheme),
                Ok(false) => {
                    debug!(scheme = %scheme, address = %credential.address, "Signature does not match");
                    failures.push(format!("{}: signature mismatch", scheme));
                }
                Err(e) => {
                    debug!(scheme = %scheme, address = %credential.address, error = %e, "Scheme rejected credential");
                    failures.push(format!("{}: {}", scheme, e));
                }
            }
        }

        VerificationOutcome::rejected(failures.join("; "))
    }
}

impl std::fmt::Debug for VerificationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationChain")
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::VerifyError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fixed-answer verifier that counts invocations
    struct StubVerifier {
        scheme: SchemeId,
        answer: std::result::Result<bool, VerifyError>,
        calls: Arc<AtomicUsize>,
    }

    impl StubVerifier {
        fn new(name: &'static str, answer: std::result::Result<bool, VerifyError>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let stub = Self {
                scheme: SchemeId::new(name),
                answer,
                calls: Arc::clone(&calls),
            };
            (stub, calls)
        }
    }

    impl AccountVerifier for StubVerifier {
        fn scheme(&self) -> SchemeId {
            self.scheme
        }

        fn verify(&self, _address: &str, _signature: &str) -> std::result::Result<bool, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn credential() -> Credential {
        Credential::new("addr", "sig")
    }

    #[test]
    fn test_empty_chain_is_config_error() {
        assert!(matches!(
            VerificationChain::new(Vec::new()),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_default_order() {
        let chain = VerificationChain::with_default_schemes();
        assert_eq!(chain.schemes(), vec![SchemeId::SUBSTRATE, SchemeId::ETHEREUM]);
    }

    #[test]
    fn test_first_match_wins_and_short_circuits() {
        let (first, first_calls) = StubVerifier::new("first", Ok(true));
        let (second, second_calls) = StubVerifier::new("second", Ok(true));
        let chain = VerificationChain::new(vec![Box::new(first), Box::new(second)]).unwrap();

        let outcome = chain.verify(&credential());
        assert_eq!(outcome, VerificationOutcome::accepted(SchemeId::new("first")));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_do_not_stop_the_chain() {
        let (broken, _) = StubVerifier::new("broken", Err(VerifyError::RecoveryFailed));
        let (working, calls) = StubVerifier::new("working", Ok(true));
        let chain = VerificationChain::new(vec![Box::new(broken), Box::new(working)]).unwrap();

        let outcome = chain.verify(&credential());
        assert!(outcome.valid);
        assert_eq!(outcome.scheme_used, Some(SchemeId::new("working")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_rejected_records_diagnostics() {
        let (a, _) = StubVerifier::new("a", Ok(false));
        let (b, _) = StubVerifier::new("b", Err(VerifyError::InvalidAddress("bad".into())));
        let chain = VerificationChain::new(vec![Box::new(a), Box::new(b)]).unwrap();

        let outcome = chain.verify(&credential());
        assert!(!outcome.valid);
        assert_eq!(outcome.scheme_used, None);
        assert_eq!(
            outcome.diagnostic.as_deref(),
            Some("a: signature mismatch; b: invalid address: bad")
        );
    }

    #[test]
    fn test_register_appends_lowest_priority() {
        let (extra, calls) = StubVerifier::new("solana", Ok(true));
        let chain = VerificationChain::with_default_schemes().register(extra);

        assert_eq!(
            chain.schemes(),
            vec![SchemeId::SUBSTRATE, SchemeId::ETHEREUM, SchemeId::new("solana")]
        );

        let outcome = chain.verify(&credential());
        assert_eq!(outcome.scheme_used, Some(SchemeId::new("solana")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_outcome_is_stable_across_calls() {
        let chain = VerificationChain::with_default_schemes();
        let credential = Credential::new("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY", "0x00");
        assert_eq!(chain.verify(&credential), chain.verify(&credential));
    }
}
