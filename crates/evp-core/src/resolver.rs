//! # Address Resolution
//!
//! Maps an attester identifier (the `issuer` or `holder` of a claim) to the
//! chain address of its proxy identity and the network it lives on.
//!
//! Dispatch is by DID method tag, the same shape as proof-type selection:
//! split out the method, match it against [`DidMethod`], and decode the
//! method-specific identifier. A bare `0x` address is tolerated for
//! compatibility and reported with a `warn!` event.

use crate::error::ResolveError;
use crate::identity::{ChainAddress, Did, Identity};
use crate::mnid::Mnid;

/// DID methods this resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DidMethod {
    /// `did:ev:<mnid>`.
    Ev,
}

impl DidMethod {
    /// Every supported method.
    pub const ALL: [DidMethod; 1] = [DidMethod::Ev];

    /// The method tag as it appears in a DID.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ev => "ev",
        }
    }

    /// Look up a method by tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.tag() == tag)
    }

    fn resolve(&self, did: &Did) -> Result<Identity, ResolveError> {
        match self {
            Self::Ev => {
                let mnid = Mnid::decode(did.method_specific_id())?;
                Ok(Identity {
                    did: did.as_str().to_string(),
                    address: mnid.address,
                    network: Some(mnid.network),
                })
            }
        }
    }
}

impl std::fmt::Display for DidMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "did:{}:", self.tag())
    }
}

/// Resolves attester identifiers into [`Identity`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve an identifier to an identity.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::DidRequired`] for an empty identifier.
    /// - [`ResolveError::UnsupportedMethod`] for a well-formed DID whose
    ///   method is not in [`DidMethod::ALL`].
    /// - [`ResolveError::InvalidMnid`] if a `did:ev:` payload does not decode.
    /// - [`ResolveError::UnrecognizedIdentifier`] for anything else.
    pub fn resolve(&self, identifier: &str) -> Result<Identity, ResolveError> {
        if identifier.is_empty() {
            return Err(ResolveError::DidRequired);
        }

        if identifier.starts_with("did:") {
            let did = Did::new(identifier)
                .map_err(|_| ResolveError::UnrecognizedIdentifier(identifier.to_string()))?;
            return match DidMethod::from_tag(did.method()) {
                Some(method) => method.resolve(&did),
                None => Err(ResolveError::UnsupportedMethod {
                    method: did.method().to_string(),
                    did: identifier.to_string(),
                }),
            };
        }

        if ChainAddress::looks_like_address(identifier) {
            tracing::warn!(
                identifier,
                "raw address received where a DID was expected"
            );
            return Ok(Identity {
                did: identifier.to_string(),
                address: ChainAddress::parse(identifier)?,
                network: None,
            });
        }

        Err(ResolveError::UnrecognizedIdentifier(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ev_did() {
        let id = AddressResolver::new()
            .resolve("did:ev:bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU")
            .unwrap();
        assert_eq!(id.address.to_hex(), "0xb23ed97aa64ebeb5df0095b025b016526418dcf4");
        assert_eq!(id.network.map(|n| n.value()), Some(80001));
        assert_eq!(id.did, "did:ev:bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU");
    }

    #[test]
    fn accepts_raw_address_without_network() {
        let id = AddressResolver::new()
            .resolve("0xb23ed97aa64ebeb5df0095b025b016526418dcf4")
            .unwrap();
        assert_eq!(id.network, None);
        assert_eq!(id.address.to_hex(), "0xb23ed97aa64ebeb5df0095b025b016526418dcf4");
    }

    #[test]
    fn rejects_unknown_method() {
        let err = AddressResolver::new().resolve("did:web:example.com").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnsupportedMethod {
                method: "web".to_string(),
                did: "did:web:example.com".to_string(),
            }
        );
    }

    #[test]
    fn rejects_unrecognized_identifier() {
        let resolver = AddressResolver::new();
        assert!(matches!(
            resolver.resolve("alice"),
            Err(ResolveError::UnrecognizedIdentifier(_))
        ));
        assert!(matches!(
            resolver.resolve("did:"),
            Err(ResolveError::UnrecognizedIdentifier(_))
        ));
        assert!(matches!(
            resolver.resolve("0x1234"),
            Err(ResolveError::UnrecognizedIdentifier(_))
        ));
    }

    #[test]
    fn rejects_empty_identifier() {
        assert_eq!(AddressResolver::new().resolve(""), Err(ResolveError::DidRequired));
    }

    #[test]
    fn bad_mnid_surfaces_as_invalid_mnid() {
        let err = AddressResolver::new().resolve("did:ev:notanmnid").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidMnid { .. }));
    }

    #[test]
    fn method_tags_roundtrip() {
        for m in DidMethod::ALL {
            assert_eq!(DidMethod::from_tag(m.tag()), Some(m));
        }
        assert_eq!(DidMethod::from_tag("key"), None);
        assert_eq!(DidMethod::Ev.to_string(), "did:ev:");
    }
}
