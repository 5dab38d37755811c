use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

use crate::jwt::claims::{AUDIENCE, ISSUER, JWT_ID, SUBJECT};
use crate::jwt::{Claim, Claims};
use crate::{Error, Result};

/// Leeway, in seconds, allowed when checking `exp` and `nbf` unless set
/// otherwise.
pub const DEFAULT_LEEWAY_SECONDS: i64 = 60;

/// What a claims set is validated against: a reference time with leeway for
/// `exp` and `nbf`, and expected values for other claims.
///
/// Contexts are values; each `with_*` method returns a modified copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationContext {
    reference_time: Option<DateTime<Utc>>,
    leeway: TimeDelta,
    constraints: Map<String, Value>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationContext {
    /// A context with the current time as reference time, the default
    /// leeway and no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reference_time: Some(Utc::now()),
            leeway: TimeDelta::seconds(DEFAULT_LEEWAY_SECONDS),
            constraints: Map::new(),
        }
    }

    /// Return a copy that checks time claims against `time`.
    #[must_use]
    pub fn with_reference_time(&self, time: DateTime<Utc>) -> Self {
        Self {
            reference_time: Some(time),
            ..self.clone()
        }
    }

    /// Return a copy that does not check time claims.
    #[must_use]
    pub fn without_reference_time(&self) -> Self {
        Self {
            reference_time: None,
            ..self.clone()
        }
    }

    /// The reference time, if any.
    #[must_use]
    pub const fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    /// Return a copy with the leeway allowed for clock skew.
    #[must_use]
    pub fn with_leeway(&self, leeway: TimeDelta) -> Self {
        Self {
            leeway,
            ..self.clone()
        }
    }

    /// The leeway allowed for clock skew.
    #[must_use]
    pub const fn leeway(&self) -> TimeDelta {
        self.leeway
    }

    /// Return a copy expecting `value` for the claim `name`.
    #[must_use]
    pub fn with_constraint(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut constraints = self.constraints.clone();
        constraints.insert(name.into(), value.into());
        Self {
            constraints,
            ..self.clone()
        }
    }

    /// Return a copy expecting the issuer `iss`.
    #[must_use]
    pub fn with_issuer(&self, issuer: impl Into<String>) -> Self {
        self.with_constraint(ISSUER, issuer.into())
    }

    /// Return a copy expecting the subject `sub`.
    #[must_use]
    pub fn with_subject(&self, subject: impl Into<String>) -> Self {
        self.with_constraint(SUBJECT, subject.into())
    }

    /// Return a copy expecting `aud` to be, or to contain, `audience`.
    #[must_use]
    pub fn with_audience(&self, audience: impl Into<String>) -> Self {
        self.with_constraint(AUDIENCE, audience.into())
    }

    /// Return a copy expecting the JWT ID `jti`.
    #[must_use]
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        self.with_constraint(JWT_ID, id.into())
    }

    /// Whether there is a constraint for the claim `name`.
    #[must_use]
    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    /// The constraint for the claim `name`.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&Value> {
        self.constraints.get(name)
    }

    /// Validate every claim in the set against the context.
    ///
    /// # Errors
    /// Returns [`Error::ClaimValidation`] naming the first claim that fails.
    pub fn validate(&self, claims: &Claims) -> Result<()> {
        if let Some(claim) = claims.iter().find(|claim| !claim.validate_with_context(self)) {
            tracing::warn!(claim = claim.name(), "claim validation failed");
            return Err(Error::ClaimValidation(claim.name().to_string()));
        }
        Ok(())
    }

    /// Check a single claim against the context.
    #[must_use]
    pub fn is_valid(&self, claim: &Claim) -> bool {
        claim.validate_with_context(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(timestamp: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(timestamp, 0).expect("should be a valid time")
    }

    #[test]
    fn expiration_time() {
        let now = at(1_700_000_000);
        let ctx = ValidationContext::new().with_reference_time(now).with_leeway(TimeDelta::zero());

        let expired = Claims::new().with_claim(Claim::expiration_time(at(1_699_999_999)));
        let Err(Error::ClaimValidation(name)) = ctx.validate(&expired) else {
            panic!("should fail validation");
        };
        assert_eq!(name, "exp");
        assert_eq!(Error::ClaimValidation(name).to_string(), "validation of claim 'exp' failed");

        // the expiry instant itself is too late
        let expiring = Claims::new().with_claim(Claim::expiration_time(now));
        assert!(ctx.validate(&expiring).is_err());

        let valid = Claims::new().with_claim(Claim::expiration_time(at(1_700_000_001)));
        assert!(ctx.validate(&valid).is_ok());

        // within the default leeway
        assert!(ctx.with_leeway(TimeDelta::seconds(60)).validate(&expired).is_ok());
        assert!(ctx.without_reference_time().validate(&expired).is_ok());
    }

    #[test]
    fn not_before() {
        let now = at(1_700_000_000);
        let ctx =
            ValidationContext::new().with_reference_time(now).with_leeway(TimeDelta::seconds(2));

        let soon = Claims::new().with_claim(Claim::not_before(at(1_700_000_001)));
        assert!(ctx.validate(&soon).is_ok());

        let later = Claims::new().with_claim(Claim::not_before(at(1_700_000_003)));
        assert!(matches!(ctx.validate(&later), Err(Error::ClaimValidation(name)) if name == "nbf"));

        // issued at is never checked
        let issued = Claims::new().with_claim(Claim::issued_at(at(1_800_000_000)));
        assert!(ctx.validate(&issued).is_ok());
    }

    // Bounds beyond the representable range saturate instead of panicking.
    #[test]
    fn extreme_bounds() {
        let now = at(1_700_000_000);
        let claims = Claims::new()
            .with_claim(Claim::expiration_time(now))
            .with_claim(Claim::not_before(now));

        let ctx = ValidationContext::new().with_reference_time(now).with_leeway(TimeDelta::MAX);
        assert!(ctx.validate(&claims).is_ok());

        let ctx = ValidationContext::new().with_reference_time(DateTime::<Utc>::MAX_UTC);
        let result = ctx.validate(&claims);
        assert!(matches!(result, Err(Error::ClaimValidation(name)) if name == "exp"));
        let not_before = Claims::new().with_claim(Claim::not_before(now));
        assert!(ctx.validate(&not_before).is_ok());

        let ctx = ValidationContext::new().with_reference_time(now).with_leeway(TimeDelta::MIN);
        let result = ctx.validate(&claims);
        assert!(matches!(result, Err(Error::ClaimValidation(name)) if name == "exp"));
    }

    #[test]
    fn constraints() {
        let claims = Claims::new()
            .with_claim(Claim::issuer("joe"))
            .with_claim(Claim::audience(["alice", "bob"]))
            .with_claim(Claim::new("role", "admin").with_validator(crate::jwt::Validator::Equals))
            .with_claim(Claim::new("level", 3));

        let ctx = ValidationContext::new()
            .with_issuer("joe")
            .with_audience("bob")
            .with_constraint("role", "admin")
            .with_constraint("level", 4);
        assert!(ctx.validate(&claims).is_ok());

        // no constraint, no check
        assert!(ValidationContext::new().validate(&claims).is_ok());
        assert!(ctx.has_constraint("iss"));
        assert!(!ctx.has_constraint("sub"));

        let result = ctx.with_audience("carol").validate(&claims);
        assert!(matches!(result, Err(Error::ClaimValidation(name)) if name == "aud"));

        // the first failing claim is reported
        let result = ctx.with_issuer("jim").with_constraint("role", "user").validate(&claims);
        assert!(matches!(result, Err(Error::ClaimValidation(name)) if name == "iss"));
    }
}
