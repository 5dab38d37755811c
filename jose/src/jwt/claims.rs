//! JWT claims ([RFC7519] §4).
//!
//! [RFC7519]: https://www.rfc-editor.org/rfc/rfc7519#section-4

use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

use crate::jwt::ValidationContext;
use crate::{Error, Result};

/// `iss`
pub const ISSUER: &str = "iss";
/// `sub`
pub const SUBJECT: &str = "sub";
/// `aud`
pub const AUDIENCE: &str = "aud";
/// `exp`
pub const EXPIRATION_TIME: &str = "exp";
/// `nbf`
pub const NOT_BEFORE: &str = "nbf";
/// `iat`
pub const ISSUED_AT: &str = "iat";
/// `jti`
pub const JWT_ID: &str = "jti";

/// How a claim value is compared with the constraint a
/// [`ValidationContext`] holds for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validator {
    /// The value equals the constraint.
    Equals,

    /// The value is the constraint, or a list containing it.
    Contains,

    /// The value is a number greater than the constraint.
    Greater,

    /// The value is a number less than or equal to the constraint.
    LessOrEqual,
}

impl Validator {
    /// Compare `value` with `constraint`.
    #[must_use]
    pub fn validate(self, value: &Value, constraint: &Value) -> bool {
        match self {
            Self::Equals => value == constraint,
            Self::Contains => match value {
                Value::Array(values) => values.contains(constraint),
                value => value == constraint,
            },
            Self::Greater => match (value.as_i64(), constraint.as_i64()) {
                (Some(value), Some(constraint)) => value > constraint,
                _ => false,
            },
            Self::LessOrEqual => match (value.as_i64(), constraint.as_i64()) {
                (Some(value), Some(constraint)) => value <= constraint,
                _ => false,
            },
        }
    }
}

/// A single claim: a name, a JSON value and, optionally, how the value is
/// validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Claim {
    name: String,
    value: Value,
    validator: Option<Validator>,
}

impl Claim {
    /// A custom claim without validation.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            validator: None,
        }
    }

    /// Return a copy validated against the context's constraint for the
    /// claim's name.
    #[must_use]
    pub fn with_validator(&self, validator: Validator) -> Self {
        Self {
            validator: Some(validator),
            ..self.clone()
        }
    }

    /// `iss`: the principal that issued the JWT.
    #[must_use]
    pub fn issuer(issuer: impl Into<String>) -> Self {
        Self::new(ISSUER, issuer.into()).with_validator(Validator::Equals)
    }

    /// `sub`: the principal that is the subject of the JWT.
    #[must_use]
    pub fn subject(subject: impl Into<String>) -> Self {
        Self::new(SUBJECT, subject.into()).with_validator(Validator::Equals)
    }

    /// `aud`: the recipients the JWT is intended for. A single audience is
    /// kept as a string, several as a list.
    #[must_use]
    pub fn audience<I, S>(audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut audience: Vec<Value> =
            audience.into_iter().map(|aud| Value::String(aud.into())).collect();
        let value = if audience.len() == 1 { audience.remove(0) } else { Value::Array(audience) };
        Self::new(AUDIENCE, value).with_validator(Validator::Contains)
    }

    /// `exp`: the time on or after which the JWT must not be accepted.
    #[must_use]
    pub fn expiration_time(time: DateTime<Utc>) -> Self {
        Self::new(EXPIRATION_TIME, time.timestamp()).with_validator(Validator::Greater)
    }

    /// `nbf`: the time before which the JWT must not be accepted.
    #[must_use]
    pub fn not_before(time: DateTime<Utc>) -> Self {
        Self::new(NOT_BEFORE, time.timestamp()).with_validator(Validator::LessOrEqual)
    }

    /// `iat`: the time the JWT was issued. Not validated.
    #[must_use]
    pub fn issued_at(time: DateTime<Utc>) -> Self {
        Self::new(ISSUED_AT, time.timestamp())
    }

    /// `jti`: a unique identifier for the JWT.
    #[must_use]
    pub fn jwt_id(id: impl Into<String>) -> Self {
        Self::new(JWT_ID, id.into()).with_validator(Validator::Equals)
    }

    /// Build a claim from a name and value as received, giving registered
    /// claims their validators.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when a registered claim has a value of the
    /// wrong type.
    pub fn from_parts(name: impl Into<String>, value: Value) -> Result<Self> {
        let name = name.into();
        let validator = match name.as_str() {
            ISSUER | SUBJECT | JWT_ID => {
                check_kind(&name, value.is_string(), "a string")?;
                Some(Validator::Equals)
            }
            AUDIENCE => {
                let valid = match &value {
                    Value::String(_) => true,
                    Value::Array(values) => values.iter().all(Value::is_string),
                    _ => false,
                };
                check_kind(&name, valid, "a string or a list of strings")?;
                Some(Validator::Contains)
            }
            EXPIRATION_TIME | NOT_BEFORE | ISSUED_AT => {
                check_kind(&name, value.is_i64(), "a NumericDate")?;
                match name.as_str() {
                    EXPIRATION_TIME => Some(Validator::Greater),
                    NOT_BEFORE => Some(Validator::LessOrEqual),
                    _ => None,
                }
            }
            _ => None,
        };
        Ok(Self {
            name,
            value,
            validator,
        })
    }

    /// The claim name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The claim value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The validator, if any.
    #[must_use]
    pub const fn validator(&self) -> Option<Validator> {
        self.validator
    }

    /// The value as a time, for NumericDate claims.
    #[must_use]
    pub fn numeric_date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.value.as_i64()?, 0)
    }

    /// Check the claim against the context.
    ///
    /// `exp` and `nbf` are checked against the context's reference time,
    /// allowing for its leeway, and pass when the context has no reference
    /// time. Other claims are checked only when they have a validator and
    /// the context has a constraint for them.
    #[must_use]
    pub fn validate_with_context(&self, ctx: &ValidationContext) -> bool {
        let Some(validator) = self.validator else {
            return true;
        };

        if matches!(self.name.as_str(), EXPIRATION_TIME | NOT_BEFORE) {
            let Some(reference) = ctx.reference_time() else {
                return true;
            };
            let is_exp = self.name == EXPIRATION_TIME;
            let leeway = ctx.leeway();
            let bound = if is_exp {
                reference.checked_sub_signed(leeway)
            } else {
                reference.checked_add_signed(leeway)
            };
            // saturate on overflow
            let lower = is_exp == (leeway > TimeDelta::zero());
            let bound = bound.unwrap_or(if lower {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
            return validator.validate(&self.value, &Value::from(bound.timestamp()));
        }

        ctx.constraint(&self.name)
            .is_none_or(|constraint| validator.validate(&self.value, constraint))
    }
}

fn check_kind(name: &str, valid: bool, kind: &str) -> Result<()> {
    if !valid {
        return Err(Error::Format(format!("claim `{name}` must be {kind}")));
    }
    Ok(())
}

/// A JWT Claims Set: claims in insertion order, with unique names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Claims {
    claims: Vec<Claim>,
}

impl Claims {
    /// An empty claims set.
    #[must_use]
    pub const fn new() -> Self {
        Self { claims: Vec::new() }
    }

    /// Return a copy with the claim added, replacing any claim of the same
    /// name in place.
    #[must_use]
    pub fn with_claim(&self, claim: Claim) -> Self {
        let mut claims = self.claims.clone();
        match claims.iter_mut().find(|c| c.name == claim.name) {
            Some(existing) => *existing = claim,
            None => claims.push(claim),
        }
        Self { claims }
    }

    /// The claim with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.name == name)
    }

    /// Whether a claim with the given name is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over the claims in order.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    /// The number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Parse a JSON object of claims.
    ///
    /// # Errors
    /// Returns [`Error::Format`] when the JSON is not an object or a
    /// registered claim has a value of the wrong type.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_slice(json)?;
        let claims = map
            .into_iter()
            .map(|(name, value)| Claim::from_parts(name, value))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { claims })
    }

    /// Serialize the claims as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        let map: Map<String, Value> =
            self.claims.iter().map(|c| (c.name.clone(), c.value.clone())).collect();
        Value::Object(map).to_string()
    }
}

impl<'a> IntoIterator for &'a Claims {
    type IntoIter = std::slice::Iter<'a, Claim>;
    type Item = &'a Claim;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}

impl FromIterator<Claim> for Claims {
    fn from_iter<T: IntoIterator<Item = Claim>>(iter: T) -> Self {
        iter.into_iter().fold(Self::new(), |claims, claim| claims.with_claim(claim))
    }
}

impl FromStr for Claims {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s.as_bytes())
    }
}

impl Display for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
