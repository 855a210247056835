use std::{borrow::Cow, fmt};

use super::Error;

/// An email address that passed syntax validation.
///
/// Equality is an exact, case-sensitive comparison of the address text.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub(crate) fn parse<'s, S>(s: S) -> Result<Self, Error>
    where
        S: Into<Cow<'s, str>>,
    {
        let s = s.into();
        if validator::validate_email(s.as_ref()) {
            Ok(Self(s.into_owned()))
        } else {
            Err(Error(format!("{} is not a valid email", s)))
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
