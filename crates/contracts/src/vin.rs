//! Vin - validated vehicle identifier
//!
//! Uses Arc<str> internally for O(1) clone operations; the VIN is cloned into
//! every request header and log span.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use crate::ContractError;

/// Default identifier used when neither argument nor environment provides one
pub const DEFAULT_VIN: &str = "5YJ3E1EA1KF000001";

/// Required VIN length
pub const VIN_LEN: usize = 17;

/// Vehicle identification number with cheap cloning.
///
/// Always exactly 17 ASCII alphanumeric characters, which also makes it safe
/// to embed in file names.
///
/// # Examples
/// ```
/// use contracts::Vin;
///
/// let vin: Vin = "5YJ3E1EA1KF000001".parse().unwrap();
/// assert_eq!(vin.as_str(), "5YJ3E1EA1KF000001");
/// assert!("TOO-SHORT".parse::<Vin>().is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Vin(Arc<str>);

impl Vin {
    /// Validate and wrap a VIN
    pub fn new(s: &str) -> Result<Self, ContractError> {
        if s.len() != VIN_LEN {
            return Err(ContractError::config_validation(
                "vin",
                format!("expected {VIN_LEN} characters, got {} ('{s}')", s.len()),
            ));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ContractError::config_validation(
                "vin",
                format!("'{s}' contains non-alphanumeric characters"),
            ));
        }
        Ok(Self(Arc::from(s)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing six characters (serial part), handy for compact log lines
    pub fn short(&self) -> &str {
        &self.0[VIN_LEN - 6..]
    }
}

impl Default for Vin {
    fn default() -> Self {
        Self(Arc::from(DEFAULT_VIN))
    }
}

impl Deref for Vin {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Vin {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Vin {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vin({:?})", self.0)
    }
}

impl PartialEq<str> for Vin {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Vin {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

// Serde support
impl Serialize for Vin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Vin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}
