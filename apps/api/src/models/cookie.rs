use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Tri-state validation status of a stored cookie.
///
/// `Unknown` means the record has never been probed. On the wire and in the
/// database this is a nullable boolean: null / true / false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Unknown,
    Valid,
    Invalid,
}

impl Validity {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Validity::Unknown => None,
            Validity::Valid => Some(true),
            Validity::Invalid => Some(false),
        }
    }

    pub fn from_bool(value: Option<bool>) -> Self {
        match value {
            None => Validity::Unknown,
            Some(true) => Validity::Valid,
            Some(false) => Validity::Invalid,
        }
    }
}

impl Serialize for Validity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bool().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Validity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Validity::from_bool(Option::<bool>::deserialize(
            deserializer,
        )?))
    }
}

/// Verdict produced by one validation attempt for a website's cookie set.
///
/// Unlike `Validity` this is never unknown: every probe terminates in a
/// verdict, transport failures included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Valid,
    Invalid,
}

impl Verdict {
    pub fn as_bool(self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn validity(self) -> Validity {
        match self {
            Verdict::Valid => Validity::Valid,
            Verdict::Invalid => Validity::Invalid,
        }
    }
}

/// A cookie name/value pair as supplied by the client, before an id or owner
/// is attached. Scoping attributes are optional and default to unset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CookiePair {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        CookiePair {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
        }
    }
}

/// One stored cookie record, scoped to its owner and website.
#[derive(Debug, Clone, Serialize)]
pub struct CookieRecord {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner: Uuid,
    pub website: String,
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub is_valid: Validity,
    pub last_validated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
