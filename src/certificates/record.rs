// Certificate Record - One certificate observed in a chain

use serde::{Deserialize, Deserializer, Serialize};

/// One certificate as observed during a handshake.
///
/// `thumbprint` and `serial_number` are stored lowercase; every constructor
/// and the deserializer normalize them, so comparisons elsewhere use plain
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Friendly name, taken from the subject common name
    #[serde(rename = "name", default, skip_serializing_if = "is_blank")]
    pub common_name: Option<String>,

    #[serde(
        rename = "ser",
        default,
        deserialize_with = "lowercase",
        skip_serializing_if = "String::is_empty"
    )]
    pub serial_number: String,

    #[serde(rename = "sub", default, skip_serializing_if = "String::is_empty")]
    pub subject: String,

    #[serde(rename = "exp", default, skip_serializing_if = "String::is_empty")]
    pub expiry: String,

    #[serde(rename = "thumb", deserialize_with = "lowercase")]
    pub thumbprint: String,

    /// Subject of the immediate issuer; cleared once the record sits under a parent
    #[serde(rename = "iss", default, skip_serializing_if = "is_blank")]
    pub issuer: Option<String>,
}

impl CertificateRecord {
    /// Create a record, normalizing the identity fields
    pub fn new(thumbprint: &str, serial_number: &str, subject: &str) -> Self {
        Self {
            thumbprint: normalize_hex(thumbprint),
            serial_number: normalize_hex(serial_number),
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = Some(issuer.to_string());
        self
    }

    pub fn with_expiry(mut self, expiry: &str) -> Self {
        self.expiry = expiry.to_string();
        self
    }

    pub fn with_common_name(mut self, common_name: &str) -> Self {
        self.common_name = Some(common_name.to_string());
        self
    }

    /// Drop the issuer reference, which the parent node already carries
    pub fn clear_issuer(&mut self) {
        self.issuer = None;
    }

    /// Re-apply lowercase normalization after direct field mutation
    pub fn normalize(&mut self) {
        self.thumbprint = normalize_hex(&self.thumbprint);
        self.serial_number = normalize_hex(&self.serial_number);
    }
}

/// Lowercase a hex identity string, dropping whitespace and `:` separators
pub fn normalize_hex(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .flat_map(char::to_lowercase)
        .collect()
}

fn lowercase<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(normalize_hex(&value))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}
