//! The consent record and its JSON wire contract.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A consent record as exchanged on the wire and stored (encrypted) on the ledger.
///
/// Field names on the wire are fixed: `Consent_ID`, `Name`, `Email`, `phone`,
/// `EventName`, `ConsentGiven`. Every field is required when decoding; unknown
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Primary key. Unique within the consent namespace.
    #[serde(rename = "Consent_ID")]
    pub consent_id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Email")]
    pub email: String,

    #[serde(rename = "phone")]
    pub phone: i64,

    #[serde(rename = "EventName")]
    pub event_name: String,

    #[serde(rename = "ConsentGiven")]
    pub consent_given: bool,
}

impl ConsentRecord {
    /// Decode a record from its JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode the record to its JSON wire form.
    ///
    /// Fields are emitted in declaration order, so equal records produce
    /// byte-identical output.
    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Check the structural invariants of a record.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.consent_id.is_empty() {
            return Err(CodecError::InvalidRecord(
                "Consent_ID must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satya() -> ConsentRecord {
        ConsentRecord {
            consent_id: "E3".to_string(),
            name: "Satya Majumder".to_string(),
            email: "satya@gmail.com".to_string(),
            phone: 6127022297,
            event_name: "JPMC Marathon".to_string(),
            consent_given: true,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = String::from_utf8(satya().to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"Consent_ID":"E3","Name":"Satya Majumder","Email":"satya@gmail.com","#,
                r#""phone":6127022297,"EventName":"JPMC Marathon","ConsentGiven":true}"#
            )
        );
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let json = concat!(
            r#"{"Consent_ID":"E3","Name":"Satya Majumder","Email":"satya@gmail.com","#,
            r#""phone":6127022297,"EventName":"JPMC Marathon","ConsentGiven":true,"Extra":1}"#
        );
        assert_eq!(ConsentRecord::from_json(json.as_bytes()).unwrap(), satya());
    }

    #[test]
    fn test_decode_missing_field_fails() {
        let json = br#"{"Consent_ID":"E3","Name":"Satya Majumder"}"#;
        let err = ConsentRecord::from_json(json).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
    }

    #[test]
    fn test_decode_mistyped_field_fails() {
        let json = concat!(
            r#"{"Consent_ID":"E3","Name":"n","Email":"e","phone":"not a number","#,
            r#""EventName":"x","ConsentGiven":true}"#
        );
        assert!(ConsentRecord::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut record = satya();
        assert!(record.validate().is_ok());

        record.consent_id.clear();
        assert!(matches!(
            record.validate(),
            Err(CodecError::InvalidRecord(_))
        ));
    }
}
