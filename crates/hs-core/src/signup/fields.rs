//! Field values collected by the signup wizard.
//!
//! Values are kept in a single map keyed by field name. The map is the union of
//! everything the user entered on every step visited so far; navigating back
//! never removes entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signup::role::Role;

/// Field holding the selected role.
pub const ROLE_FIELD: &str = "userType";
/// Field holding the account email.
pub const EMAIL_FIELD: &str = "email";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A place picked from the geocoder's predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LatLng>,
}

/// Location autocomplete input: free search text plus the resolved place, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationValue {
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_place: Option<Place>,
}

impl LocationValue {
    /// Whether the search text was resolved to a recognized place.
    pub fn is_resolved(&self) -> bool {
        self.selected_place
            .as_ref()
            .is_some_and(|place| !place.address.trim().is_empty())
    }
}

/// Reference to an uploaded file (profile image, documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
    Location(LocationValue),
    File(FileRef),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether the value counts as "filled in" for a required field.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Bool(_) => true,
            FieldValue::Number(n) => n.is_finite(),
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::List(items) => items.iter().any(|item| !item.trim().is_empty()),
            FieldValue::Location(location) => {
                !location.search.trim().is_empty() || location.is_resolved()
            }
            FieldValue::File(file) => !file.file_name.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view; form inputs frequently deliver numbers as text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&LocationValue> {
        match self {
            FieldValue::Location(location) => Some(location),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(FieldValue::is_present)
    }

    /// Role derived from the `userType` field.
    pub fn role(&self) -> Option<Role> {
        self.text(ROLE_FIELD).and_then(|raw| raw.parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FieldValues {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untagged_values_decode_by_shape() {
        let values: FieldValues = serde_json::from_value(json!({
            "userType": "buyer",
            "minPrice": 250000,
            "newsletter": false,
            "propertyTypeBuyer": ["condo", "townhouse"],
            "location": {
                "search": "Austin",
                "selectedPlace": {
                    "address": "Austin, TX",
                    "origin": { "lat": 30.27, "lng": -97.74 }
                }
            },
            "profileImage": { "fileName": "me.png", "size": 1024 }
        }))
        .unwrap();

        assert_eq!(values.role(), Some(Role::Buyer));
        assert_eq!(values.number("minPrice"), Some(250000.0));
        assert_eq!(values.get("newsletter"), Some(&FieldValue::Bool(false)));
        assert!(values
            .get("location")
            .and_then(FieldValue::as_location)
            .is_some_and(LocationValue::is_resolved));
        assert!(matches!(values.get("profileImage"), Some(FieldValue::File(_))));
    }

    #[test]
    fn blank_text_and_empty_lists_are_not_present() {
        let values: FieldValues = [
            ("fname", FieldValue::text("   ")),
            ("regions", FieldValue::List(vec![])),
            ("lname", FieldValue::text("Doe")),
        ]
        .into_iter()
        .collect();

        assert!(!values.is_present("fname"));
        assert!(!values.is_present("regions"));
        assert!(values.is_present("lname"));
        assert!(!values.is_present("missing"));
    }

    #[test]
    fn numbers_entered_as_text_are_readable() {
        let value = FieldValue::text(" 1999 ");
        assert_eq!(value.as_number(), Some(1999.0));
        assert_eq!(FieldValue::text("n/a").as_number(), None);
    }
}
