use serde_json::{Map, Value};

use crate::models::ResourceKind;

/// Number of charities shown
pub const MAX_CHARITIES: usize = 10;

/// Reshapes third-party resource records for display
pub struct ResourceService;

impl ResourceService {
    pub fn reshape(kind: ResourceKind, records: Vec<Value>, no_photo_url: &str) -> Vec<Value> {
        match kind {
            ResourceKind::LocalPups => Self::reshape_animals(records, no_photo_url),
            ResourceKind::LocalOrgs => Self::reshape_organizations(records),
            ResourceKind::Charities => Self::reshape_charities(records),
        }
    }

    /// Flatten each animal's contact address and pick a display photo
    pub fn reshape_animals(records: Vec<Value>, no_photo_url: &str) -> Vec<Value> {
        records
            .into_iter()
            .map(|mut record| {
                if let Some(contact) = record.get_mut("contact").and_then(Value::as_object_mut) {
                    flatten_field(contact, "address");
                }
                let photo = first_medium_photo(&record).unwrap_or_else(|| no_photo_url.to_string());
                set_field(&mut record, "photo", photo);
                record
            })
            .collect()
    }

    /// Flatten address and opening hours of each organization
    pub fn reshape_organizations(records: Vec<Value>) -> Vec<Value> {
        records
            .into_iter()
            .map(|mut record| {
                if let Some(org) = record.as_object_mut() {
                    flatten_field(org, "address");
                    flatten_field(org, "hours");
                }
                let photo = first_medium_photo(&record).unwrap_or_default();
                set_field(&mut record, "photo", photo);
                record
            })
            .collect()
    }

    /// Top charities with a flattened mailing address
    pub fn reshape_charities(records: Vec<Value>) -> Vec<Value> {
        records
            .into_iter()
            .take(MAX_CHARITIES)
            .map(|mut record| {
                let address = record.get("mailingAddress").map(join_values);
                if let Some(address) = address {
                    set_field(&mut record, "address", address);
                }
                record
            })
            .collect()
    }
}

/// `", "`-joined non-empty values of an object, in key order
fn join_values(value: &Value) -> String {
    let Some(object) = value.as_object() else {
        return value.as_str().unwrap_or_default().to_string();
    };

    object
        .values()
        .filter_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn flatten_field(object: &mut Map<String, Value>, key: &str) {
    if let Some(value) = object.get(key) {
        let joined = join_values(value);
        object.insert(key.to_string(), Value::String(joined));
    }
}

fn first_medium_photo(record: &Value) -> Option<String> {
    record
        .get("photos")?
        .as_array()?
        .first()?
        .get("medium")?
        .as_str()
        .map(str::to_string)
}

fn set_field(record: &mut Value, key: &str, value: String) {
    if let Some(object) = record.as_object_mut() {
        object.insert(key.to_string(), Value::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reshape_animals() {
        let records = vec![
            json!({
                "name": "Rex",
                "contact": { "address": { "address1": "1 Bark St", "address2": null, "city": "Austin", "state": "TX" } },
                "photos": [{ "small": "s.jpg", "medium": "m.jpg" }]
            }),
            json!({
                "name": "Fido",
                "contact": { "address": { "address1": "", "city": "Boise" } },
                "photos": []
            }),
        ];

        let out = ResourceService::reshape_animals(records, "/assets/no_photo_avail.jpg");
        assert_eq!(out[0]["contact"]["address"], "1 Bark St, Austin, TX");
        assert_eq!(out[0]["photo"], "m.jpg");
        assert_eq!(out[1]["contact"]["address"], "Boise");
        assert_eq!(out[1]["photo"], "/assets/no_photo_avail.jpg");
    }

    #[test]
    fn test_reshape_organizations() {
        let records = vec![json!({
            "name": "Shelter",
            "address": { "city": "Austin", "postcode": "78701", "country": "" },
            "hours": { "monday": "9-5", "tuesday": null, "wednesday": "9-5" },
            "photos": []
        })];

        let out = ResourceService::reshape_organizations(records);
        assert_eq!(out[0]["address"], "Austin, 78701");
        assert_eq!(out[0]["hours"], "9-5, 9-5");
        assert_eq!(out[0]["photo"], "");
    }

    #[test]
    fn test_reshape_charities_keeps_top_ten() {
        let records: Vec<Value> = (0..15)
            .map(|i| {
                json!({
                    "charityName": format!("Charity {}", i),
                    "mailingAddress": { "streetAddress1": "2 Paw Ln", "streetAddress2": null, "city": "Denver" }
                })
            })
            .collect();

        let out = ResourceService::reshape_charities(records);
        assert_eq!(out.len(), MAX_CHARITIES);
        assert_eq!(out[0]["charityName"], "Charity 0");
        assert_eq!(out[0]["address"], "2 Paw Ln, Denver");
    }

    #[test]
    fn test_reshape_dispatch() {
        let out = ResourceService::reshape(ResourceKind::Charities, Vec::new(), "");
        assert!(out.is_empty());
    }
}
