//! Typed view over one adverse-event report
//!
//! Source documents are loosely structured: any field may be missing, null,
//! or of an unexpected type. Construction never fails; anything that does not
//! fit degrades to an empty value.

use crate::sanitize::{sanitize, scalar_text};
use crate::types::Column;
use serde_json::{Map, Value};

/// One entry of a document's `results` array
#[derive(Debug, Clone, Default)]
pub struct Report {
    scalars: Map<String, Value>,
    pub product_problems: Vec<String>,
    /// `None` when the report has no `patient` array at all
    pub patients: Option<Vec<Patient>>,
    pub devices: Vec<Device>,
    pub texts: Vec<MdrText>,
}

/// Device sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    pub brand_name: String,
    pub generic_name: String,
    pub manufacturer_d_name: String,
    pub manufacturer_d_address_1: String,
    pub manufacturer_d_address_2: String,
    pub manufacturer_d_city: String,
    pub manufacturer_d_state: String,
    pub manufacturer_d_zip_code: String,
    pub manufacturer_d_country: String,
    pub manufacturer_d_postal_code: String,
    pub device_operator: String,
    pub model_number: String,
    pub catalog_number: String,
    pub lot_number: String,
    /// Sourced from the nested `openfda.device_class`
    pub device_class: String,
}

/// Patient sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patient {
    pub patient_problems: Vec<String>,
}

/// Narrative-text sub-record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdrText {
    pub mdr_text_key: String,
    pub text_type_code: String,
    pub patient_sequence_number: String,
    pub text: String,
}

impl Report {
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(obj) = value else {
            return Report::default();
        };

        let mut scalars = Map::new();
        for (key, value) in obj.iter() {
            match key.as_str() {
                "device" | "patient" | "mdr_text" | "product_problems" => {}
                _ => {
                    scalars.insert(key.clone(), value.clone());
                }
            }
        }

        Report {
            scalars,
            product_problems: obj
                .get("product_problems")
                .map(text_list)
                .unwrap_or_default(),
            patients: obj
                .get("patient")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(Patient::from_value).collect()),
            devices: object_list(obj.get("device"), Device::from_value),
            texts: object_list(obj.get("mdr_text"), MdrText::from_value),
        }
    }

    /// Sanitized top-level scalar for `column`, empty when absent
    pub fn scalar(&self, column: Column) -> String {
        self.scalars
            .get(column.as_str())
            .map(scalar_text)
            .unwrap_or_default()
    }

    /// `product_problems` joined for display
    pub fn product_problems_text(&self) -> String {
        sanitize(&self.product_problems.join(", "))
    }

    /// Every patient's problems concatenated in order, or `None` when the
    /// report carries no patient array
    pub fn patient_problems_text(&self) -> Option<String> {
        self.patients.as_ref().map(|patients| {
            let problems: Vec<&str> = patients
                .iter()
                .flat_map(|p| p.patient_problems.iter().map(String::as_str))
                .collect();
            sanitize(&problems.join(", "))
        })
    }
}

impl Device {
    pub fn from_value(value: &Value) -> Self {
        let device_class = value
            .get("openfda")
            .and_then(|openfda| openfda.get("device_class"))
            .map(scalar_text)
            .unwrap_or_default();

        Device {
            brand_name: field_text(value, "brand_name"),
            generic_name: field_text(value, "generic_name"),
            manufacturer_d_name: field_text(value, "manufacturer_d_name"),
            manufacturer_d_address_1: field_text(value, "manufacturer_d_address_1"),
            manufacturer_d_address_2: field_text(value, "manufacturer_d_address_2"),
            manufacturer_d_city: field_text(value, "manufacturer_d_city"),
            manufacturer_d_state: field_text(value, "manufacturer_d_state"),
            manufacturer_d_zip_code: field_text(value, "manufacturer_d_zip_code"),
            manufacturer_d_country: field_text(value, "manufacturer_d_country"),
            manufacturer_d_postal_code: field_text(value, "manufacturer_d_postal_code"),
            device_operator: field_text(value, "device_operator"),
            model_number: field_text(value, "model_number"),
            catalog_number: field_text(value, "catalog_number"),
            lot_number: field_text(value, "lot_number"),
            device_class,
        }
    }

    /// Value this device contributes to a device column
    pub fn value(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::BrandName => &self.brand_name,
            Column::GenericName => &self.generic_name,
            Column::ManufacturerDName => &self.manufacturer_d_name,
            Column::ManufacturerDAddress1 => &self.manufacturer_d_address_1,
            Column::ManufacturerDAddress2 => &self.manufacturer_d_address_2,
            Column::ManufacturerDCity => &self.manufacturer_d_city,
            Column::ManufacturerDState => &self.manufacturer_d_state,
            Column::ManufacturerDZipCode => &self.manufacturer_d_zip_code,
            Column::ManufacturerDCountry => &self.manufacturer_d_country,
            Column::ManufacturerDPostalCode => &self.manufacturer_d_postal_code,
            Column::DeviceOperator => &self.device_operator,
            Column::ModelNumber => &self.model_number,
            Column::CatalogNumber => &self.catalog_number,
            Column::LotNumber => &self.lot_number,
            Column::DeviceClass => &self.device_class,
            _ => return None,
        };
        Some(value)
    }
}

impl Patient {
    pub fn from_value(value: &Value) -> Self {
        Patient {
            patient_problems: value
                .get("patient_problems")
                .map(text_list)
                .unwrap_or_default(),
        }
    }
}

impl MdrText {
    pub fn from_value(value: &Value) -> Self {
        MdrText {
            mdr_text_key: field_text(value, "mdr_text_key"),
            text_type_code: field_text(value, "text_type_code"),
            patient_sequence_number: field_text(value, "patient_sequence_number"),
            text: field_text(value, "text"),
        }
    }

    /// Value this entry contributes to a text column
    pub fn value(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::MdrTextKey => &self.mdr_text_key,
            Column::TextTypeCode => &self.text_type_code,
            Column::PatientSequenceNumber => &self.patient_sequence_number,
            Column::Text => &self.text,
            _ => return None,
        };
        Some(value)
    }
}

/// Sanitized text of `key` on an object; empty for non-objects and missing keys
fn field_text(value: &Value, key: &str) -> String {
    value.get(key).map(scalar_text).unwrap_or_default()
}

/// Scalar elements of an array as text; a non-array yields nothing
fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !matches!(item, Value::Null | Value::Array(_) | Value::Object(_)))
            .map(scalar_text)
            .collect(),
        _ => Vec::new(),
    }
}

/// Build sub-records from an array field; anything but an array counts as absent
fn object_list<T>(value: Option<&Value>, build: fn(&Value) -> T) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items.iter().map(build).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_defaults_to_empty() {
        let report = Report::from_value(&json!({
            "report_number": "2124215-2021-00042",
            "event_type": null,
            "date_received": 20210314
        }));

        assert_eq!(report.scalar(Column::ReportNumber), "2124215-2021-00042");
        assert_eq!(report.scalar(Column::EventType), "");
        assert_eq!(report.scalar(Column::DateReceived), "20210314");
        assert_eq!(report.scalar(Column::ManufacturerContactState), "");
    }

    #[test]
    fn test_device_reads_nested_class() {
        let device = Device::from_value(&json!({
            "brand_name": "ACME\u{0001} STENT",
            "lot_number": 4471,
            "openfda": {"device_class": "3"}
        }));

        assert_eq!(device.brand_name, "ACME STENT");
        assert_eq!(device.lot_number, "4471");
        assert_eq!(device.device_class, "3");
        assert_eq!(device.model_number, "");
        assert_eq!(device.value(Column::DeviceClass), Some("3"));
        assert_eq!(device.value(Column::Text), None);
    }

    #[test]
    fn test_non_collection_nested_fields_are_absent() {
        let report = Report::from_value(&json!({
            "device": "not a list",
            "patient": {"patient_problems": ["Pain"]},
            "mdr_text": 7,
            "product_problems": "Break"
        }));

        assert!(report.devices.is_empty());
        assert!(report.texts.is_empty());
        assert!(report.patients.is_none());
        assert_eq!(report.patient_problems_text(), None);
        assert_eq!(report.product_problems_text(), "");
    }

    #[test]
    fn test_malformed_sub_records_degrade_to_empty() {
        let report = Report::from_value(&json!({
            "device": [42, {"brand_name": "X"}],
            "mdr_text": [null]
        }));

        assert_eq!(report.devices.len(), 2);
        assert_eq!(report.devices[0], Device::default());
        assert_eq!(report.devices[1].brand_name, "X");
        assert_eq!(report.texts, vec![MdrText::default()]);
    }

    #[test]
    fn test_patient_problems_concatenate_across_patients() {
        let report = Report::from_value(&json!({
            "patient": [
                {"patient_problems": ["A"]},
                {"patient_problems": ["B", "C"]},
                {"sequence_number_outcome": ["Other"]}
            ]
        }));

        assert_eq!(report.patient_problems_text().as_deref(), Some("A, B, C"));
    }

    #[test]
    fn test_product_problems_join() {
        let empty = Report::from_value(&json!({"product_problems": []}));
        assert_eq!(empty.product_problems_text(), "");

        let two = Report::from_value(&json!({"product_problems": ["X", "Y"]}));
        assert_eq!(two.product_problems_text(), "X, Y");
    }

    #[test]
    fn test_non_object_report_is_empty() {
        let report = Report::from_value(&json!("garbage"));
        assert!(report.devices.is_empty());
        assert_eq!(report.scalar(Column::ReportNumber), "");
    }
}
