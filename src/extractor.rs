use crate::report::Report;
use crate::types::{Column, FlatRow, FlattenConfig};

/// Expands one report into denormalized rows, one per device and one per
/// narrative-text entry
pub struct RecordFlattener {
    config: FlattenConfig,
}

impl RecordFlattener {
    pub fn new(config: FlattenConfig) -> Self {
        RecordFlattener { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// Lazily flatten a report: device rows in device order, then text rows
    /// in text order
    pub fn flatten<'a>(&self, report: &'a Report) -> FlatRows<'a> {
        let base = Self::base_row(report);
        FlatRows {
            report,
            working: base.clone(),
            base,
            phase: Phase::Devices(0),
            text_rows_from_base: self.config.text_rows_from_base,
            emit_bare: self.config.emit_bare_reports,
        }
    }

    /// Scalars plus the problem aggregates, shared by every row of the report
    fn base_row(report: &Report) -> FlatRow {
        let mut row = FlatRow::empty();
        for column in Column::ALL {
            row.set(column, report.scalar(column));
        }

        row.set(Column::ProductProblems, report.product_problems_text());
        if let Some(problems) = report.patient_problems_text() {
            row.set(Column::PatientProblems, problems);
        }

        row
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Devices(usize),
    Texts(usize),
    Done,
}

/// Row iterator for one report
///
/// The working row is shared across both expansion loops: device columns
/// written for the last device remain visible on the text rows unless
/// `text_rows_from_base` is set.
pub struct FlatRows<'a> {
    report: &'a Report,
    base: FlatRow,
    working: FlatRow,
    phase: Phase,
    text_rows_from_base: bool,
    emit_bare: bool,
}

impl<'a> Iterator for FlatRows<'a> {
    type Item = FlatRow;

    fn next(&mut self) -> Option<FlatRow> {
        loop {
            match self.phase {
                Phase::Devices(idx) => {
                    let Some(device) = self.report.devices.get(idx) else {
                        self.phase = Phase::Texts(0);
                        if self.text_rows_from_base {
                            self.working = self.base.clone();
                        }
                        continue;
                    };
                    for column in Column::DEVICE {
                        if let Some(value) = device.value(column) {
                            self.working.set(column, value);
                        }
                    }
                    self.phase = Phase::Devices(idx + 1);
                    return Some(self.working.clone());
                }
                Phase::Texts(idx) => {
                    let Some(text) = self.report.texts.get(idx) else {
                        self.phase = Phase::Done;
                        if self.emit_bare
                            && self.report.devices.is_empty()
                            && self.report.texts.is_empty()
                        {
                            return Some(self.base.clone());
                        }
                        return None;
                    };
                    for column in Column::TEXT {
                        if let Some(value) = text.value(column) {
                            self.working.set(column, value);
                        }
                    }
                    self.phase = Phase::Texts(idx + 1);
                    return Some(self.working.clone());
                }
                Phase::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flatten_default(value: serde_json::Value) -> Vec<FlatRow> {
        let report = Report::from_value(&value);
        let flattener = RecordFlattener::new(FlattenConfig::default());
        flattener.flatten(&report).collect()
    }

    fn two_devices_one_text() -> serde_json::Value {
        json!({
            "report_number": "1",
            "product_problems": ["Leak"],
            "patient": [{"patient_problems": ["Burn"]}],
            "device": [
                {"brand_name": "FIRST", "openfda": {"device_class": "2"}},
                {
                    "brand_name": "SECOND",
                    "generic_name": "INFUSION PUMP",
                    "manufacturer_d_name": "ACME MEDICAL",
                    "manufacturer_d_address_1": "1 MAIN ST",
                    "manufacturer_d_address_2": "SUITE 2",
                    "manufacturer_d_city": "DULUTH",
                    "manufacturer_d_state": "MN",
                    "manufacturer_d_zip_code": "55802",
                    "manufacturer_d_country": "US",
                    "manufacturer_d_postal_code": "55802",
                    "device_operator": "HEALTH PROFESSIONAL",
                    "model_number": "M-2",
                    "catalog_number": "C-2",
                    "lot_number": "L-2",
                    "openfda": {"device_class": "3"}
                }
            ],
            "mdr_text": [
                {"mdr_text_key": "k1", "text_type_code": "Description of Event or Problem", "text": "IT LEAKED"}
            ]
        })
    }

    #[test]
    fn test_no_sub_records_yields_nothing() {
        assert!(flatten_default(json!({"report_number": "1"})).is_empty());
        assert!(flatten_default(json!({"device": [], "mdr_text": []})).is_empty());
    }

    #[test]
    fn test_bare_report_emits_base_row_when_enabled() {
        let report = Report::from_value(&json!({
            "report_number": "9",
            "product_problems": ["Crack"]
        }));
        let flattener = RecordFlattener::new(FlattenConfig {
            emit_bare_reports: true,
            ..FlattenConfig::default()
        });
        let rows: Vec<FlatRow> = flattener.flatten(&report).collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Column::ReportNumber), "9");
        assert_eq!(rows[0].get(Column::ProductProblems), "Crack");
    }

    #[test]
    fn test_one_row_per_device() {
        let rows = flatten_default(json!({
            "report_number": "77",
            "manufacturer_contact_state": "MN",
            "device": [
                {"brand_name": "A", "lot_number": "L1"},
                {"brand_name": "B"},
                {"brand_name": "C", "model_number": "M3"}
            ]
        }));

        assert_eq!(rows.len(), 3);
        for row in &rows {
            for column in Column::ALL {
                if !Column::DEVICE.contains(&column) {
                    assert_eq!(row.get(column), rows[0].get(column));
                }
            }
            assert_eq!(row.get(Column::ManufacturerContactState), "MN");
        }
        assert_eq!(rows[1].get(Column::BrandName), "B");
        // every device column is overwritten, missing ones with ""
        assert_eq!(rows[1].get(Column::LotNumber), "");
        assert_eq!(rows[2].get(Column::ModelNumber), "M3");
    }

    #[test]
    fn test_one_row_per_text() {
        let rows = flatten_default(json!({
            "report_number": "5",
            "brand_name": "TOP LEVEL",
            "mdr_text": [
                {"mdr_text_key": "a", "text": "first"},
                {"mdr_text_key": "b", "text": "second", "patient_sequence_number": 1}
            ]
        }));

        assert_eq!(rows.len(), 2);
        for row in &rows {
            for column in Column::ALL {
                if !Column::TEXT.contains(&column) {
                    assert_eq!(row.get(column), rows[0].get(column));
                }
            }
        }
        assert_eq!(rows[0].get(Column::BrandName), "TOP LEVEL");
        assert_eq!(rows[1].get(Column::Text), "second");
        assert_eq!(rows[1].get(Column::PatientSequenceNumber), "1");
    }

    #[test]
    fn test_text_rows_inherit_last_device() {
        let rows = flatten_default(two_devices_one_text());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get(Column::DeviceClass), "2");
        assert_eq!(rows[1].get(Column::DeviceClass), "3");
        assert_eq!(rows[2].get(Column::DeviceClass), "3");
        for column in Column::DEVICE {
            assert_eq!(rows[2].get(column), rows[1].get(column), "{}", column.as_str());
        }
        assert_eq!(rows[2].get(Column::BrandName), "SECOND");
        assert_eq!(rows[2].get(Column::LotNumber), "L-2");
        assert_eq!(rows[2].get(Column::DeviceOperator), "HEALTH PROFESSIONAL");
        assert_eq!(rows[2].get(Column::ManufacturerDPostalCode), "55802");
        assert_eq!(rows[2].get(Column::Text), "IT LEAKED");
        assert_eq!(rows[2].get(Column::MdrTextKey), "k1");
        assert_eq!(rows[2].get(Column::TextTypeCode), "Description of Event or Problem");

        // device rows precede text rows, so text columns stay at the base value
        assert_eq!(rows[0].get(Column::Text), "");
        assert_eq!(rows[1].get(Column::MdrTextKey), "");
    }

    #[test]
    fn test_text_rows_from_base_drop_device_state() {
        let report = Report::from_value(&two_devices_one_text());
        let flattener = RecordFlattener::new(FlattenConfig {
            text_rows_from_base: true,
            ..FlattenConfig::default()
        });
        let rows: Vec<FlatRow> = flattener.flatten(&report).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get(Column::DeviceClass), "");
        assert_eq!(rows[2].get(Column::BrandName), "");
        assert_eq!(rows[2].get(Column::Text), "IT LEAKED");
    }

    #[test]
    fn test_problem_aggregates_visible_on_every_row() {
        let rows = flatten_default(two_devices_one_text());

        for row in &rows {
            assert_eq!(row.get(Column::ProductProblems), "Leak");
            assert_eq!(row.get(Column::PatientProblems), "Burn");
        }
    }

    #[test]
    fn test_missing_scalar_is_empty_string() {
        let rows = flatten_default(json!({
            "report_number": "1",
            "device": [{"brand_name": "A"}]
        }));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Column::ManufacturerContactState), "");
        assert_eq!(rows[0].values().len(), Column::COUNT);
    }

    #[test]
    fn test_top_level_patient_problems_kept_without_patient_array() {
        let rows = flatten_default(json!({
            "patient_problems": "legacy value",
            "mdr_text": [{"text": "t"}]
        }));

        assert_eq!(rows[0].get(Column::PatientProblems), "legacy value");
    }
}
