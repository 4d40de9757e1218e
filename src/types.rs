use serde::ser::{Serialize, SerializeMap, Serializer};

/// One column of the flattened export, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ManufacturerContactState,
    ManufacturerG1City,
    ManufacturerContactAddress1,
    ManufacturerContactPcity,
    EventType,
    ReportNumber,
    TypeOfReport,
    ProductProblemFlag,
    DateReceived,
    ManufacturerAddress2,
    PmaPmnNumber,
    DateOfEvent,
    ManufacturerContactZipCode,
    SourceType,
    BrandName,
    GenericName,
    ManufacturerDName,
    ManufacturerDAddress1,
    ManufacturerDAddress2,
    ManufacturerDCity,
    ManufacturerDState,
    ManufacturerDZipCode,
    ManufacturerDCountry,
    ManufacturerDPostalCode,
    DeviceOperator,
    ModelNumber,
    CatalogNumber,
    LotNumber,
    DeviceClass,
    ProductProblems,
    PatientProblems,
    DateChanged,
    InitialReportToFda,
    MdrTextKey,
    TextTypeCode,
    PatientSequenceNumber,
    Text,
}

impl Column {
    pub const COUNT: usize = 37;

    /// Every column, in the order it appears in the export
    pub const ALL: [Column; Column::COUNT] = [
        Column::ManufacturerContactState,
        Column::ManufacturerG1City,
        Column::ManufacturerContactAddress1,
        Column::ManufacturerContactPcity,
        Column::EventType,
        Column::ReportNumber,
        Column::TypeOfReport,
        Column::ProductProblemFlag,
        Column::DateReceived,
        Column::ManufacturerAddress2,
        Column::PmaPmnNumber,
        Column::DateOfEvent,
        Column::ManufacturerContactZipCode,
        Column::SourceType,
        Column::BrandName,
        Column::GenericName,
        Column::ManufacturerDName,
        Column::ManufacturerDAddress1,
        Column::ManufacturerDAddress2,
        Column::ManufacturerDCity,
        Column::ManufacturerDState,
        Column::ManufacturerDZipCode,
        Column::ManufacturerDCountry,
        Column::ManufacturerDPostalCode,
        Column::DeviceOperator,
        Column::ModelNumber,
        Column::CatalogNumber,
        Column::LotNumber,
        Column::DeviceClass,
        Column::ProductProblems,
        Column::PatientProblems,
        Column::DateChanged,
        Column::InitialReportToFda,
        Column::MdrTextKey,
        Column::TextTypeCode,
        Column::PatientSequenceNumber,
        Column::Text,
    ];

    /// Columns overwritten by each device sub-record
    pub const DEVICE: [Column; 15] = [
        Column::BrandName,
        Column::GenericName,
        Column::ManufacturerDName,
        Column::ManufacturerDAddress1,
        Column::ManufacturerDAddress2,
        Column::ManufacturerDCity,
        Column::ManufacturerDState,
        Column::ManufacturerDZipCode,
        Column::ManufacturerDCountry,
        Column::ManufacturerDPostalCode,
        Column::DeviceOperator,
        Column::ModelNumber,
        Column::CatalogNumber,
        Column::LotNumber,
        Column::DeviceClass,
    ];

    /// Columns overwritten by each narrative-text sub-record
    pub const TEXT: [Column; 4] = [
        Column::MdrTextKey,
        Column::TextTypeCode,
        Column::PatientSequenceNumber,
        Column::Text,
    ];

    /// The field name used both as the JSON key and the column header
    pub fn as_str(self) -> &'static str {
        match self {
            Column::ManufacturerContactState => "manufacturer_contact_state",
            Column::ManufacturerG1City => "manufacturer_g1_city",
            Column::ManufacturerContactAddress1 => "manufacturer_contact_address_1",
            Column::ManufacturerContactPcity => "manufacturer_contact_pcity",
            Column::EventType => "event_type",
            Column::ReportNumber => "report_number",
            Column::TypeOfReport => "type_of_report",
            Column::ProductProblemFlag => "product_problem_flag",
            Column::DateReceived => "date_received",
            Column::ManufacturerAddress2 => "manufacturer_address_2",
            Column::PmaPmnNumber => "pma_pmn_number",
            Column::DateOfEvent => "date_of_event",
            Column::ManufacturerContactZipCode => "manufacturer_contact_zip_code",
            Column::SourceType => "source_type",
            Column::BrandName => "brand_name",
            Column::GenericName => "generic_name",
            Column::ManufacturerDName => "manufacturer_d_name",
            Column::ManufacturerDAddress1 => "manufacturer_d_address_1",
            Column::ManufacturerDAddress2 => "manufacturer_d_address_2",
            Column::ManufacturerDCity => "manufacturer_d_city",
            Column::ManufacturerDState => "manufacturer_d_state",
            Column::ManufacturerDZipCode => "manufacturer_d_zip_code",
            Column::ManufacturerDCountry => "manufacturer_d_country",
            Column::ManufacturerDPostalCode => "manufacturer_d_postal_code",
            Column::DeviceOperator => "device_operator",
            Column::ModelNumber => "model_number",
            Column::CatalogNumber => "catalog_number",
            Column::LotNumber => "lot_number",
            Column::DeviceClass => "device_class",
            Column::ProductProblems => "product_problems",
            Column::PatientProblems => "patient_problems",
            Column::DateChanged => "date_changed",
            Column::InitialReportToFda => "initial_report_to_fda",
            Column::MdrTextKey => "mdr_text_key",
            Column::TextTypeCode => "text_type_code",
            Column::PatientSequenceNumber => "patient_sequence_number",
            Column::Text => "text",
        }
    }

    /// Position of this column in the export
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A denormalized output row - one value for every column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    values: Vec<String>,
}

impl FlatRow {
    /// A row with every column set to the empty string
    pub fn empty() -> Self {
        FlatRow {
            values: vec![String::new(); Column::COUNT],
        }
    }

    pub fn get(&self, column: Column) -> &str {
        &self.values[column.index()]
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        self.values[column.index()] = value.into();
    }

    /// Values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// (column, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (Column, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (Column::ALL[idx], value.as_str()))
    }
}

impl Default for FlatRow {
    fn default() -> Self {
        FlatRow::empty()
    }
}

impl Serialize for FlatRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Column::COUNT))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column.as_str(), value)?;
        }
        map.end()
    }
}

/// Configuration for the flattening process
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Start every narrative-text row from the base row instead of the
    /// working row left behind by the last device
    pub text_rows_from_base: bool,

    /// Emit one base row for a report that has neither devices nor text entries
    pub emit_bare_reports: bool,

    /// Data rows per worksheet before the workbook writer opens a new sheet
    pub rows_per_sheet: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            text_rows_from_base: false,
            emit_bare_reports: false,
            rows_per_sheet: 1_000_000,
        }
    }
}
