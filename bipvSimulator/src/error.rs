use std::fmt;

#[derive(Debug)]
pub enum BipvError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    // Configuration errors, raised before any year is simulated
    UnknownReplacementScenario(String),
    MissingReplacementFrequency(String),
    InvalidReplacementFrequency(u32),
    InvalidMinimumPanelEroi(f64),
    InvalidInverterSizingRatio(f64),
    InvalidGhgIntensity(f64),
    InvalidYearRange { start: u32, current: u32, end: u32 },
    ZeroPrimaryEnergy(String),
    MissingKey { record_id: String, key: String },
    DuplicateLibraryId(String),
    UnknownLibraryId { kind: String, id: String },
    WrongRecordType { id: String, expected: String, found: String },
    InvalidTechnology { id: String, reason: String },
    InvalidLibraryRecord { id: String, reason: String },
    // Input shape errors
    IrradianceTableShape(String),
    GridLengthMismatch { face_areas: usize, irradiance: usize },
    SeriesLengthMismatch { series: String, left: usize, right: usize },
    InvalidBuildingId(String),
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, BipvError>;

impl BipvError {
    /// True for the errors that must abort the whole run rather than a single building.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BipvError::UnknownReplacementScenario(_)
                | BipvError::MissingReplacementFrequency(_)
                | BipvError::InvalidReplacementFrequency(_)
                | BipvError::InvalidMinimumPanelEroi(_)
                | BipvError::InvalidInverterSizingRatio(_)
                | BipvError::InvalidGhgIntensity(_)
                | BipvError::InvalidYearRange { .. }
                | BipvError::ZeroPrimaryEnergy(_)
                | BipvError::MissingKey { .. }
                | BipvError::DuplicateLibraryId(_)
                | BipvError::UnknownLibraryId { .. }
                | BipvError::WrongRecordType { .. }
                | BipvError::InvalidTechnology { .. }
                | BipvError::InvalidLibraryRecord { .. }
        )
    }
}

impl From<std::io::Error> for BipvError {
    fn from(err: std::io::Error) -> Self {
        BipvError::IoError(err)
    }
}

impl From<serde_json::Error> for BipvError {
    fn from(err: serde_json::Error) -> Self {
        BipvError::JsonError(err)
    }
}

impl From<csv::Error> for BipvError {
    fn from(err: csv::Error) -> Self {
        BipvError::CsvError(err)
    }
}

impl fmt::Display for BipvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BipvError::IoError(e) => write!(f, "IO error: {}", e),
            BipvError::JsonError(e) => write!(f, "JSON error: {}", e),
            BipvError::CsvError(e) => write!(f, "CSV error: {}", e),
            BipvError::UnknownReplacementScenario(s) => write!(f, "Unknown replacement scenario: {}", s),
            BipvError::MissingReplacementFrequency(s) => {
                write!(f, "The replacement frequency in years is not given for scenario {}", s)
            }
            BipvError::InvalidReplacementFrequency(v) => {
                write!(f, "The replacement frequency must be at least 1 year, got {}", v)
            }
            BipvError::InvalidMinimumPanelEroi(v) => {
                write!(f, "The minimum panel EROI must be greater than 1, got {}", v)
            }
            BipvError::InvalidInverterSizingRatio(v) => {
                write!(f, "The inverter sizing ratio must be greater than 0, got {}", v)
            }
            BipvError::InvalidGhgIntensity(v) => {
                write!(f, "The country GHG intensity must be non-negative, got {}", v)
            }
            BipvError::InvalidYearRange { start, current, end } => write!(
                f,
                "Invalid year range: start {}, current {}, end {} (expected start <= current < end)",
                start, current, end
            ),
            BipvError::ZeroPrimaryEnergy(id) => {
                write!(f, "Technology {} declares a total primary energy of zero", id)
            }
            BipvError::MissingKey { record_id, key } => {
                write!(f, "Library record {} is missing the required key \"{}\"", record_id, key)
            }
            BipvError::DuplicateLibraryId(id) => write!(
                f,
                "The element {} seems to be duplicated in the libraries, elements must be unique",
                id
            ),
            BipvError::UnknownLibraryId { kind, id } => write!(f, "Unknown {} id: {}", kind, id),
            BipvError::WrongRecordType { id, expected, found } => {
                write!(f, "Library record {} is a {}, expected a {}", id, found, expected)
            }
            BipvError::InvalidTechnology { id, reason } => write!(f, "Invalid technology {}: {}", id, reason),
            BipvError::InvalidLibraryRecord { id, reason } => write!(f, "Invalid library record {}: {}", id, reason),
            BipvError::IrradianceTableShape(s) => write!(f, "Invalid irradiance table: {}", s),
            BipvError::GridLengthMismatch { face_areas, irradiance } => write!(
                f,
                "Sensor grid has {} face areas but {} irradiance values",
                face_areas, irradiance
            ),
            BipvError::SeriesLengthMismatch { series, left, right } => write!(
                f,
                "Cannot merge series {}: lengths {} and {} differ",
                series, left, right
            ),
            BipvError::InvalidBuildingId(id) => {
                write!(f, "Building id \"{}\" cannot be used as a folder name", id)
            }
            BipvError::InvalidInput(s) => write!(f, "Invalid input: {}", s),
        }
    }
}

impl std::error::Error for BipvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BipvError::IoError(e) => Some(e),
            BipvError::JsonError(e) => Some(e),
            BipvError::CsvError(e) => Some(e),
            _ => None,
        }
    }
}
