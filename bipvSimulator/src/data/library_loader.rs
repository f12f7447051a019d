use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use serde_json::{Map, Value};
use tracing::{debug, info};
use crate::error::{BipvError, Result};
use crate::models::inverter::Inverter;
use crate::models::technology::PanelTechnology;
use crate::models::transportation::Transportation;
use crate::utils::logging::{self, FileIOType, OperationCategory};

pub const PV_TECHNOLOGY_TYPE: &str = "pv_technology";
pub const TRANSPORTATION_TYPE: &str = "transportation";
pub const INVERTER_TYPE: &str = "inverter";

const PV_TECHNOLOGY_REQUIRED_KEYS: &[&str] = &[
    "panel_area",
    "nominal_efficiency",
    "efficiency_model",
    "weibull_law_failure_parameters",
    "primary_energy_manufacturing",
    "ghg_manufacturing",
    "cost_investment",
    "weight",
    "primary_energy_recycling",
    "ghg_recycling",
    "cost_recycling",
    "revenue_material_recovery",
    "primary_energy_annual_maintenance",
    "ghg_annual_maintenance",
    "cost_annual_maintenance",
    "revenue_substituted_construction_material_roof",
    "revenue_substituted_construction_material_facades",
    "estimated_primary_energy_inverter",
];

const TRANSPORTATION_REQUIRED_KEYS: &[&str] = &["gate_to_gate", "recycling"];

const INVERTER_REQUIRED_KEYS: &[&str] = &[
    "replacement_frequency",
    "max_unit_capacity_kw",
    "primary_energy_per_kw",
    "ghg_per_kw",
    "cost_per_kw",
];

/// Technologies, transportation routes and inverters, keyed by their unique id.
#[derive(Debug, Clone, Default)]
pub struct Library {
    technologies: HashMap<String, Arc<PanelTechnology>>,
    transportations: HashMap<String, Arc<Transportation>>,
    inverters: HashMap<String, Arc<Inverter>>,
}

impl Library {
    /// Loads every library file. Ids must be unique across all of them.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let _timing = logging::start_timing(
            "load_library",
            OperationCategory::FileIO { subcategory: FileIOType::DataLoad },
        );
        let mut library = Library::default();
        for path in paths {
            let reader = BufReader::new(File::open(path.as_ref())?);
            let value: Value = serde_json::from_reader(reader)?;
            let added = library.add_records(value)?;
            debug!(path = %path.as_ref().display(), records = added, "library file loaded");
        }
        info!(
            target: "user",
            "Library loaded: {} PV technologies, {} transportation routes, {} inverters",
            library.technologies.len(),
            library.transportations.len(),
            library.inverters.len()
        );
        Ok(library)
    }

    /// Adds the records of one library document, a JSON object of records.
    pub fn add_records(&mut self, document: Value) -> Result<usize> {
        let records = match document {
            Value::Object(records) => records,
            _ => {
                return Err(BipvError::InvalidLibraryRecord {
                    id: "<document>".to_string(),
                    reason: "a library file must contain a JSON object of records".to_string(),
                })
            }
        };
        let mut added = 0;
        for (key, record) in records {
            self.add_record(&key, record)?;
            added += 1;
        }
        Ok(added)
    }

    fn add_record(&mut self, key: &str, record: Value) -> Result<()> {
        let fields = match &record {
            Value::Object(fields) => fields,
            _ => {
                return Err(BipvError::InvalidLibraryRecord {
                    id: key.to_string(),
                    reason: "the record is not a JSON object".to_string(),
                })
            }
        };
        let id = string_field(fields, key, "id")?;
        let record_type = string_field(fields, &id, "type")?;
        if self.contains(&id) {
            return Err(BipvError::DuplicateLibraryId(id));
        }

        match record_type.as_str() {
            PV_TECHNOLOGY_TYPE => {
                check_required_keys(fields, &id, PV_TECHNOLOGY_REQUIRED_KEYS)?;
                let technology: PanelTechnology = parse_record(&id, record)?;
                technology.validate()?;
                self.technologies.insert(id, Arc::new(technology));
            }
            TRANSPORTATION_TYPE => {
                check_required_keys(fields, &id, TRANSPORTATION_REQUIRED_KEYS)?;
                let transportation: Transportation = parse_record(&id, record)?;
                transportation.validate()?;
                self.transportations.insert(id, Arc::new(transportation));
            }
            INVERTER_TYPE => {
                check_required_keys(fields, &id, INVERTER_REQUIRED_KEYS)?;
                let inverter: Inverter = parse_record(&id, record)?;
                inverter.validate()?;
                self.inverters.insert(id, Arc::new(inverter));
            }
            other => {
                return Err(BipvError::WrongRecordType {
                    id,
                    expected: format!("{}, {} or {}", PV_TECHNOLOGY_TYPE, TRANSPORTATION_TYPE, INVERTER_TYPE),
                    found: other.to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.technologies.contains_key(id) || self.transportations.contains_key(id) || self.inverters.contains_key(id)
    }

    pub fn add_technology(&mut self, technology: PanelTechnology) -> Result<()> {
        if self.contains(&technology.id) {
            return Err(BipvError::DuplicateLibraryId(technology.id));
        }
        technology.validate()?;
        self.technologies.insert(technology.id.clone(), Arc::new(technology));
        Ok(())
    }

    pub fn add_transportation(&mut self, transportation: Transportation) -> Result<()> {
        if self.contains(&transportation.id) {
            return Err(BipvError::DuplicateLibraryId(transportation.id));
        }
        transportation.validate()?;
        self.transportations.insert(transportation.id.clone(), Arc::new(transportation));
        Ok(())
    }

    pub fn add_inverter(&mut self, inverter: Inverter) -> Result<()> {
        if self.contains(&inverter.id) {
            return Err(BipvError::DuplicateLibraryId(inverter.id));
        }
        inverter.validate()?;
        self.inverters.insert(inverter.id.clone(), Arc::new(inverter));
        Ok(())
    }

    pub fn technology(&self, id: &str) -> Result<Arc<PanelTechnology>> {
        lookup(&self.technologies, PV_TECHNOLOGY_TYPE, id)
    }

    pub fn transportation(&self, id: &str) -> Result<Arc<Transportation>> {
        lookup(&self.transportations, TRANSPORTATION_TYPE, id)
    }

    pub fn inverter(&self, id: &str) -> Result<Arc<Inverter>> {
        lookup(&self.inverters, INVERTER_TYPE, id)
    }
}

fn lookup<T>(records: &HashMap<String, Arc<T>>, kind: &str, id: &str) -> Result<Arc<T>> {
    records.get(id).cloned().ok_or_else(|| BipvError::UnknownLibraryId {
        kind: kind.to_string(),
        id: id.to_string(),
    })
}

/// Deserializes a record whose keys were checked, reporting malformed values against its id.
fn parse_record<T: serde::de::DeserializeOwned>(id: &str, record: Value) -> Result<T> {
    serde_json::from_value(record).map_err(|err| BipvError::InvalidLibraryRecord {
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn string_field(fields: &Map<String, Value>, record_id: &str, key: &str) -> Result<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BipvError::MissingKey {
            record_id: record_id.to_string(),
            key: key.to_string(),
        })
}

fn check_required_keys(fields: &Map<String, Value>, record_id: &str, required: &[&str]) -> Result<()> {
    match required.iter().find(|key| !fields.contains_key(**key)) {
        Some(key) => Err(BipvError::MissingKey {
            record_id: record_id.to_string(),
            key: key.to_string(),
        }),
        None => Ok(()),
    }
}
