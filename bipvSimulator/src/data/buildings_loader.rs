use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;
use crate::core::fleet::IrradianceTable;
use crate::error::{BipvError, Result};
use crate::models::building::{check_building_id, BuildingBasic, BuildingModeled, SurfaceGrid};
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// One entry of the buildings file: GIS attributes plus the sensor grids computed upstream.
#[derive(Debug, Clone, Deserialize)]
struct BuildingRecord {
    #[serde(flatten)]
    basic: BuildingBasic,
    #[serde(default = "default_is_target")]
    is_target: bool,
    #[serde(default)]
    roof: Option<SurfaceGrid>,
    #[serde(default)]
    facades: Option<SurfaceGrid>,
}

fn default_is_target() -> bool {
    true
}

/// Loads the buildings file (a JSON array). Relative irradiance file paths are
/// resolved against the folder of the buildings file.
pub fn load_buildings<P: AsRef<Path>>(path: P) -> Result<Vec<BuildingModeled>> {
    let _timing = logging::start_timing(
        "load_buildings",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad },
    );
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<BuildingRecord> = serde_json::from_reader(reader)?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let buildings: Vec<BuildingModeled> = records
        .into_iter()
        .map(|record| {
            check_building_id(&record.basic.id)?;
            let mut building = BuildingModeled::from_basic(record.basic, record.is_target);
            building.roof_grid = record.roof.map(|grid| resolve_grid_path(grid, &base_dir));
            building.facades_grid = record.facades.map(|grid| resolve_grid_path(grid, &base_dir));
            Ok(building)
        })
        .collect::<Result<_>>()?;
    debug!(path = %path.display(), buildings = buildings.len(), "buildings loaded");
    Ok(buildings)
}

fn resolve_grid_path(mut grid: SurfaceGrid, base_dir: &Path) -> SurfaceGrid {
    grid.hourly_irradiance_file = grid.hourly_irradiance_file.map(|file| {
        if file.is_relative() {
            base_dir.join(file)
        } else {
            file
        }
    });
    grid
}

/// Reads an hourly irradiance table: a header-less CSV with one row per mesh cell
/// and one column per hour.
pub fn load_irradiance_table<P: AsRef<Path>>(path: P) -> Result<IrradianceTable> {
    let _timing = logging::start_timing(
        "load_irradiance_table",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad },
    );
    let path: PathBuf = path.as_ref().to_path_buf();
    let mut file = File::open(&path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let mut rows = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .enumerate()
            .map(|(hour, value)| {
                value.parse::<f64>().map_err(|_| {
                    BipvError::IrradianceTableShape(format!(
                        "{}: invalid value \"{}\" at row {}, hour {}",
                        path.display(),
                        value,
                        row_index,
                        hour
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    IrradianceTable::new(rows)
}
