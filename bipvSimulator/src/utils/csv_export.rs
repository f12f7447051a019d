use std::path::{Path, PathBuf};
use chrono::Local;
use csv::Writer;
use tracing::info;
use crate::analysis::results::SurfaceResults;
use crate::config::constants::{RESULTS_CSV_FILE_NAME, RESULTS_JSON_FILE_NAME, SUMMARY_CSV_FILE_NAME};
use crate::core::simulation::{BuildingOutcome, BuildingReport};
use crate::error::Result;
use crate::models::building::{check_building_id, SurfaceKind};
use crate::utils::logging::{self, FileIOType, OperationCategory};

const SUMMARY_HEADER: [&str; 15] = [
    "building_id",
    "status",
    "nb_panels_roof",
    "nb_panels_facades",
    "energy_harvested",
    "primary_energy",
    "carbon",
    "dmfa_waste",
    "net_cost",
    "eroi",
    "ghg_per_kwh",
    "energy_payback_year",
    "energy_reimbursement_year",
    "ghg_payback_year",
    "reason",
];

/// Writes the results of a batch in a timestamped folder of the output directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
    verbose_logging: bool,
}

impl CsvExporter {
    pub fn new(output_dir: impl AsRef<Path>, verbose_logging: bool) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        std::fs::create_dir_all(&full_path)?;
        Ok(Self {
            output_dir: full_path,
            timestamp,
            verbose_logging,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Exports every simulated building and the summary over the batch.
    pub fn export_outcomes(&self, outcomes: &[BuildingOutcome]) -> Result<()> {
        let _timing = logging::start_timing(
            "export_outcomes",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave },
        );
        for report in outcomes.iter().filter_map(BuildingOutcome::report) {
            self.export_building(report)?;
        }
        self.export_summary(outcomes)?;
        if self.verbose_logging {
            info!(target: "user", "Results exported to {}", self.output_dir.display());
        }
        Ok(())
    }

    /// `results.csv` has one row per year and surface, `results.json` the raw series.
    pub fn export_building(&self, report: &BuildingReport) -> Result<PathBuf> {
        check_building_id(&report.building_id)?;
        let building_dir = self.output_dir.join(&report.building_id);
        std::fs::create_dir_all(&building_dir)?;

        let mut writer = Writer::from_path(building_dir.join(RESULTS_CSV_FILE_NAME))?;
        let mut header = vec!["year".to_string(), "surface".to_string(), "nb_new_panels".to_string()];
        header.extend(
            report.results.total.named_series().into_iter().map(|(name, _)| name.to_string()),
        );
        writer.write_record(&header)?;
        for surface in SurfaceKind::ALL {
            if let Some(results) = report.results.surface(surface) {
                write_rows(&mut writer, &surface.to_string(), results)?;
            }
        }
        write_rows(&mut writer, "total", &report.results.total)?;
        writer.flush()?;

        let json = serde_json::to_string_pretty(&report.results)?;
        std::fs::write(building_dir.join(RESULTS_JSON_FILE_NAME), json)?;
        Ok(building_dir)
    }

    pub fn export_summary(&self, outcomes: &[BuildingOutcome]) -> Result<PathBuf> {
        let path = self.output_dir.join(SUMMARY_CSV_FILE_NAME);
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(SUMMARY_HEADER)?;
        for outcome in outcomes {
            let record = match outcome {
                BuildingOutcome::Simulated(report) => {
                    let panels = |surface: SurfaceKind| {
                        report
                            .surface(surface)
                            .map(|s| s.nb_panels.to_string())
                            .unwrap_or_default()
                    };
                    let summary = &report.summary;
                    vec![
                        report.building_id.clone(),
                        "simulated".to_string(),
                        panels(SurfaceKind::Roof),
                        panels(SurfaceKind::Facades),
                        summary.total_energy_harvested.to_string(),
                        summary.total_primary_energy.to_string(),
                        summary.total_carbon.to_string(),
                        summary.total_dmfa_waste.to_string(),
                        summary.net_cost.to_string(),
                        summary.eroi.to_string(),
                        summary.ghg_per_kwh.to_string(),
                        optional(summary.energy_payback_year),
                        optional(summary.energy_reimbursement_year),
                        optional(summary.ghg_payback_year),
                        String::new(),
                    ]
                }
                BuildingOutcome::Skipped { building_id, reason } => {
                    let mut record = vec![building_id.clone(), "skipped".to_string()];
                    // every column between the status and the reason stays empty
                    record.extend(std::iter::repeat(String::new()).take(SUMMARY_HEADER.len() - 3));
                    record.push(reason.clone());
                    record
                }
            };
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows<W: std::io::Write>(writer: &mut Writer<W>, surface: &str, results: &SurfaceResults) -> Result<()> {
    let series = results.named_series();
    for (i, year) in results.years.iter().enumerate() {
        let mut record = vec![
            year.to_string(),
            surface.to_string(),
            results.nb_new_panels.get(i).copied().unwrap_or(0).to_string(),
        ];
        record.extend(
            series
                .iter()
                .map(|(_, values)| values.get(i).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_buildings_are_listed_in_the_summary() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), false).unwrap();
        assert!(exporter.output_dir().ends_with(exporter.timestamp()));

        let outcomes = vec![BuildingOutcome::Skipped {
            building_id: "b7".to_string(),
            reason: "no sensor grid".to_string(),
        }];
        exporter.export_outcomes(&outcomes).unwrap();

        let mut reader = csv::Reader::from_path(exporter.output_dir().join(SUMMARY_CSV_FILE_NAME)).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), SUMMARY_HEADER.len());
        assert_eq!(&records[0][0], "b7");
        assert_eq!(&records[0][1], "skipped");
        assert_eq!(&records[0][14], "no sensor grid");
        assert!(!exporter.output_dir().join("b7").exists());
    }
}
