use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use ts_rs::TS;
use tracing::warn;

use crate::schedule::ProgramCatalog;

/// Every program successfully retrieved in one batch run.
///
/// Programs that failed are absent rather than present with empty content, so
/// `total_programs` below the catalog size signals a degraded run.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConsolidatedDataset {
    generated_at: DateTime<Utc>,
    total_programs: usize,
    programs: IndexMap<String, ProgramCatalog>,
}

impl ConsolidatedDataset {
    pub fn new(catalogs: impl IntoIterator<Item = ProgramCatalog>) -> Self {
        let mut programs = IndexMap::new();
        for catalog in catalogs {
            if let Some(previous) = programs.insert(catalog.code.clone(), catalog) {
                warn!(program = %previous.code, "duplicate program in batch, keeping the later one");
            }
        }

        Self {
            generated_at: Utc::now(),
            total_programs: programs.len(),
            programs,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn total_programs(&self) -> usize {
        self.total_programs
    }

    pub fn programs(&self) -> &IndexMap<String, ProgramCatalog> {
        &self.programs
    }

    pub fn get(&self, code: &str) -> Option<&ProgramCatalog> {
        self.programs.get(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_matches_programs() {
        let dataset = ConsolidatedDataset::new([
            ProgramCatalog::empty("20321", "Actuaría"),
            ProgramCatalog::empty("20121", "Arquitectura"),
        ]);
        assert_eq!(dataset.total_programs(), 2);
        assert_eq!(dataset.programs().len(), 2);
    }

    #[test]
    fn test_duplicate_codes_counted_once() {
        let dataset = ConsolidatedDataset::new([
            ProgramCatalog::empty("20321", "Actuaría"),
            ProgramCatalog::empty("20321", "Actuaría"),
        ]);
        assert_eq!(dataset.total_programs(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let dataset = ConsolidatedDataset::new([ProgramCatalog::empty("20321", "Actuaría")]);
        let json = serde_json::to_value(&dataset).unwrap();

        assert_eq!(json["totalPrograms"], 1);
        assert!(json["generatedAt"].is_string());
        let program = &json["programs"]["20321"];
        assert_eq!(program["code"], "20321");
        assert_eq!(program["name"], "Actuaría");
        assert!(program["retrievedAt"].is_string());
        assert!(program["courses"].as_object().unwrap().is_empty());
    }
}
