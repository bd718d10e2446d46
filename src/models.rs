//! Domain models for the pipeline dataset.
//!
//! These structs match the JSON document emitted by the offline producer and
//! use serde for deserialization. Date fields stay ISO strings on the record
//! and are parsed into NaiveDate on demand: a missing or malformed date is a
//! display concern ("TBD"), never a load error.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Qualifier for dates and enrollment figures ("A" = actual on the wire,
/// anything else is treated as estimated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Certainty {
    Actual,
    #[default]
    Estimated,
}

impl From<String> for Certainty {
    fn from(code: String) -> Self {
        if code == "A" {
            Certainty::Actual
        } else {
            Certainty::Estimated
        }
    }
}

impl From<Certainty> for String {
    fn from(value: Certainty) -> Self {
        match value {
            Certainty::Actual => "A".to_string(),
            Certainty::Estimated => "E".to_string(),
        }
    }
}

impl Certainty {
    pub fn is_actual(&self) -> bool {
        matches!(self, Certainty::Actual)
    }

    /// Parenthesized qualifier shown next to dates and enrollment numbers.
    pub fn qualifier(&self) -> &'static str {
        match self {
            Certainty::Actual => "(Actual)",
            Certainty::Estimated => "(Estimated)",
        }
    }
}

/// A single clinical trial entry. Every field is defaulted so one sparse
/// record cannot sink the whole document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrialRecord {
    #[serde(default)]
    pub nct_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub indications: String,
    #[serde(default)]
    pub imp: Option<String>,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub is_malignancy: bool,
    #[serde(default)]
    pub major_category: Option<String>,
    #[serde(default)]
    pub is_collaborator: bool,
    #[serde(default)]
    pub actual_company: String,
    #[serde(default)]
    pub sample_size: u32,
    #[serde(default)]
    pub enrollment_type: Certainty,
    #[serde(default)]
    pub start_date_iso: Option<String>,
    #[serde(default)]
    pub start_date_type: Certainty,
    #[serde(default)]
    pub primary_completion_date_iso: Option<String>,
    #[serde(default)]
    pub primary_completion_date_type: Certainty,
    #[serde(default)]
    pub completion_date_iso: Option<String>,
    #[serde(default)]
    pub completion_date_type: Certainty,
    #[serde(default)]
    pub readout_summary: Option<String>,
    #[serde(default)]
    pub readout_source: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Phase-3 marker token as written by the producer. Combined descriptors like
/// "PHASE2/PHASE3" still count.
pub const PHASE3_TOKEN: &str = "PHASE3";

impl TrialRecord {
    /// Pre-classified disease grouping, defaulting to "Other" when the
    /// producer left it blank.
    pub fn category_label(&self) -> &str {
        self.major_category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("Other")
    }

    /// Investigational product name, or the placeholder used for undisclosed
    /// assets.
    pub fn imp_label(&self) -> &str {
        self.imp
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or("Pipeline Targeted")
    }

    pub fn is_phase3(&self) -> bool {
        self.phase.contains(PHASE3_TOKEN)
    }

    /// Public registry entry for this trial.
    pub fn registry_url(&self) -> String {
        format!("https://clinicaltrials.gov/study/{}", self.nct_id)
    }

    /// First token of the comma-separated indications list, for narrow labels.
    pub fn first_indication(&self) -> &str {
        self.indications.split(',').next().unwrap_or_default().trim()
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_collaborator {
            "Collab"
        } else {
            "Lead"
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.start_date_iso)
    }

    pub fn completion_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.completion_date_iso)
    }

    pub fn primary_completion_date(&self) -> Option<NaiveDate> {
        parse_iso_date(&self.primary_completion_date_iso)
    }
}

/// Parse an optional ISO date string, treating absence and garbage alike.
fn parse_iso_date(value: &Option<String>) -> Option<NaiveDate> {
    value
        .as_deref()
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Display form of an optional ISO date string ("TBD" when absent).
pub fn display_date(value: &Option<String>) -> &str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("TBD")
}

/// Sponsor metadata from the document's company map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub ticker: String,
}

/// Document metadata: the company lookup plus the category labels that seed
/// the indication autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetMeta {
    #[serde(default)]
    pub company_map: HashMap<String, CompanyInfo>,
    #[serde(default)]
    pub cancer_groups: Vec<String>,
}

impl DatasetMeta {
    /// Look up a sponsor, falling back to the raw key for both name and
    /// ticker. A missing entry is expected, never an error.
    pub fn company_details(&self, key: &str) -> CompanyInfo {
        self.company_map.get(key).cloned().unwrap_or_else(|| CompanyInfo {
            name: key.to_string(),
            ticker: key.to_string(),
        })
    }

    pub fn ticker(&self, key: &str) -> String {
        self.company_details(key).ticker
    }

    /// Selector label for a sponsor: "Name (TICKER)".
    pub fn company_label(&self, key: &str) -> String {
        let details = self.company_details(key);
        format!("{} ({})", details.name, details.ticker)
    }
}

/// The complete dataset document as fetched at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dataset {
    #[serde(default)]
    pub metadata: DatasetMeta,
    #[serde(default)]
    pub trials: Vec<TrialRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certainty_decoding() {
        assert_eq!(Certainty::from("A".to_string()), Certainty::Actual);
        assert_eq!(Certainty::from("E".to_string()), Certainty::Estimated);
        // Unknown codes degrade to estimated rather than failing the load.
        assert_eq!(Certainty::from("X".to_string()), Certainty::Estimated);
        assert_eq!(String::from(Certainty::Actual), "A");
    }

    #[test]
    fn test_document_parses() {
        let doc = r#"{
            "metadata": {
                "company_map": {
                    "ACME": { "name": "Acme Therapeutics", "ticker": "ACME" }
                },
                "cancer_groups": ["Lung Cancer", "Breast Cancer"]
            },
            "trials": [{
                "nct_id": "NCT001",
                "title": "Trial of Drug X",
                "indications": "NSCLC",
                "phase": "PHASE3",
                "is_malignancy": true,
                "major_category": "Lung Cancer",
                "actual_company": "ACME",
                "sample_size": 420,
                "enrollment_type": "A",
                "start_date_iso": "2021-01-01",
                "start_date_type": "A",
                "completion_date_iso": "2024-06-01",
                "completion_date_type": "E",
                "primary_completion_date_iso": "2023-01-01",
                "primary_completion_date_type": "E"
            }]
        }"#;

        let dataset: Dataset = serde_json::from_str(doc).unwrap();
        assert_eq!(dataset.trials.len(), 1);

        let trial = &dataset.trials[0];
        assert_eq!(trial.nct_id, "NCT001");
        assert!(trial.is_phase3());
        assert_eq!(trial.enrollment_type, Certainty::Actual);
        assert_eq!(trial.completion_date_type, Certainty::Estimated);
        assert_eq!(trial.start_date(), NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(
            dataset.metadata.company_label("ACME"),
            "Acme Therapeutics (ACME)"
        );
    }

    #[test]
    fn test_sparse_record_defaults() {
        let trial: TrialRecord = serde_json::from_str(r#"{"nct_id": "NCT002"}"#).unwrap();
        assert_eq!(trial.category_label(), "Other");
        assert_eq!(trial.imp_label(), "Pipeline Targeted");
        assert_eq!(trial.role_label(), "Lead");
        assert!(trial.start_date().is_none());
        assert_eq!(display_date(&trial.completion_date_iso), "TBD");
        assert!(!trial.is_phase3());
    }

    #[test]
    fn test_company_lookup_fallback() {
        let meta = DatasetMeta::default();
        let details = meta.company_details("UNLISTED");
        assert_eq!(details.name, "UNLISTED");
        assert_eq!(details.ticker, "UNLISTED");
    }

    #[test]
    fn test_combined_phase_counts_as_phase3() {
        let trial = TrialRecord {
            phase: "PHASE2/PHASE3".to_string(),
            ..TrialRecord::default()
        };
        assert!(trial.is_phase3());
    }

    #[test]
    fn test_malformed_date_is_none() {
        let trial = TrialRecord {
            completion_date_iso: Some("sometime in 2024".to_string()),
            ..TrialRecord::default()
        };
        assert!(trial.completion_date().is_none());
    }

    #[test]
    fn test_first_indication() {
        let trial = TrialRecord {
            indications: "NSCLC, Solid Tumors".to_string(),
            ..TrialRecord::default()
        };
        assert_eq!(trial.first_indication(), "NSCLC");
    }
}
