//! Filter state and the pure filtering pipeline.
//!
//! The engine is a single pure function over the loaded records: renderers
//! receive its output as a parameter and never read ambient state. Selector
//! enums cycle in the order their UI controls present them.

use std::collections::BTreeSet;

use crate::models::TrialRecord;
use crate::timeline::{window_end, window_start};

/// Oncology / non-oncology split, driven by the producer's `is_malignancy`
/// flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainArea {
    #[default]
    All,
    Oncology,
    NonOncology,
}

impl DomainArea {
    pub fn next(&self) -> Self {
        match self {
            DomainArea::All => DomainArea::Oncology,
            DomainArea::Oncology => DomainArea::NonOncology,
            DomainArea::NonOncology => DomainArea::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DomainArea::All => "All",
            DomainArea::Oncology => "Oncology",
            DomainArea::NonOncology => "Non-Oncology",
        }
    }
}

/// Sponsor role on the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Lead,
    Collab,
}

impl RoleFilter {
    pub fn next(&self) -> Self {
        match self {
            RoleFilter::All => RoleFilter::Lead,
            RoleFilter::Lead => RoleFilter::Collab,
            RoleFilter::Collab => RoleFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoleFilter::All => "All",
            RoleFilter::Lead => "Lead",
            RoleFilter::Collab => "Collab",
        }
    }
}

/// Which presentation the filtered set feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Grid,
    Timeline,
}

impl View {
    pub fn toggle(&self) -> Self {
        match self {
            View::Grid => View::Timeline,
            View::Timeline => View::Grid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Grid => "Grid",
            View::Timeline => "Timeline",
        }
    }
}

/// The user's current query. One instance per session, mutated only by input
/// handlers; every mutation is followed by a full re-filter on the next frame.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub search_text: String,
    /// None = all sponsors, Some(key) = exact company-key match.
    pub company: Option<String>,
    pub domain_area: DomainArea,
    pub indication_text: String,
    pub role: RoleFilter,
    pub view: View,
}

impl FilterState {
    /// True when the four primary dimensions are untouched. The engine is
    /// never invoked in this state: the UI shows a prompt instead of dumping
    /// the whole dataset. Role and view do not participate.
    pub fn is_default_query(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.company.is_none()
            && self.indication_text.trim().is_empty()
            && self.domain_area == DomainArea::All
    }

    /// Reset every filter dimension, keeping the active view.
    pub fn clear(&mut self) {
        let view = self.view;
        *self = FilterState {
            view,
            ..FilterState::default()
        };
    }
}

/// Select the records matching `state`, preserving input order. Pure: no
/// side effects, no ambient reads.
pub fn filter_records<'a>(records: &'a [TrialRecord], state: &FilterState) -> Vec<&'a TrialRecord> {
    let search = state.search_text.trim().to_lowercase();
    let ind_search = state.indication_text.trim().to_lowercase();

    records
        .iter()
        .filter(|record| {
            let title = record.title.to_lowercase();
            let indications = record.indications.to_lowercase();

            let match_area = match state.domain_area {
                DomainArea::All => true,
                DomainArea::Oncology => record.is_malignancy,
                DomainArea::NonOncology => !record.is_malignancy,
            };

            let match_indication = ind_search.is_empty()
                || record.category_label().to_lowercase().contains(&ind_search)
                || indications.contains(&ind_search)
                || title.contains(&ind_search);

            let match_company = state
                .company
                .as_deref()
                .map_or(true, |company| record.actual_company == company);

            let match_role = match state.role {
                RoleFilter::All => true,
                RoleFilter::Lead => !record.is_collaborator,
                RoleFilter::Collab => record.is_collaborator,
            };

            let match_search = search.is_empty()
                || title.contains(&search)
                || record.nct_id.to_lowercase().contains(&search)
                || indications.contains(&search);

            // Sanity filter against the fixed calendar window. Absent dates
            // are permissive: they exclude nothing.
            let in_window = match record.completion_date() {
                None => true,
                Some(completion) => {
                    completion >= window_start()
                        && record.start_date().map_or(true, |start| start <= window_end())
                }
            };

            match_area && match_indication && match_company && match_role && match_search && in_window
        })
        .collect()
}

/// Summary counters over a filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    pub asset_count: usize,
    pub phase3_count: usize,
}

pub fn compute_stats(filtered: &[&TrialRecord]) -> PipelineStats {
    PipelineStats {
        asset_count: filtered.len(),
        phase3_count: filtered.iter().filter(|r| r.is_phase3()).count(),
    }
}

/// Distinct sponsor keys, sorted, for the company selector.
pub fn unique_companies(records: &[TrialRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.actual_company.is_empty())
        .map(|r| r.actual_company.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Autocomplete entries for the indication input: category labels merged with
/// every comma-split indication token found in the records, sorted and
/// deduplicated.
pub fn indication_suggestions(records: &[TrialRecord], cancer_groups: &[String]) -> Vec<String> {
    let mut suggestions: BTreeSet<String> = cancer_groups.iter().cloned().collect();
    for record in records {
        for token in record.indications.split(',') {
            let token = token.trim();
            if !token.is_empty() {
                suggestions.insert(token.to_string());
            }
        }
    }
    suggestions.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(nct_id: &str) -> TrialRecord {
        TrialRecord {
            nct_id: nct_id.to_string(),
            title: "Trial of Drug X".to_string(),
            indications: "NSCLC".to_string(),
            phase: "PHASE3".to_string(),
            is_malignancy: true,
            major_category: Some("Lung Cancer".to_string()),
            actual_company: "ACME".to_string(),
            start_date_iso: Some("2021-01-01".to_string()),
            completion_date_iso: Some("2024-06-01".to_string()),
            primary_completion_date_iso: Some("2023-01-01".to_string()),
            ..TrialRecord::default()
        }
    }

    #[test]
    fn test_default_query_detection() {
        let mut state = FilterState::default();
        assert!(state.is_default_query());

        // Whitespace-only text is still the default state.
        state.search_text = "   ".to_string();
        assert!(state.is_default_query());

        state.search_text.clear();
        state.domain_area = DomainArea::Oncology;
        assert!(!state.is_default_query());

        // Role and view alone do not activate a query.
        let mut state = FilterState::default();
        state.role = RoleFilter::Lead;
        state.view = View::Timeline;
        assert!(state.is_default_query());
    }

    #[test]
    fn test_clear_keeps_view() {
        let mut state = FilterState {
            search_text: "egfr".to_string(),
            company: Some("ACME".to_string()),
            view: View::Timeline,
            ..FilterState::default()
        };
        state.clear();
        assert!(state.is_default_query());
        assert_eq!(state.view, View::Timeline);
    }

    #[test]
    fn test_domain_area_partition() {
        let mut onc = record("NCT001");
        onc.is_malignancy = true;
        let mut non = record("NCT002");
        non.is_malignancy = false;
        let records = vec![onc, non];

        let oncology = FilterState {
            domain_area: DomainArea::Oncology,
            ..FilterState::default()
        };
        let non_oncology = FilterState {
            domain_area: DomainArea::NonOncology,
            ..FilterState::default()
        };

        let a = filter_records(&records, &oncology);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].nct_id, "NCT001");

        let b = filter_records(&records, &non_oncology);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].nct_id, "NCT002");
    }

    #[test]
    fn test_indication_matches_category_and_text() {
        let records = vec![record("NCT001")];
        let state = FilterState {
            domain_area: DomainArea::Oncology,
            indication_text: "lung".to_string(),
            ..FilterState::default()
        };

        // "lung" hits the major category even though title/indications don't.
        let filtered = filter_records(&records, &state);
        assert_eq!(filtered.len(), 1);

        let stats = compute_stats(&filtered);
        assert_eq!(stats.asset_count, 1);
        assert_eq!(stats.phase3_count, 1);
    }

    #[test]
    fn test_company_mismatch_excludes() {
        let records = vec![record("NCT001")];
        let state = FilterState {
            company: Some("OTHERCO".to_string()),
            ..FilterState::default()
        };
        let filtered = filter_records(&records, &state);
        assert!(filtered.is_empty());
        assert_eq!(compute_stats(&filtered), PipelineStats::default());
    }

    #[test]
    fn test_search_matches_nct_id_only() {
        let records = vec![record("NCT00123456")];
        let state = FilterState {
            search_text: "nct0012".to_string(),
            ..FilterState::default()
        };
        assert_eq!(filter_records(&records, &state).len(), 1);
    }

    #[test]
    fn test_role_filter() {
        let mut lead = record("NCT001");
        lead.is_collaborator = false;
        let mut collab = record("NCT002");
        collab.is_collaborator = true;
        let records = vec![lead, collab];

        let state = FilterState {
            company: Some("ACME".to_string()),
            role: RoleFilter::Collab,
            ..FilterState::default()
        };
        let filtered = filter_records(&records, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].nct_id, "NCT002");
    }

    #[test]
    fn test_window_sanity_filter() {
        let mut ancient = record("NCT001");
        ancient.start_date_iso = Some("2010-01-01".to_string());
        ancient.completion_date_iso = Some("2015-01-01".to_string());

        let mut undated = record("NCT002");
        undated.start_date_iso = None;
        undated.completion_date_iso = None;

        let records = vec![ancient, undated];
        let state = FilterState {
            domain_area: DomainArea::Oncology,
            ..FilterState::default()
        };

        // A completion before the window excludes; missing dates never do.
        let filtered = filter_records(&records, &state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].nct_id, "NCT002");
    }

    #[test]
    fn test_filter_preserves_order_and_is_idempotent() {
        let records = vec![record("NCT003"), record("NCT001"), record("NCT002")];
        let state = FilterState {
            domain_area: DomainArea::Oncology,
            ..FilterState::default()
        };

        let once = filter_records(&records, &state);
        let ids: Vec<_> = once.iter().map(|r| r.nct_id.clone()).collect();
        assert_eq!(ids, vec!["NCT003", "NCT001", "NCT002"]);

        let owned: Vec<TrialRecord> = once.into_iter().cloned().collect();
        let twice = filter_records(&owned, &state);
        let ids_again: Vec<_> = twice.iter().map(|r| r.nct_id.clone()).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn test_unique_companies_sorted() {
        let mut a = record("NCT001");
        a.actual_company = "ZETA".to_string();
        let mut b = record("NCT002");
        b.actual_company = "ACME".to_string();
        let mut c = record("NCT003");
        c.actual_company = "ZETA".to_string();

        assert_eq!(unique_companies(&[a, b, c]), vec!["ACME", "ZETA"]);
    }

    #[test]
    fn test_indication_suggestions_merge() {
        let mut a = record("NCT001");
        a.indications = "NSCLC, Solid Tumors".to_string();
        let groups = vec!["Lung Cancer".to_string()];

        let suggestions = indication_suggestions(&[a], &groups);
        assert_eq!(suggestions, vec!["Lung Cancer", "NSCLC", "Solid Tumors"]);
    }
}
