//! Classification report data
//!
//! Laid out here, rendered by the CLI.

use super::producers::ProducerRegistry;
use super::types::{MatchResult, RunLabel, SampleFileSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a data source was found for a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    OneSide,
    Absent,
}

impl Presence {
    fn of(files: &SampleFileSet, data_source: &str) -> (Self, bool, bool) {
        let pair = files.get(data_source);
        let one = pair.is_some_and(|p| p.file_one.is_some());
        let two = pair.is_some_and(|p| p.file_two.is_some());
        let presence = match (one, two) {
            (true, true) => Presence::Both,
            (false, false) => Presence::Absent,
            _ => Presence::OneSide,
        };
        (presence, one, two)
    }
}

/// One data source cell of a report row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportCell {
    /// File present in this row's set
    pub present: bool,
    pub presence: Presence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub sample_name: String,
    /// First row of its sample (matched samples span two rows)
    pub leading: bool,
    pub set: u8,
    pub matched: bool,
    pub cells: Vec<ReportCell>,
}

/// Sample by data source table for one producer
#[derive(Debug, Clone, Serialize)]
pub struct ProducerReport {
    pub producer: String,
    pub title: String,
    pub columns: Vec<String>,
    pub matched: usize,
    pub total: usize,
    pub rows: Vec<ReportRow>,
}

/// Build one table per producer with results, in registry order.
pub fn build_report(
    registry: &ProducerRegistry,
    results: &BTreeMap<String, MatchResult>,
) -> Vec<ProducerReport> {
    registry
        .iter()
        .filter_map(|producer| {
            let result = results.get(producer.id)?;
            let sources: Vec<&str> = producer.data_sources.iter().map(|s| s.name).collect();
            Some(ProducerReport {
                producer: producer.id.to_string(),
                title: producer.title.to_string(),
                columns: producer
                    .data_sources
                    .iter()
                    .map(|s| s.display_name.to_string())
                    .collect(),
                matched: result.matched.len(),
                total: result.sample_count(),
                rows: report_rows(result, &sources),
            })
        })
        .collect()
}

fn report_rows(result: &MatchResult, sources: &[&str]) -> Vec<ReportRow> {
    let empty = SampleFileSet::default();
    let files_of = |sample: &str| result.samples.get(sample).unwrap_or(&empty);
    let mut rows = Vec::new();

    for sample in &result.matched {
        let files = files_of(sample.as_str());
        let (mut one, mut two) = (Vec::new(), Vec::new());
        for source in sources {
            let (presence, in_one, in_two) = Presence::of(files, source);
            one.push(ReportCell { present: in_one, presence });
            two.push(ReportCell { present: in_two, presence });
        }
        rows.push(ReportRow {
            sample_name: sample.clone(),
            leading: true,
            set: RunLabel::One.number(),
            matched: true,
            cells: one,
        });
        rows.push(ReportRow {
            sample_name: sample.clone(),
            leading: false,
            set: RunLabel::Two.number(),
            matched: true,
            cells: two,
        });
    }

    for sample in result.unmatched() {
        let files = files_of(sample);
        let set = if result.unmatched_two.contains(sample) {
            RunLabel::Two
        } else {
            RunLabel::One
        };
        let cells = sources
            .iter()
            .map(|source| {
                let (presence, in_one, in_two) = Presence::of(files, source);
                ReportCell {
                    present: in_one || in_two,
                    presence,
                }
            })
            .collect();
        rows.push(ReportRow {
            sample_name: sample.to_string(),
            leading: true,
            set: set.number(),
            matched: false,
            cells,
        });
    }
    rows
}

/// Machine-readable summary of one producer
#[derive(Debug, Clone, Serialize)]
pub struct ProducerSummary {
    pub matched: Vec<String>,
    pub unmatched_one: Vec<String>,
    pub unmatched_two: Vec<String>,
    /// sample -> data source -> presence
    pub samples: BTreeMap<String, BTreeMap<String, SourcePresence>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePresence {
    pub one: bool,
    pub two: bool,
}

pub fn summarize(results: &BTreeMap<String, MatchResult>) -> BTreeMap<String, ProducerSummary> {
    results
        .iter()
        .map(|(producer, result)| {
            let samples = result
                .samples
                .iter()
                .map(|(sample, files)| {
                    let sources: BTreeMap<String, SourcePresence> = files
                        .pairs
                        .iter()
                        .map(|(source, pair)| {
                            let presence = SourcePresence {
                                one: pair.file_one.is_some(),
                                two: pair.file_two.is_some(),
                            };
                            (source.clone(), presence)
                        })
                        .collect();
                    (sample.clone(), sources)
                })
                .collect();
            let summary = ProducerSummary {
                matched: result.matched.iter().cloned().collect(),
                unmatched_one: result.unmatched_one.iter().cloned().collect(),
                unmatched_two: result.unmatched_two.iter().cloned().collect(),
                samples,
            };
            (producer.clone(), summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::matching::perform_matching;
    use crate::discovery::types::{DataType, InputFile};

    fn input(sample: &str, run: RunLabel, source: &str) -> InputFile {
        InputFile {
            sample_name: sample.to_string(),
            run,
            producer: "umccrise".to_string(),
            data_source: source.to_string(),
            data_type: DataType::SmallVariants,
            path: format!("/{run}/{sample}/{source}"),
        }
    }

    fn results() -> BTreeMap<String, MatchResult> {
        let one = vec![
            input("B", RunLabel::One, "cpsr"),
            input("B", RunLabel::One, "purple"),
            input("A", RunLabel::One, "pcgr"),
        ];
        let two = vec![input("B", RunLabel::Two, "cpsr"), input("C", RunLabel::Two, "manta")];
        let mut results = BTreeMap::new();
        results.insert("umccrise".to_string(), perform_matching("umccrise", &one, &two).unwrap());
        results
    }

    #[test]
    fn test_report_layout() {
        let registry = ProducerRegistry::builtin().unwrap();
        let reports = build_report(&registry, &results());
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.title, "UMCCRISE");
        assert_eq!(report.columns, vec!["CPSR", "PCGR", "Manta", "PURPLE"]);
        assert_eq!((report.matched, report.total), (1, 3));

        let order: Vec<(&str, u8, bool)> = report
            .rows
            .iter()
            .map(|r| (r.sample_name.as_str(), r.set, r.matched))
            .collect();
        assert_eq!(
            order,
            vec![("B", 1, true), ("B", 2, true), ("A", 1, false), ("C", 2, false)]
        );

        // Matched sample B: cpsr on both sides, purple only in set 1
        let (b_one, b_two) = (&report.rows[0].cells, &report.rows[1].cells);
        assert_eq!(b_one[0], ReportCell { present: true, presence: Presence::Both });
        assert_eq!(b_one[3], ReportCell { present: true, presence: Presence::OneSide });
        assert_eq!(b_two[3], ReportCell { present: false, presence: Presence::OneSide });
        assert_eq!(b_two[2], ReportCell { present: false, presence: Presence::Absent });

        let c = &report.rows[3].cells;
        assert!(c[2].present);
        assert!(!c[0].present);
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&results());
        let umccrise = &summary["umccrise"];
        assert_eq!(umccrise.matched, vec!["B"]);
        assert_eq!(umccrise.unmatched_one, vec!["A"]);
        assert_eq!(umccrise.unmatched_two, vec!["C"]);
        assert_eq!(
            umccrise.samples["B"]["purple"],
            SourcePresence { one: true, two: false }
        );
    }
}
