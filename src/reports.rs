use std::collections::{BTreeMap, HashSet};

use crate::error::ReportError;
use crate::types::{
    ClassificationCount, DatasetSummary, FactorAreaCount, FactorNameCount, IncidentRecord,
    ProjectedTable, YearlyBreakdown, UNSPECIFIED_SENTINEL,
};

/// Default number of contributing-factor groups kept by `top_factor_names`.
pub const DEFAULT_TOP_N: usize = 10;

/// Distinct-incident count per classification label, in ascending label
/// order. Rows with a null classification contribute no group.
pub fn count_by_classification(data: &[IncidentRecord]) -> Vec<ClassificationCount> {
    let mut groups: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for r in data {
        if let Some(label) = r.ocorrencia_classificacao.as_deref() {
            groups
                .entry(label)
                .or_default()
                .insert(r.codigo_ocorrencia.as_str());
        }
    }
    groups
        .into_iter()
        .map(|(label, incidents)| ClassificationCount {
            classificacao: label.to_string(),
            ocorrencias: incidents.len(),
        })
        .collect()
}

/// Distinct-incident count and fatality sum per year, ascending by year.
///
/// Rows are first deduplicated on (codigo, ano, fatalidades) so an incident
/// with several factor rows is not double counted. If the source carries
/// conflicting fatality totals for one incident, each distinct total survives
/// the dedup and each adds to the sum; the incident count still counts it
/// once.
pub fn yearly_breakdown(data: &[IncidentRecord]) -> Vec<YearlyBreakdown> {
    let mut seen: HashSet<(&str, &str, Option<i64>)> = HashSet::new();
    let mut groups: BTreeMap<&str, (HashSet<&str>, i64)> = BTreeMap::new();
    for r in data {
        let triple = (
            r.codigo_ocorrencia.as_str(),
            r.ocorrencia_ano.as_str(),
            r.aeronave_fatalidades_total,
        );
        if !seen.insert(triple) {
            continue;
        }
        let entry = groups.entry(r.ocorrencia_ano.as_str()).or_default();
        entry.0.insert(r.codigo_ocorrencia.as_str());
        entry.1 += r.aeronave_fatalidades_total.unwrap_or(0);
    }
    groups
        .into_iter()
        .map(|(ano, (incidents, fatalidades))| YearlyBreakdown {
            ano: ano.to_string(),
            ocorrencias: incidents.len(),
            fatalidades,
        })
        .collect()
}

/// Distinct-incident count per contributing-factor area, ascending by count
/// (smallest first, for a horizontal-bar layout). The `***` placeholder area
/// is excluded; ties keep ascending area order thanks to the stable sort
/// over key-sorted groups.
pub fn count_by_factor_area(data: &[IncidentRecord]) -> Vec<FactorAreaCount> {
    let mut groups: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for r in data {
        match r.fator_area.as_deref() {
            Some(area) if area != UNSPECIFIED_SENTINEL => {
                groups
                    .entry(area)
                    .or_default()
                    .insert(r.codigo_ocorrencia.as_str());
            }
            _ => {}
        }
    }
    let mut rows: Vec<FactorAreaCount> = groups
        .into_iter()
        .map(|(area, incidents)| FactorAreaCount {
            fator_area: area.to_string(),
            ocorrencias: incidents.len(),
        })
        .collect();
    rows.sort_by_key(|row| row.ocorrencias);
    rows
}

/// Distinct-incident count per contributing-factor name, ascending by count,
/// truncated to the `n` largest groups while keeping ascending order among
/// them. Unlike the area view, the `***` placeholder groups normally here.
pub fn top_factor_names(data: &[IncidentRecord], n: usize) -> Vec<FactorNameCount> {
    let mut groups: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for r in data {
        if let Some(name) = r.fator_nome.as_deref() {
            groups
                .entry(name)
                .or_default()
                .insert(r.codigo_ocorrencia.as_str());
        }
    }
    let mut rows: Vec<FactorNameCount> = groups
        .into_iter()
        .map(|(name, incidents)| FactorNameCount {
            fator_nome: name.to_string(),
            ocorrencias: incidents.len(),
        })
        .collect();
    rows.sort_by_key(|row| row.ocorrencias);
    let cut = rows.len().saturating_sub(n);
    rows.split_off(cut)
}

/// Project the table onto `columns`, dropping duplicate rows under full-row
/// equality while preserving first-occurrence order. Every requested column
/// is validated up front, so an unknown name fails even on an empty table.
pub fn project(
    data: &[IncidentRecord],
    columns: &[String],
) -> Result<ProjectedTable, ReportError> {
    for column in columns {
        if !IncidentRecord::has_column(column) {
            return Err(ReportError::UnknownColumn(column.clone()));
        }
    }
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    let mut rows = Vec::new();
    for record in data {
        let row: Vec<Option<String>> = columns
            .iter()
            .map(|c| record.column(c))
            .collect::<Result<_, _>>()?;
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    Ok(ProjectedTable {
        columns: columns.to_vec(),
        rows,
    })
}

/// Headline numbers for `summary.json`. Fatalities go through the same
/// (codigo, ano, fatalidades) dedup as the yearly view so the two agree.
pub fn generate_summary(
    full: &[IncidentRecord],
    filtered: &[IncidentRecord],
) -> DatasetSummary {
    let distinct = |rows: &[IncidentRecord]| {
        rows.iter()
            .map(|r| r.codigo_ocorrencia.as_str())
            .collect::<HashSet<_>>()
            .len()
    };
    let total_fatalities = yearly_breakdown(filtered)
        .iter()
        .map(|y| y.fatalidades)
        .sum();
    DatasetSummary {
        total_rows: full.len(),
        distinct_incidents: distinct(full),
        filtered_rows: filtered.len(),
        filtered_incidents: distinct(filtered),
        total_fatalities,
        first_year: full.iter().map(|r| r.ocorrencia_ano.clone()).min(),
        last_year: full.iter().map(|r| r.ocorrencia_ano.clone()).max(),
    }
}
