use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::ReportError;
use crate::types::{IncidentRecord, NULL_LITERAL, UNSPECIFIED_SENTINEL};
use crate::util;

/// Current state of the filter controls. An empty selection list puts no
/// constraint on its column; all active constraints AND together.
///
/// The date range only applies when **both** bounds are set — a single bound
/// is ignored entirely, matching the date-picker behavior this tool mirrors.
/// Bounds are ISO `YYYY-MM-DD` strings as a picker emits them.
#[derive(Debug, Default, Clone)]
pub struct FilterCriteria {
    pub classification: Vec<String>,
    pub incident_type: Vec<String>,
    pub factor_area: Vec<String>,
    pub factor_name: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl FilterCriteria {
    fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ReportError> {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) if !start.trim().is_empty() && !end.trim().is_empty() => {
                Ok(Some((
                    util::parse_filter_date(start)?,
                    util::parse_filter_date(end)?,
                )))
            }
            _ => Ok(None),
        }
    }
}

/// Return the rows satisfying every active criterion. The input is never
/// mutated; the result is an owned subset the caller is free to keep.
///
/// Date comparison is strictly exclusive on both ends: a row on either
/// boundary day is dropped. An unparseable bound is an `InvalidDate` error
/// rather than a silently skipped constraint.
pub fn apply_filters(
    data: &[IncidentRecord],
    criteria: &FilterCriteria,
) -> Result<Vec<IncidentRecord>, ReportError> {
    let range = criteria.date_range()?;
    let keep = |r: &IncidentRecord| {
        matches_selection(&criteria.classification, r.ocorrencia_classificacao.as_deref())
            && matches_selection(&criteria.incident_type, r.ocorrencia_tipo.as_deref())
            && matches_selection(&criteria.factor_area, r.fator_area.as_deref())
            && matches_selection(&criteria.factor_name, r.fator_nome.as_deref())
            && range.map_or(true, |(start, end)| {
                start < r.ocorrencia_data && r.ocorrencia_data < end
            })
    };
    Ok(data.iter().filter(|r| keep(r)).cloned().collect())
}

/// A null cell never matches an active selection; an empty selection matches
/// everything.
fn matches_selection(selected: &[String], value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.iter().any(|s| s == v))
}

/// Distinct values of `column`, for populating a filter control: string
/// coerced, deduplicated, sorted lexicographically. Null cells, the `***`
/// placeholder, and the literal `nan` are never selectable.
pub fn distinct_options(
    data: &[IncidentRecord],
    column: &str,
) -> Result<Vec<String>, ReportError> {
    if !IncidentRecord::has_column(column) {
        return Err(ReportError::UnknownColumn(column.to_string()));
    }
    let mut values = BTreeSet::new();
    for record in data {
        if let Some(value) = record.column(column)? {
            if value != UNSPECIFIED_SENTINEL && value != NULL_LITERAL {
                values.insert(value);
            }
        }
    }
    Ok(values.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<IncidentRecord> {
        let mut a = IncidentRecord::sample("101");
        a.ocorrencia_classificacao = Some("INCIDENTE".to_string());
        a.ocorrencia_data = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        a.fator_area = Some("FATOR OPERACIONAL".to_string());

        let mut b = IncidentRecord::sample("102");
        b.ocorrencia_classificacao = Some("ACIDENTE".to_string());
        b.ocorrencia_data = NaiveDate::from_ymd_opt(2015, 6, 15).unwrap();
        b.fator_area = Some("FATOR HUMANO".to_string());
        b.fator_nome = Some("APLICACAO DE COMANDOS".to_string());

        let mut c = IncidentRecord::sample("103");
        c.ocorrencia_classificacao = Some("ACIDENTE".to_string());
        c.ocorrencia_data = NaiveDate::from_ymd_opt(2016, 3, 10).unwrap();
        c.fator_area = Some(UNSPECIFIED_SENTINEL.to_string());
        c.fator_nome = None;

        vec![a, b, c]
    }

    #[test]
    fn empty_criteria_keeps_everything() {
        let data = dataset();
        let out = apply_filters(&data, &FilterCriteria::default()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn classification_filter_keeps_members_only() {
        let data = dataset();
        let criteria = FilterCriteria {
            classification: vec!["ACIDENTE".to_string()],
            ..Default::default()
        };
        let out = apply_filters(&data, &criteria).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.ocorrencia_classificacao.as_deref() == Some("ACIDENTE")));
    }

    #[test]
    fn additional_criteria_never_grow_the_result() {
        let data = dataset();
        let one = FilterCriteria {
            classification: vec!["ACIDENTE".to_string()],
            ..Default::default()
        };
        let two = FilterCriteria {
            classification: vec!["ACIDENTE".to_string()],
            factor_area: vec!["FATOR HUMANO".to_string()],
            ..Default::default()
        };
        let first = apply_filters(&data, &one).unwrap();
        let second = apply_filters(&data, &two).unwrap();
        assert!(second.len() <= first.len());
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].codigo_ocorrencia, "102");
    }

    #[test]
    fn null_cells_never_match_an_active_selection() {
        let data = dataset();
        let criteria = FilterCriteria {
            factor_name: vec!["APLICACAO DE COMANDOS".to_string()],
            ..Default::default()
        };
        let out = apply_filters(&data, &criteria).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].codigo_ocorrencia, "102");
    }

    #[test]
    fn date_bounds_are_strictly_exclusive() {
        let data = dataset();
        let criteria = FilterCriteria {
            start_date: Some("2015-01-01".to_string()),
            end_date: Some("2015-12-31".to_string()),
            ..Default::default()
        };
        let out = apply_filters(&data, &criteria).unwrap();
        // 101 sits exactly on the start bound and is excluded; 102 falls
        // inside; 103 is past the end.
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].codigo_ocorrencia, "102");
    }

    #[test]
    fn single_bound_is_ignored() {
        let data = dataset();
        let criteria = FilterCriteria {
            start_date: Some("2015-12-31".to_string()),
            ..Default::default()
        };
        let out = apply_filters(&data, &criteria).unwrap();
        assert_eq!(out.len(), data.len());

        let criteria = FilterCriteria {
            end_date: Some("2015-12-31".to_string()),
            ..Default::default()
        };
        let out = apply_filters(&data, &criteria).unwrap();
        assert_eq!(out.len(), data.len());
    }

    #[test]
    fn unparseable_bound_is_an_error() {
        let data = dataset();
        let criteria = FilterCriteria {
            start_date: Some("not-a-date".to_string()),
            end_date: Some("2015-12-31".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            apply_filters(&data, &criteria),
            Err(ReportError::InvalidDate { .. })
        ));
    }

    #[test]
    fn options_are_sorted_deduplicated_and_sentinel_free() {
        let data = dataset();
        let options = distinct_options(&data, "fator_area").unwrap();
        assert_eq!(options, vec!["FATOR HUMANO", "FATOR OPERACIONAL"]);

        let options = distinct_options(&data, "ocorrencia_classificacao").unwrap();
        assert_eq!(options, vec!["ACIDENTE", "INCIDENTE"]);
    }

    #[test]
    fn literal_nan_is_not_selectable() {
        let mut data = dataset();
        data[2].fator_nome = Some(NULL_LITERAL.to_string());
        let options = distinct_options(&data, "fator_nome").unwrap();
        assert_eq!(options, vec!["APLICACAO DE COMANDOS", "JULGAMENTO DE PILOTAGEM"]);
    }

    #[test]
    fn options_for_unknown_column_fail() {
        let data = dataset();
        assert!(matches!(
            distinct_options(&data, "no_such_column"),
            Err(ReportError::UnknownColumn(_))
        ));
    }
}
