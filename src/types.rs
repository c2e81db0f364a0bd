use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::ReportError;

/// Literal placeholder CENIPA uses for "not applicable".
pub const UNSPECIFIED_SENTINEL: &str = "***";

/// Legacy spelling of a stringified null; excluded from selectable options.
pub const NULL_LITERAL: &str = "nan";

#[derive(Debug, Deserialize)]
pub struct RawOccurrence {
    pub codigo_ocorrencia: String,
    pub codigo_ocorrencia1: String,
    pub codigo_ocorrencia2: String,
    pub codigo_ocorrencia3: String,
    pub codigo_ocorrencia4: String,
    pub ocorrencia_classificacao: Option<String>,
    pub ocorrencia_cidade: Option<String>,
    pub ocorrencia_uf: Option<String>,
    pub ocorrencia_dia: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOccurrenceType {
    pub codigo_ocorrencia: String,
    pub ocorrencia_tipo: Option<String>,
    pub ocorrencia_tipo_categoria: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAircraft {
    pub codigo_ocorrencia: String,
    pub aeronave_matricula: Option<String>,
    pub aeronave_fatalidades_total: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawContributingFactor {
    pub codigo_ocorrencia: String,
    pub fator_nome: Option<String>,
    pub fator_aspecto: Option<String>,
    pub fator_area: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRecommendation {
    pub codigo_ocorrencia: String,
    pub recomendacao_numero: Option<String>,
    pub recomendacao_status: Option<String>,
}

/// One row of the denormalized table: the base occurrence joined against the
/// four dimension tables. Dimension fields are `None` when the left join
/// found no match; one occurrence can span several rows (one per factor,
/// recommendation, etc.), so incident counts must always deduplicate on
/// `codigo_ocorrencia`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRecord {
    pub codigo_ocorrencia: String,
    pub ocorrencia_classificacao: Option<String>,
    pub ocorrencia_cidade: Option<String>,
    pub ocorrencia_uf: Option<String>,
    pub ocorrencia_dia: String,
    /// Parsed form of `ocorrencia_dia`, used only by the date-range filter.
    pub ocorrencia_data: NaiveDate,
    pub ocorrencia_ano: String,
    pub ocorrencia_mes: String,
    pub ocorrencia_tipo: Option<String>,
    pub ocorrencia_tipo_categoria: Option<String>,
    pub aeronave_matricula: Option<String>,
    pub aeronave_fatalidades_total: Option<i64>,
    pub fator_nome: Option<String>,
    pub fator_aspecto: Option<String>,
    pub fator_area: Option<String>,
    pub recomendacao_numero: Option<String>,
    pub recomendacao_status: Option<String>,
}

impl IncidentRecord {
    /// Column identifiers available to the option extractor and projection.
    pub const COLUMNS: [&'static str; 16] = [
        "codigo_ocorrencia",
        "ocorrencia_classificacao",
        "ocorrencia_cidade",
        "ocorrencia_uf",
        "ocorrencia_dia",
        "ocorrencia_ano",
        "ocorrencia_mes",
        "ocorrencia_tipo",
        "ocorrencia_tipo_categoria",
        "aeronave_matricula",
        "aeronave_fatalidades_total",
        "fator_nome",
        "fator_aspecto",
        "fator_area",
        "recomendacao_numero",
        "recomendacao_status",
    ];

    pub fn has_column(name: &str) -> bool {
        Self::COLUMNS.contains(&name)
    }

    /// Look up a cell by column name. `Ok(None)` is a null cell (a dimension
    /// the join did not match); an unlisted name is an error, not a panic.
    pub fn column(&self, name: &str) -> Result<Option<String>, ReportError> {
        let value = match name {
            "codigo_ocorrencia" => Some(self.codigo_ocorrencia.clone()),
            "ocorrencia_classificacao" => self.ocorrencia_classificacao.clone(),
            "ocorrencia_cidade" => self.ocorrencia_cidade.clone(),
            "ocorrencia_uf" => self.ocorrencia_uf.clone(),
            "ocorrencia_dia" => Some(self.ocorrencia_dia.clone()),
            "ocorrencia_ano" => Some(self.ocorrencia_ano.clone()),
            "ocorrencia_mes" => Some(self.ocorrencia_mes.clone()),
            "ocorrencia_tipo" => self.ocorrencia_tipo.clone(),
            "ocorrencia_tipo_categoria" => self.ocorrencia_tipo_categoria.clone(),
            "aeronave_matricula" => self.aeronave_matricula.clone(),
            "aeronave_fatalidades_total" => {
                self.aeronave_fatalidades_total.map(|n| n.to_string())
            }
            "fator_nome" => self.fator_nome.clone(),
            "fator_aspecto" => self.fator_aspecto.clone(),
            "fator_area" => self.fator_area.clone(),
            "recomendacao_numero" => self.recomendacao_numero.clone(),
            "recomendacao_status" => self.recomendacao_status.clone(),
            _ => return Err(ReportError::UnknownColumn(name.to_string())),
        };
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ClassificationCount {
    #[serde(rename = "Classificacao")]
    #[tabled(rename = "Classificacao")]
    pub classificacao: String,
    #[serde(rename = "Ocorrencias")]
    #[tabled(rename = "Ocorrencias")]
    pub ocorrencias: usize,
}

/// Count and fatality sum share one row per year so the two series stay
/// aligned on the same axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct YearlyBreakdown {
    #[serde(rename = "Ano")]
    #[tabled(rename = "Ano")]
    pub ano: String,
    #[serde(rename = "Ocorrencias")]
    #[tabled(rename = "Ocorrencias")]
    pub ocorrencias: usize,
    #[serde(rename = "Fatalidades")]
    #[tabled(rename = "Fatalidades")]
    pub fatalidades: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct FactorAreaCount {
    #[serde(rename = "FatorArea")]
    #[tabled(rename = "FatorArea")]
    pub fator_area: String,
    #[serde(rename = "Ocorrencias")]
    #[tabled(rename = "Ocorrencias")]
    pub ocorrencias: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct FactorNameCount {
    #[serde(rename = "FatorNome")]
    #[tabled(rename = "FatorNome")]
    pub fator_nome: String,
    #[serde(rename = "Ocorrencias")]
    #[tabled(rename = "Ocorrencias")]
    pub ocorrencias: usize,
}

/// Column-subset projection of the filtered table, deduplicated on full-row
/// equality. `None` cells render as empty on export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub distinct_incidents: usize,
    pub filtered_rows: usize,
    pub filtered_incidents: usize,
    pub total_fatalities: i64,
    pub first_year: Option<String>,
    pub last_year: Option<String>,
}

#[cfg(test)]
impl IncidentRecord {
    /// Fully populated record for tests; tweak fields per case.
    pub(crate) fn sample(codigo: &str) -> Self {
        Self {
            codigo_ocorrencia: codigo.to_string(),
            ocorrencia_classificacao: Some("INCIDENTE".to_string()),
            ocorrencia_cidade: Some("SAO PAULO".to_string()),
            ocorrencia_uf: Some("SP".to_string()),
            ocorrencia_dia: "15/06/2015".to_string(),
            ocorrencia_data: NaiveDate::from_ymd_opt(2015, 6, 15).unwrap(),
            ocorrencia_ano: "2015".to_string(),
            ocorrencia_mes: "06".to_string(),
            ocorrencia_tipo: Some("FALHA DO MOTOR EM VOO".to_string()),
            ocorrencia_tipo_categoria: Some("FALHA DE SISTEMA".to_string()),
            aeronave_matricula: Some("PT-ABC".to_string()),
            aeronave_fatalidades_total: Some(0),
            fator_nome: Some("JULGAMENTO DE PILOTAGEM".to_string()),
            fator_aspecto: Some("DESEMPENHO DO SER HUMANO".to_string()),
            fator_area: Some("FATOR OPERACIONAL".to_string()),
            recomendacao_numero: None,
            recomendacao_status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_column_resolves() {
        let rec = IncidentRecord::sample("1001");
        for name in IncidentRecord::COLUMNS {
            assert!(rec.column(name).is_ok(), "column {name} did not resolve");
        }
    }

    #[test]
    fn unknown_column_is_an_error() {
        let rec = IncidentRecord::sample("1001");
        assert!(matches!(
            rec.column("ocorrencia_pais"),
            Err(ReportError::UnknownColumn(_))
        ));
    }

    #[test]
    fn null_cell_reads_as_none() {
        let mut rec = IncidentRecord::sample("1001");
        rec.fator_area = None;
        assert_eq!(rec.column("fator_area").unwrap(), None);
        assert_eq!(
            rec.column("codigo_ocorrencia").unwrap().as_deref(),
            Some("1001")
        );
    }

    #[test]
    fn fatalities_coerce_to_string() {
        let mut rec = IncidentRecord::sample("1001");
        rec.aeronave_fatalidades_total = Some(3);
        assert_eq!(
            rec.column("aeronave_fatalidades_total").unwrap().as_deref(),
            Some("3")
        );
    }
}
