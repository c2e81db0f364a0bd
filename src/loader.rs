use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use serde::de::DeserializeOwned;

use crate::error::ReportError;
use crate::types::{
    IncidentRecord, RawAircraft, RawContributingFactor, RawOccurrence, RawOccurrenceType,
    RawRecommendation,
};
use crate::util;

pub const BASE_TABLE: &str = "ocorrencia.csv";
pub const DIMENSION_TABLES: [&str; 4] = [
    "ocorrencia_tipo.csv",
    "aeronave.csv",
    "fator_contribuinte.csv",
    "recomendacao.csv",
];

// Join keys: `codigo_ocorrencia1..4` on the base side, one per dimension,
// against `codigo_ocorrencia` on the dimension side.
const BASE_JOIN_KEYS: [&str; 4] = [
    "codigo_ocorrencia1",
    "codigo_ocorrencia2",
    "codigo_ocorrencia3",
    "codigo_ocorrencia4",
];
const DIMENSION_JOIN_KEY: &str = "codigo_ocorrencia";

const FIELD_DELIMITER: u8 = b';';

/// Where the five CENIPA source files live.
#[derive(Debug, Clone)]
pub struct DataSources {
    dir: PathBuf,
}

impl DataSources {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, table: &str) -> PathBuf {
        self.dir.join(table)
    }
}

/// Diagnostics from one load-and-join pass.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub base_rows: usize,
    /// Row counts per dimension table, in `DIMENSION_TABLES` order.
    pub dimension_rows: [usize; 4],
    /// Base rows whose key found no dimension match, per dimension.
    pub unmatched_keys: [usize; 4],
    pub joined_rows: usize,
    pub distinct_incidents: usize,
}

/// Base row carried through the sequential join passes together with its
/// four join keys; the keys are dropped once the record is fully joined.
#[derive(Debug, Clone)]
struct PendingRecord {
    keys: [String; 4],
    record: IncidentRecord,
}

/// Read the five source files and left-join the dimensions onto the base
/// occurrence table. Base rows are never dropped: an unmatched key keeps its
/// row with null dimension fields, and a key with several dimension rows
/// fans out into one joined row per match.
///
/// A base row whose `ocorrencia_dia` does not parse fails the whole load;
/// skipping it would silently drop an incident from every report.
pub fn load(sources: &DataSources) -> Result<(Vec<IncidentRecord>, LoadReport), ReportError> {
    let mut base_required = vec![DIMENSION_JOIN_KEY];
    base_required.extend(BASE_JOIN_KEYS);
    let base: Vec<RawOccurrence> = read_table(sources, BASE_TABLE, &base_required)?;
    let tipos: Vec<RawOccurrenceType> =
        read_table(sources, DIMENSION_TABLES[0], &[DIMENSION_JOIN_KEY])?;
    let aeronaves: Vec<RawAircraft> =
        read_table(sources, DIMENSION_TABLES[1], &[DIMENSION_JOIN_KEY])?;
    let fatores: Vec<RawContributingFactor> =
        read_table(sources, DIMENSION_TABLES[2], &[DIMENSION_JOIN_KEY])?;
    let recomendacoes: Vec<RawRecommendation> =
        read_table(sources, DIMENSION_TABLES[3], &[DIMENSION_JOIN_KEY])?;
    log::info!(
        "sources read: {} base rows, {}/{}/{}/{} dimension rows",
        base.len(),
        tipos.len(),
        aeronaves.len(),
        fatores.len(),
        recomendacoes.len()
    );

    let base_rows = base.len();
    let dimension_rows = [
        tipos.len(),
        aeronaves.len(),
        fatores.len(),
        recomendacoes.len(),
    ];

    let mut pending = Vec::with_capacity(base.len());
    for row in base {
        let dia = row
            .ocorrencia_dia
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string();
        let (ano, mes) = util::split_occurrence_date(&dia)?;
        let data = util::parse_occurrence_date(&dia)?;
        pending.push(PendingRecord {
            keys: [
                row.codigo_ocorrencia1,
                row.codigo_ocorrencia2,
                row.codigo_ocorrencia3,
                row.codigo_ocorrencia4,
            ],
            record: IncidentRecord {
                codigo_ocorrencia: row.codigo_ocorrencia,
                ocorrencia_classificacao: util::non_empty(row.ocorrencia_classificacao),
                ocorrencia_cidade: util::non_empty(row.ocorrencia_cidade),
                ocorrencia_uf: util::non_empty(row.ocorrencia_uf),
                ocorrencia_dia: dia,
                ocorrencia_data: data,
                ocorrencia_ano: ano,
                ocorrencia_mes: mes,
                ocorrencia_tipo: None,
                ocorrencia_tipo_categoria: None,
                aeronave_matricula: None,
                aeronave_fatalidades_total: None,
                fator_nome: None,
                fator_aspecto: None,
                fator_area: None,
                recomendacao_numero: None,
                recomendacao_status: None,
            },
        });
    }

    let mut unmatched_keys = [0usize; 4];

    let tipo_index = index_rows(&tipos, |t| t.codigo_ocorrencia.as_str());
    let (pending, unmatched) = join_dimension(pending, 0, &tipo_index, |rec, t| {
        rec.ocorrencia_tipo = util::non_empty(t.ocorrencia_tipo.clone());
        rec.ocorrencia_tipo_categoria = util::non_empty(t.ocorrencia_tipo_categoria.clone());
    });
    unmatched_keys[0] = unmatched;

    let aeronave_index = index_rows(&aeronaves, |a| a.codigo_ocorrencia.as_str());
    let (pending, unmatched) = join_dimension(pending, 1, &aeronave_index, |rec, a| {
        rec.aeronave_matricula = util::non_empty(a.aeronave_matricula.clone());
        rec.aeronave_fatalidades_total = util::parse_count(a.aeronave_fatalidades_total.as_deref());
    });
    unmatched_keys[1] = unmatched;

    let fator_index = index_rows(&fatores, |f| f.codigo_ocorrencia.as_str());
    let (pending, unmatched) = join_dimension(pending, 2, &fator_index, |rec, f| {
        rec.fator_nome = util::non_empty(f.fator_nome.clone());
        rec.fator_aspecto = util::non_empty(f.fator_aspecto.clone());
        rec.fator_area = util::non_empty(f.fator_area.clone());
    });
    unmatched_keys[2] = unmatched;

    let recomendacao_index = index_rows(&recomendacoes, |r| r.codigo_ocorrencia.as_str());
    let (pending, unmatched) = join_dimension(pending, 3, &recomendacao_index, |rec, r| {
        rec.recomendacao_numero = util::non_empty(r.recomendacao_numero.clone());
        rec.recomendacao_status = util::non_empty(r.recomendacao_status.clone());
    });
    unmatched_keys[3] = unmatched;

    let records: Vec<IncidentRecord> = pending.into_iter().map(|p| p.record).collect();
    let distinct_incidents = records
        .iter()
        .map(|r| r.codigo_ocorrencia.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    for (i, table) in DIMENSION_TABLES.iter().enumerate() {
        log::debug!("{}: {} base rows without a match", table, unmatched_keys[i]);
    }
    log::info!(
        "join complete: {} rows, {} distinct incidents",
        records.len(),
        distinct_incidents
    );

    let report = LoadReport {
        base_rows,
        dimension_rows,
        unmatched_keys,
        joined_rows: records.len(),
        distinct_incidents,
    };
    Ok((records, report))
}

/// Read one `;`-delimited source file. CENIPA exports are latin1, decoded
/// here before the CSV reader ever sees the text. The required join columns
/// are checked against the header row so a reshaped export fails with
/// `SchemaMismatch` instead of a deserialize error.
fn read_table<T>(sources: &DataSources, table: &str, required: &[&str]) -> Result<Vec<T>, ReportError>
where
    T: DeserializeOwned,
{
    let path = sources.path(table);
    let bytes = fs::read(&path).map_err(|source| ReportError::SourceUnavailable {
        path: path.clone(),
        source,
    })?;
    let (text, _, _) = WINDOWS_1252.decode(&bytes);
    let mut rdr = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|source| ReportError::Csv {
            table: table.to_string(),
            source,
        })?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(ReportError::SchemaMismatch {
                table: table.to_string(),
                column: (*column).to_string(),
            });
        }
    }
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        rows.push(result.map_err(|source| ReportError::Csv {
            table: table.to_string(),
            source,
        })?);
    }
    Ok(rows)
}

fn index_rows<'a, D, K>(rows: &'a [D], key: K) -> HashMap<&'a str, Vec<&'a D>>
where
    K: Fn(&D) -> &str,
{
    let mut index: HashMap<&str, Vec<&D>> = HashMap::new();
    for row in rows {
        index.entry(key(row)).or_default().push(row);
    }
    index
}

/// One left-join pass. Every input row survives: unmatched keys pass through
/// with the dimension fields untouched (still null), matched keys fan out
/// into one output row per dimension match.
fn join_dimension<D, F>(
    rows: Vec<PendingRecord>,
    dim: usize,
    index: &HashMap<&str, Vec<&D>>,
    apply: F,
) -> (Vec<PendingRecord>, usize)
where
    F: Fn(&mut IncidentRecord, &D),
{
    let mut out = Vec::with_capacity(rows.len());
    let mut unmatched = 0usize;
    for pending in rows {
        match index.get(pending.keys[dim].as_str()) {
            Some(matches) => {
                for d in matches {
                    let mut next = pending.clone();
                    apply(&mut next.record, *d);
                    out.push(next);
                }
            }
            None => {
                unmatched += 1;
                out.push(pending);
            }
        }
    }
    (out, unmatched)
}
