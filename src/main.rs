// Entry point and high-level CLI flow.
//
// The binary is an interactive report generator over the CENIPA occurrence
// dataset:
// - Option [1] loads and joins the five CSV sources, printing diagnostics.
// - Options [2] and [3] adjust the filter criteria and report columns.
// - Option [4] generates the four chart series, the report table and a JSON
//   summary from the current filters.
mod error;
mod filter;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use once_cell::sync::Lazy;

use crate::filter::FilterCriteria;
use crate::loader::DataSources;
use crate::types::IncidentRecord;

const DEFAULT_REPORT_COLUMNS: [&str; 5] = [
    "codigo_ocorrencia",
    "ocorrencia_dia",
    "ocorrencia_classificacao",
    "fator_area",
    "fator_nome",
];

// In-memory app state: the dataset is loaded and joined once, then every
// report run filters and aggregates against that read-only table.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        data: None,
        criteria: FilterCriteria::default(),
        report_columns: DEFAULT_REPORT_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect(),
    })
});

struct AppState {
    data: Option<Vec<IncidentRecord>>,
    criteria: FilterCriteria,
    report_columns: Vec<String>,
}

#[derive(Parser)]
#[command(
    name = "cenipa_report",
    about = "Interactive reports over the CENIPA aeronautical occurrence dataset"
)]
struct Args {
    /// Directory holding the five CENIPA CSV files
    #[arg(long, default_value = "Data/CENIPA")]
    data_dir: PathBuf,
    /// How many contributing-factor groups the top-factors chart keeps
    #[arg(long, default_value_t = reports::DEFAULT_TOP_N)]
    top_n: usize,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

/// Split a comma-separated selection, keeping only values that are actually
/// selectable for the control.
fn parse_selection(input: &str, options: &[String]) -> Vec<String> {
    let mut selected = Vec::new();
    for part in input.split(',') {
        let value = part.trim();
        if value.is_empty() {
            continue;
        }
        if options.iter().any(|o| o == value) {
            selected.push(value.to_string());
        } else {
            println!("Ignoring unknown value: {}", value);
        }
    }
    selected
}

/// Handle option [1]: load and join the source tables.
fn handle_load(sources: &DataSources) {
    match loader::load(sources) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} base rows, {} joined rows, {} incidents)",
                util::format_int(report.base_rows as i64),
                util::format_int(report.joined_rows as i64),
                util::format_int(report.distinct_incidents as i64)
            );
            for (i, table) in loader::DIMENSION_TABLES.iter().enumerate() {
                println!(
                    "  {}: {} rows",
                    table,
                    util::format_int(report.dimension_rows[i] as i64)
                );
            }
            for (i, table) in loader::DIMENSION_TABLES.iter().enumerate() {
                if report.unmatched_keys[i] > 0 {
                    println!(
                        "Note: {} rows had no match in {}.",
                        util::format_int(report.unmatched_keys[i] as i64),
                        table
                    );
                }
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load dataset: {}\n", e);
        }
    }
}

/// Handle option [2]: set the filter criteria. Each control shows its
/// selectable values (sentinels and nulls already excluded); a blank entry
/// clears that filter.
fn handle_set_filters() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the dataset first (option 1).\n");
        return;
    };

    let prompt_control = |label: &str, column: &str| -> Vec<String> {
        let options = match filter::distinct_options(&data, column) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Failed to list options for {}: {}", column, e);
                return Vec::new();
            }
        };
        println!("{} ({} values):", label, options.len());
        println!("  {}", options.join(", "));
        let input = read_line("Selection (comma-separated, blank for all): ");
        println!();
        parse_selection(&input, &options)
    };

    let classification = prompt_control("Classification", "ocorrencia_classificacao");
    let incident_type = prompt_control("Occurrence type", "ocorrencia_tipo");
    let factor_area = prompt_control("Contributing factor area", "fator_area");
    let factor_name = prompt_control("Contributing factor", "fator_nome");

    let start_date = prompt_date("Start date (YYYY-MM-DD, blank for none): ");
    let end_date = prompt_date("End date (YYYY-MM-DD, blank for none): ");
    if start_date.is_some() != end_date.is_some() {
        println!("Note: the date range only applies when both bounds are set.");
    }
    println!();

    let mut state = APP_STATE.lock().unwrap();
    state.criteria = FilterCriteria {
        classification,
        incident_type,
        factor_area,
        factor_name,
        start_date,
        end_date,
    };
}

fn prompt_date(prompt: &str) -> Option<String> {
    let input = read_line(prompt);
    if input.is_empty() {
        return None;
    }
    match util::parse_filter_date(&input) {
        Ok(_) => Some(input),
        Err(e) => {
            println!("{}; bound left unset.", e);
            None
        }
    }
}

/// Handle option [3]: choose the report table columns.
fn handle_select_columns() {
    println!("Available columns:");
    println!("  {}", IncidentRecord::COLUMNS.join(", "));
    {
        let state = APP_STATE.lock().unwrap();
        println!("Current: {}", state.report_columns.join(", "));
    }
    let input = read_line("Columns (comma-separated, blank to keep current): ");
    if input.is_empty() {
        println!();
        return;
    }
    let mut columns = Vec::new();
    for part in input.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if IncidentRecord::has_column(name) {
            columns.push(name.to_string());
        } else {
            println!("Ignoring unknown column: {}", name);
        }
    }
    if columns.is_empty() {
        println!("No valid columns given; keeping current selection.\n");
        return;
    }
    let mut state = APP_STATE.lock().unwrap();
    state.report_columns = columns;
    println!();
}

/// Handle option [4]: filter once, then generate the four chart series, the
/// report table and the JSON summary.
fn handle_generate(top_n: usize) {
    let (data, criteria, report_columns) = {
        let state = APP_STATE.lock().unwrap();
        (
            state.data.clone(),
            state.criteria.clone(),
            state.report_columns.clone(),
        )
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the dataset first (option 1).\n");
        return;
    };

    let filtered = match filter::apply_filters(&data, &criteria) {
        Ok(filtered) => filtered,
        Err(e) => {
            eprintln!("Failed to apply filters: {}\n", e);
            return;
        }
    };
    println!(
        "Generating reports... ({} of {} rows after filters)",
        util::format_int(filtered.len() as i64),
        util::format_int(data.len() as i64)
    );
    println!("Outputs saved to individual files...\n");

    let r1 = reports::count_by_classification(&filtered);
    let file1 = "chart1_classificacao.csv";
    if let Err(e) = output::write_csv(file1, &r1) {
        eprintln!("Write error: {}", e);
    }
    println!("Chart 1: Occurrences by classification\n");
    output::preview_rows(&r1, r1.len());
    println!("(Full series exported to {})\n", file1);

    let r2 = reports::yearly_breakdown(&filtered);
    let file2 = "chart2_ocorrencias_fatalidades_ano.csv";
    if let Err(e) = output::write_csv(file2, &r2) {
        eprintln!("Write error: {}", e);
    }
    println!("Chart 2: Occurrences and fatalities by year\n");
    output::preview_rows(&r2, r2.len());
    println!("(Full series exported to {})\n", file2);

    let r3 = reports::count_by_factor_area(&filtered);
    let file3 = "chart3_fator_area.csv";
    if let Err(e) = output::write_csv(file3, &r3) {
        eprintln!("Write error: {}", e);
    }
    println!("Chart 3: Occurrences by contributing factor area\n");
    output::preview_rows(&r3, r3.len());
    println!("(Full series exported to {})\n", file3);

    let r4 = reports::top_factor_names(&filtered, top_n);
    let file4 = "chart4_fator_nome.csv";
    if let Err(e) = output::write_csv(file4, &r4) {
        eprintln!("Write error: {}", e);
    }
    println!("Chart 4: Occurrences by contributing factor (top {})\n", top_n);
    output::preview_rows(&r4, r4.len());
    println!("(Full series exported to {})\n", file4);

    let file5 = "relatorio.csv";
    match reports::project(&filtered, &report_columns) {
        Ok(table) => {
            if let Err(e) = output::write_projection_csv(file5, &table) {
                eprintln!("Write error: {}", e);
            }
            println!("Report table ({} rows)\n", util::format_int(table.rows.len() as i64));
            output::preview_projection(&table, 10);
            println!("(Full table exported to {})\n", file5);
        }
        Err(e) => eprintln!("Projection error: {}", e),
    }

    let summary = reports::generate_summary(&data, &filtered);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Summary Stats (summary.json): {} incidents, {} fatalities\n",
        util::format_int(summary.filtered_incidents as i64),
        util::format_int(summary.total_fatalities)
    );
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();
    let sources = DataSources::new(&args.data_dir);

    loop {
        println!("CENIPA occurrence reports:");
        println!("[1] Load dataset");
        println!("[2] Set filters");
        println!("[3] Choose report columns");
        println!("[4] Generate charts and report");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&sources),
            "2" => handle_set_filters(),
            "3" => handle_select_columns(),
            "4" => {
                println!();
                handle_generate(args.top_n);
            }
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter a number from 1 to 5.\n");
            }
        }
    }
}
