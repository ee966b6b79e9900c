use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::helper::counts_log::{check_library_count, pair_counts, read_count_log};
use crate::helper::export::{FULL_TABLE_FILE, write_full_table, write_normalization_table};
use crate::helper::normalization::normalize;
use crate::helper::params::{Params, ValidatedParams};
use crate::helper::plot::{PLOT_FILE, plot_read_proportions};
use crate::helper::summary::{NormalizationSummary, SUMMARY_FILE};
use crate::helper::utils::{log_line, open_run_log};
use crate::pipelines::PipelineError;

/// Where a run reads its count logs and writes its results.
#[derive(Debug, Clone)]
pub struct RunDirs {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RunDirs {
    /// Checks the input directory and creates the output directory if needed.
    /// The output defaults to the input directory.
    pub fn prepare(input: &str, output: Option<&str>) -> Result<Self, PipelineError> {
        let input_dir = Path::new(input);
        if !input_dir.exists() {
            return Err(PipelineError::InputDirNotFound(input.to_string()));
        }
        if !input_dir.is_dir() {
            return Err(PipelineError::NotADirectory(input.to_string()));
        }

        let output_dir = output.map_or_else(|| input_dir.to_path_buf(), PathBuf::from);
        if output_dir.is_file() {
            return Err(PipelineError::OutputNotADirectory(
                output_dir.display().to_string(),
            ));
        }

        Ok(RunDirs {
            input: input_dir.to_path_buf(),
            output: output_dir,
        })
    }
}

pub fn run_normalize(
    input: &str,
    params: &Params,
    output: Option<&str>,
    plot: bool,
) -> Result<NormalizationSummary, Box<dyn Error>> {
    let dirs = RunDirs::prepare(input, output)?;
    fs::create_dir_all(&dirs.output)?;

    let mut logger = open_run_log(&dirs.output)?;

    log_line(&mut logger, "Starting spike-in normalization")?;
    log_line(&mut logger, &format!("Input directory: {}", dirs.input.display()))?;
    log_line(
        &mut logger,
        &format!("Output directory: {}", dirs.output.display()),
    )?;
    log_line(&mut logger, &format!("Params: {}", params))?;

    match run_normalize_pipeline(&dirs, params, plot, &mut logger) {
        Ok(summary) => {
            log_line(&mut logger, "Spike-in normalization completed")?;
            Ok(summary)
        }
        Err(e) => {
            log_line(&mut logger, &format!("Error running normalization: {}", e))?;
            Err(e)
        }
    }
}

fn run_normalize_pipeline(
    dirs: &RunDirs,
    params: &Params,
    plot: bool,
    logger: &mut BufWriter<File>,
) -> Result<NormalizationSummary, Box<dyn Error>> {
    let start_time = Local::now();

    log_line(logger, "Validating Params")?;
    let params: ValidatedParams = params.validate()?;

    log_line(logger, "Reading count logs")?;
    let experimental = read_count_log(&dirs.input.join(&params.experimental_log))?;
    let spike_in = read_count_log(&dirs.input.join(&params.spike_in_log))?;
    log_line(
        logger,
        &format!(
            "{}: {} lines, {}: {} lines",
            experimental.path, experimental.line_count, spike_in.path, spike_in.line_count
        ),
    )?;

    let (table, warnings) = pair_counts(&experimental, &spike_in, params.strict_names)?;
    for warning in &warnings {
        log_line(logger, &format!("Warning: {}", warning))?;
    }
    check_library_count(&table, params.expected_libraries)?;
    log_line(logger, &format!("Libraries: {}", table.len()))?;

    let groups = params.group_specs(table.len())?;
    for group in &groups {
        log_line(
            logger,
            &format!(
                "Group {}: members {}, reference {}",
                group.name, group.members, group.reference
            ),
        )?;
    }

    let normalized = normalize(&table, &groups, params.precision)?;
    for group in normalized.groups() {
        log_line(
            logger,
            &format!(
                "Group {}: reference {}, norm {}",
                group.group(),
                group.reference(),
                group.group_norm()
            ),
        )?;
    }

    let table_path = dirs.output.join(&params.output_table);
    write_normalization_table(&normalized, &table_path)?;
    log_line(
        logger,
        &format!("Normalization table written to {}", table_path.display()),
    )?;

    write_full_table(&normalized, &dirs.output.join(FULL_TABLE_FILE))?;

    if plot {
        let plot_path = dirs.output.join(PLOT_FILE);
        plot_read_proportions(
            &normalized,
            &params.experimental_genome,
            &params.spike_in_genome,
            &plot_path,
        )?;
        log_line(logger, &format!("Plot written to {}", plot_path.display()))?;
    }

    let mut summary = NormalizationSummary::from_normalized_table(&normalized);
    summary.set_process_start_time(start_time);
    summary.set_input_directory(dirs.input.display().to_string());
    summary.set_output_directory(dirs.output.display().to_string());
    summary.set_experimental_genome(params.experimental_genome.clone());
    summary.set_spike_in_genome(params.spike_in_genome.clone());
    summary.set_warnings(warnings);
    summary.set_process_end_time(Local::now());

    summary.write_json(&dirs.output.join(SUMMARY_FILE))?;

    Ok(summary)
}
