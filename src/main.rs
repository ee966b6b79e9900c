use std::fs;
use std::process;

use clap::Parser;
use chip_spikein_norm::cli::{Args, Commands};
use chip_spikein_norm::helper::params::{PRESETS, Params, preset_names};
use chip_spikein_norm::params_generator;
use chip_spikein_norm::pipelines::PipelineError;
use chip_spikein_norm::pipelines::normalize::run_normalize;

fn main() {
    let args = Args::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match args.command {
        Commands::Run {
            input,
            param,
            preset,
            output,
            no_plot,
        } => {
            println!(
                "Running spike-in normalization with input: {}, param: {}, output: {}",
                input,
                param.as_deref().or(preset.as_deref()).unwrap_or("-"),
                output.as_deref().unwrap_or(&input)
            );
            load_params(param.as_deref(), preset.as_deref()).and_then(|params| {
                run_normalize(&input, &params, output.as_deref(), !no_plot).map(|summary| {
                    for group in summary.groups() {
                        println!(
                            "Group {}: reference {}, norm {}",
                            group.group(),
                            group.reference(),
                            group.group_norm()
                        );
                    }
                    println!("Normalized {} libraries", summary.library_count());
                })
            })
        }
        Commands::Generate {} => params_generator::exec(),
        Commands::Presets { name } => match name {
            Some(name) => match PRESETS.get(name.as_str()) {
                Some(json) => {
                    println!("{}", json);
                    Ok(())
                }
                None => Err(format!("Unknown preset: {}", name).into()),
            },
            None => {
                println!("Available presets:");
                for name in preset_names() {
                    println!("  {}", name);
                }
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_params(
    param: Option<&str>,
    preset: Option<&str>,
) -> Result<Params, Box<dyn std::error::Error>> {
    match (param, preset) {
        (Some(path), _) => {
            let json = fs::read_to_string(path)
                .map_err(|_| PipelineError::ParamFileNotFound(path.to_string()))?;
            Ok(Params::from_json_string(&json)?)
        }
        (None, Some(name)) => Ok(Params::from_preset(name)?),
        (None, None) => Err("Either a param file or a preset is required".into()),
    }
}
