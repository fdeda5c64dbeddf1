use epmat::base::{ParamSolid, Settings};
use epmat::material::{allocate_nd_material, StrainPath};
use epmat::tensor::Tensor2;
use epmat::StrError;
use log::LevelFilter;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "strain_driver",
    about = "Drives an elastoplastic material point through a path of total strains"
)]
struct Options {
    /// JSON file with the material parameters, settings, and strains
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Prints the strains and the configuration of the material point
    #[structopt(short, long)]
    verbose: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[structopt(long, default_value = "warn")]
    log_level: LevelFilter,
}

/// Holds the contents of the input file
#[derive(Deserialize)]
struct Input {
    /// Material parameters
    param: ParamSolid,

    /// Options of the stress update
    #[serde(default)]
    settings: Settings,

    /// Initial stress (Voigt components)
    #[serde(default)]
    initial_stress: Option<[f64; 6]>,

    /// Total strains (Voigt components with engineering shear strains)
    strains: Vec<[f64; 6]>,
}

fn initialize_logging(level: LevelFilter) -> Result<(), StrError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}][{}] {}", record.target(), record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|_| "cannot initialize the logger")
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();
    initialize_logging(options.log_level)?;

    // load data
    let text = fs::read_to_string(&options.input).map_err(|_| "cannot read the input file")?;
    let input: Input = serde_json::from_str(&text).map_err(|_| "cannot parse the input file")?;

    // allocate material point
    let mut material = allocate_nd_material(&input.param, &input.settings)?;
    if let Some(voigt) = &input.initial_stress {
        material.initialize_stress(&Tensor2::from_voigt_stress(voigt))?;
    }
    if options.verbose {
        println!("configuration: {}", material.config_id());
        println!("method: {:?}, tangent: {:?}", input.settings.method, input.settings.tangent);
    }

    // run
    let mut path = StrainPath::new();
    for voigt in &input.strains {
        path.push_voigt(voigt);
        if options.verbose {
            println!("strain: {:?}", voigt);
        }
    }
    let history = path.follow(material.as_mut())?;

    // results
    println!(
        "{:>5} {:>14} {:>14} {:>14} {:>14} {:>8}",
        "step", "σm", "σd", "f", "Δλ", "elastic"
    );
    for (i, state) in history.iter().enumerate() {
        println!(
            "{:>5} {:>14.6e} {:>14.6e} {:>14.6e} {:>14.6e} {:>8}",
            i,
            state.sigma_m(),
            state.sigma_d(),
            state.yield_value,
            state.algo_lambda,
            state.elastic
        );
    }
    Ok(())
}
