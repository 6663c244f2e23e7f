use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info, warn, LevelFilter};

use ccml_tools::build::build_stores;
use ccml_tools::gen::generate_hpp;
use ccml_tools::source::{AllFilter, ClassificationFilter, StageFilter, TitleFilter};
use ccml_tools::{DeviceCharset, Result};

const VERBOSE_FLAG: &str = "verbose";

const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn build_filter(matches: &ArgMatches) -> Result<AllFilter> {
    let mut filter = AllFilter::new();
    filter.push(Box::new(StageFilter {
        min: *matches.get_one::<u8>("min-stage").unwrap_or(&2),
        max: *matches.get_one::<u8>("max-stage").unwrap_or(&16),
    }));
    if let Some(titles) = matches.get_many::<String>("title") {
        filter.push(Box::new(TitleFilter::exact(titles.cloned())));
    }
    if let Some(pattern) = matches.get_one::<String>("title-pattern") {
        filter.push(Box::new(TitleFilter::pattern(pattern)?));
    }
    if let Some(classes) = matches.get_many::<String>("class") {
        filter.push(Box::new(ClassificationFilter::classes(classes.cloned())));
    }
    Ok(filter)
}

fn run_build(matches: &ArgMatches) -> Result<bool> {
    let input = matches.get_one::<PathBuf>("input").cloned().unwrap();
    let out_dir = matches
        .get_one::<PathBuf>("out-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("methods"));
    let filter = build_filter(matches)?;

    let report = build_stores(&input, &filter, &out_dir)?;
    let total: usize = report.stages.iter().map(|s| s.methods).sum();
    info!(
        "wrote {} stores, {} methods, {} rejected",
        report.stages.len(),
        total,
        report.rejected
    );
    if report.rejected > 0 {
        warn!("{} methods were rejected", report.rejected);
    }
    Ok(report.rejected == 0)
}

fn run_gen_hpp(matches: &ArgMatches) -> Result<bool> {
    let output = matches.get_one::<PathBuf>("output").cloned().unwrap();
    let charset = DeviceCharset::new()?;
    fs::write(&output, generate_hpp(&charset))?;
    info!("wrote {}", output.display());
    Ok(true)
}

fn main() -> ExitCode {
    let matches = Command::new("methodconv")
        .version(crate_version())
        .about("Convert a method collection XML to on-device method stores.")
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("build")
                .about("Build one store file per stage from a method collection XML.")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .help("Path to the method collection XML")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out-dir")
                        .long("out-dir")
                        .default_value("methods")
                        .help("Directory for the generated store files")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("min-stage")
                        .long("min-stage")
                        .default_value("2")
                        .help("Smallest stage to include")
                        .value_parser(clap::value_parser!(u8).range(1..=16)),
                )
                .arg(
                    Arg::new("max-stage")
                        .long("max-stage")
                        .default_value("16")
                        .help("Largest stage to include")
                        .value_parser(clap::value_parser!(u8).range(1..=16)),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .action(ArgAction::Append)
                        .help("Only include methods with this title (stage name optional, repeatable)")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("title-pattern")
                        .long("title-pattern")
                        .help("Only include methods whose title matches this regex")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    Arg::new("class")
                        .long("class")
                        .action(ArgAction::Append)
                        .help("Only include methods with this classification (repeatable)")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("gen-hpp")
                .about("Generate the C++ lookup header for the on-device reader.")
                .arg(
                    Arg::new("output")
                        .required(true)
                        .help("Path of the header file to write")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .get_matches();

    let level = if matches.get_flag(VERBOSE_FLAG) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    let result = match matches.subcommand() {
        Some(("build", sub)) => run_build(sub),
        Some(("gen-hpp", sub)) => run_gen_hpp(sub),
        _ => {
            error!("no subcommand given, see --help");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
