use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use featprune_cli::commands::{run_collinearity, run_gini, run_prune, run_stability};
use featprune_cli::config::{resolve_config, ConfigOverrides};

fn data_arg() -> Arg {
    Arg::new("data")
        .help("Path to the input table (*.csv, *.tsv or *.txt)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help("Path to a JSON pruning configuration. Defaults are used when omitted.")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn output_dir_arg() -> Arg {
    Arg::new("output_dir")
        .short('o')
        .long("output-dir")
        .help("Directory for the output files. Prints the feature list to stdout when omitted.")
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::DirPath)
}

fn stability_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("cohort")
            .long("cohort")
            .help("Cohort column. Overrides cohort_column in the configuration file.")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::Other),
    )
    .arg(
        Arg::new("target")
            .long("target")
            .help("Target column, excluded from the candidate features.")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::Other),
    )
    .arg(
        Arg::new("psi_threshold")
            .long("psi-threshold")
            .help("Features whose worst-cohort PSI exceeds this are unstable.")
            .value_parser(clap::value_parser!(f64)),
    )
    .arg(
        Arg::new("bins")
            .long("bins")
            .help("Number of equal-width PSI bins.")
            .value_parser(clap::value_parser!(usize)),
    )
}

fn collinearity_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("vif_threshold")
            .long("vif-threshold")
            .help("Features with a VIF above this are removed, worst first.")
            .value_parser(clap::value_parser!(f64)),
    )
    .arg(
        Arg::new("max_rounds")
            .long("max-rounds")
            .help("Rounds allowed after the first removal. Unbounded when omitted.")
            .allow_negative_numbers(true)
            .value_parser(clap::value_parser!(i64)),
    )
}

fn overrides_from(matches: &ArgMatches) -> ConfigOverrides {
    // Not every subcommand defines every flag
    let string = |id: &str| {
        matches
            .try_get_one::<String>(id)
            .ok()
            .flatten()
            .cloned()
    };
    ConfigOverrides {
        cohort_column: string("cohort"),
        target_column: string("target"),
        psi_threshold: matches.try_get_one::<f64>("psi_threshold").ok().flatten().copied(),
        bins: matches.try_get_one::<usize>("bins").ok().flatten().copied(),
        vif_threshold: matches.try_get_one::<f64>("vif_threshold").ok().flatten().copied(),
        max_rounds: matches.try_get_one::<i64>("max_rounds").ok().flatten().copied(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("FEATPRUNE_LOG", "error,featprune=info"))
        .init();

    let matches = Command::new("featprune")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("featprune - Candidate feature pruning by cohort stability and collinearity")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(stability_args(
            Command::new("stability")
                .about("Flag features whose distribution drifts across cohorts (PSI)")
                .arg(data_arg())
                .arg(config_arg())
                .arg(output_dir_arg()),
        ))
        .subcommand(collinearity_args(
            Command::new("collinearity")
                .about("Iteratively remove the feature with the highest VIF")
                .arg(data_arg())
                .arg(config_arg())
                .arg(output_dir_arg())
                .arg(
                    Arg::new("target")
                        .long("target")
                        .help("Target column, excluded from the candidate features.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                ),
        ))
        .subcommand(collinearity_args(stability_args(
            Command::new("prune")
                .about("Run the stability filter, then collinearity elimination on the stable features")
                .arg(data_arg())
                .arg(config_arg())
                .arg(output_dir_arg()),
        )))
        .subcommand(
            Command::new("gini")
                .about("Compute the Gini coefficient (2 * AUC - 1) of a score column")
                .arg(data_arg())
                .arg(
                    Arg::new("label")
                        .long("label")
                        .help("Binary label column; the larger value is the positive class.")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("score")
                        .long("score")
                        .help("Score column; larger scores should indicate the positive class.")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("stability", sub_m)) => handle_stability(sub_m),
        Some(("collinearity", sub_m)) => handle_collinearity(sub_m),
        Some(("prune", sub_m)) => handle_prune(sub_m),
        Some(("gini", sub_m)) => handle_gini(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

struct CommonArgs {
    data: PathBuf,
    config: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

fn common_args(matches: &ArgMatches) -> CommonArgs {
    CommonArgs {
        data: matches.get_one::<PathBuf>("data").cloned().unwrap_or_default(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        output_dir: matches.get_one::<PathBuf>("output_dir").cloned(),
    }
}

fn fail(what: &str, e: anyhow::Error) -> ! {
    log::error!("{} failed: {:#}", what, e);
    std::process::exit(1)
}

fn handle_stability(matches: &ArgMatches) -> Result<()> {
    let args = common_args(matches);
    log::info!("[featprune::stability] Data: {:?}", args.data);
    let config = match resolve_config(args.config.as_deref(), &overrides_from(matches)) {
        Ok(config) => config,
        Err(e) => fail("Loading configuration", e),
    };
    match run_stability(&args.data, &config, args.output_dir.as_deref()) {
        Ok(_) => Ok(()),
        Err(e) => fail("Stability filter", e),
    }
}

fn handle_collinearity(matches: &ArgMatches) -> Result<()> {
    let args = common_args(matches);
    log::info!("[featprune::collinearity] Data: {:?}", args.data);
    let config = match resolve_config(args.config.as_deref(), &overrides_from(matches)) {
        Ok(config) => config,
        Err(e) => fail("Loading configuration", e),
    };
    match run_collinearity(&args.data, &config, args.output_dir.as_deref()) {
        Ok(_) => Ok(()),
        Err(e) => fail("Collinearity elimination", e),
    }
}

fn handle_prune(matches: &ArgMatches) -> Result<()> {
    let args = common_args(matches);
    log::info!("[featprune::prune] Data: {:?}", args.data);
    let config = match resolve_config(args.config.as_deref(), &overrides_from(matches)) {
        Ok(config) => config,
        Err(e) => fail("Loading configuration", e),
    };
    match run_prune(&args.data, &config, args.output_dir.as_deref()) {
        Ok(_) => Ok(()),
        Err(e) => fail("Pruning", e),
    }
}

fn handle_gini(matches: &ArgMatches) -> Result<()> {
    let data: &PathBuf = matches.get_one("data").unwrap();
    let label = matches.get_one::<String>("label").map(String::as_str).unwrap_or_default();
    let score = matches.get_one::<String>("score").map(String::as_str).unwrap_or_default();
    log::info!("[featprune::gini] Data: {:?}", data);
    match run_gini(data, label, score) {
        Ok(_) => Ok(()),
        Err(e) => fail("Gini", e),
    }
}
