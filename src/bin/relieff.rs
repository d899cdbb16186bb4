use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::info;

use relieff::arff::{read_arff, write_arff_retained};
use relieff::core::RError;
use relieff::evaluator::{NominalDifference, ReliefF, ReliefFArg, Variant};
use relieff::ranking::PruneSpec;

#[derive(Parser, Debug)]
#[command(name = "relieff")]
#[command(about = "Relief-F attribute evaluation and feature selection", long_about = None)]
#[command(version)]
struct Cli {
    /// Input ARFF file
    arff_file: PathBuf,

    /// Output rank file with one "name,weight" line per retained attribute
    rank_file: PathBuf,

    /// Algorithm variant (p = batch, g = iterative)
    #[arg(short, long, default_value = "p")]
    algorithm: String,

    /// Class attribute name, matched case-insensitively
    #[arg(short, long, default_value = "Class")]
    class: String,

    /// Difference metric for nominal values
    #[arg(short, long, default_value = "genotype")]
    difference: String,

    /// Write the pruned dataset to this ARFF file
    #[arg(short = 'r', long = "arff")]
    arff_out: Option<PathBuf>,

    /// Write the ranking to this JSON file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Number (or percentage, with a "%" suffix) of attributes to prune
    #[arg(short, long, default_value = "0")]
    prune: String,

    /// Number of reference instances to process; negative values process every instance
    #[arg(short, long, default_value = "-1", allow_negative_numbers = true)]
    sample_size: i64,

    /// Number of nearest neighbours per class
    #[arg(short = 'k', long, default_value = "10")]
    neighbours: usize,

    /// Rank-decay parameter of the distance weighting
    #[arg(long, default_value = "2")]
    sigma: usize,

    /// Weight neighbours by their distance rank
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    weight_by_distance: bool,

    /// Seed of the reference sampler
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Seed the sampler from entropy instead of the fixed seed
    #[arg(long)]
    clock_seed: bool,

    /// Number of parallel workers
    #[arg(long, default_value = "1")]
    workers: usize,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("relieff: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RError> {
    let variant = match cli.algorithm.to_ascii_lowercase().as_str() {
        "p" => Variant::Batch,
        "g" => Variant::Iterative,
        other => {
            return Err(RError::BadArguments(
                "algorithm".to_string(),
                format!("'{other}' is neither 'p' nor 'g'"),
            ));
        }
    };
    let difference = match cli.difference.to_ascii_lowercase().as_str() {
        "genotype" => NominalDifference::Genotype,
        "allele-sharing" => NominalDifference::AlleleSharing,
        other => {
            return Err(RError::BadArguments(
                "difference".to_string(),
                format!("'{other}' is neither 'genotype' nor 'allele-sharing'"),
            ));
        }
    };
    let prune: PruneSpec = cli.prune.parse()?;

    let dataset = Arc::new(read_arff(&cli.arff_file, &cli.class)?);
    info!("{dataset}");

    let args = ReliefFArg {
        sample_size: usize::try_from(cli.sample_size).ok(),
        number_of_neighbours: cli.neighbours,
        sigma: cli.sigma,
        weight_by_distance: cli.weight_by_distance,
        seed: (!cli.clock_seed).then_some(cli.seed),
        variant,
        difference,
        workers: cli.workers,
    };
    let mut evaluator = ReliefF::new(dataset.clone(), args)?;
    evaluator.build()?;

    let ranking = evaluator.ranking()?;
    let prune = prune.resolve(dataset.number_of_attributes());
    let retained = ranking.retained(prune)?;

    let rank_out = File::create(&cli.rank_file)
        .map_err(|e| RError::File(cli.rank_file.clone(), e.to_string()))?;
    let mut rank_out = BufWriter::new(rank_out);
    for &attribute in &retained {
        writeln!(
            rank_out,
            "{},{:.3}",
            dataset.attribute(attribute)?.name(),
            ranking.weight(attribute)?
        )
        .map_err(|e| RError::File(cli.rank_file.clone(), e.to_string()))?;
    }
    info!(
        "Wrote {} ranked attributes to {:?}",
        retained.len(),
        cli.rank_file
    );

    if let Some(json_file) = &cli.json {
        ranking.export(&dataset, prune)?.write_json(json_file)?;
        info!("Wrote the ranking to {json_file:?}");
    }

    if let Some(arff_out) = &cli.arff_out {
        let out =
            File::create(arff_out).map_err(|e| RError::File(arff_out.clone(), e.to_string()))?;
        let mut out = BufWriter::new(out);
        write_arff_retained(&dataset, &retained, &mut out)?;
        info!("Wrote the pruned dataset to {arff_out:?}");
    }

    Ok(())
}
