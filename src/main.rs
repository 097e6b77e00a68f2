use basepile::cli;
use basepile::commands;

use clap::Parser;
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Pileup {
            bam_file,
            region,
            output_file,
            limit,
            json,
            min_mapq,
            reference,
        } => commands::pileup::run(bam_file, region, output_file, limit, json, min_mapq, reference),
        cli::Commands::Refnames { bam_file } => commands::refnames::run(bam_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
