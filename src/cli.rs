use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream per-position nucleotide statistics from an indexed BAM/CRAM
    Pileup {
        /// Path to the indexed BAM/CRAM file
        bam_file: String,

        /// Start streaming from this position (CHR or CHR:POS, 1-based)
        #[arg(short = 'r', long = "region")]
        region: Option<String>,

        /// Output file for the statistics table (default: stdout)
        #[arg(short = 'o', long = "output")]
        output_file: Option<String>,

        /// Stop after this many positions
        #[arg(short = 'n', long = "limit")]
        limit: Option<u64>,

        /// Emit one JSON object per line instead of the delimited table
        #[arg(long)]
        json: bool,

        /// Minimum mapping quality for a read to contribute (default: 0)
        #[arg(long = "min-mapq", default_value = "0")]
        min_mapq: u8,

        /// Reference FASTA, needed for CRAM input
        #[arg(long = "reference")]
        reference: Option<String>,
    },

    /// List the reference sequence names of a BAM/CRAM file
    Refnames {
        /// Path to the indexed BAM/CRAM file
        bam_file: String,
    },
}
