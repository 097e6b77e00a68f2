use anyhow::{Context, Result};

use crate::pileup::PileupCursor;

pub fn run(bam_file: String) -> Result<()> {
    let cursor =
        PileupCursor::open(&bam_file).with_context(|| format!("Failed to open {}", bam_file))?;
    for name in cursor.reference_names() {
        println!("{}", name);
    }
    Ok(())
}
