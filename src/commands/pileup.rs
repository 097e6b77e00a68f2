use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::pileup::{DefaultReadFilter, PileupCursor, PositionStatistics};

pub fn run(
    bam_file: String,
    region: Option<String>,
    output_file: Option<String>,
    limit: Option<u64>,
    json: bool,
    min_mapq: u8,
    reference: Option<String>,
) -> Result<()> {
    info!("Streaming pileup statistics from {}", bam_file);

    let filter = DefaultReadFilter::new(min_mapq);
    let mut cursor =
        PileupCursor::open_with_filter(&bam_file, reference.as_deref().map(Path::new), filter)
            .with_context(|| format!("Failed to open {}", bam_file))?;
    let ref_names = cursor.reference_names();

    if let Some(region) = region.as_deref() {
        let (name, pos) = parse_region(region)?;
        cursor
            .seek(name, pos)
            .with_context(|| format!("Failed to seek to {}", region))?;
    }

    let mut writer: BufWriter<Box<dyn Write>> = match output_file {
        Some(ref path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => BufWriter::new(Box::new(io::stdout())),
    };

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    if !json {
        write_header(&mut writer)?;
    }

    let mut written = 0u64;
    while let Some(stat) = cursor.next()? {
        if json {
            serde_json::to_writer(&mut writer, &stat)?;
            writeln!(writer)?;
        } else {
            write_row(&mut writer, &ref_names, &stat)?;
        }

        written += 1;
        if written % 10_000 == 0 {
            progress.set_message(format!(
                "{}:{} ({} positions)",
                ref_names
                    .get(stat.ref_id as usize)
                    .map(String::as_str)
                    .unwrap_or("?"),
                stat.pos,
                written
            ));
        }
        if limit.is_some_and(|max| written >= max) {
            break;
        }
    }

    writer.flush()?;
    progress.finish_and_clear();
    info!("Wrote {} positions", written);
    Ok(())
}

/// `CHR` or `CHR:POS` with a 1-based position.
fn parse_region(region: &str) -> Result<(&str, i64)> {
    match region.split_once(':') {
        None => Ok((region, 1)),
        Some((name, pos)) => {
            let pos: i64 = pos
                .parse()
                .with_context(|| format!("Invalid position in region '{}'", region))?;
            if name.is_empty() || pos < 1 {
                bail!("Invalid region '{}'", region);
            }
            Ok((name, pos))
        }
    }
}

fn write_header<W: Write>(writer: &mut W) -> Result<()> {
    let mut columns = vec!["CONTIG".to_string(), "POS".to_string()];
    for channel in ["A", "C", "G", "T", "TOTAL"] {
        for metric in ["COUNT", "QUAL_SUM", "MAPQ_SUM", "POS_SIGNAL", "RES0", "RES1"] {
            columns.push(format!("{}_{}", channel, metric));
        }
    }
    for column in ["MAJOR", "MINOR", "AMBIGUOUS", "RES_A", "ENTROPY", "RES_B"] {
        columns.push(column.to_string());
    }
    writeln!(writer, "{}", columns.join("|"))?;
    Ok(())
}

fn write_row<W: Write>(
    writer: &mut W,
    ref_names: &[String],
    stat: &PositionStatistics,
) -> Result<()> {
    let contig = ref_names
        .get(stat.ref_id as usize)
        .map(String::as_str)
        .unwrap_or("?");
    write!(writer, "{}|{}", contig, stat.pos)?;
    for channel in [&stat.a, &stat.c, &stat.g, &stat.t, &stat.total] {
        write!(
            writer,
            "|{}|{}|{}|{}|{}|{}",
            channel.count,
            channel.qual_sum,
            channel.mapq_sum,
            channel.pos_signal,
            channel.reserved[0],
            channel.reserved[1]
        )?;
    }
    writeln!(
        writer,
        "|{}|{}|{}|{}|{:.6}|{}",
        stat.major_base, stat.minor_base, stat.ambiguous, stat.reserved_a, stat.entropy, stat.reserved_b
    )?;
    Ok(())
}
