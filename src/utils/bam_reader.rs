use std::path::Path;

use rust_htslib::bam;

use crate::error::{PileupError, Result};

pub struct BamReaderFactory;

impl BamReaderFactory {
    /// Open an indexed BAM/CRAM reader.
    ///
    /// CRAM decoding may need the reference FASTA; htslib picks it up
    /// from `REF_PATH`.
    pub fn open_indexed(
        bam_path: &Path,
        reference_path: Option<&Path>,
    ) -> Result<bam::IndexedReader> {
        if let Some(ref_path) = reference_path {
            if bam_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("cram"))
            {
                std::env::set_var("REF_PATH", ref_path);
            }
        }
        match bam::IndexedReader::from_path(bam_path) {
            Ok(reader) => Ok(reader),
            Err(source) => {
                // A file that opens without its index narrows the failure
                // down to the index itself.
                if bam::Reader::from_path(bam_path).is_ok() {
                    Err(PileupError::IndexMissing {
                        path: bam_path.to_path_buf(),
                    })
                } else {
                    Err(PileupError::FileOpen {
                        path: bam_path.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }
}
