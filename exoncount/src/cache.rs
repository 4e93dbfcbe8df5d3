//! Optional on-disk cache of per-sample results.
//!
//! A cached result is reused only when the sample id, the input file (size and
//! modification time), the gene model, the cut-points, the counting settings
//! and the crate version all match. Anything that goes wrong while loading or storing is logged and
//! treated as a miss; the cache never fails a sample.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use md5::{Digest, Md5};

use crate::worker::{Sample, SampleResult};

pub struct ResultCache {
    dir: PathBuf,
    version: String,
}

impl ResultCache {
    ///
    /// Open (creating if needed) a cache directory for results computed against
    /// the given gene model and cut-point digests and counting fingerprint.
    ///
    pub fn new(
        dir: &Path,
        model_digest: &str,
        cut_points_digest: &str,
        settings: &str,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(ResultCache {
            dir: dir.to_path_buf(),
            version: format!(
                "{}\t{}\t{}\t{}",
                env!("CARGO_PKG_VERSION"),
                model_digest,
                cut_points_digest,
                settings
            ),
        })
    }

    fn entry_path(&self, sample: &Sample) -> PathBuf {
        let mut hasher = Md5::new();
        hasher.update(sample.id.as_bytes());
        hasher.update(b"\t");
        hasher.update(sample.path.to_string_lossy().as_bytes());
        hasher.update(b"\t");
        hasher.update(file_stamp(&sample.path).as_bytes());
        hasher.update(b"\t");
        hasher.update(self.version.as_bytes());
        let key = format!("{:x}", hasher.finalize());
        self.dir.join(format!("{}.{}.bin", sample.id, key))
    }

    /// The cached result for `sample`, if present and readable.
    pub fn load(&self, sample: &Sample) -> Option<SampleResult> {
        let path = self.entry_path(sample);
        if !path.exists() {
            return None;
        }
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("Could not open cache entry {:?}: {}", path, e);
                return None;
            }
        };
        match bincode::deserialize_from::<_, SampleResult>(BufReader::new(file)) {
            Ok(result) if result.sample == sample.id => Some(result),
            Ok(_) => {
                log::warn!("Cache entry {:?} belongs to another sample; ignoring", path);
                None
            }
            Err(e) => {
                log::warn!("Could not decode cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Store `result` for `sample`. Failures are logged, not returned.
    pub fn store(&self, sample: &Sample, result: &SampleResult) {
        let path = self.entry_path(sample);
        let written = File::create(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                bincode::serialize_into(&mut writer, result).map_err(|e| e.to_string())?;
                writer.flush().map_err(|e| e.to_string())
            });
        if let Err(e) = written {
            log::warn!("Could not write cache entry {:?}: {}", path, e);
            let _ = fs::remove_file(&path);
        }
    }
}

fn file_stamp(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            format!("{}:{}", meta.len(), modified)
        }
        Err(_) => String::from("missing"),
    }
}
