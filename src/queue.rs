//! Task queue construction.
//!
//! Candidates are expanded from the batch source, resolved to a sensor and a
//! panchromatic companion, and dropped when the companion is missing or the
//! final pansharpened product already exists. Each survivor becomes one
//! [`Task`]. No two tasks plan the same output path: an image whose planned
//! files overlap an earlier task's, such as a second multispectral tile
//! sharing one panchromatic companion, is excluded.

use crate::config::OutputOptions;
use crate::discovery::SourceSpec;
use crate::error::{PanbatchError, Result};
use crate::paths::{self, ImagePathSet};
use crate::sensor::{self, ResolutionError, Sensor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Everything the pipeline executor needs for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub sensor: Sensor,
    pub dst_dir: PathBuf,
    pub paths: ImagePathSet,
    pub options: OutputOptions,
}

/// One unit of work. Created once per queue build and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub sequence_id: u32,
    /// Multispectral source filename; keys the batch status report
    pub name: String,
    /// Short scheduler job name, `Pansh0001` style
    pub job_name: String,
    /// Shell command line re-running this image alone, for cluster submission
    pub invocation: String,
    pub request: PipelineRequest,
}

impl Task {
    pub fn job_name_for(sequence_id: u32) -> String {
        format!("Pansh{:04}", sequence_id)
    }
}

/// Counts gathered while building a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub candidates: usize,
    pub unrecognized: usize,
    pub excluded: usize,
    pub already_complete: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pub tasks: Vec<Task>,
    pub summary: QueueSummary,
}

impl TaskQueue {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

pub struct TaskQueueBuilder {
    dst_dir: PathBuf,
    options: OutputOptions,
    /// Program and output options prefixed to every single-image invocation
    base_args: Vec<String>,
}

impl TaskQueueBuilder {
    pub fn new(dst_dir: impl Into<PathBuf>, options: OutputOptions) -> Self {
        Self {
            dst_dir: dst_dir.into(),
            options,
            base_args: Vec::new(),
        }
    }

    pub fn with_base_args(mut self, base_args: Vec<String>) -> Self {
        self.base_args = base_args;
        self
    }

    pub fn build(&self, source: &SourceSpec) -> Result<TaskQueue> {
        let candidates = source.expand()?;
        let mut summary = QueueSummary {
            candidates: candidates.len(),
            ..QueueSummary::default()
        };

        // Planned output path -> multispectral source of the task that owns it
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut tasks = Vec::new();

        for mul_source in candidates {
            let (sensor, pan_source) = match resolve_pair(&mul_source) {
                Ok(pair) => pair,
                Err(ResolutionError::UnknownSensor(path)) => {
                    debug!("Skipping image with no sensor match: {}", path.display());
                    summary.unrecognized += 1;
                    continue;
                }
                Err(e) => {
                    error!("{}", PanbatchError::from(e));
                    summary.excluded += 1;
                    continue;
                }
            };

            let final_output = paths::pansharp_final_path(&mul_source, &self.dst_dir, &self.options);
            if final_output.is_file() {
                debug!("Output already exists, skipping: {}", final_output.display());
                summary.already_complete += 1;
                continue;
            }

            if claimed.contains_key(&final_output) {
                // A manifest may list the same image twice
                warn!("Duplicate source image ignored: {}", mul_source.display());
                continue;
            }

            let paths = paths::plan(&mul_source, &pan_source, &self.dst_dir, &self.options);
            if let Some(owner) = paths.outputs().iter().find_map(|path| claimed.get(*path)) {
                let e = ResolutionError::CompanionShared {
                    image: mul_source.clone(),
                    companion: pan_source,
                    claimed_by: owner.clone(),
                };
                error!("{}", PanbatchError::from(e));
                summary.excluded += 1;
                continue;
            }
            for path in paths.outputs() {
                claimed.insert(path.to_path_buf(), mul_source.clone());
            }

            let sequence_id = tasks.len() as u32 + 1;
            tasks.push(self.make_task(sequence_id, sensor, paths));
        }

        info!("Number of src images: {}", summary.candidates - summary.unrecognized - summary.excluded);
        info!("Number of incomplete tasks: {}", tasks.len());

        Ok(TaskQueue { tasks, summary })
    }

    fn make_task(&self, sequence_id: u32, sensor: Sensor, paths: ImagePathSet) -> Task {
        let mul_source = &paths.mul_source;
        let name = mul_source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut argv = self.base_args.clone();
        argv.push(mul_source.to_string_lossy().into_owned());
        argv.push(self.dst_dir.to_string_lossy().into_owned());

        Task {
            sequence_id,
            name,
            job_name: Task::job_name_for(sequence_id),
            invocation: shell_words::join(argv),
            request: PipelineRequest {
                sensor,
                dst_dir: self.dst_dir.clone(),
                paths,
                options: self.options.clone(),
            },
        }
    }
}

/// Resolve sensor and an existing panchromatic companion for a multispectral image
pub fn resolve_pair(mul_source: &Path) -> std::result::Result<(Sensor, PathBuf), ResolutionError> {
    let file_name = mul_source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ResolutionError::UnknownSensor(mul_source.to_path_buf()))?;

    let sensor = sensor::resolve(file_name)
        .ok_or_else(|| ResolutionError::UnknownSensor(mul_source.to_path_buf()))?;
    info!("Image: {}, Sensor: {}", file_name, sensor);

    let pan_name = sensor::derive_pan_name(sensor, mul_source)?;
    let pan_source = mul_source.with_file_name(pan_name);
    if !pan_source.is_file() {
        return Err(ResolutionError::CompanionMissing {
            image: mul_source.to_path_buf(),
            companion: pan_source,
        });
    }

    Ok((sensor, pan_source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitDepth, Stretch};
    use tempfile::TempDir;

    const MUL: &str = "WV02_12FEB061315046-M1BS-10300100106FC100.ntf";
    const PAN: &str = "WV02_12FEB061315046-P1BS-10300100106FC100.ntf";

    fn builder(dst: &Path) -> TaskQueueBuilder {
        TaskQueueBuilder::new(dst, OutputOptions::new(BitDepth::Byte, Stretch::Rf, 3413))
            .with_base_args(vec!["panbatch".into(), "-p".into(), "3413".into()])
    }

    #[test]
    fn test_pair_becomes_one_task() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join(MUL), b"m").unwrap();
        std::fs::write(src.path().join(PAN), b"p").unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Directory(src.path().to_path_buf()))
            .unwrap();

        assert_eq!(queue.len(), 1);
        let task = &queue.tasks[0];
        assert_eq!(task.sequence_id, 1);
        assert_eq!(task.job_name, "Pansh0001");
        assert_eq!(task.name, MUL);
        assert_eq!(task.request.sensor, Sensor::WV02);
        assert_eq!(task.request.paths.pan_source, src.path().join(PAN));
        assert!(task.invocation.starts_with("panbatch -p 3413 "));
        assert!(task.invocation.contains(MUL));
        // The pan image itself matches no multispectral pattern
        assert_eq!(queue.summary.unrecognized, 1);
    }

    #[test]
    fn test_missing_companion_is_excluded() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join(MUL), b"m").unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Directory(src.path().to_path_buf()))
            .unwrap();

        assert!(queue.is_empty());
        assert_eq!(queue.summary.excluded, 1);

        let err = resolve_pair(&src.path().join(MUL)).unwrap_err();
        assert!(matches!(err, ResolutionError::CompanionMissing { .. }));
    }

    #[test]
    fn test_completed_output_is_skipped() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join(MUL), b"m").unwrap();
        std::fs::write(src.path().join(PAN), b"p").unwrap();
        std::fs::write(
            dst.path()
                .join("WV02_12FEB061315046-M1BS-10300100106FC100_u8rf3413_pansh.tif"),
            b"done",
        )
        .unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Directory(src.path().to_path_buf()))
            .unwrap();

        assert!(queue.is_empty());
        assert_eq!(queue.summary.already_complete, 1);
        assert_eq!(queue.summary.excluded, 0);
    }

    #[test]
    fn test_sequence_ids_increase_and_duplicates_collapse() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let mut lines = String::new();
        for i in 0..3 {
            let mul = src.path().join(format!("QB02_0{i}JUL041626233-M1BS-101.ntf"));
            let pan = src.path().join(format!("QB02_0{i}JUL041626233-P1BS-101.ntf"));
            std::fs::write(&mul, b"m").unwrap();
            std::fs::write(&pan, b"p").unwrap();
            lines.push_str(&format!("{}\n", mul.display()));
        }
        // Same image listed twice
        lines.push_str(&format!(
            "{}\n",
            src.path().join("QB02_00JUL041626233-M1BS-101.ntf").display()
        ));
        let manifest = src.path().join("list.txt");
        std::fs::write(&manifest, lines).unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Manifest(manifest))
            .unwrap();

        let ids: Vec<u32> = queue.tasks.iter().map(|t| t.sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let finals: std::collections::HashSet<_> = queue
            .tasks
            .iter()
            .map(|t| t.request.paths.pansharp_final_output.clone())
            .collect();
        assert_eq!(finals.len(), 3);
    }

    #[test]
    fn test_shared_companion_is_queued_once() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let msi = "IK01_2009121113234710000011610960_msi_6516S.ntf";
        let bgrn = "IK01_2009121113234710000011610960_bgrn_6516S.ntf";
        for name in [msi, bgrn, "IK01_2009121113234710000011610960_pan_6516S.ntf"] {
            std::fs::write(src.path().join(name), b"x").unwrap();
        }
        let mut lines = String::new();
        for name in [msi, bgrn] {
            lines.push_str(&format!("{}\n", src.path().join(name).display()));
        }
        let manifest = src.path().join("list.txt");
        std::fs::write(&manifest, lines).unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Manifest(manifest))
            .unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.tasks[0].name, msi);
        assert_eq!(queue.summary.excluded, 1);
    }

    #[test]
    fn test_no_two_tasks_share_an_output() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        for name in [
            "IK01_2009121113234710000011610960_msi_6516S.ntf",
            "IK01_2009121113234710000011610960_bgrn_6516S.ntf",
            "IK01_2009121113234710000011610960_pan_6516S.ntf",
            MUL,
            PAN,
        ] {
            std::fs::write(src.path().join(name), b"x").unwrap();
        }

        let queue = builder(dst.path())
            .build(&SourceSpec::Directory(src.path().to_path_buf()))
            .unwrap();

        assert_eq!(queue.len(), 2);
        let mut owners = HashMap::new();
        for task in &queue.tasks {
            for path in task.request.paths.outputs() {
                if let Some(other) = owners.insert(path.to_path_buf(), task.sequence_id) {
                    assert_eq!(other, task.sequence_id, "{} planned twice", path.display());
                }
            }
        }
    }

    #[test]
    fn test_invocation_quotes_paths_with_spaces() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let spaced = src.path().join("scene one");
        std::fs::create_dir(&spaced).unwrap();
        std::fs::write(spaced.join(MUL), b"m").unwrap();
        std::fs::write(spaced.join(PAN), b"p").unwrap();

        let queue = builder(dst.path())
            .build(&SourceSpec::Image(spaced.join(MUL)))
            .unwrap();

        let argv = shell_words::split(&queue.tasks[0].invocation).unwrap();
        assert_eq!(argv[3], spaced.join(MUL).to_string_lossy());
        assert_eq!(argv[4], dst.path().to_string_lossy());
    }
}
