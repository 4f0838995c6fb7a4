use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use super::{ProcessedImage, ProcessingEngine};
use crate::error::ProcessorError;
use crate::utils::{display_name, has_valid_extension, DEFAULT_EXTENSIONS};

/// Batch-level settings that do not affect a single image's pixels.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Lowercase, dotless extensions to pick up from the input directory.
    pub extensions: Vec<String>,
    /// Worker count. `1` processes files strictly in order on this thread.
    pub jobs: usize,
    /// Run the pipeline but never touch the output directory.
    pub dry_run: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            jobs: 1,
            dry_run: false,
        }
    }
}

/// Result of running the pipeline on one file, before anything is written.
#[derive(Debug)]
pub enum FileOutcome {
    Success(ProcessedImage),
    Failure(ProcessorError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Saved {
        output_path: PathBuf,
        width: u32,
        height: u32,
        face_detected: bool,
    },
    Failed {
        error: String,
    },
}

/// What happened to one input file. Holds no pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub input_path: PathBuf,
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Saved { .. })
    }
}

/// Progress notification handed to a batch observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatchEvent<'a> {
    /// Discovery finished; sent once, before the output directory is touched.
    Started { total_files: usize },
    /// One file finished, successfully or not.
    FileDone(&'a FileReport),
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Number of eligible files found in the input directory.
    pub discovered: usize,
    /// One entry per discovered file, in processing (sorted path) order.
    pub files: Vec<FileReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.successful()
    }

    pub fn faces_detected(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Saved { face_detected: true, .. }))
            .count()
    }
}

/// Drives the pipeline over every eligible file of a directory.
///
/// A failure on one file is recorded in its [`FileReport`] and never stops
/// the rest of the batch. Only missing/unreadable directories are fatal.
pub struct BatchRunner {
    engine: ProcessingEngine,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(engine: ProcessingEngine, config: BatchConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// List eligible files directly inside `input_dir`, sorted by path.
    pub fn discover_images(&self, input_dir: &Path) -> Result<Vec<PathBuf>, ProcessorError> {
        if !input_dir.is_dir() {
            return Err(ProcessorError::NotFound(input_dir.to_path_buf()));
        }

        let mut image_files = Vec::new();

        let walker = WalkDir::new(input_dir)
            .follow_links(false)
            .min_depth(1)
            .max_depth(1);

        for entry in walker {
            let entry = entry.map_err(|e| ProcessorError::Io {
                path: input_dir.to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();

            if path.is_file() && has_valid_extension(path, &self.config.extensions) {
                image_files.push(path.to_path_buf());
            }
        }

        // Sort for consistent processing order
        image_files.sort();

        Ok(image_files)
    }

    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport, ProcessorError> {
        self.run_with_observer(input_dir, output_dir, |_| {})
    }

    /// Discover, process and write a whole directory, calling `observer` once
    /// with the file count and then with each file's report as soon as it is
    /// known.
    pub fn run_with_observer<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        observer: F,
    ) -> Result<BatchReport, ProcessorError>
    where
        F: Fn(BatchEvent<'_>) + Sync,
    {
        let start_time = Instant::now();

        let image_files = self.discover_images(input_dir)?;
        tracing::info!(
            count = image_files.len(),
            input = %input_dir.display(),
            "Found {} files to process",
            image_files.len()
        );
        observer(BatchEvent::Started {
            total_files: image_files.len(),
        });

        self.prepare_output_dir(output_dir)?;
        let files = self.process_files(&image_files, output_dir, &|report: &FileReport| {
            observer(BatchEvent::FileDone(report))
        })?;

        Ok(BatchReport {
            discovered: image_files.len(),
            files,
            elapsed: start_time.elapsed(),
        })
    }

    /// Create `output_dir` if it does not exist yet (skipped in dry-run mode).
    pub fn prepare_output_dir(&self, output_dir: &Path) -> Result<(), ProcessorError> {
        if self.config.dry_run {
            tracing::debug!("Dry run mode: skipping output directory creation");
            return Ok(());
        }

        std::fs::create_dir_all(output_dir).map_err(|source| ProcessorError::Io {
            path: output_dir.to_path_buf(),
            source,
        })
    }

    /// Process `files` in the given order and write every success.
    pub fn process_files<F>(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        observer: &F,
    ) -> Result<Vec<FileReport>, ProcessorError>
    where
        F: Fn(&FileReport) + Sync,
    {
        if self.config.jobs <= 1 {
            let mut reports = Vec::with_capacity(files.len());
            for (index, path) in files.iter().enumerate() {
                if index > 0 {
                    // Let other work in the host process run between files
                    std::thread::yield_now();
                }
                let report = self.process_one(path, output_dir);
                observer(&report);
                reports.push(report);
            }
            return Ok(reports);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| ProcessorError::Configuration(format!("failed to start worker pool: {}", e)))?;

        Ok(pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    let report = self.process_one(path, output_dir);
                    observer(&report);
                    report
                })
                .collect()
        }))
    }

    fn process_one(&self, input_path: &Path, output_dir: &Path) -> FileReport {
        let outcome = self.run_pipeline(input_path);
        // The source and processed buffers are dropped inside persist
        self.persist(input_path, outcome, output_dir)
    }

    /// Pipeline stage of the fold: never writes, never panics on bad input.
    pub fn run_pipeline(&self, input_path: &Path) -> FileOutcome {
        tracing::debug!(file = %display_name(input_path), "Processing");

        match self.engine.process_file(input_path) {
            Ok(processed) => FileOutcome::Success(processed),
            Err(e) => FileOutcome::Failure(ProcessorError::PerFile {
                path: input_path.to_path_buf(),
                reason: format!("{:#}", e),
            }),
        }
    }

    /// Write stage of the fold: only successful outcomes reach the disk.
    fn persist(&self, input_path: &Path, outcome: FileOutcome, output_dir: &Path) -> FileReport {
        let result = match outcome {
            FileOutcome::Success(processed) => self.write_output(&processed, output_dir),
            FileOutcome::Failure(error) => Err(error),
        };

        let status = match result {
            Ok(status) => {
                if let FileStatus::Saved { output_path, .. } = &status {
                    tracing::info!(
                        file = %display_name(input_path),
                        output = %output_path.display(),
                        "Saved"
                    );
                }
                status
            }
            Err(error) => {
                tracing::warn!(file = %display_name(input_path), error = %error, "Skipping file");
                FileStatus::Failed {
                    error: error.to_string(),
                }
            }
        };

        FileReport {
            input_path: input_path.to_path_buf(),
            status,
        }
    }

    fn write_output(
        &self,
        processed: &ProcessedImage,
        output_dir: &Path,
    ) -> Result<FileStatus, ProcessorError> {
        let output_path = if self.config.dry_run {
            output_dir.join(&processed.file_name)
        } else {
            processed
                .save(output_dir)
                .map_err(|e| ProcessorError::PerFile {
                    path: output_dir.join(&processed.file_name),
                    reason: format!("{:#}", e),
                })?
        };

        Ok(FileStatus::Saved {
            output_path,
            width: processed.image.width(),
            height: processed.image.height(),
            face_detected: processed.face.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::face_detection::{FaceBox, FaceDetector};
    use crate::image_processing::ProcessingOptions;
    use image::{GrayImage, Rgb, RgbImage};

    struct NoFaces;

    impl FaceDetector for NoFaces {
        fn detect(&self, _image: &GrayImage) -> Vec<FaceBox> {
            Vec::new()
        }
    }

    fn runner(config: BatchConfig) -> BatchRunner {
        let options = ProcessingOptions::new(64, 64, 300, "model.bin").unwrap();
        BatchRunner::new(
            ProcessingEngine::with_detector(options, Box::new(NoFaces)),
            config,
        )
    }

    fn write_png(path: &Path) {
        RgbImage::from_pixel(20, 10, Rgb([10, 20, 30])).save(path).unwrap();
    }

    #[test]
    fn test_discover_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.png", "a.JPG", "b.txt", "B.bmp", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("deep.jpg"), b"x").unwrap();

        let files = runner(BatchConfig::default()).discover_images(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();

        assert_eq!(names, vec!["B.bmp", "a.JPG", "c.png"]);
    }

    #[test]
    fn test_discover_images_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = runner(BatchConfig::default()).discover_images(&missing).unwrap_err();
        assert!(matches!(err, ProcessorError::NotFound(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_run_pipeline_failure_is_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"garbage").unwrap();

        match runner(BatchConfig::default()).run_pipeline(&bad) {
            FileOutcome::Failure(err) => assert!(!err.is_fatal()),
            FileOutcome::Success(_) => panic!("corrupt file must not decode"),
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = input.path().join("out");
        write_png(&input.path().join("a.png"));

        let config = BatchConfig {
            dry_run: true,
            ..BatchConfig::default()
        };
        let report = runner(config).run(input.path(), &output).unwrap();

        assert_eq!(report.successful(), 1);
        assert!(!output.exists());
        assert_eq!(
            report.files[0].status,
            FileStatus::Saved {
                output_path: output.join("a.png"),
                width: 64,
                height: 32,
                face_detected: false,
            }
        );
    }

    #[test]
    fn test_observer_sees_every_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_png(&input.path().join("a.png"));
        std::fs::write(input.path().join("b.png"), b"broken").unwrap();
        write_png(&input.path().join("c.png"));

        let started = std::sync::Mutex::new(Vec::new());
        let seen = std::sync::Mutex::new(Vec::new());
        let report = runner(BatchConfig::default())
            .run_with_observer(input.path(), output.path(), |event| match event {
                BatchEvent::Started { total_files } => started.lock().unwrap().push(total_files),
                BatchEvent::FileDone(r) => seen.lock().unwrap().push(r.clone()),
            })
            .unwrap();

        assert_eq!(started.into_inner().unwrap(), vec![3]);
        assert_eq!(seen.into_inner().unwrap(), report.files);
        assert_eq!(report.discovered, 3);
        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.faces_detected(), 0);
    }
}
