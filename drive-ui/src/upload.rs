//! Sequential batch upload.
//!
//! Files go out one at a time: file *i + 1* is not sent until file *i* has
//! settled, whether it succeeded or failed. Progress is reported as
//! [`UploadEvent`]s over an mpsc channel so the caller can drive a progress
//! bar without polling.

use crate::api::{ClientError, DriveApi, UploadFile};
use service_core::models::{UploadLimits, UploadedFile};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Too many files: {count} selected, at most {max} per upload")]
    TooManyFiles { count: usize, max: usize },

    #[error("{name} is larger than the {max_mb} MB limit")]
    TooLarge { name: String, max_mb: u64 },

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started {
        index: usize,
        total: usize,
        name: String,
    },
    Completed {
        index: usize,
        file: UploadedFile,
    },
    Failed {
        index: usize,
        name: String,
        error: String,
    },
    /// Bytes of settled files over bytes in the batch.
    Progress {
        settled_bytes: u64,
        total_bytes: u64,
    },
    Finished {
        succeeded: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub name: String,
    pub result: Result<UploadedFile, UploadError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn uploaded(&self) -> impl Iterator<Item = &UploadedFile> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

pub struct UploadQueue {
    limits: UploadLimits,
    events: Option<mpsc::UnboundedSender<UploadEvent>>,
}

impl UploadQueue {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            limits,
            events: None,
        }
    }

    /// Returns the receiving end for progress events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }

    /// Rejects the whole batch when it has more files than allowed.
    pub fn precheck(&self, files: &[UploadFile]) -> Result<(), UploadError> {
        if files.len() > self.limits.max_files {
            return Err(UploadError::TooManyFiles {
                count: files.len(),
                max: self.limits.max_files,
            });
        }
        Ok(())
    }

    fn check_size(&self, file: &UploadFile) -> Result<(), UploadError> {
        if file.size() > self.limits.max_file_size {
            return Err(UploadError::TooLarge {
                name: file.name.clone(),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Uploads `files` into `parent_id` one after another. Oversized files
    /// fail locally without a request; the rest of the batch continues.
    pub async fn run<A: DriveApi + ?Sized>(
        &self,
        api: &A,
        files: Vec<UploadFile>,
        parent_id: Option<&str>,
    ) -> Result<UploadReport, UploadError> {
        self.precheck(&files)?;

        let total = files.len();
        let total_bytes: u64 = files.iter().map(UploadFile::size).sum();
        let mut settled_bytes = 0;
        let mut report = UploadReport::default();

        for (index, file) in files.into_iter().enumerate() {
            let name = file.name.clone();
            let size = file.size();
            self.emit(UploadEvent::Started {
                index,
                total,
                name: name.clone(),
            });

            let result = match self.check_size(&file) {
                Ok(()) => api.upload(file, parent_id).await.map_err(UploadError::from),
                Err(e) => Err(e),
            };

            match &result {
                Ok(uploaded) => {
                    tracing::info!(name = %name, id = %uploaded.id, "File uploaded");
                    self.emit(UploadEvent::Completed {
                        index,
                        file: uploaded.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "File upload failed");
                    self.emit(UploadEvent::Failed {
                        index,
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            settled_bytes += size;
            self.emit(UploadEvent::Progress {
                settled_bytes,
                total_bytes,
            });
            report.outcomes.push(UploadOutcome { name, result });
        }

        self.emit(UploadEvent::Finished {
            succeeded: report.succeeded(),
            failed: report.failed(),
        });
        Ok(report)
    }
}
