use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::encode::{ActivityMetadata, EncodeError, encode_gpx, encode_tcx};
use crate::track::{
    Activity, MetricIndex, MetricKind, TrackError, synthesize_performance_track,
    synthesize_position_track,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Gpx,
    Tcx,
}

impl DocumentFormat {
    /// GPX when the activity carries both position streams, TCX otherwise.
    /// Metric types the activity declares count as carried even when the
    /// stream itself is absent.
    pub fn select(activity: &Activity) -> Self {
        let index = MetricIndex::new(&activity.metrics);
        let carries = |kind: MetricKind| {
            index.contains(&kind)
                || activity
                    .metric_types
                    .iter()
                    .any(|declared| MetricKind::from(declared.as_str()) == kind)
        };
        if carries(MetricKind::Latitude) && carries(MetricKind::Longitude) {
            DocumentFormat::Gpx
        } else {
            DocumentFormat::Tcx
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Gpx => "gpx",
            DocumentFormat::Tcx => "tcx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Gpx => "application/gpx+xml",
            DocumentFormat::Tcx => "application/vnd.garmin.tcx+xml",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A fully encoded document ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub activity_id: String,
    pub format: DocumentFormat,
    pub point_count: usize,
    pub bytes: Vec<u8>,
}

impl RenderedDocument {
    /// `activity_<id>.<ext>`, with anything outside `[A-Za-z0-9_-]` in the id
    /// replaced so the name cannot escape the target directory.
    pub fn file_name(&self) -> String {
        let id: String = self
            .activity_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("activity_{id}.{}", self.format.extension())
    }
}

#[derive(Debug)]
pub enum ExportError {
    Track(TrackError),
    Encode(EncodeError),
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Track(err) => write!(f, "{err}"),
            ExportError::Encode(err) => write!(f, "{err}"),
            ExportError::Io { path, source } => {
                write!(f, "Failed to write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Track(err) => Some(err),
            ExportError::Encode(err) => Some(err),
            ExportError::Io { source, .. } => Some(source),
        }
    }
}

impl From<TrackError> for ExportError {
    fn from(err: TrackError) -> Self {
        ExportError::Track(err)
    }
}

impl From<EncodeError> for ExportError {
    fn from(err: EncodeError) -> Self {
        ExportError::Encode(err)
    }
}

/// Synthesize and encode one activity. `format` overrides
/// [`DocumentFormat::select`].
pub fn convert_activity(
    activity: &Activity,
    format: Option<DocumentFormat>,
    config: &ServiceConfig,
) -> Result<RenderedDocument, ExportError> {
    let format = format.unwrap_or_else(|| DocumentFormat::select(activity));
    let metadata = ActivityMetadata::from_activity(activity, config.application.clone())?;

    let (point_count, bytes) = match format {
        DocumentFormat::Gpx => {
            let track = synthesize_position_track(activity)?;
            (track.points.len(), encode_gpx(&track, &metadata)?)
        }
        DocumentFormat::Tcx => {
            let track = synthesize_performance_track(activity, &config.synthesis)?;
            (track.lap.points.len(), encode_tcx(&track, &metadata)?)
        }
    };

    Ok(RenderedDocument {
        activity_id: activity.id.clone(),
        format,
        point_count,
        bytes,
    })
}

/// Durable storage for rendered documents.
pub trait DocumentSink {
    /// Store the document and report where it ended up.
    fn persist(&self, document: &RenderedDocument) -> Result<PathBuf, ExportError>;
}

/// Writes documents into one directory, creating it on first use.
///
/// Each document is written to a uniquely named temporary file first and
/// renamed into place, so readers never observe a partial document.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DocumentSink for FileSink {
    fn persist(&self, document: &RenderedDocument) -> Result<PathBuf, ExportError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| ExportError::Io { path, source }
        };

        fs::create_dir_all(&self.directory).map_err(io_error(&self.directory))?;

        let file_name = document.file_name();
        let target = self.directory.join(&file_name);
        let staging = self
            .directory
            .join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        fs::write(&staging, &document.bytes).map_err(io_error(&staging))?;
        if let Err(source) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(ExportError::Io {
                path: target,
                source,
            });
        }

        Ok(target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedActivity {
    pub activity_id: String,
    pub format: DocumentFormat,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedActivity {
    pub activity_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub exported: Vec<ExportedActivity>,
    pub skipped: Vec<SkippedActivity>,
}

/// Convert and persist every accepted activity. A failing activity is logged
/// and recorded as skipped; it never stops the rest of the batch.
pub fn export_batch(
    activities: &[Activity],
    config: &ServiceConfig,
    sink: &dyn DocumentSink,
) -> ExportReport {
    let mut report = ExportReport::default();

    for activity in activities {
        if !config.accepts_activity_type(&activity.activity_type) {
            tracing::info!(
                activity_id = %activity.id,
                activity_type = %activity.activity_type,
                "Activity skipped because of its type"
            );
            report.skipped.push(SkippedActivity {
                activity_id: activity.id.clone(),
                reason: format!("activity type `{}` is not exported", activity.activity_type),
            });
            continue;
        }

        let outcome = convert_activity(activity, None, config).and_then(|document| {
            sink.persist(&document)
                .map(|path| (document.format, document.point_count, path))
        });

        match outcome {
            Ok((format, point_count, path)) => {
                tracing::info!(
                    activity_id = %activity.id,
                    %format,
                    point_count,
                    path = %path.display(),
                    "Activity exported"
                );
                report.exported.push(ExportedActivity {
                    activity_id: activity.id.clone(),
                    format,
                    path,
                });
            }
            Err(err) => {
                tracing::warn!(activity_id = %activity.id, error = %err, "Activity export failed");
                report.skipped.push(SkippedActivity {
                    activity_id: activity.id.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}
