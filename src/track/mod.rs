pub mod clock;
pub mod index;
pub mod performance;
pub mod position;
pub mod types;

pub use index::{MetricIndex, find_metric, find_summary};
pub use performance::{KMH_TO_MPS, synthesize_performance_track};
pub use position::synthesize_position_track;
pub use types::{
    Activity, Lap, MetricKind, MetricSample, MetricSource, MetricStream, PerformancePoint,
    PerformanceTrack, PositionPoint, PositionTrack, SummaryStat, SynthesisOptions, TrackError,
};
