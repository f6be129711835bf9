// Station file ingestion
//
// One station file is one station's complete daily history. Each file flows
// through reader -> sanitizer -> aggregator -> IngestRepository as a single
// unit of work; the pipeline drives that per file across the file set.

pub mod aggregator;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod sanitizer;

pub use aggregator::aggregate_yearly;
pub use error::{FileFailure, IngestError};
pub use models::{RawReading, YearlyStat};
pub use pipeline::{FileOutcome, FileReport, IngestPipeline, PreparedFile, RunSummary, Stage};
pub use reader::{read_station_file, read_station_records, ParseError};
pub use sanitizer::{sanitize, SENTINEL_MISSING};
