pub mod batch;
pub mod classification;
pub mod config;
pub mod date;
pub mod extraction;
pub mod ids;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod segmentation;
pub mod sources;

pub use batch::{
    Attachment, BatchProgress, BatchReport, BatchRunner, BatchStatus, DocumentError,
    IncomingDocument, ScannedCandidate,
};
pub use classification::{classify, classify_with_score, ClassificationScore, DocumentCategory};
pub use config::{ConfigError, EngineConfig};
pub use extraction::extract_from_email;
pub use ids::candidate_unique_id;
pub use pipeline::{extract, extract_generic, extract_image, extract_resume};
pub use record::{
    CandidateRecord, DocumentHint, EmailContact, ExtractionResult, GenericDocumentRecord,
    ImageRecord, OcrLine, RawDocument,
};
pub use sources::{DocumentKind, OcrEngine, PlainTextExtractor, SourceError, TextExtractor};
