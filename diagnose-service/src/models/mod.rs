pub mod diagnosis;

pub use diagnosis::{DiagnosisRequest, DiagnosisResponse};
