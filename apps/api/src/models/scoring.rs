use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::scoring::skills::SkillScores;

/// One uploaded document: original file name (its extension picks the
/// extraction strategy) plus raw content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Input unit of the pipeline; consumed exactly once.
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub job_posting: UploadedFile,
    pub resumes: Vec<UploadedFile>,
    pub threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub file_name: String,
    pub name: String,
    pub email: String,
    /// 0 – 100, two decimals
    pub score: f64,
    pub skills: SkillScores,
}

/// Invariant: `count == results.len()`, results sorted by score descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResponse {
    pub results: Vec<ScoredCandidate>,
    pub count: usize,
}

impl ScoringResponse {
    pub fn new(results: Vec<ScoredCandidate>) -> Self {
        let count = results.len();
        Self { results, count }
    }
}

/// Result row in the shape the legacy desktop client reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCandidate {
    #[serde(rename = "cv_adi")]
    pub file_name: String,
    #[serde(rename = "isim")]
    pub name: String,
    pub email: String,
    #[serde(rename = "puan")]
    pub score: f64,
    #[serde(rename = "yetenekler")]
    pub skills: SkillScores,
}

impl From<ScoredCandidate> for LegacyCandidate {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            file_name: candidate.file_name,
            name: candidate.name,
            email: candidate.email,
            score: candidate.score,
            skills: candidate.skills,
        }
    }
}

/// Body of `POST /puanla-toplu/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyScoringResponse {
    #[serde(rename = "sonuclar")]
    pub results: Vec<LegacyCandidate>,
    #[serde(rename = "basarili_cv_sayisi")]
    pub count: usize,
}

impl From<ScoringResponse> for LegacyScoringResponse {
    fn from(response: ScoringResponse) -> Self {
        Self {
            results: response.results.into_iter().map(LegacyCandidate::from).collect(),
            count: response.count,
        }
    }
}
