//! Batch Ranker: scores a batch of résumés against one job posting.
//!
//! Per résumé: persist to a transient file, extract, release the file, score,
//! filter by threshold, then tag contact info and skills. Résumés run on a
//! bounded set of tasks; the final stable sort alone decides output order.
//!
//! Per-document failures (unsupported type, corrupt file, unwritable
//! transient file, embedding rejected) drop that résumé silently. Failing to
//! create the request directory aborts the whole batch.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};

use crate::errors::AppError;
use crate::extraction::extract_from_path;
use crate::models::scoring::{ScoredCandidate, ScoringRequest, ScoringResponse, UploadedFile};
use crate::scoring::contact::extract_contact;
use crate::scoring::similarity::{round2, SimilarityScorer};
use crate::scoring::skills::SkillTaxonomy;

#[derive(Debug, Clone)]
pub struct RankerOptions {
    /// Parent directory for request-scoped transient directories.
    pub work_dir: PathBuf,
    pub max_concurrent_documents: usize,
    pub require_job_posting_text: bool,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            max_concurrent_documents: 4,
            require_job_posting_text: false,
        }
    }
}

/// What happened to a single résumé.
#[derive(Debug)]
enum DocumentOutcome {
    Scored(ScoredCandidate),
    BelowThreshold,
    Skipped,
}

#[derive(Clone)]
pub struct BatchRanker {
    scorer: SimilarityScorer,
    taxonomy: Arc<SkillTaxonomy>,
    options: RankerOptions,
}

impl BatchRanker {
    pub fn new(scorer: SimilarityScorer, taxonomy: Arc<SkillTaxonomy>, options: RankerOptions) -> Self {
        Self {
            scorer,
            taxonomy,
            options,
        }
    }

    pub fn model_name(&self) -> &str {
        self.scorer.model_name()
    }

    pub async fn rank(&self, request: ScoringRequest) -> Result<ScoringResponse, AppError> {
        let ScoringRequest {
            job_posting,
            resumes,
            threshold,
        } = request;

        tokio::fs::create_dir_all(&self.options.work_dir)
            .await
            .map_err(|e| infrastructure("cannot create work directory", e))?;
        let workspace = tempfile::Builder::new()
            .prefix("cvscore-")
            .tempdir_in(&self.options.work_dir)
            .map_err(|e| infrastructure("cannot create request directory", e))?;
        let workspace_path: Arc<Path> = Arc::from(workspace.path());

        let posting_text = match persist_and_extract(workspace_path.clone(), "posting", job_posting).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => self.missing_posting_text("no text")?,
            Err(reason) => self.missing_posting_text(&reason)?,
        };
        let posting_vector: Option<Arc<[f32]>> = self
            .scorer
            .embed_text(&posting_text)
            .await
            .map_err(|e| AppError::Infrastructure(format!("failed to embed job posting: {e}")))?
            .map(Arc::from);

        let total = resumes.len();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_documents.max(1)));
        let mut tasks = JoinSet::new();

        for (index, resume) in resumes.into_iter().enumerate() {
            let ranker = self.clone();
            let workspace_path = workspace_path.clone();
            let posting_vector = posting_vector.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| AppError::Internal(e.into()))?;
                    let outcome = ranker
                        .score_resume(index, workspace_path, posting_vector.as_deref(), resume, threshold)
                        .await?;
                    Ok::<_, AppError>((index, outcome))
                }
                .in_current_span(),
            );
        }

        let mut outcomes: Vec<(usize, DocumentOutcome)> = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(entry)) => outcomes.push(entry),
                // Dropping `tasks` aborts whatever is still running.
                Ok(Err(e)) => return Err(e),
                Err(e) => warn!("Résumé task failed, skipping: {e}"),
            }
        }
        drop(workspace);

        outcomes.sort_by_key(|(index, _)| *index);
        let results = rank_outcomes(outcomes);

        info!(
            submitted = total,
            returned = results.len(),
            "Batch scored"
        );
        Ok(ScoringResponse::new(results))
    }

    fn missing_posting_text(&self, reason: &str) -> Result<String, AppError> {
        if self.options.require_job_posting_text {
            return Err(AppError::UnprocessableEntity(format!(
                "Job posting has no extractable text ({reason})"
            )));
        }
        warn!("Job posting has no extractable text ({reason}); every résumé will score 0.0");
        Ok(String::new())
    }

    async fn score_resume(
        &self,
        index: usize,
        workspace: Arc<Path>,
        posting: Option<&[f32]>,
        resume: UploadedFile,
        threshold: i64,
    ) -> Result<DocumentOutcome, AppError> {
        let file_name = resume.file_name.clone();

        let text = match persist_and_extract(workspace, &index.to_string(), resume).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => return Ok(skipped(&file_name, "no text")),
            Err(reason) => return Ok(skipped(&file_name, &reason)),
        };

        let score = match self.scorer.score_against(posting, &text).await {
            Ok(score) => round2(score),
            Err(e) => return Ok(skipped(&file_name, &format!("embedding failed: {e}"))),
        };

        if score < threshold as f64 {
            debug!(file = %file_name, score, threshold, "Below threshold");
            return Ok(DocumentOutcome::BelowThreshold);
        }

        let taxonomy = self.taxonomy.clone();
        let (contact, skills) = match tokio::task::spawn_blocking(move || {
            (extract_contact(&text), taxonomy.score(&text))
        })
        .await
        {
            Ok(tagged) => tagged,
            Err(e) => return Ok(skipped(&file_name, &format!("tagging failed: {e}"))),
        };

        Ok(DocumentOutcome::Scored(ScoredCandidate {
            file_name,
            name: contact.name,
            email: contact.email,
            score,
            skills,
        }))
    }
}

/// Keeps scored candidates (already in input order) and stable-sorts them by score, descending.
fn rank_outcomes(outcomes: Vec<(usize, DocumentOutcome)>) -> Vec<ScoredCandidate> {
    let mut results: Vec<ScoredCandidate> = outcomes
        .into_iter()
        .filter_map(|(_, outcome)| match outcome {
            DocumentOutcome::Scored(candidate) => Some(candidate),
            DocumentOutcome::BelowThreshold | DocumentOutcome::Skipped => None,
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

fn skipped(file_name: &str, reason: &str) -> DocumentOutcome {
    debug!(file = %file_name, reason, "Résumé skipped");
    DocumentOutcome::Skipped
}

fn infrastructure(context: &str, e: std::io::Error) -> AppError {
    AppError::Infrastructure(format!("{context}: {e}"))
}

/// Longest file-name tail kept for a transient file; well under the usual
/// 255-byte component limit once the random part is added.
const MAX_TRANSIENT_NAME_BYTES: usize = 96;

/// Writes `file` to a uniquely named transient file inside `workspace`,
/// extracts it, and removes the file again whatever the outcome.
///
/// Any failure here only concerns this document; the request directory
/// itself was created up front.
async fn persist_and_extract(
    workspace: Arc<Path>,
    key: &str,
    file: UploadedFile,
) -> Result<String, String> {
    let prefix = format!("{key}-");
    let suffix = format!("-{}", transient_file_name(&file.file_name));

    let joined = tokio::task::spawn_blocking(move || -> Result<String, String> {
        let mut transient = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(&workspace)
            .map_err(|e| format!("cannot create transient file: {e}"))?;
        transient
            .write_all(&file.bytes)
            .and_then(|_| transient.flush())
            .map_err(|e| format!("cannot write transient file: {e}"))?;

        let extracted = extract_from_path(transient.path()).map_err(|e| e.to_string());
        if let Err(e) = transient.close() {
            warn!("Failed to remove transient file: {e}");
        }
        extracted
    })
    .await;

    joined.unwrap_or_else(|e| Err(format!("extraction worker failed: {e}")))
}

/// Final path component of a client-supplied file name, so uploads cannot
/// escape the request directory. Long names are cut down to
/// `MAX_TRANSIENT_NAME_BYTES`; the extension survives.
fn transient_file_name(original: &str) -> String {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("upload");
    if name.len() <= MAX_TRANSIENT_NAME_BYTES {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if name.len() - dot <= 16 => name.split_at(dot),
        _ => (name, ""),
    };
    let mut end = MAX_TRANSIENT_NAME_BYTES - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], extension)
}
