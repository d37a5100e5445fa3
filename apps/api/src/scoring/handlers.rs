//! Axum route handlers for the Scoring API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::scoring::{
    LegacyScoringResponse, ScoringRequest, ScoringResponse, UploadedFile,
};
use crate::scoring::skills::SkillTaxonomy;
use crate::state::AppState;

// Field names; the second of each pair is what the legacy desktop client sends.
const JOB_POSTING_FIELDS: [&str; 2] = ["job_posting", "is_ilani"];
const RESUME_FIELDS: [&str; 2] = ["resumes", "cv_listesi"];
const THRESHOLD_FIELDS: [&str; 2] = ["threshold", "esik_puani"];

/// POST /api/v1/score
///
/// Multipart form: one job posting file, one or more résumé files, optional
/// integer threshold. Résumés that cannot be read or score below the
/// threshold are simply absent from the result.
pub async fn handle_score_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScoringResponse>, AppError> {
    score_batch(&state, multipart).await.map(Json)
}

/// POST /puanla-toplu/
///
/// Same pipeline, answered with the key names the legacy desktop client reads.
pub async fn handle_score_batch_legacy(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<LegacyScoringResponse>, AppError> {
    let response = score_batch(&state, multipart).await?;
    Ok(Json(response.into()))
}

async fn score_batch(state: &AppState, multipart: Multipart) -> Result<ScoringResponse, AppError> {
    let ranker = state.ranker.clone().ok_or(AppError::ModelUnavailable)?;

    let request = read_scoring_request(multipart, state.config.default_threshold).await?;

    let span = info_span!(
        "score_batch",
        request_id = %Uuid::new_v4(),
        resumes = request.resumes.len(),
        threshold = request.threshold,
    );
    ranker.rank(request).instrument(span).await
}

/// GET /api/v1/taxonomy
///
/// The active skill taxonomy, so clients can label skill columns.
pub async fn handle_get_taxonomy(State(state): State<AppState>) -> Json<SkillTaxonomy> {
    Json(state.taxonomy.as_ref().clone())
}

async fn read_scoring_request(
    mut multipart: Multipart,
    default_threshold: i64,
) -> Result<ScoringRequest, AppError> {
    let mut job_posting: Option<UploadedFile> = None;
    let mut resumes = Vec::new();
    let mut threshold = default_threshold;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if JOB_POSTING_FIELDS.contains(&name.as_str()) {
            if job_posting.is_some() {
                return Err(AppError::Validation(
                    "Exactly one job posting file is allowed".to_string(),
                ));
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            job_posting = Some(UploadedFile::new(file_name, field.bytes().await?));
        } else if RESUME_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            resumes.push(UploadedFile::new(file_name, field.bytes().await?));
        } else if THRESHOLD_FIELDS.contains(&name.as_str()) {
            let raw = field.text().await?;
            threshold = parse_threshold(&raw, default_threshold)?;
        }
    }

    let job_posting = job_posting.ok_or_else(|| {
        AppError::Validation("A job posting file ('job_posting') is required".to_string())
    })?;
    if resumes.is_empty() {
        return Err(AppError::Validation(
            "At least one résumé file ('resumes') is required".to_string(),
        ));
    }

    Ok(ScoringRequest {
        job_posting,
        resumes,
        threshold,
    })
}

/// Blank means "not provided".
fn parse_threshold(raw: &str, default_threshold: i64) -> Result<i64, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default_threshold);
    }
    raw.parse::<i64>()
        .map_err(|_| AppError::Validation(format!("threshold must be an integer, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::routes::build_router;
    use crate::scoring::ranker::{BatchRanker, RankerOptions};
    use crate::scoring::similarity::SimilarityScorer;
    use crate::scoring::test_support::HashingEmbedder;

    const BOUNDARY: &str = "cvscore-test-boundary";

    enum Part<'a> {
        File {
            field: &'a str,
            file_name: &'a str,
            content: &'a [u8],
        },
        Text {
            field: &'a str,
            value: &'a str,
        },
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File {
                    field,
                    file_name,
                    content,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(content);
                }
                Part::Text { field, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn test_state(work_dir: &TempDir, model_loaded: bool) -> AppState {
        let config = Config {
            work_dir: work_dir.path().to_path_buf(),
            ..Config::default()
        };
        let taxonomy = Arc::new(SkillTaxonomy::builtin());
        let ranker = model_loaded.then(|| {
            BatchRanker::new(
                SimilarityScorer::new(Arc::new(HashingEmbedder)),
                taxonomy.clone(),
                RankerOptions {
                    work_dir: config.work_dir.clone(),
                    ..RankerOptions::default()
                },
            )
        });
        AppState {
            config,
            taxonomy,
            ranker,
        }
    }

    async fn post(app: Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_score_batch_end_to_end() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, true));

        let (status, body) = post(
            app,
            "/api/v1/score",
            &[
                Part::File {
                    field: "job_posting",
                    file_name: "posting.txt",
                    content: b"python, django, postgresql",
                },
                Part::File {
                    field: "resumes",
                    file_name: "a.txt",
                    content: b"Ece Kurt\nece@example.com\nExperienced Python developer using Django and PostgreSQL",
                },
                Part::File {
                    field: "resumes",
                    file_name: "b.bin",
                    content: b"\x00\x01",
                },
                Part::File {
                    field: "resumes",
                    file_name: "c.txt",
                    content: b"Python django postgresql",
                },
                Part::Text {
                    field: "threshold",
                    value: "0",
                },
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["fileName"], "c.txt");
        assert_eq!(results[0]["score"], 100.0);
        assert_eq!(results[1]["name"], "Ece Kurt");
        assert_eq!(results[1]["email"], "ece@example.com");
        assert!(results[1]["skills"]["Backend"].as_u64().unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_legacy_route_and_field_names() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, true));

        let (status, body) = post(
            app,
            "/puanla-toplu/",
            &[
                Part::File {
                    field: "is_ilani",
                    file_name: "ilan.txt",
                    content: b"flutter dart kotlin",
                },
                Part::File {
                    field: "cv_listesi",
                    file_name: "cv.txt",
                    content: b"flutter dart kotlin",
                },
                Part::Text {
                    field: "esik_puani",
                    value: "50",
                },
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["basarili_cv_sayisi"], 1);
        let row = &body["sonuclar"][0];
        assert_eq!(row["cv_adi"], "cv.txt");
        assert_eq!(row["puan"], 100.0);
        assert_eq!(row["isim"], "flutter dart kotlin");
        assert_eq!(row["email"], "Not found");
        assert_eq!(row["yetenekler"]["Mobil"], 3);
        assert!(body.get("results").is_none());
    }

    #[tokio::test]
    async fn test_default_threshold_is_70() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, true));

        let (status, body) = post(
            app,
            "/api/v1/score",
            &[
                Part::File {
                    field: "job_posting",
                    file_name: "posting.txt",
                    content: b"rust tokio axum",
                },
                Part::File {
                    field: "resumes",
                    file_name: "cv.txt",
                    content: b"pastry chef, sourdough",
                },
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_model_unavailable_returns_503() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, false));

        let (status, body) = post(
            app,
            "/api/v1/score",
            &[Part::File {
                field: "job_posting",
                file_name: "posting.txt",
                content: b"anything",
            }],
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_missing_resumes_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, true));

        let (status, body) = post(
            app,
            "/api/v1/score",
            &[Part::File {
                field: "job_posting",
                file_name: "posting.txt",
                content: b"anything",
            }],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_integer_threshold_rejected() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, true));

        let (status, _) = post(
            app,
            "/api/v1/score",
            &[
                Part::File {
                    field: "job_posting",
                    file_name: "posting.txt",
                    content: b"anything",
                },
                Part::File {
                    field: "resumes",
                    file_name: "cv.txt",
                    content: b"anything",
                },
                Part::Text {
                    field: "threshold",
                    value: "seventy",
                },
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_taxonomy_endpoint_lists_categories() {
        let dir = TempDir::new().unwrap();
        let app = build_router(test_state(&dir, false));

        let request = Request::builder()
            .uri("/api/v1/taxonomy")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let categories = body["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 6);
        assert_eq!(categories[5]["keywords"][0]["rule"], "word_boundary");
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold(" 55 ", 70).unwrap(), 55);
        assert_eq!(parse_threshold("", 70).unwrap(), 70);
        assert!(parse_threshold("7.5", 70).is_err());
    }
}
