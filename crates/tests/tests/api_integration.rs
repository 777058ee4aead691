use std::io::{Cursor, Read};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pagesplit_api::{build_app, ApiConfig};
use pagesplit_document::fixtures::{page_label, page_labels, sample_pdf};
use serde_json::Value;
use tower::ServiceExt;
use zip::ZipArchive;

const BOUNDARY: &str = "pagesplit-test-boundary";

fn app() -> Router {
    build_app(ApiConfig::default())
}

fn multipart_body(file: Option<(&str, &[u8])>, pages_per_split: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(value) = pages_per_split {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pages_per_split\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_LENGTH, body.len())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn root_reports_status() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
}

#[tokio::test]
async fn root_answers_head() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_includes_metrics() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = json_body(response).await;
    assert_eq!(parsed["metrics"]["requests_total"], 0);
}

#[tokio::test]
async fn validate_reports_uneven_split() {
    let pdf = sample_pdf(10);
    let request = upload_request(
        "/api/validate-split",
        multipart_body(Some(("report.pdf", pdf.as_slice())), Some("3")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["isValid"], true);
    assert_eq!(parsed["needsConfirmation"], true);
    assert_eq!(parsed["totalPages"], 10);
    assert_eq!(
        parsed["message"],
        "PDF will be split into 4 parts of 3 pages each. Last part will have 1 pages instead of 3 pages"
    );
}

#[tokio::test]
async fn validate_reports_infeasible_split_without_error_status() {
    let pdf = sample_pdf(2);
    let request = upload_request(
        "/api/validate-split",
        multipart_body(Some(("short.pdf", pdf.as_slice())), Some("5")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["isValid"], false);
    assert_eq!(parsed["needsConfirmation"], false);
    assert_eq!(parsed["totalPages"], 2);
}

#[tokio::test]
async fn validate_handles_empty_document() {
    let pdf = sample_pdf(0);
    let request = upload_request(
        "/api/validate-split",
        multipart_body(Some(("blank.pdf", pdf.as_slice())), Some("1")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["isValid"], false);
    assert_eq!(parsed["totalPages"], 0);
}

#[tokio::test]
async fn validate_rejects_non_pdf_upload() {
    let request = upload_request(
        "/api/validate-split",
        multipart_body(Some(("notes.pdf", &b"plain text, not a pdf"[..])), Some("2")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let parsed = json_body(response).await;
    assert_eq!(parsed["error"], "unparseable_document");
}

#[tokio::test]
async fn validate_requires_positive_chunk_size() {
    let pdf = sample_pdf(4);
    for value in ["0", "-1", "abc"] {
        let request = upload_request(
            "/api/validate-split",
            multipart_body(Some(("doc.pdf", pdf.as_slice())), Some(value)),
        );
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "value {value}");
    }
}

#[tokio::test]
async fn validate_requires_both_fields() {
    let pdf = sample_pdf(4);

    let response = app()
        .oneshot(upload_request(
            "/api/validate-split",
            multipart_body(None, Some("2")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "missing_file");

    let response = app()
        .oneshot(upload_request(
            "/api/validate-split",
            multipart_body(Some(("doc.pdf", pdf.as_slice())), None),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "missing_pages_per_split");
}

#[tokio::test]
async fn split_returns_zip_of_parts() {
    let pdf = sample_pdf(10);
    let request = upload_request(
        "/api/split-pdf",
        multipart_body(Some(("My Report (final).pdf", pdf.as_slice())), Some("3")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"My_Report_final_split.zip\""
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut archive = ZipArchive::new(Cursor::new(body.to_vec())).unwrap();

    let mut names = Vec::new();
    let mut labels = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).unwrap();
        names.push(entry.name().to_string());
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        labels.push(page_labels(&bytes));
    }

    assert_eq!(
        names,
        vec![
            "My_Report_final_part_1.pdf",
            "My_Report_final_part_2.pdf",
            "My_Report_final_part_3.pdf",
            "My_Report_final_part_4.pdf",
        ]
    );
    assert_eq!(
        labels.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![3, 3, 3, 1]
    );
    assert_eq!(
        labels.concat(),
        (1..=10).map(page_label).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn split_rejects_infeasible_plan() {
    let pdf = sample_pdf(2);
    let request = upload_request(
        "/api/split-pdf",
        multipart_body(Some(("short.pdf", pdf.as_slice())), Some("5")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parsed = json_body(response).await;
    assert_eq!(parsed["error"], "invalid_split");
    assert_eq!(
        parsed["message"],
        "PDF has 2 pages but requested 5 pages per split"
    );
}

#[tokio::test]
async fn split_accepts_camel_case_field() {
    let pdf = sample_pdf(4);
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pagesPerSplit\"\r\n\r\n2\r\n"
    )
    .into_bytes()
    .into_iter()
    .chain(multipart_body(Some(("doc.pdf", pdf.as_slice())), None))
    .collect::<Vec<_>>();

    let response = app()
        .oneshot(upload_request("/api/split-pdf", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn split_falls_back_to_default_name() {
    let pdf = sample_pdf(2);
    let request = upload_request(
        "/api/split-pdf",
        multipart_body(Some(("(((.pdf", pdf.as_slice())), Some("1")),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"document_split.zip\""
    );
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let config = ApiConfig {
        max_upload_bytes: 1024,
        ..ApiConfig::default()
    };
    let pdf = vec![b'x'; 4096];
    let request = upload_request(
        "/api/split-pdf",
        multipart_body(Some(("big.pdf", pdf.as_slice())), Some("1")),
    );

    let response = build_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn api_routes_are_rate_limited_per_client() {
    let config = ApiConfig {
        rate_limit_max: 1,
        ..ApiConfig::default()
    };
    let app = build_app(config);
    let pdf = sample_pdf(2);

    let first = app
        .clone()
        .oneshot(upload_request(
            "/api/validate-split",
            multipart_body(Some(("doc.pdf", pdf.as_slice())), Some("1")),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(upload_request(
            "/api/validate-split",
            multipart_body(Some(("doc.pdf", pdf.as_slice())), Some("1")),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));

    let root = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(root.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
