//! HTTP dashboard server: every enrollment view as a JSON endpoint.
//!
//! The dataset is loaded once and shared read-only between requests. Each
//! request recomputes its view from scratch, so handlers never lock.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};

use enrollscope_core::{
    AssociationQuery, AssociationReport, Attribute, Catalog, CramersVariant, Dataset,
    DEFAULT_POPULARITY_TOP_N, DEFAULT_TREEMAP_DIMENSIONS, EnrollmentCount, EnrollmentFilter,
    GradeBand, HeatmapFigure, PairAssociation, ProgramCount, TimelineCount, TreemapLeaf,
    YearRange, enrollment_counts, enrollment_timeline, parse_codes, parse_list, popularity,
    treemap,
};

/// Shared server state.
struct AppState {
    dataset: Arc<Dataset>,
}

/// Query parameters shared by every view. Each view reads the subset it
/// needs and ignores the rest.
#[derive(Debug, Default, Deserialize)]
struct ViewParams {
    start: Option<i32>,
    end: Option<i32>,
    /// Comma-separated program codes, e.g. `S,A`.
    codes: Option<String>,
    /// `hs`, `ms` or `all`.
    grades: Option<String>,
    top_n: Option<usize>,
    /// `plain` or `bias_corrected`.
    variant: Option<String>,
    /// Grouping attribute(s): treemap dimensions or the timeline facet.
    by: Option<String>,
    /// Colour attribute for the enrollment charts.
    color: Option<String>,
    /// Comma-separated base program names.
    programs: Option<String>,
}

impl ViewParams {
    fn years(&self, dataset: &Dataset) -> YearRange {
        let span = dataset.year_range().unwrap_or(YearRange::new(0, 0));
        YearRange::new(
            self.start.unwrap_or(span.start()),
            self.end.unwrap_or(span.end()),
        )
    }

    fn codes(&self, dataset: &Dataset) -> BTreeSet<String> {
        match &self.codes {
            Some(codes) => parse_codes(codes),
            None => dataset.codes(),
        }
    }

    fn grades(&self, default: GradeBand) -> GradeBand {
        self.grades.as_deref().map_or(default, GradeBand::parse)
    }

    fn variant(&self) -> Result<CramersVariant, String> {
        match &self.variant {
            None => Ok(CramersVariant::default()),
            Some(v) => CramersVariant::parse(v)
                .ok_or_else(|| format!("Unknown variant: {v}. Use plain or bias_corrected.")),
        }
    }

    fn attribute(value: Option<&str>, default: Attribute) -> Result<Attribute, String> {
        match value {
            None => Ok(default),
            Some(key) => Attribute::parse(key).ok_or_else(|| unknown_attribute(key)),
        }
    }

    /// Filter over explicit programs (all when absent), years and grades.
    fn program_filter(&self, dataset: &Dataset) -> EnrollmentFilter {
        let filter =
            EnrollmentFilter::new(self.years(dataset)).with_grades(self.grades(GradeBand::All));
        match &self.programs {
            Some(programs) => filter.with_programs(parse_list(programs)),
            None => filter,
        }
    }
}

fn unknown_attribute(key: &str) -> String {
    let keys: Vec<&str> = Attribute::ALL.iter().map(|a| a.key()).collect();
    format!("Unknown attribute: {key}. Use one of: {}", keys.join(", "))
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    log::debug!("rejecting request: {error}");
    Json(ErrorResponse {
        success: false,
        error,
    })
    .with_status(StatusCode::BAD_REQUEST)
}

/// `Query<ViewParams>` whose rejection is the JSON error body instead of
/// axum's plain-text one.
struct ViewQuery(ViewParams);

impl<S: Send + Sync> FromRequestParts<S> for ViewQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<ViewParams>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| ViewQuery(params))
            .map_err(|rejection| bad_request(rejection.body_text()))
    }
}

trait JsonWithStatus<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>);
}

impl<T> JsonWithStatus<T> for Json<T> {
    fn with_status(self, status: StatusCode) -> (StatusCode, Json<T>) {
        (status, self)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    enrollments: usize,
    students: usize,
}

#[derive(Serialize)]
struct HeatmapResponse {
    success: bool,
    query: AssociationQuery,
    filtered_enrollments: usize,
    universe_size: usize,
    top_programs: Vec<ProgramCount>,
    figure: HeatmapFigure,
    pairs: Vec<PairAssociation>,
}

impl From<AssociationReport> for HeatmapResponse {
    fn from(report: AssociationReport) -> Self {
        Self {
            success: true,
            figure: report.heatmap(),
            query: report.query,
            filtered_enrollments: report.filtered_enrollments,
            universe_size: report.universe_size,
            top_programs: report.top_programs.entries().to_vec(),
            pairs: report.pairs,
        }
    }
}

#[derive(Serialize)]
struct PopularityResponse {
    success: bool,
    programs: Vec<ProgramCount>,
    total: usize,
}

#[derive(Serialize)]
struct TreemapResponse {
    success: bool,
    dimensions: Vec<Attribute>,
    leaves: Vec<TreemapLeaf>,
}

#[derive(Serialize)]
struct EnrollmentResponse {
    success: bool,
    color: Attribute,
    counts: Vec<EnrollmentCount>,
}

#[derive(Serialize)]
struct TimelineResponse {
    success: bool,
    facet: Attribute,
    color: Attribute,
    counts: Vec<TimelineCount>,
}

async fn handle_heatmap(
    State(state): State<Arc<AppState>>,
    ViewQuery(params): ViewQuery,
) -> Result<Json<HeatmapResponse>, ApiError> {
    let dataset = &state.dataset;
    let variant = params.variant().map_err(bad_request)?;
    let mut query = AssociationQuery::new(
        params.years(dataset),
        params.codes(dataset),
        params.grades(GradeBand::Hs),
    )
    .with_variant(variant);
    if let Some(top_n) = params.top_n {
        query = query.with_top_n(top_n);
    }
    let report = enrollscope_core::association_matrix(dataset, &query);
    Ok(Json(report.into()))
}

async fn handle_popularity(
    State(state): State<Arc<AppState>>,
    ViewQuery(params): ViewQuery,
) -> Json<PopularityResponse> {
    let dataset = &state.dataset;
    let filter = EnrollmentFilter::new(params.years(dataset))
        .with_codes(params.codes(dataset))
        .with_grades(params.grades(GradeBand::All));
    let programs = popularity(
        dataset,
        &filter,
        params.top_n.unwrap_or(DEFAULT_POPULARITY_TOP_N),
    );
    let total = programs.len();
    Json(PopularityResponse {
        success: true,
        programs,
        total,
    })
}

async fn handle_treemap(
    State(state): State<Arc<AppState>>,
    ViewQuery(params): ViewQuery,
) -> Result<Json<TreemapResponse>, ApiError> {
    let dataset = &state.dataset;
    let dimensions = match params.by.as_deref() {
        None => DEFAULT_TREEMAP_DIMENSIONS.to_vec(),
        Some(by) => parse_list(by)
            .iter()
            .map(|key| Attribute::parse(key).ok_or_else(|| unknown_attribute(key)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(bad_request)?,
    };
    let leaves = treemap(
        dataset,
        params.years(dataset),
        &params.codes(dataset),
        &dimensions,
    );
    Ok(Json(TreemapResponse {
        success: true,
        dimensions,
        leaves,
    }))
}

async fn handle_enrollment(
    State(state): State<Arc<AppState>>,
    ViewQuery(params): ViewQuery,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let color =
        ViewParams::attribute(params.color.as_deref(), Attribute::Gender).map_err(bad_request)?;
    let counts = enrollment_counts(&state.dataset, &params.program_filter(&state.dataset), color);
    Ok(Json(EnrollmentResponse {
        success: true,
        color,
        counts,
    }))
}

async fn handle_timeline(
    State(state): State<Arc<AppState>>,
    ViewQuery(params): ViewQuery,
) -> Result<Json<TimelineResponse>, ApiError> {
    let facet =
        ViewParams::attribute(params.by.as_deref(), Attribute::ProgramName).map_err(bad_request)?;
    let color =
        ViewParams::attribute(params.color.as_deref(), Attribute::Gender).map_err(bad_request)?;
    let counts = enrollment_timeline(
        &state.dataset,
        &params.program_filter(&state.dataset),
        facet,
        color,
    );
    Ok(Json(TimelineResponse {
        success: true,
        facet,
        color,
        counts,
    }))
}

async fn handle_catalog(State(state): State<Arc<AppState>>) -> Json<Catalog> {
    Json(state.dataset.catalog())
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.dataset.is_empty() {
            "empty".to_string()
        } else {
            "healthy".to_string()
        },
        enrollments: state.dataset.len(),
        students: state.dataset.student_count(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let catalog = state.dataset.catalog();
    let first_year = catalog.years.first().copied().unwrap_or_default();
    let last_year = catalog.years.last().copied().unwrap_or_default();

    Json(serde_json::json!({
        "name": "Enrollscope Server",
        "version": enrollscope_core::VERSION,
        "enrollments": catalog.enrollments,
        "students": catalog.students,
        "endpoints": {
            "/": "This API index",
            "/health": "Health check",
            "/api/v1/catalog": "Program codes, academic years, program names and grade bands",
            "/api/v1/heatmap": {
                "method": "GET",
                "description": "Cramer's V association matrix between the most enrolled programs",
                "params": {
                    "start": format!("First academic year (default: {first_year})"),
                    "end": format!("Last academic year (default: {last_year})"),
                    "codes": "Comma-separated program codes (default: all)",
                    "grades": "hs (default), ms, all",
                    "top_n": "Programs in the matrix (default: 12)",
                    "variant": "plain (default), bias_corrected",
                }
            },
            "/api/v1/popularity": "Most enrolled programs (params: start, end, codes, grades, top_n)",
            "/api/v1/treemap": "Enrollment by attribute group (params: start, end, codes, by)",
            "/api/v1/enrollment": "Total enrollment per program (params: programs, start, end, grades, color)",
            "/api/v1/enrollment/timeline": "Enrollment per year (params: programs, start, end, grades, by, color)",
        },
        "examples": {
            "heatmap": format!("/api/v1/heatmap?start={first_year}&end={last_year}&codes=S,A&grades=hs"),
            "treemap": "/api/v1/treemap?by=gender,race",
            "timeline": "/api/v1/enrollment/timeline?programs=Crew,Chorus&color=fa",
        }
    }))
}

/// Build the axum router over a loaded dataset.
pub fn build_router(dataset: Arc<Dataset>) -> Router {
    let state = Arc::new(AppState { dataset });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/v1/catalog", get(handle_catalog))
        .route("/api/v1/heatmap", get(handle_heatmap))
        .route("/api/v1/popularity", get(handle_popularity))
        .route("/api/v1/treemap", get(handle_treemap))
        .route("/api/v1/enrollment", get(handle_enrollment))
        .route("/api/v1/enrollment/timeline", get(handle_timeline))
        .with_state(state)
}

/// Run the HTTP dashboard server until the listener fails.
pub async fn run_server(dataset: Arc<Dataset>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(dataset);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use enrollscope_core::EnrollmentRecord;
    use tower::ServiceExt;

    fn dataset() -> Arc<Dataset> {
        let mut records = Vec::new();
        for s in 0..30u32 {
            let id = format!("s{s}");
            let grade = 9 + (s % 4) as u8;
            let mut crew = EnrollmentRecord::new(&id, "Crew", "S", 2019, grade);
            crew.gender = Some(if s % 2 == 0 { "F" } else { "M" }.to_string());
            records.push(crew);
            if s % 2 == 0 {
                records.push(EnrollmentRecord::new(&id, "Chorus", "A", 2020, grade));
            }
            if s % 3 == 0 {
                records.push(EnrollmentRecord::new(&id, "Robotics", "O", 2021, grade));
            }
        }
        records.push(EnrollmentRecord::new("m1", "Chorus", "A", 2020, 7));
        Arc::new(Dataset::from_records(records))
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = build_router(dataset());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_lists_endpoints() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/api/v1/heatmap"].is_object());
        assert_eq!(body["enrollments"], 56);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["students"], 31);
    }

    #[tokio::test]
    async fn test_catalog() {
        let (_, body) = get_json("/api/v1/catalog").await;
        assert_eq!(body["years"], serde_json::json!([2019, 2020, 2021]));
        assert_eq!(body["codes"][0]["code"], "A");
        assert_eq!(body["codes"][0]["label"], "Arts (A)");
    }

    #[tokio::test]
    async fn test_heatmap_defaults() {
        let (status, body) = get_json("/api/v1/heatmap").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["query"]["grades"], "hs");
        assert_eq!(body["query"]["variant"], "plain");
        let x = body["figure"]["x"].as_array().unwrap();
        assert_eq!(x.len(), 3);
        assert_eq!(x[0], "Crew");
        assert_eq!(body["figure"]["x"], body["figure"]["y"]);
        assert_eq!(body["figure"]["z"][0][0], 1.0);
        assert_eq!(body["figure"]["text"][1][1], "1.00");
        assert_eq!(body["figure"]["color_label"], "Correlation");
        assert_eq!(body["pairs"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_heatmap_filters() {
        let (_, body) = get_json("/api/v1/heatmap?codes=S,A&top_n=1&variant=bias_corrected").await;
        assert_eq!(body["query"]["variant"], "bias_corrected");
        assert_eq!(body["figure"]["z"], serde_json::json!([[1.0]]));

        let (_, body) = get_json("/api/v1/heatmap?start=2022&end=2023").await;
        assert_eq!(body["filtered_enrollments"], 0);
        assert!(body["figure"]["z"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_heatmap_rejects_unknown_variant() {
        let (status, body) = get_json("/api/v1/heatmap?variant=tschuprow").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("tschuprow"));
    }

    #[tokio::test]
    async fn test_malformed_params_return_json_error() {
        for uri in [
            "/api/v1/heatmap?start=abc",
            "/api/v1/heatmap?top_n=-1",
            "/api/v1/popularity?end=2020.5",
            "/api/v1/enrollment/timeline?start=twenty",
        ] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["success"], false, "{uri}");
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
        }
        let (_, body) = get_json("/api/v1/heatmap?start=abc").await;
        assert!(body["error"].as_str().unwrap().contains("start"));
    }

    #[tokio::test]
    async fn test_popularity() {
        let (_, body) = get_json("/api/v1/popularity?grades=all").await;
        assert_eq!(body["programs"][0]["program"], "Crew");
        assert_eq!(body["programs"][0]["count"], 30);
        assert_eq!(body["programs"][1]["count"], 16);
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_treemap() {
        let (status, body) = get_json("/api/v1/treemap?by=gender&codes=S").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dimensions"], serde_json::json!(["gender"]));
        let leaves = body["leaves"].as_array().unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0]["total"], 15);

        let (status, _) = get_json("/api/v1/treemap?by=shoe_size").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_treemap_defaults_to_race_then_gender() {
        let (status, body) = get_json("/api/v1/treemap?codes=S").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dimensions"], serde_json::json!(["race_ethnicity", "gender"]));
        let leaves = body["leaves"].as_array().unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0]["path"], serde_json::json!(["Unknown", "F", "Crew"]));
    }

    #[tokio::test]
    async fn test_enrollment_counts() {
        let (_, body) = get_json("/api/v1/enrollment?programs=Crew&color=gender").await;
        let counts = body["counts"].as_array().unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|c| c["program"] == "Crew" && c["count"] == 15));
    }

    #[tokio::test]
    async fn test_enrollment_timeline() {
        let (status, body) =
            get_json("/api/v1/enrollment/timeline?programs=Chorus&by=program&color=grade").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["facet"], "program_name");
        let total: u64 = body["counts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["count"].as_u64().unwrap())
            .sum();
        assert_eq!(total, 16);

        let (status, body) = get_json("/api/v1/enrollment/timeline?color=height").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
