use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use argrisk_core::export::{BULK_EXPORT_FILENAME, RISK_EXPORT_FILENAME};
use argrisk_core::{
    bulk_table, compute, lookup, parse_pasted, parse_query_lines, parse_table, record_table,
    resolve_all, risk_table, AbundanceEntry, ClampPolicy, DatasetHandle, Error, LookupOutcome,
    MatchSettings, ReferenceDataset, ResultTable, Settings,
};
use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state of the HTTP service
pub struct ApiState {
    pub dataset: Arc<DatasetHandle>,
    pub settings: Settings,
}

#[derive(Deserialize)]
struct LookupParams {
    fuzzy: Option<bool>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct FormatParams {
    format: Option<String>,
}

#[derive(Deserialize)]
struct BulkRequest {
    #[serde(default)]
    queries: Vec<String>,
    text: Option<String>,
    fuzzy: Option<bool>,
    cutoff: Option<u8>,
}

#[derive(Deserialize)]
struct RiskRequest {
    #[serde(default)]
    entries: Vec<AbundanceEntry>,
    text: Option<String>,
    score: Option<String>,
    fuzzy: Option<bool>,
    cutoff: Option<u8>,
    clamp: Option<ClampPolicy>,
}

#[derive(Deserialize)]
struct RiskUploadParams {
    score: Option<String>,
    fuzzy: Option<bool>,
    cutoff: Option<u8>,
    clamp: Option<ClampPolicy>,
    format: Option<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        dataset: Arc<DatasetHandle>,
        settings: Settings,
        port: u16,
    ) -> std::io::Result<()> {
        let state = web::Data::new(ApiState { dataset, settings });

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(Self::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Registers all routes; expects `web::Data<ApiState>` in app data
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/columns", web::get().to(list_columns))
            .route("/genes/{query}", web::get().to(get_gene))
            .route("/bulk", web::post().to(bulk_lookup))
            .route("/risk", web::post().to(risk_index))
            .route("/risk/upload", web::post().to(risk_upload));
    }
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        Error::Column(_) | Error::AbundanceColumns | Error::InvalidConfig(_) => {
            HttpResponse::BadRequest().json(body)
        }
        Error::Schema { .. } | Error::Parse(_) | Error::Csv(_) => {
            HttpResponse::UnprocessableEntity().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Shared dataset, loading it on the blocking pool when this is the first access
async fn load_dataset(state: &ApiState) -> Result<Arc<ReferenceDataset>, HttpResponse> {
    let handle = state.dataset.clone();
    let loaded = if handle.is_loaded() {
        handle.get_or_load()
    } else {
        match web::block(move || handle.get_or_load()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Dataset load task failed: {}", e);
                return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": e.to_string()
                })));
            }
        }
    };

    loaded.map_err(|e| {
        warn!("Reference dataset unavailable: {}", e);
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": format!("Reference dataset unavailable: {}", e)
        }))
    })
}

fn match_settings(
    base: &MatchSettings,
    fuzzy: Option<bool>,
    cutoff: Option<u8>,
) -> Result<MatchSettings, Error> {
    let settings = MatchSettings {
        fuzzy: fuzzy.unwrap_or(base.fuzzy),
        cutoff: cutoff.unwrap_or(base.cutoff),
        ..*base
    };
    settings.validate()?;
    Ok(settings)
}

fn wants_csv(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("csv"))
}

fn csv_response(table: &ResultTable, filename: &str) -> HttpResponse {
    match table.to_csv() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ))
            .body(body),
        Err(e) => error_response(&e),
    }
}

async fn list_columns(state: web::Data<ApiState>) -> ActixResult<HttpResponse> {
    let dataset = match load_dataset(&state).await {
        Ok(d) => d,
        Err(resp) => return Ok(resp),
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "rows": dataset.len(),
        "display_columns": dataset.display_columns(),
        "score_columns": dataset.score_columns(),
        "default_score_column": dataset.default_score_column(),
    })))
}

async fn get_gene(
    state: web::Data<ApiState>,
    path: web::Path<String>,
    params: web::Query<LookupParams>,
) -> ActixResult<HttpResponse> {
    let query = path.into_inner();
    let dataset = match load_dataset(&state).await {
        Ok(d) => d,
        Err(resp) => return Ok(resp),
    };

    let mut settings = match match_settings(&state.settings.matching, params.fuzzy, None) {
        Ok(s) => s,
        Err(e) => return Ok(error_response(&e)),
    };
    if let Some(limit) = params.limit {
        settings.limit = limit.max(1);
    }

    match lookup(&dataset, &query, &settings) {
        LookupOutcome::Empty => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Query is empty"
        }))),
        LookupOutcome::Hit { record, note, similar } => {
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "query": query,
                "note": note,
                "match": record.genes,
                "risk_percent": record.risk_percent(),
                "record": record_table(&dataset, record),
                "similar": similar,
            })))
        }
        LookupOutcome::Miss { note } => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "query": query,
            "note": note,
        }))),
    }
}

async fn bulk_lookup(
    state: web::Data<ApiState>,
    params: web::Query<FormatParams>,
    req: web::Json<BulkRequest>,
) -> ActixResult<HttpResponse> {
    let dataset = match load_dataset(&state).await {
        Ok(d) => d,
        Err(resp) => return Ok(resp),
    };
    let settings = match match_settings(&state.settings.matching, req.fuzzy, req.cutoff) {
        Ok(s) => s,
        Err(e) => return Ok(error_response(&e)),
    };

    let mut queries = req.queries.clone();
    if let Some(text) = &req.text {
        queries.extend(parse_query_lines(text));
    }

    let results = resolve_all(&dataset, &queries, &settings);
    let table = bulk_table(&dataset, &results);
    debug!("Bulk lookup answered {} queries", table.len());

    if wants_csv(params.format.as_deref()) {
        return Ok(csv_response(&table, BULK_EXPORT_FILENAME));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "matched": results.iter().filter(|r| r.note.is_match()).count(),
        "table": table,
    })))
}

async fn risk_response(
    state: &ApiState,
    entries: &[AbundanceEntry],
    score: Option<&str>,
    fuzzy: Option<bool>,
    cutoff: Option<u8>,
    clamp: Option<ClampPolicy>,
    format: Option<&str>,
) -> HttpResponse {
    let dataset = match load_dataset(state).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let settings = match match_settings(&state.settings.matching, fuzzy, cutoff) {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };
    if entries.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "No abundance entries supplied"
        }));
    }

    let score = score.unwrap_or(&state.settings.risk.score_attribute);
    let clamp = clamp.unwrap_or(state.settings.risk.clamp);

    let index = match compute(&dataset, entries, score, &settings, clamp) {
        Ok(index) => index,
        Err(e) => return error_response(&e),
    };
    let table = risk_table(&dataset, &index);

    if wants_csv(format) {
        return csv_response(&table, RISK_EXPORT_FILENAME);
    }
    HttpResponse::Ok().json(serde_json::json!({
        "score_column": index.score_column,
        "total": index.total,
        "total_display": index.display_total(),
        "matched": index.matched_count(),
        "table": table,
    }))
}

async fn risk_index(
    state: web::Data<ApiState>,
    params: web::Query<FormatParams>,
    req: web::Json<RiskRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let mut entries = req.entries;
    if let Some(text) = &req.text {
        entries.extend(parse_pasted(text));
    }

    Ok(risk_response(
        &state,
        &entries,
        req.score.as_deref(),
        req.fuzzy,
        req.cutoff,
        req.clamp,
        params.format.as_deref(),
    )
    .await)
}

async fn risk_upload(
    state: web::Data<ApiState>,
    params: web::Query<RiskUploadParams>,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let mut upload: Option<Vec<u8>> = None;

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let is_file = field.name().map_or(true, |name| name == "file");
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        if is_file && upload.is_none() {
            upload = Some(bytes);
        }
    }

    let text = match upload.map(String::from_utf8) {
        Some(Ok(text)) => text,
        Some(Err(_)) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Uploaded file is not valid UTF-8"
            })));
        }
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Missing 'file' field"
            })));
        }
    };

    let entries = match parse_table(&text) {
        Ok(entries) => entries,
        Err(e) => return Ok(error_response(&e)),
    };

    Ok(risk_response(
        &state,
        &entries,
        params.score.as_deref(),
        params.fuzzy,
        params.cutoff,
        params.clamp,
        params.format.as_deref(),
    )
    .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use std::io::Write;

    const DATASET: &str = "\
Genes,Mobility_level,Final_Risk_score,Pathogenic_score
geneA,Mobile,2.0,1
mecA,Fixed,0.5,Not Defined
bla_TEM_1,Mobile,0.7,3
";

    fn state() -> web::Data<ApiState> {
        let dataset = ReferenceDataset::from_text(DATASET).unwrap();
        web::Data::new(ApiState {
            dataset: Arc::new(DatasetHandle::from_dataset(dataset)),
            settings: Settings::default(),
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state).configure(RestApi::configure)).await
        };
    }

    #[actix_web::test]
    async fn test_columns() {
        let app = app!(state());
        let req = test::TestRequest::get().uri("/columns").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rows"], 3);
        assert_eq!(body["default_score_column"], "Final_Risk_score");
        assert_eq!(body["score_columns"][1], "Pathogenic_score");
    }

    #[actix_web::test]
    async fn test_gene_lookup_fuzzy() {
        let app = app!(state());
        let req = test::TestRequest::get().uri("/genes/blaTEM?limit=2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["match"], "bla_TEM_1");
        assert_eq!(body["note"], "Fuzzy");
        assert_eq!(body["similar"].as_array().unwrap().len(), 2);
        assert!((body["risk_percent"].as_f64().unwrap() - 70.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn test_gene_lookup_exact_miss() {
        let app = app!(state());
        let req = test::TestRequest::get().uri("/genes/blaTEM?fuzzy=false").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["note"], "No exact match");
    }

    #[actix_web::test]
    async fn test_bulk_json_and_csv() {
        let app = app!(state());
        let payload = serde_json::json!({ "text": "mecA\n\nunknown\n", "fuzzy": false });

        let req = test::TestRequest::post().uri("/bulk").set_json(&payload).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["matched"], 1);
        assert_eq!(body["table"]["rows"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::post().uri("/bulk?format=csv").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        let table = ResultTable::from_csv(std::str::from_utf8(&body).unwrap()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Note"), Some("No exact match"));
    }

    #[actix_web::test]
    async fn test_bulk_rejects_bad_cutoff() {
        let app = app!(state());
        let req = test::TestRequest::post()
            .uri("/bulk")
            .set_json(serde_json::json!({ "queries": ["mecA"], "cutoff": 10 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_risk_from_text() {
        let app = app!(state());
        let req = test::TestRequest::post()
            .uri("/risk")
            .set_json(serde_json::json!({ "text": "geneA, 10\ngeneB, 3.5", "fuzzy": false }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 20.0);
        assert_eq!(body["total_display"], "20");
        assert_eq!(body["matched"], 1);
    }

    #[actix_web::test]
    async fn test_risk_unknown_score_column() {
        let app = app!(state());
        let req = test::TestRequest::post()
            .uri("/risk")
            .set_json(serde_json::json!({ "entries": [{"gene": "mecA", "abundance": 1.0}], "score": "Mobility_score" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_risk_upload() {
        let app = app!(state());
        let body = "--XBOUNDARY\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"sample.csv\"\r\n\
Content-Type: text/csv\r\n\r\n\
Genes,Abundance\ngeneA,10\nbla_TEM_1,x\r\n\
--XBOUNDARY--\r\n";
        let req = test::TestRequest::post()
            .uri("/risk/upload?score=Pathogenic_score&fuzzy=false")
            .insert_header(("content-type", "multipart/form-data; boundary=XBOUNDARY"))
            .set_payload(body)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["score_column"], "Pathogenic_score");
        assert_eq!(body["total"], 10.0);
        assert_eq!(body["table"]["rows"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_file_backed_dataset_loads_on_first_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DATASET.as_bytes()).unwrap();
        file.flush().unwrap();

        let handle = Arc::new(DatasetHandle::new(file.path()));
        let state = web::Data::new(ApiState {
            dataset: handle.clone(),
            settings: Settings::default(),
        });
        let app = app!(state);
        assert!(!handle.is_loaded());

        let req = test::TestRequest::get().uri("/columns").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["rows"], 3);
        assert!(handle.is_loaded());
    }

    #[actix_web::test]
    async fn test_dataset_unavailable() {
        let state = web::Data::new(ApiState {
            dataset: Arc::new(DatasetHandle::new("/nonexistent/genes_risk.csv")),
            settings: Settings::default(),
        });
        let app = app!(state);
        let req = test::TestRequest::get().uri("/columns").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 503);
    }
}
