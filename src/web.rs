use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::chart::{bar_chart_png, ChartOptions};
use crate::config::Settings;
use crate::error::TrackerError;
use crate::parser::{read_events, sort_events, EventRecord};
use crate::reconcile::{reconcile, MemberTotal};
use crate::roster::load_roster;
use crate::sheet::build_submission;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// The most recently uploaded backup, already sorted by member
pub struct AppState {
    pub events: Mutex<Option<Vec<EventRecord>>>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            events: Mutex::new(None),
            settings,
        }
    }

    fn events(&self) -> MutexGuard<'_, Option<Vec<EventRecord>>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn totals(&self, events: &[EventRecord]) -> crate::error::Result<Vec<MemberTotal>> {
        let roster = load_roster(&self.settings.roster_path)?;
        Ok(reconcile(events, &roster))
    }
}

#[derive(Serialize)]
pub struct TotalsResponse {
    totals: Vec<MemberTotal>,
    total_hours: f64,
}

fn no_data() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({"error": "No backup uploaded"}))
}

fn internal(err: TrackerError) -> actix_web::Error {
    actix_web::error::ErrorInternalServerError(err.to_string())
}

// Backup CSV upload endpoint
async fn upload(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match read_events(body.as_ref()) {
        Ok(mut events) => {
            sort_events(&mut events);
            let count = events.len();
            *state.events() = Some(events);
            info!(events = count, "backup uploaded");

            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "events": count
            })))
        }
        Err(e) => {
            warn!(error = %e, "rejected backup upload");
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": format!("Failed to process CSV: {}", e)
            })))
        }
    }
}

async fn get_totals(state: web::Data<AppState>) -> Result<HttpResponse> {
    let events = state.events();
    let Some(ref events) = *events else {
        return Ok(no_data());
    };

    let totals = state.totals(events).map_err(internal)?;
    let total_hours = totals.iter().map(|t| t.hours).sum();
    Ok(HttpResponse::Ok().json(TotalsResponse {
        totals,
        total_hours,
    }))
}

async fn get_chart(state: web::Data<AppState>) -> Result<HttpResponse> {
    let totals = {
        let events = state.events();
        let Some(ref events) = *events else {
            return Ok(no_data());
        };
        state.totals(events).map_err(internal)?
    };

    let options = ChartOptions {
        title: chart_title(&state.settings),
        ..ChartOptions::default()
    };
    let png = web::block(move || bar_chart_png(&totals, &options))
        .await?
        .map_err(internal)?;
    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}

async fn get_submission(state: web::Data<AppState>) -> Result<HttpResponse> {
    let events = state.events();
    let Some(ref events) = *events else {
        return Ok(no_data());
    };

    let settings = &state.settings;
    let template = Some(settings.template_path.as_path());
    let sheet = match build_submission(events, &settings.layout, &settings.organization, template) {
        Ok(sheet) => sheet,
        Err(TrackerError::SlotOverflow(overflow)) => {
            return Ok(HttpResponse::Conflict().json(serde_json::json!({
                "success": false,
                "error": overflow.to_string(),
                "member": overflow.member
            })));
        }
        Err(e) => return Err(internal(e)),
    };
    let bytes = sheet.to_buffer().map_err(internal)?;

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"FINALIZED_SUBMISSION.xlsx\"",
        ))
        .body(bytes))
}

async fn get_roster(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = load_roster(&state.settings.roster_path).map_err(internal)?;
    let names: Vec<String> = roster.into_iter().map(|r| r.member).collect();
    Ok(HttpResponse::Ok().json(names))
}

async fn index() -> Result<HttpResponse> {
    let html = "<!doctype html>\n<html><head><title>Voluntracker</title></head><body>\n\
<h1>Voluntracker</h1>\n<ul>\n\
<li>POST /api/upload &mdash; backup CSV as the request body</li>\n\
<li><a href=\"/api/totals\">/api/totals</a></li>\n\
<li><a href=\"/api/chart\">/api/chart</a></li>\n\
<li><a href=\"/api/submission\">/api/submission</a></li>\n\
<li><a href=\"/api/roster\">/api/roster</a></li>\n\
</ul>\n</body></html>\n";
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

fn chart_title(settings: &Settings) -> String {
    if settings.organization.is_empty() {
        "Volunteer Hours".to_string()
    } else {
        format!("{} Volunteer Hours", settings.organization)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/upload", web::post().to(upload))
        .route("/api/totals", web::get().to(get_totals))
        .route("/api/chart", web::get().to(get_chart))
        .route("/api/submission", web::get().to(get_submission))
        .route("/api/roster", web::get().to(get_roster));
}

pub async fn start_server(settings: Settings, port: u16) -> std::io::Result<()> {
    let bind = settings.web_bind.clone();
    let app_state = web::Data::new(AppState::new(settings));

    info!(%bind, port, "starting web dashboard");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((bind.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    const BACKUP: &str = "\
What is your name?,Email,Where?,Hours
Bob,b@x.org,Park,1
Alice,a@x.org,Beach,2
Alice,a@x.org,Park,3
";

    fn state_with_roster(dir: &std::path::Path, roster: &str) -> web::Data<AppState> {
        let roster_path = dir.join("Roster.csv");
        std::fs::write(&roster_path, roster).unwrap();
        let settings = Settings {
            roster_path,
            ..Settings::default()
        };
        web::Data::new(AppState::new(settings))
    }

    #[actix_web::test]
    async fn totals_before_upload_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_roster(dir.path(), "Alice\n");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/totals").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn upload_then_totals() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_roster(dir.path(), "Alice\nBob\nCarol\n");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload(BACKUP)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/totals").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["totals"],
            serde_json::json!([
                {"member": "Alice", "hours": 5.0},
                {"member": "Bob", "hours": 1.0},
                {"member": "Carol", "hours": 0.0}
            ])
        );
        assert_eq!(body["total_hours"], serde_json::json!(6.0));
    }

    #[actix_web::test]
    async fn bad_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_roster(dir.path(), "");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload("Alice,a@x.org,Beach,lots\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn overflow_blocks_submission() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_roster(dir.path(), "");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let backup: String = (1..=5)
            .map(|i| format!("Zed,z@x.org,Site {i},1\n"))
            .collect();
        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload(backup)
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/submission").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["member"], "Zed");
    }

    #[actix_web::test]
    async fn submission_downloads_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_roster(dir.path(), "");
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_payload(BACKUP)
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/submission").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = test::read_body(resp).await;
        assert_eq!(&bytes[..2], b"PK");
    }
}
