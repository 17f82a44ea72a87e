use std::path::PathBuf;
use std::str::FromStr;

use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use automarket_core::domain::catalog::{BrandId, CarId, ManagerId, PriceCategoryId};
use automarket_core::domain::lead::{LeadId, LeadStatus};
use automarket_core::i18n::Lang;
use automarket_core::money::format_price;
use automarket_db::repositories::{CatalogReader, LeadStore, NewCar, RepositoryError};

use crate::bootstrap::AppState;

const COOKIE_NAME: &str = "admin_token";
const LEADS_PAGE_SIZE: i64 = 200;
const UPLOAD_BODY_LIMIT: usize = 20 * 1024 * 1024;

const ALLOWED_PHOTO_SUFFIXES: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(login_form).post(login_submit))
        .route("/admin/logout", post(logout))
        .route("/admin", get(dashboard))
        .route("/admin/brands", post(create_brand))
        .route("/admin/brands/{id}/delete", post(delete_brand))
        .route("/admin/categories", post(create_category))
        .route("/admin/categories/{id}/delete", post(delete_category))
        .route("/admin/managers", post(create_manager))
        .route("/admin/managers/{id}/active", post(set_manager_active))
        .route("/admin/managers/{id}/delete", post(delete_manager))
        .route(
            "/admin/cars",
            post(create_car).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/admin/cars/{id}/active", post(set_car_active))
        .route("/admin/cars/{id}/delete", post(delete_car))
        .route("/admin/leads", get(leads_page))
        .route("/admin/leads/{id}/status", post(set_lead_status))
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin session is missing or expired")]
    Unauthorized,
    #[error("invalid form input: {0}")]
    BadRequest(String),
    #[error("storage operation failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("template rendering failed: {0}")]
    Render(#[from] tera::Error),
    #[error("photo upload failed: {0}")]
    Upload(#[from] std::io::Error),
    #[error("multipart form was malformed: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => Redirect::to("/admin/login").into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            other => {
                error!(error = %other, "admin page failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_string())
}

async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AdminError> {
    let token = cookie_token(headers).ok_or(AdminError::Unauthorized)?;
    if state.admin_sessions.validate(&token).await? {
        Ok(())
    } else {
        Err(AdminError::Unauthorized)
    }
}

// --- authentication -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    error: Option<u8>,
}

#[derive(Deserialize)]
struct LoginForm {
    password: String,
}

async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, AdminError> {
    let mut context = tera::Context::new();
    context.insert("failed", &query.error.is_some());
    Ok(Html(state.templates.render("admin/login.html", &context)?))
}

async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AdminError> {
    if form.password != state.config.admin.password.expose_secret() {
        warn!("admin login rejected");
        return Ok(Redirect::to("/admin/login?error=1").into_response());
    }

    let ttl_hours = state.config.admin.session_ttl_hours;
    let token = state.admin_sessions.create(ttl_hours).await?;
    let cookie = format!(
        "{COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl_hours * 3600,
    );
    info!("admin login accepted");

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AdminError> {
    if let Some(token) = cookie_token(&headers) {
        state.admin_sessions.revoke(&token).await?;
    }
    let cookie = format!("{COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin/login")).into_response())
}

// --- dashboard ------------------------------------------------------------

#[derive(Serialize)]
struct AdminCarView {
    id: i64,
    brand: String,
    model: String,
    year: i32,
    price_text: String,
    category: String,
    active: bool,
    cover_photo: Option<String>,
}

async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, AdminError> {
    require_admin(&state, &headers).await?;

    let brands = state.catalog.brands().await?;
    let categories = state.catalog.price_categories().await?;
    let managers = state.catalog.all_managers().await?;
    let cars: Vec<AdminCarView> = state
        .catalog
        .all_for_admin()
        .await?
        .iter()
        .map(|summary| AdminCarView {
            id: summary.car.id.0,
            brand: summary.brand_name(Lang::Ru).to_string(),
            model: summary.car.model.clone(),
            year: summary.car.year,
            price_text: format_price(summary.car.price),
            category: summary.category_label(Lang::Ru).to_string(),
            active: summary.car.active,
            cover_photo: summary.cover_photo.clone(),
        })
        .collect();

    let mut context = tera::Context::new();
    context.insert("brands", &brands);
    context.insert("categories", &categories);
    context.insert("managers", &managers);
    context.insert("cars", &cars);

    Ok(Html(state.templates.render("admin/index.html", &context)?))
}

// --- catalog management ---------------------------------------------------

#[derive(Deserialize)]
struct BrandForm {
    name_ru: String,
    name_uz: String,
}

async fn create_brand(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BrandForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    if form.name_ru.trim().is_empty() || form.name_uz.trim().is_empty() {
        return Err(AdminError::BadRequest("brand names must not be empty".to_string()));
    }
    state.catalog.insert_brand(form.name_ru.trim(), form.name_uz.trim()).await?;
    Ok(Redirect::to("/admin"))
}

async fn delete_brand(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.delete_brand(BrandId(id)).await?;
    Ok(Redirect::to("/admin"))
}

#[derive(Deserialize)]
struct CategoryForm {
    label_ru: String,
    label_uz: String,
    #[serde(default)]
    sort: i64,
}

async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    if form.label_ru.trim().is_empty() || form.label_uz.trim().is_empty() {
        return Err(AdminError::BadRequest("category labels must not be empty".to_string()));
    }
    state
        .catalog
        .insert_price_category(form.label_ru.trim(), form.label_uz.trim(), form.sort)
        .await?;
    Ok(Redirect::to("/admin"))
}

async fn delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.delete_price_category(PriceCategoryId(id)).await?;
    Ok(Redirect::to("/admin"))
}

#[derive(Deserialize)]
struct ManagerForm {
    name: String,
    phone: String,
    #[serde(default)]
    sort: i64,
}

#[derive(Deserialize)]
struct ActiveForm {
    active: u8,
}

async fn create_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ManagerForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    if form.name.trim().is_empty() || form.phone.trim().is_empty() {
        return Err(AdminError::BadRequest("manager name and phone are required".to_string()));
    }
    state.catalog.insert_manager(form.name.trim(), form.phone.trim(), form.sort).await?;
    Ok(Redirect::to("/admin"))
}

async fn set_manager_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<ActiveForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.set_manager_active(ManagerId(id), form.active != 0).await?;
    Ok(Redirect::to("/admin"))
}

async fn delete_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.delete_manager(ManagerId(id)).await?;
    Ok(Redirect::to("/admin"))
}

// --- cars and photo uploads -----------------------------------------------

#[derive(Default)]
struct CarFields {
    brand_id: Option<i64>,
    model: String,
    year: Option<i32>,
    price: Option<Decimal>,
    price_category_id: Option<i64>,
    description_ru: String,
    description_uz: String,
}

/// Stored photo names are regenerated from scratch: an uploaded file name
/// only contributes its sanitized stem, and the extension comes from an
/// allow-list so nothing executable lands under the upload directory.
fn stored_file_name(original: &str) -> String {
    let lower = original.to_ascii_lowercase();
    let extension = ALLOWED_PHOTO_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .copied()
        .unwrap_or(".jpg");

    let stem = lower.strip_suffix(extension).unwrap_or(&lower);
    let mut safe: String = stem
        .chars()
        .map(|ch| {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '.' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    safe.truncate(80);
    if safe.is_empty() {
        safe.push_str("photo");
    }

    format!("{}-{safe}{extension}", Uuid::new_v4())
}

async fn create_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;

    let max_photos = state.config.admin.max_photos_per_car as usize;
    let upload_dir = PathBuf::from(&state.config.admin.upload_dir);
    let mut fields = CarFields::default();
    let mut photo_paths: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "brand_id" => fields.brand_id = field.text().await?.trim().parse().ok(),
            "model" => fields.model = field.text().await?.trim().to_string(),
            "year" => fields.year = field.text().await?.trim().parse().ok(),
            "price" => {
                let raw = field.text().await?;
                fields.price = Decimal::from_str(raw.trim().replace(' ', "").as_str()).ok();
            }
            "price_category_id" => {
                fields.price_category_id = field.text().await?.trim().parse().ok();
            }
            "description_ru" => fields.description_ru = field.text().await?,
            "description_uz" => fields.description_uz = field.text().await?,
            "photos" => {
                let original = field.file_name().unwrap_or("photo.jpg").to_string();
                let bytes = field.bytes().await?;
                if bytes.is_empty() || photo_paths.len() >= max_photos {
                    continue;
                }

                let stored = stored_file_name(&original);
                tokio::fs::create_dir_all(&upload_dir).await?;
                tokio::fs::write(upload_dir.join(&stored), &bytes).await?;
                photo_paths.push(format!("uploads/{stored}"));
            }
            _ => {}
        }
    }

    let brand_id = fields
        .brand_id
        .ok_or_else(|| AdminError::BadRequest("brand_id is required".to_string()))?;
    let year =
        fields.year.ok_or_else(|| AdminError::BadRequest("year is required".to_string()))?;
    let price = fields
        .price
        .ok_or_else(|| AdminError::BadRequest("price must be a number".to_string()))?;
    if fields.model.is_empty() {
        return Err(AdminError::BadRequest("model is required".to_string()));
    }

    let blank_to_none = |text: String| {
        let trimmed = text.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };
    let car_id = state
        .catalog
        .insert_car_with_photos(
            NewCar {
                brand_id: BrandId(brand_id),
                model: fields.model,
                year,
                price,
                price_category_id: fields.price_category_id.map(PriceCategoryId),
                description_ru: blank_to_none(fields.description_ru),
                description_uz: blank_to_none(fields.description_uz),
            },
            &photo_paths,
        )
        .await?;
    info!(car_id = car_id.0, photos = photo_paths.len(), "car created");

    Ok(Redirect::to("/admin"))
}

async fn set_car_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<ActiveForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.set_car_active(CarId(id), form.active != 0).await?;
    Ok(Redirect::to("/admin"))
}

async fn delete_car(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    state.catalog.delete_car(CarId(id)).await?;
    Ok(Redirect::to("/admin"))
}

// --- leads ----------------------------------------------------------------

#[derive(Serialize)]
struct LeadView {
    id: i64,
    full_name: String,
    phone: String,
    car: String,
    year: String,
    color: String,
    price_wanted: String,
    condition: String,
    status: &'static str,
    created_at: String,
}

async fn leads_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, AdminError> {
    require_admin(&state, &headers).await?;

    let leads: Vec<LeadView> = state
        .leads
        .recent(LEADS_PAGE_SIZE)
        .await?
        .iter()
        .map(|lead| LeadView {
            id: lead.id.0,
            full_name: lead.full_name.clone(),
            phone: lead.phone.clone(),
            car: format!("{} {}", lead.brand_text, lead.model_text),
            year: lead.year.clone(),
            color: lead.color.clone(),
            price_wanted: lead.price_wanted.clone(),
            condition: lead.condition.clone(),
            status: lead.status.as_str(),
            created_at: lead.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let mut context = tera::Context::new();
    context.insert("leads", &leads);

    Ok(Html(state.templates.render("admin/leads.html", &context)?))
}

#[derive(Deserialize)]
struct StatusForm {
    status: String,
}

async fn set_lead_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AdminError> {
    require_admin(&state, &headers).await?;
    let status = LeadStatus::from_str(&form.status)
        .map_err(|error| AdminError::BadRequest(error.to_string()))?;
    state.leads.set_status(LeadId(id), status).await?;
    Ok(Redirect::to("/admin/leads"))
}
