use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use automarket_core::domain::catalog::{Brand, BrandId, CarDetail, CarId, CarSummary, Manager};
use automarket_core::i18n::Lang;
use automarket_core::money::format_price;
use automarket_db::repositories::{CatalogReader, RepositoryError};

use crate::bootstrap::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(index)).route("/car/{id}", get(car_page))
}

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("catalog read failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("template rendering failed: {0}")]
    Render(#[from] tera::Error),
    #[error("car not found")]
    NotFound,
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            other => {
                error!(error = %other, "site page failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    brand: Option<i64>,
    lang: Option<String>,
}

impl PageQuery {
    fn lang(&self) -> Lang {
        Lang::parse_lenient(self.lang.as_deref().unwrap_or(""))
    }
}

#[derive(Serialize)]
struct BrandView {
    id: i64,
    name: String,
    selected: bool,
}

#[derive(Serialize)]
struct CarCardView {
    id: i64,
    brand: String,
    model: String,
    year: i32,
    price_text: String,
    category: String,
    cover_photo: Option<String>,
}

#[derive(Serialize)]
struct ManagerView {
    name: String,
    phone: String,
}

#[derive(Serialize)]
struct CarPageView {
    id: i64,
    brand: String,
    model: String,
    year: i32,
    price_text: String,
    category: String,
    description: Option<String>,
    photos: Vec<String>,
}

fn brand_view(brand: &Brand, lang: Lang, selected: Option<BrandId>) -> BrandView {
    BrandView {
        id: brand.id.0,
        name: brand.name(lang).to_string(),
        selected: selected == Some(brand.id),
    }
}

fn card_view(summary: &CarSummary, lang: Lang) -> CarCardView {
    CarCardView {
        id: summary.car.id.0,
        brand: summary.brand_name(lang).to_string(),
        model: summary.car.model.clone(),
        year: summary.car.year,
        price_text: format_price(summary.car.price),
        category: summary.category_label(lang).to_string(),
        cover_photo: summary.cover_photo.clone(),
    }
}

fn manager_view(manager: &Manager) -> ManagerView {
    ManagerView { name: manager.name.clone(), phone: manager.phone.clone() }
}

fn detail_view(detail: &CarDetail, lang: Lang) -> CarPageView {
    CarPageView {
        id: detail.car.id.0,
        brand: detail.brand_name(lang).to_string(),
        model: detail.car.model.clone(),
        year: detail.car.year,
        price_text: format_price(detail.car.price),
        category: detail.category_label(lang).to_string(),
        description: detail.car.description(lang).map(str::to_string),
        photos: detail.photos.iter().map(|photo| photo.file_path.clone()).collect(),
    }
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, SiteError> {
    let lang = query.lang();
    let selected = query.brand.map(BrandId);

    let brands = state.catalog.brands().await?;
    let cars = state.catalog.active_listing(selected).await?;
    let managers = state.catalog.active_managers().await?;

    let mut context = tera::Context::new();
    context.insert("lang", lang.as_str());
    context.insert(
        "brands",
        &brands.iter().map(|brand| brand_view(brand, lang, selected)).collect::<Vec<_>>(),
    );
    context.insert("cars", &cars.iter().map(|car| card_view(car, lang)).collect::<Vec<_>>());
    context.insert("managers", &managers.iter().map(manager_view).collect::<Vec<_>>());
    context.insert("selected_brand", &selected.map(|id| id.0));

    Ok(Html(state.templates.render("site/index.html", &context)?))
}

async fn car_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, SiteError> {
    let lang = query.lang();
    let detail = state.catalog.car_detail(CarId(id)).await?.ok_or(SiteError::NotFound)?;
    if !detail.car.active {
        return Err(SiteError::NotFound);
    }

    let mut context = tera::Context::new();
    context.insert("lang", lang.as_str());
    context.insert("car", &detail_view(&detail, lang));

    Ok(Html(state.templates.render("site/car.html", &context)?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use automarket_core::domain::catalog::BrandId;
    use automarket_db::repositories::NewCar;

    use crate::bootstrap::tests::test_state;
    use crate::bootstrap::AppState;

    async fn seed_car(state: &AppState, active: bool) -> i64 {
        let brand_id = state
            .catalog
            .insert_brand("Шевроле", "Chevrolet")
            .await
            .expect("brand insert should succeed");
        let car_id = state
            .catalog
            .insert_car_with_photos(
                NewCar {
                    brand_id,
                    model: "Cobalt".to_string(),
                    year: 2021,
                    price: Decimal::new(145_000_000, 0),
                    price_category_id: None,
                    description_ru: Some("Один владелец".to_string()),
                    description_uz: None,
                },
                &["uploads/cobalt-front.jpg".to_string()],
            )
            .await
            .expect("car insert should succeed");
        if !active {
            state
                .catalog
                .set_car_active(car_id, false)
                .await
                .expect("deactivation should succeed");
        }
        car_id.0
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }

    #[tokio::test]
    async fn index_lists_active_cars_with_formatted_prices() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        seed_car(&state, true).await;
        let app = super::router().with_state(state.clone());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Cobalt"));
        assert!(html.contains("145 000 000 сум"));
        assert!(html.contains("Шевроле"));

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn index_brand_filter_hides_other_brands() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        seed_car(&state, true).await;
        let other = state
            .catalog
            .insert_brand("Киа", "Kia")
            .await
            .expect("brand insert should succeed");
        let app = super::router().with_state(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/?brand={}", other.0))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(!html.contains("Cobalt"), "filtered listing should not show other brands");

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn car_page_switches_brand_name_by_language() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        let car_id = seed_car(&state, true).await;
        let app = super::router().with_state(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/car/{car_id}?lang=uz"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Chevrolet"));
        assert!(html.contains("uploads/cobalt-front.jpg"));

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn hidden_and_missing_cars_are_not_found() {
        let (state, _api) = test_state("sqlite::memory:?cache=shared").await;
        let hidden = seed_car(&state, false).await;
        let app = super::router().with_state(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/car/{hidden}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::builder().uri("/car/424242").body(Body::empty()).expect("request"))
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.db_pool.close().await;
    }
}
