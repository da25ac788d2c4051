use crate::auth::AuthenticatedUser;
use crate::catalog::{CatalogListing, Gender};
use crate::database::entities::Enhancement;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub code: String,
    pub enhancement_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementView {
    pub enhancement_type: String,
    pub display_name: String,
    pub category: String,
    pub sort_order: i32,
}

impl From<Enhancement> for EnhancementView {
    fn from(e: Enhancement) -> Self {
        Self {
            enhancement_type: e.enhancement_type,
            display_name: e.display_name,
            category: e.category,
            sort_order: e.sort_order,
        }
    }
}

/// Listing response; beauty categories use the bucketed form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum ListingView {
    Flat {
        enhancements: Vec<EnhancementView>,
    },
    Beauty {
        hair_style: Vec<EnhancementView>,
        makeup: Vec<EnhancementView>,
    },
}

impl From<CatalogListing> for ListingView {
    fn from(listing: CatalogListing) -> Self {
        match listing {
            CatalogListing::Flat(enhancements) => ListingView::Flat {
                enhancements: enhancements.into_iter().map(Into::into).collect(),
            },
            CatalogListing::Beauty { hair_style, makeup } => ListingView::Beauty {
                hair_style: hair_style.into_iter().map(Into::into).collect(),
                makeup: makeup.into_iter().map(Into::into).collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: String,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub image_url: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub category: String,
    pub gender: String,
    #[serde(flatten)]
    pub enhancements: ListingView,
}

pub fn create_catalog_routes() -> Router<Server> {
    Router::new()
        .route("/catalog/categories", get(list_categories))
        .route("/catalog/enhancements", get(list_enhancements))
        .route("/classify", post(classify))
}

async fn list_categories(
    State(server): State<Server>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<CategoryView>>, AppError> {
    let categories = server.catalog.list_categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryView {
                code: c.code,
                enhancement_count: c.enhancement_count,
            })
            .collect(),
    ))
}

async fn list_enhancements(
    State(server): State<Server>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListingView>, AppError> {
    let default_gender = server.default_gender();
    let gender = query
        .gender
        .as_deref()
        .map(|g| Gender::parse_or(g, default_gender))
        .unwrap_or(default_gender);

    let listing = server.catalog.list_enhancements(&query.category, gender).await?;
    Ok(Json(listing.into()))
}

/// Classify an image and return the enhancement options for the
/// resulting category. Classification failures fall back to the
/// default category; this endpoint never fails on classifier errors.
async fn classify(
    State(server): State<Server>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if request.image_url.trim().is_empty() {
        return Err(AppError::Validation("imageUrl is required".to_string()));
    }

    let (category, gender) = server
        .classifier
        .classify_or_default(&request.image_url, request.category.as_deref())
        .await;

    let listing = server.catalog.list_enhancements(&category, gender).await?;

    Ok(Json(ClassifyResponse {
        category,
        gender: gender.as_str().to_string(),
        enhancements: listing.into(),
    }))
}
