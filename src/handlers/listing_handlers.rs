//! HTTP handlers for car listing operations.
//! Parses and validates request input up front, then delegates upload and
//! persistence concerns to `ListingService`.

use crate::{
    errors::AppError,
    models::car::UserCarsDocument,
    services::{
        listing_service::{ListingError, ListingService, NewListing},
        media_service::ImagePayload,
    },
};
use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartError,
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;

/// Upper bound on picture parts accepted per create request.
const MAX_PICTURES: usize = 10;

/// Raw multipart fields of a create request, before validation.
#[derive(Default)]
struct ListingForm {
    username: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    color: Option<String>,
    description: Option<String>,
    modelyear: Option<String>,
    price: Option<String>,
    pictures: Vec<ImagePayload>,
}

/// Query params accepted by `GET /products`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub username: Option<String>,
}

/// Query params accepted by `DELETE /products`.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub uuid: Option<String>,
    pub username: Option<String>,
}

/// POST `/products` — create a car listing from a multipart form.
///
/// Validation runs before any upload is attempted; a request with no
/// picture parts never reaches the media store. Upload or persistence
/// failures fail the request as a whole with a generic 500 — images
/// already accepted by the media store are not rolled back.
pub async fn create_listing(
    State(service): State<ListingService>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = read_listing_form(&mut multipart).await?;
    let (listing, images) = form.validate()?;

    match service.create_listing(listing, images).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(err) => {
            tracing::error!("error during listing creation: {err}");
            Err(AppError::internal("Failed to upload the data"))
        }
    }
}

/// GET `/products?username=` — fetch the full document for one user.
pub async fn get_listings(
    State(service): State<ListingService>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UserCarsDocument>, AppError> {
    let username = non_empty(query.username)
        .ok_or_else(|| AppError::bad_request("username is required"))?;

    match service.find_by_username(&username).await {
        Ok(document) => Ok(Json(document)),
        Err(ListingError::UserNotFound(_)) => Err(AppError::bad_request("User not found")),
        Err(err) => {
            tracing::error!("error fetching listings: {err}");
            Err(AppError::internal("Server error"))
        }
    }
}

/// DELETE `/products?uuid=&username=` — remove one car from a user's
/// document and return the updated document.
///
/// A uuid that matches no car succeeds with the unchanged document; only
/// a missing user is 404.
pub async fn delete_listing(
    State(service): State<ListingService>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, AppError> {
    let (Some(uuid), Some(username)) = (non_empty(query.uuid), non_empty(query.username)) else {
        return Err(AppError::bad_request("UUID and username are required"));
    };

    match service.remove_car(&username, &uuid).await {
        Ok(document) => Ok(Json(json!({ "success": true, "data": document }))),
        Err(ListingError::UserNotFound(_)) => Err(AppError::not_found("User not found")),
        Err(err) => {
            tracing::error!("error deleting car: {err}");
            Err(AppError::internal("Server error"))
        }
    }
}

/// Drain the multipart stream into a `ListingForm`.
///
/// Picture parts are buffered in memory in arrival order. Unknown field
/// names are ignored.
async fn read_listing_form(multipart: &mut Multipart) -> Result<ListingForm, AppError> {
    let mut form = ListingForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "username" => form.username = Some(field.text().await.map_err(bad_multipart)?),
            "brand" => form.brand = Some(field.text().await.map_err(bad_multipart)?),
            "model" => form.model = Some(field.text().await.map_err(bad_multipart)?),
            "color" => form.color = Some(field.text().await.map_err(bad_multipart)?),
            "description" => {
                form.description = Some(field.text().await.map_err(bad_multipart)?);
            }
            "modelyear" => form.modelyear = Some(field.text().await.map_err(bad_multipart)?),
            "price" => form.price = Some(field.text().await.map_err(bad_multipart)?),
            "pictures" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.pictures.push(ImagePayload { filename, bytes });
            }
            other => {
                tracing::debug!("ignoring unexpected multipart field `{other}`");
            }
        }
    }

    Ok(form)
}

impl ListingForm {
    /// Validate the raw form into a `NewListing` plus its image payloads.
    ///
    /// Runs before any side-effecting operation: picture count first, then
    /// required text fields, then numeric parsing.
    fn validate(self) -> Result<(NewListing, Vec<ImagePayload>), AppError> {
        if self.pictures.is_empty() {
            return Err(AppError::bad_request("No pictures uploaded"));
        }
        if self.pictures.len() > MAX_PICTURES {
            return Err(AppError::bad_request(format!(
                "At most {MAX_PICTURES} pictures are allowed"
            )));
        }

        let listing = NewListing {
            username: require(self.username, "username")?,
            brand: require(self.brand, "brand")?,
            model: require(self.model, "model")?,
            color: self.color,
            description: self.description,
            model_year: parse_number(require(self.modelyear, "modelyear")?, "modelyear")?,
            price: parse_number(require(self.price, "price")?, "price")?,
        };

        Ok((listing, self.pictures))
    }
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::bad_request(format!("invalid multipart request: {err}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_empty(value).ok_or_else(|| AppError::bad_request(format!("missing required field `{field}`")))
}

fn parse_number<T: FromStr>(value: String, field: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("field `{field}` must be numeric")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use bytes::Bytes;

    fn filled_form(picture_count: usize) -> ListingForm {
        ListingForm {
            username: Some("alice".into()),
            brand: Some("Toyota".into()),
            model: Some("Corolla".into()),
            color: None,
            description: Some("one careful owner".into()),
            modelyear: Some("2020".into()),
            price: Some("15000".into()),
            pictures: (0..picture_count)
                .map(|i| ImagePayload {
                    filename: format!("img-{i}.jpg"),
                    bytes: Bytes::from_static(b"jpeg"),
                })
                .collect(),
        }
    }

    #[test]
    fn valid_form_produces_listing_and_keeps_payload_order() {
        let (listing, images) = filled_form(3).validate().unwrap();
        assert_eq!(listing.username, "alice");
        assert_eq!(listing.model_year, 2020);
        assert_eq!(listing.price, 15000.0);
        assert_eq!(listing.color, None);

        let names: Vec<&str> = images.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, ["img-0.jpg", "img-1.jpg", "img-2.jpg"]);
    }

    #[test]
    fn zero_pictures_is_rejected_before_anything_else() {
        let mut form = filled_form(0);
        // Even with every other field missing, the picture check fires first.
        form.username = None;
        form.brand = None;

        let err = form.validate().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No pictures uploaded");
    }

    #[test]
    fn more_than_ten_pictures_is_rejected() {
        let err = filled_form(11).validate().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ten_pictures_is_accepted() {
        assert!(filled_form(10).validate().is_ok());
    }

    #[test]
    fn missing_username_is_rejected() {
        let mut form = filled_form(1);
        form.username = Some("   ".into());
        let err = form.validate().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "missing required field `username`");
    }

    #[test]
    fn non_numeric_model_year_is_rejected() {
        let mut form = filled_form(1);
        form.modelyear = Some("twenty twenty".into());
        let err = form.validate().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "field `modelyear` must be numeric");
    }

    #[test]
    fn blank_query_params_count_as_missing() {
        assert_eq!(non_empty(Some(" ".into())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("alice".into())), Some("alice".into()));
    }
}
