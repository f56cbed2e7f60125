//! src/services/listing_service.rs
//!
//! ListingService — car listing operations backed by MongoDB for the
//! per-user documents and the remote media store for image payloads. One
//! document per username holds that user's ordered car records; creation
//! appends, deletion pulls by uuid. There is no cross-request locking:
//! two concurrent creates for the same username race on read-then-append
//! and the last write wins at the persistence layer.

use crate::{
    models::{
        car::{Car, UserCarsDocument},
        picture::Picture,
    },
    services::media_service::{CloudinaryClient, ImagePayload, MediaError, upload_all},
};
use mongodb::{
    Collection, Database,
    bson::{doc, to_bson},
    options::ReturnDocument,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("no document for username `{0}`")]
    UserNotFound(String),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
    #[error("encoding car record: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),
}

pub type ListingResult<T> = Result<T, ListingError>;

/// Validated fields of a new car listing, before images are uploaded.
#[derive(Clone, Debug)]
pub struct NewListing {
    pub username: String,
    pub brand: String,
    pub model: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub model_year: i32,
    pub price: f64,
}

/// ListingService provides the three listing operations:
/// - Create a listing (uploads images, then appends a car record)
/// - Find a user's document by username
/// - Remove one car record by uuid
///
/// The MongoDB handle is created once at startup and passed in; the
/// service holds no other state and is cheap to clone into handlers.
#[derive(Clone)]
pub struct ListingService {
    /// Full database handle, kept for readiness pings.
    db: Database,

    /// Typed view of the per-user car documents collection.
    cars: Collection<UserCarsDocument>,

    /// Remote media store used for image uploads.
    media: CloudinaryClient,
}

impl ListingService {
    /// Create a new ListingService on the given database and media client.
    pub fn new(db: Database, media: CloudinaryClient) -> Self {
        let cars = db.collection::<UserCarsDocument>("cars");
        Self { db, cars, media }
    }

    /// Round-trip a `ping` command to verify the document store is up.
    pub async fn ping(&self) -> ListingResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Upload all images, then append a new car record to the user's
    /// document, creating the document on first submission.
    ///
    /// Uploads run concurrently; the stored picture order matches the
    /// submitted order. Any upload or persistence failure fails the whole
    /// operation — images already accepted by the media store are left
    /// orphaned there.
    pub async fn create_listing(
        &self,
        listing: NewListing,
        images: Vec<ImagePayload>,
    ) -> ListingResult<()> {
        let pictures = upload_all(&self.media, images).await?;
        let username = listing.username.clone();
        let car = build_car(listing, pictures);

        match self.cars.find_one(doc! { "username": &username }).await? {
            Some(_) => {
                self.cars
                    .update_one(
                        doc! { "username": &username },
                        doc! { "$push": { "carsData": to_bson(&car)? } },
                    )
                    .await?;
            }
            None => {
                self.cars
                    .insert_one(UserCarsDocument {
                        id: None,
                        username: username.clone(),
                        cars_data: vec![car],
                    })
                    .await?;
            }
        }

        debug!("appended car listing for `{username}`");
        Ok(())
    }

    /// Fetch the full document for a username.
    ///
    /// Returns UserNotFound if the user has never submitted a listing; an
    /// empty document is never synthesized.
    pub async fn find_by_username(&self, username: &str) -> ListingResult<UserCarsDocument> {
        self.cars
            .find_one(doc! { "username": username })
            .await?
            .ok_or_else(|| ListingError::UserNotFound(username.to_string()))
    }

    /// Pull the car matching `uuid` out of the user's document and return
    /// the updated document.
    ///
    /// A uuid with no matching car is a silent no-op: the update matches
    /// the document, pulls nothing, and the unchanged document is
    /// returned. Only a missing username is an error.
    pub async fn remove_car(
        &self,
        username: &str,
        uuid: &str,
    ) -> ListingResult<UserCarsDocument> {
        self.cars
            .find_one_and_update(
                doc! { "username": username },
                doc! { "$pull": { "carsData": { "uuid": uuid } } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ListingError::UserNotFound(username.to_string()))
    }
}

/// Assemble the stored car record: fresh v4 uuid plus the validated
/// fields and the uploaded picture references.
fn build_car(listing: NewListing, pictures: Vec<Picture>) -> Car {
    Car {
        uuid: Uuid::new_v4().to_string(),
        brand: listing.brand,
        model: listing.model,
        color: listing.color,
        description: listing.description,
        model_year: listing.model_year,
        price: listing.price,
        pictures,
    }
}
