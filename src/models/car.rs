//! Represents car listings and the per-user document that holds them.

use crate::models::picture::Picture;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A single car listing inside a user's document.
///
/// Records are append-only: a car is created once with a server-generated
/// uuid and removed as a whole, never mutated in place.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Car {
    /// Server-generated v4 UUID, assigned once at creation. Unique within
    /// one user's list by generation randomness (not checked).
    pub uuid: String,

    /// Manufacturer name.
    pub brand: String,

    /// Model name.
    pub model: String,

    /// Optional exterior color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Model year as submitted on the form.
    pub model_year: i32,

    /// Asking price as submitted on the form.
    pub price: f64,

    /// Hosted images, in the order they were submitted.
    pub pictures: Vec<Picture>,
}

/// The per-username document holding all of one user's car listings.
///
/// Created lazily on the user's first submission. `cars_data` preserves
/// insertion order across reads and deletions.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserCarsDocument {
    /// MongoDB document id; absent until the document is first inserted.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Unique key across all documents in the collection.
    pub username: String,

    /// Ordered car listings for this user.
    #[serde(rename = "carsData", default)]
    pub cars_data: Vec<Car>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_car() -> Car {
        Car {
            uuid: "11111111-2222-3333-4444-555555555555".into(),
            brand: "Toyota".into(),
            model: "Corolla".into(),
            color: None,
            description: None,
            model_year: 2020,
            price: 15000.0,
            pictures: vec![Picture {
                url: "https://cdn.example/cars/a.jpg".into(),
                public_id: "cars/a".into(),
            }],
        }
    }

    #[test]
    fn cars_field_serializes_as_cars_data() {
        let doc = UserCarsDocument {
            id: None,
            username: "alice".into(),
            cars_data: vec![sample_car()],
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["carsData"].as_array().unwrap().len(), 1);
        assert!(value.get("_id").is_none(), "unset _id must be omitted");
        assert!(value.get("cars_data").is_none());
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let value = serde_json::to_value(sample_car()).unwrap();
        assert!(value.get("color").is_none());
        assert!(value.get("description").is_none());
        assert_eq!(value["pictures"][0]["public_id"], "cars/a");
    }

    #[test]
    fn document_deserializes_with_missing_cars_data() {
        let doc: UserCarsDocument =
            serde_json::from_value(json!({"username": "bob"})).unwrap();
        assert_eq!(doc.username, "bob");
        assert!(doc.cars_data.is_empty());
    }
}
