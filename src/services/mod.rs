pub mod listing_service;
pub mod media_service;
