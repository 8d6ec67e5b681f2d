// src/models/college.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Represents the 'colleges' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct College {
    pub id: i64,

    /// The college-role user who manages this listing.
    pub owner_id: i64,

    pub name: String,

    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,

    /// Average rating on a 0..5 scale. Feeds the ranking boost.
    pub rating: Option<f64>,

    pub website: Option<String>,
    pub description: Option<String>,

    /// 'pending', 'active' or 'inactive'.
    pub status: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a college listing.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCollegeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub website: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

pub const DEFAULT_COUNTRY: &str = "India";

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateCollegeRequest {
        CreateCollegeRequest {
            name: "Northfield Institute".to_string(),
            city: Some("Pune".to_string()),
            state: None,
            country: None,
            rating: Some(4.2),
            website: Some("https://northfield.example.edu".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_valid_college() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rating_out_of_range() {
        let mut req = request();
        req.rating = Some(7.5);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_website() {
        let mut req = request();
        req.website = Some("not a url".to_string());
        assert!(req.validate().is_err());
    }
}
