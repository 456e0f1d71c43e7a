use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog movie record
///
/// Catalog rows are maintained out of band; this service only reads them,
/// either for listing or for resolving recommended titles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub year: i32,
    /// Catalog-wide average rating, not a per-user score
    pub rating: Option<f64>,
    pub language: Option<String>,
    pub director: Option<String>,
    pub actors: Option<Vec<String>>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl Movie {
    /// Creates a catalog entry with only the required fields set
    pub fn new(title: impl Into<String>, genre: impl Into<String>, year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            genre: genre.into(),
            year,
            rating: None,
            language: None,
            director: None,
            actors: None,
            image: None,
            description: None,
        }
    }
}
