mod movie;
mod profile;
mod rating;

pub use movie::Movie;
pub use profile::{Profile, QuizResponse, WatchedMovie};
pub use rating::{validate_stars, MovieRating, RatedMovie};
