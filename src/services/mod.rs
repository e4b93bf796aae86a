pub mod recommendation;

pub use recommendation::RecommendationService;
