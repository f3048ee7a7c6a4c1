pub mod cache;
pub mod normalizer;
pub mod resolver;
pub mod router;
