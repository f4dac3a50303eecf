pub mod download;
pub mod models;

pub use download::download;
pub use models::models;
