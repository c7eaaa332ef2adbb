pub mod service;

pub use service::CategoryService;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(rename = "categoryName", alias = "name")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    #[serde(rename = "categoryName", alias = "name")]
    pub name: String,
}
