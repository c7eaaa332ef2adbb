pub mod category;
pub mod collector;
pub mod feed;
