pub mod collector;
pub mod config;
pub mod db;
pub mod http;
pub mod repositories;
