pub mod cli;
pub mod cocktaildb;
pub mod commands;
pub mod db;
pub mod measure;
pub mod models;
pub mod reviews;
pub mod scrape;
pub mod signals;
pub mod util;
