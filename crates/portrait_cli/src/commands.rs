pub mod config;
pub mod db;
pub mod run;
pub mod user;
