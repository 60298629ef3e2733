//! HTTP backend that turns a fitness intake profile into a calorie and macro
//! plan, either from a fixed mock or an OpenAI-compatible completion service,
//! and records the results in Postgres when storage is available.

pub mod api;
pub mod coach;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod openai_client;
pub mod storage;
