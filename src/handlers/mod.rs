pub mod auth;
pub mod gallery;
pub mod photo;
pub mod resources;
pub mod user;
