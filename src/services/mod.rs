pub mod auth;
pub mod gallery;
pub mod naming;
pub mod photo;
pub mod resources;
pub mod retention;
pub mod user;

pub use auth::AuthService;
pub use gallery::GalleryService;
pub use photo::PhotoService;
pub use resources::ResourceService;
pub use retention::RetentionService;
pub use user::UserService;
