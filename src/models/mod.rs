pub mod photo;
pub mod resource;
pub mod user;

pub use photo::*;
pub use resource::*;
pub use user::*;
