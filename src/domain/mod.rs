pub mod engagement;
pub mod friendship;
pub mod notification;
pub mod page;
pub mod post;
pub mod user;
