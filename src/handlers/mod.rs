pub mod denuncias;
pub mod health;
pub mod pages;

pub use pages::HtmlTemplate;
