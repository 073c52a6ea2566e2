pub mod generate;
pub mod health;
pub mod search_image;
