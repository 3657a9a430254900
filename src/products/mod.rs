// Product catalog: listing, lookup, search and categories

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod view_counter;


pub use routes::products_routes;
pub use services::ProductService;
pub use view_counter::ViewCounter;
