//! ProductService: product use cases and payload validation.

mod product;
mod validation;
pub use product::ProductService;
pub use validation::{RequestValidator, DESCRIPTION_MAX_LENGTH, NAME_MAX_LENGTH};
