pub mod types;
pub mod crypto;
pub mod utils;
pub mod pagination;
