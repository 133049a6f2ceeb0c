pub mod product;

pub use product::{
    GetProductById, ListActiveProducts, ListActiveProductsByCategory, ProductSnapshot,
};
