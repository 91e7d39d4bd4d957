//! Product catalog (event-sourced).
//!
//! Only what stock availability needs: whether a product is stockable and the
//! unit symbol quantities are displayed in.

pub mod product;

pub use product::{
    ArchiveProduct, CreateProduct, DEFAULT_UOM, Product, ProductArchived, ProductCommand,
    ProductCreated, ProductEvent, ProductId, ProductKind,
};
