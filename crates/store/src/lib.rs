//! Persistence for users (with embedded address documents) and products.
//!
//! Backed by SQLite through `sqlx`; queryable fields live in columns while
//! the address list is kept as an embedded JSON document, mirroring the
//! document-store shape of the data.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod db;
pub mod error;
pub mod product;
pub mod user;

pub use {
    db::Store,
    error::StoreError,
    product::{NewProduct, Product, ProductPage, ProductQuery, ProductSort},
    user::{Address, NewAddress, NewUser, ProfilePatch, User},
};
