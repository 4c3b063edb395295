//! Repository implementations backed by PostgreSQL.

pub mod item;

pub use item::ItemRepository;
