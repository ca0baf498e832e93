pub mod db;

pub use db::{PgCatalog, PgStore};
