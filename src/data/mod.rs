/// Data layer: core types, import, storage, filtering and pagination.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → typed rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store   │  Tables (duplicate skip) ⇄ JSON snapshot
///   └──────────┘
///        │  count / fetch
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter  │ ───► │   page   │  window against total → Page
///   └──────────┘      └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod page;
pub mod store;
