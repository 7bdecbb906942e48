//! Relational storage on libsql.
//!
//! - [`turso`]: the client, schema, and user/article/simulation records
//! - [`likes`]: the like ledger
//! - [`provider`]: choosing between in-memory, file and remote Turso backends

pub mod likes;
pub mod provider;
pub mod turso;

pub use likes::LikeLedger;
pub use provider::DatabaseProvider;
pub use turso::TursoClient;
