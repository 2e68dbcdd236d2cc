//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled              |
//! |------------|-------------------------------|
//! | `schema`   | `Schema`                      |
//! | `migrate`  | `Export`, `Import`, `Migrate` |
//! | `validate` | `Validate`                    |
//! | `ping`     | `Ping`                        |
//! | `audit`    | `Audit`                       |

pub mod audit;
pub mod migrate;
pub mod ping;
pub mod schema;
pub mod validate;

pub use audit::cmd_audit;
pub use migrate::{cmd_export, cmd_import, cmd_migrate};
pub use ping::cmd_ping;
pub use schema::cmd_schema;
pub use validate::cmd_validate;
