//! Layered server configuration.
//!
//! Configuration is merged field-by-field from four tiers, lowest first:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/rdbms-config/config.yaml`
//! 3. **User** - `~/.rdbms-config/config.yaml`
//! 4. **Environment** - `RDBMS_CONFIG_*` variables
//!
//! ## Environment Variables
//! - `RDBMS_CONFIG_PATH` - Explicit config file (replaces all file tiers)
//! - `RDBMS_CONFIG_PROJECT_DIR` - Project config dir (default: `./rdbms-config`)
//! - `RDBMS_CONFIG_USER_DIR` - User config dir (default: `~/.rdbms-config`)
//! - `RDBMS_CONFIG_DB_PATH` - Database path
//! - `RDBMS_CONFIG_TABLE` - Configuration table name
//! - `RDBMS_CONFIG_BUSY_TIMEOUT_MS` - Busy timeout in milliseconds
//! - `RDBMS_CONFIG_MALFORMED_SOURCE` - `skip` or `abort`

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
