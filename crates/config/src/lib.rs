//! Configuration loading: discovery, `${ENV}` substitution and parsing of
//! `psytech.{toml,yaml,yml,json}`.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        DATA_DIR_ENV, clear_config_dir, config_dir, discover_and_load, find_config_file,
        load_config, resolve_base_path, set_config_dir,
    },
    schema::{PsytechConfig, StorageConfig},
};
