pub mod config;

pub use config::{output_dir_from_env, EdinetConfig};
