use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::persistence::SnapshotFile;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/dump.json";
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "respkv", version, about = "A minimal RESP key-value server")]
pub struct Config {
    /// The port to listen on
    #[arg(short, long, env = "RESPKV_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The address to bind to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// JSON file the store is loaded from at startup and written to on SAVE and shutdown
    #[arg(short, long, env = "RESPKV_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// Never read or write the snapshot file
    #[arg(long)]
    pub in_memory: bool,

    /// Largest amount of buffered bytes a connection may hold before a frame completes
    #[arg(long, env = "MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl Config {
    pub fn from_args() -> Config {
        Self::from_args_or_default(std::env::args_os())
    }

    /// Parses the command line. Invalid arguments are reported and the defaults are used
    /// instead, only `--help` and `--version` end the process.
    pub fn from_args_or_default<I, T>(args: I) -> Config
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Config::try_parse_from(args) {
            Ok(config) => config,
            Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                err.exit()
            }
            Err(err) => {
                let _ = err.print();
                Config::default()
            }
        }
    }

    pub fn snapshot_file(&self) -> Option<SnapshotFile> {
        if self.in_memory {
            None
        } else {
            Some(SnapshotFile::new(&self.snapshot))
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            in_memory: false,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
