//! Driver configuration: an optional JSON file, overridden by CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use cinder_world::TickConfig;

#[derive(Parser, Debug, Default)]
#[command(name = "cinder", about = "Load assets through the cinder pipeline headlessly")]
pub struct Args {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to mount as the first file source
    #[arg(short, long)]
    pub data_root: Option<PathBuf>,

    /// Stop after this many ticks (0 runs until loading finishes)
    #[arg(short, long)]
    pub ticks: Option<u64>,

    /// Ticks per second
    #[arg(long)]
    pub tick_rate: Option<f64>,

    /// Multiplier applied to every tick delta
    #[arg(long)]
    pub time_scale: Option<f64>,

    /// Stop after this many ticks without loading progress (0 waits forever)
    #[arg(long)]
    pub settle_ticks: Option<u64>,

    /// Asset paths to load, relative to the mounted sources
    pub assets: Vec<String>,
}

/// An image/palette pair shown while loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingScreen {
    pub image: String,
    pub palette: String,
}

/// Everything the driver needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tick: TickConfig,
    pub time_scale: f64,
    /// Ticks without stage movement before the run gives up.
    pub settle_ticks: u64,
    pub data_root: Option<PathBuf>,
    /// Extra sources (archives or directories) mounted after `data_root`.
    pub sources: Vec<PathBuf>,
    pub assets: Vec<String>,
    pub loading_screen: Option<LoadingScreen>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick: TickConfig::default(),
            time_scale: 1.0,
            settle_ticks: 120,
            data_root: None,
            sources: Vec::new(),
            assets: Vec::new(),
            loading_screen: None,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load the file named by `--config`, if any, then apply the flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: &Args) {
        if let Some(root) = &args.data_root {
            self.data_root = Some(root.clone());
        }
        if let Some(ticks) = args.ticks {
            self.tick.max_ticks = ticks;
        }
        if let Some(rate) = args.tick_rate {
            self.tick.tick_rate = rate;
        }
        if let Some(scale) = args.time_scale {
            self.time_scale = scale;
        }
        if let Some(settle) = args.settle_ticks {
            self.settle_ticks = settle;
        }
        self.assets.extend(args.assets.iter().cloned());
    }
}
