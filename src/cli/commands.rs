// ============================================================
// Layer 1 — CLI Modes and Config Locations
// ============================================================
// Defines the four pipeline modes and where each one finds
// its JSON config.
//
// clap's ValueEnum derive generates:
//   - the list of accepted values shown in --help
//   - a usage error + non-zero exit for unknown modes
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::{Path, PathBuf};

use clap::ValueEnum;

pub const DEFAULT_CONFIG_DIR: &str = "config";

/// One pipeline stage per invocation
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Load, label and split the raw dataset
    #[value(name = "process_data")]
    ProcessData,

    /// Fine-tune the classifier and save the best model
    #[value(name = "train")]
    Train,

    /// Evaluate the trained model and optionally publish it
    #[value(name = "test")]
    Test,

    /// Download the published model and classify typed reviews
    #[value(name = "inference")]
    Inference,
}

impl Mode {
    /// File name of this mode's config under the config directory.
    pub fn config_file(self) -> &'static str {
        match self {
            Mode::ProcessData => "preprocessing_config.json",
            Mode::Train       => "training_config.json",
            Mode::Test        => "testing_config.json",
            Mode::Inference   => "inference_config.json",
        }
    }

    pub fn config_path(self, config_dir: &Path) -> PathBuf {
        config_dir.join(self.config_file())
    }
}
