//! Chromium provisioning: where the browser binary lives and how to start it.
//!
//! On a workstation the backend can auto-detect Chrome. Function hosts with a
//! read-only filesystem and no user namespaces need an explicit binary and a
//! sandbox-less, single-process switch set, which [`Provision::serverless`]
//! supplies.

use crate::LaunchConfig;
use std::path::PathBuf;

/// Switches for sandbox-less, read-only function hosts.
const SERVERLESS_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--no-zygote",
    "--single-process",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--hide-scrollbars",
    "--mute-audio",
    "--no-first-run",
    "--disable-extensions",
    "--disable-background-networking",
    "--font-render-hinting=none",
    "--force-color-profile=srgb",
];

/// Executable location and launch arguments for the browser
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provision {
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub sandbox: bool,
}

impl Provision {
    /// Auto-detected browser with the OS sandbox on.
    pub fn local() -> Self {
        Self {
            executable: None,
            args: Vec::new(),
            sandbox: true,
        }
    }

    /// Preset for serverless function hosts.
    pub fn serverless() -> Self {
        Self {
            executable: None,
            args: SERVERLESS_ARGS.iter().map(|s| s.to_string()).collect(),
            sandbox: false,
        }
    }

    pub fn with_executable(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.executable = path;
        }
        self
    }

    /// Append user-supplied switches after the preset, skipping duplicates.
    pub fn with_args<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in extra {
            let arg = arg.into();
            if !self.args.contains(&arg) {
                self.args.push(arg);
            }
        }
        self
    }

    /// Fold this provision into a launch configuration.
    pub fn apply(self, launch: &mut LaunchConfig) {
        launch.executable = self.executable;
        launch.args = self.args;
        launch.sandbox = self.sandbox;
    }
}
