//! Backend selection from the installed `sdcctl` version.
//!
//! `sdcctl --version` prints a token like `1.4-23`. Releases before 1.4-23
//! only speak the legacy etcd (v2) API; everything from 1.4-23 on uses etcdv3.

use std::fmt;
use std::process::Command;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::resolver::FetchMode;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.\d+-\d+").unwrap());

/// Which backend client the adapter talks to. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Legacy etcd: no batch reads, every scoped candidate is fetched alone.
    Etcd,
    /// etcdv3: all scoped candidates go out in one request.
    EtcdV3,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Etcd => "etcd",
            BackendKind::EtcdV3 => "etcdv3",
        }
    }

    pub fn fetch_mode(self) -> FetchMode {
        match self {
            BackendKind::Etcd => FetchMode::PerCandidate,
            BackendKind::EtcdV3 => FetchMode::Batched,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "etcd" => Ok(BackendKind::Etcd),
            "etcdv3" => Ok(BackendKind::EtcdV3),
            other => Err(StoreError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// Parsed `sdcctl` version: `<main>-<minor>`, e.g. `1.4-23`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdcVersion {
    /// Decimal main version (`1.4`).
    pub main: f64,
    /// Build number after the dash (`23`).
    pub minor: u32,
}

impl SdcVersion {
    /// Extract the first `<digits>.<digits>-<digits>` token from `output`.
    pub fn parse(output: &str) -> Result<Self, StoreError> {
        let token = VERSION_RE.find(output).map(|m| m.as_str()).ok_or_else(|| {
            StoreError::VersionDetection(format!("no version token in {:?}", output.trim()))
        })?;

        let (main, minor) = token
            .split_once('-')
            .ok_or_else(|| StoreError::VersionDetection(format!("malformed version {:?}", token)))?;
        let main: f64 = main
            .parse()
            .map_err(|e| StoreError::VersionDetection(format!("main version {:?}: {}", main, e)))?;
        let minor: u32 = minor
            .parse()
            .map_err(|e| StoreError::VersionDetection(format!("minor version {:?}: {}", minor, e)))?;

        Ok(Self { main, minor })
    }

    pub fn backend(&self) -> BackendKind {
        if self.main < 1.4 || (self.main == 1.4 && self.minor < 23) {
            BackendKind::Etcd
        } else {
            BackendKind::EtcdV3
        }
    }
}

impl fmt::Display for SdcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.main, self.minor)
    }
}

/// Source of the raw version text.
pub trait VersionProbe: Send + Sync {
    fn version_output(&self) -> Result<String, StoreError>;
}

/// Runs an external command and returns stdout followed by stderr.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandProbe {
    fn default() -> Self {
        Self::new("sdcctl", ["--version"])
    }
}

impl VersionProbe for CommandProbe {
    fn version_output(&self) -> Result<String, StoreError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| StoreError::VersionDetection(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            warn!("{} {:?} exited with {}", self.program, self.args, output.status);
            return Err(StoreError::VersionDetection(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

/// Run the probe once and decide the backend.
pub fn select_backend(probe: &dyn VersionProbe) -> Result<(BackendKind, SdcVersion), StoreError> {
    let output = probe.version_output()?;
    let version = SdcVersion::parse(&output)?;
    let kind = version.backend();
    info!("sdcctl version {} → {} backend", version, kind);
    Ok((kind, version))
}
