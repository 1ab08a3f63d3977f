use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operating system family the process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    TvOs,
    WatchOs,
    MacOs,
}

impl Platform {
    /// Minimum OS version on which the v2 storefront is available.
    pub fn v2_minimum(self) -> PlatformVersion {
        match self {
            Platform::Ios | Platform::TvOs => PlatformVersion::new(15, 0, 0),
            Platform::WatchOs => PlatformVersion::new(8, 0, 0),
            Platform::MacOs => PlatformVersion::new(12, 0, 0),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Ios => "ios",
            Platform::TvOs => "tvos",
            Platform::WatchOs => "watchos",
            Platform::MacOs => "macos",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" | "ipados" => Ok(Platform::Ios),
            "tvos" => Ok(Platform::TvOs),
            "watchos" => Ok(Platform::WatchOs),
            "macos" | "osx" => Ok(Platform::MacOs),
            other => Err(anyhow!("unknown platform {other:?}")),
        }
    }
}

/// `major.minor.patch` OS version; missing components default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PlatformVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for PlatformVersion {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("empty platform version");
        }
        let mut parts = [0u32; 3];
        for (idx, piece) in trimmed.split('.').enumerate() {
            if idx >= parts.len() {
                bail!("platform version {trimmed:?} has more than three components");
            }
            parts[idx] = piece.parse().map_err(|_| {
                anyhow!("invalid platform version component {piece:?} in {trimmed:?}")
            })?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Result of the v2 availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum V2Support {
    Supported,
    Unsupported,
}

impl V2Support {
    pub fn is_supported(self) -> bool {
        matches!(self, V2Support::Supported)
    }
}

/// Single point deciding whether the v2 storefront may be used at all.
pub trait CapabilityGate: Send + Sync {
    fn v2_support(&self) -> V2Support;
}

/// Gate backed by the running platform's version.
#[derive(Debug, Clone, Copy)]
pub struct SystemPlatformGate {
    platform: Platform,
    version: PlatformVersion,
}

impl SystemPlatformGate {
    pub fn new(platform: Platform, version: PlatformVersion) -> Self {
        Self { platform, version }
    }
}

impl CapabilityGate for SystemPlatformGate {
    fn v2_support(&self) -> V2Support {
        if self.version >= self.platform.v2_minimum() {
            V2Support::Supported
        } else {
            V2Support::Unsupported
        }
    }
}

/// Process-wide platform facts plus the caller's runtime v2 preference.
pub struct SystemInfo {
    platform: Platform,
    version: PlatformVersion,
    gate: Arc<dyn CapabilityGate>,
    prefer_v2: AtomicBool,
}

impl SystemInfo {
    pub fn new(platform: Platform, version: PlatformVersion, prefer_v2: bool) -> Self {
        Self {
            platform,
            version,
            gate: Arc::new(SystemPlatformGate::new(platform, version)),
            prefer_v2: AtomicBool::new(prefer_v2),
        }
    }

    /// Replace the platform gate, e.g. to force either outcome.
    pub fn with_gate(mut self, gate: Arc<dyn CapabilityGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn platform_version(&self) -> PlatformVersion {
        self.version
    }

    pub fn prefer_v2(&self) -> bool {
        self.prefer_v2.load(Ordering::Acquire)
    }

    pub fn set_prefer_v2(&self, prefer: bool) {
        self.prefer_v2.store(prefer, Ordering::Release);
    }

    pub fn v2_support(&self) -> V2Support {
        self.gate.v2_support()
    }

    /// Evaluated fresh on every call; the preference may change at runtime.
    pub fn use_v2(&self) -> bool {
        self.v2_support().is_supported() && self.prefer_v2()
    }
}

impl fmt::Debug for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemInfo")
            .field("platform", &self.platform)
            .field("version", &self.version)
            .field("v2_support", &self.v2_support())
            .field("prefer_v2", &self.prefer_v2())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_versions() {
        assert_eq!(
            "15".parse::<PlatformVersion>().unwrap(),
            PlatformVersion::new(15, 0, 0)
        );
        assert_eq!(
            "14.8.1".parse::<PlatformVersion>().unwrap(),
            PlatformVersion::new(14, 8, 1)
        );
        assert!("".parse::<PlatformVersion>().is_err());
        assert!("15.x".parse::<PlatformVersion>().is_err());
        assert!("1.2.3.4".parse::<PlatformVersion>().is_err());
    }

    #[test]
    fn gate_boundary_is_inclusive() {
        let at_min = SystemPlatformGate::new(Platform::Ios, PlatformVersion::new(15, 0, 0));
        let below = SystemPlatformGate::new(Platform::Ios, PlatformVersion::new(14, 9, 9));
        assert_eq!(at_min.v2_support(), V2Support::Supported);
        assert_eq!(below.v2_support(), V2Support::Unsupported);

        let watch = SystemPlatformGate::new(Platform::WatchOs, PlatformVersion::new(8, 0, 0));
        let mac = SystemPlatformGate::new(Platform::MacOs, PlatformVersion::new(11, 6, 0));
        assert!(watch.v2_support().is_supported());
        assert!(!mac.v2_support().is_supported());
    }

    #[test]
    fn platform_names_round_trip() {
        for platform in [
            Platform::Ios,
            Platform::TvOs,
            Platform::WatchOs,
            Platform::MacOs,
        ] {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
        assert!("android".parse::<Platform>().is_err());
    }

    #[test]
    fn gate_overrides_preference() {
        let info = SystemInfo::new(Platform::Ios, PlatformVersion::new(14, 0, 0), true);
        assert!(info.prefer_v2());
        assert!(!info.use_v2());

        let info = SystemInfo::new(Platform::Ios, PlatformVersion::new(16, 1, 0), false);
        assert!(!info.use_v2());
        info.set_prefer_v2(true);
        assert!(info.use_v2());
    }
}
