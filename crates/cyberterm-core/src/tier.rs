#![forbid(unsafe_code)]

//! Device tiers.
//!
//! A [`DeviceTier`] is a coarse capability class computed once per session
//! from host-probed [`Capabilities`]. Subsystems never probe the environment;
//! they receive the tier as plain configuration and scale their decorative
//! work from it.
//!
//! # Precedence
//!
//! When several signals apply, the most constrained tier wins:
//! `low-resource` overrides `mobile` overrides `tablet` overrides `full`.
//! A narrow viewport on a battery-saving device is therefore `low-resource`,
//! never `mobile`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Viewports narrower than this are `mobile`.
pub const MOBILE_MAX_WIDTH: u32 = 767;
/// Viewports narrower than this (and not mobile) are `tablet`.
pub const TABLET_MAX_WIDTH: u32 = 1023;
/// Hosts with this many hardware threads or fewer are `low-resource`.
pub const LOW_RESOURCE_MAX_THREADS: u32 = 2;

/// Coarse device capability class, fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceTier {
    /// Desktop-class device: every effect at base frequency.
    #[default]
    Full,
    /// Mid-width viewport: longer periods, heavy effects off.
    Tablet,
    /// Narrow viewport: longest periods, only light effects.
    Mobile,
    /// Constrained device: no decorative work at all.
    LowResource,
}

/// Host-probed environment facts used to pick a tier.
///
/// Fields default to the most capable values, so an empty probe yields
/// [`DeviceTier::Full`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Viewport width in CSS pixels (`None` when unknown).
    pub viewport_width: Option<u32>,
    /// Battery saver / low-power mode is active.
    pub battery_saver: bool,
    /// The user asked for reduced motion.
    pub reduced_motion: bool,
    /// Reported hardware concurrency (`None` when unknown).
    pub hardware_threads: Option<u32>,
    /// The host reported memory pressure.
    pub low_memory: bool,
}

impl DeviceTier {
    /// Every tier, most capable first.
    pub const ALL: [Self; 4] = [Self::Full, Self::Tablet, Self::Mobile, Self::LowResource];

    /// Classify probed capabilities, applying the documented precedence.
    #[must_use]
    pub fn classify(caps: &Capabilities) -> Self {
        let constrained = caps.battery_saver
            || caps.reduced_motion
            || caps.low_memory
            || caps
                .hardware_threads
                .is_some_and(|threads| threads <= LOW_RESOURCE_MAX_THREADS);
        let tier = if constrained {
            Self::LowResource
        } else {
            match caps.viewport_width {
                Some(width) if width <= MOBILE_MAX_WIDTH => Self::Mobile,
                Some(width) if width <= TABLET_MAX_WIDTH => Self::Tablet,
                _ => Self::Full,
            }
        };
        tracing::debug!(target: "cyberterm.tier", ?caps, %tier, "device tier classified");
        tier
    }

    /// Capability rank: `Full` is highest, `LowResource` is zero.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Full => 3,
            Self::Tablet => 2,
            Self::Mobile => 1,
            Self::LowResource => 0,
        }
    }

    /// Whether this tier is at least as capable as `minimum`.
    #[must_use]
    pub const fn meets(self, minimum: Self) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Whether decorative subsystems run at all.
    #[must_use]
    pub const fn decorative_enabled(self) -> bool {
        !matches!(self, Self::LowResource)
    }

    /// Whether text reveals animate (otherwise they use skip mode).
    #[must_use]
    pub const fn animates_text(self) -> bool {
        self.decorative_enabled()
    }

    /// Multiplier applied to decorative periods, in percent.
    ///
    /// `None` means the tier runs no decorative work.
    #[must_use]
    pub const fn period_percent(self) -> Option<u32> {
        match self {
            Self::Full => Some(100),
            Self::Tablet => Some(150),
            Self::Mobile => Some(200),
            Self::LowResource => None,
        }
    }

    /// Scale a base period for this tier.
    #[must_use]
    pub fn scale_period(self, base: Duration) -> Option<Duration> {
        self.period_percent()
            .map(|percent| base.saturating_mul(percent) / 100)
    }

    /// Stable lowercase name, as used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
            Self::LowResource => "low-resource",
        }
    }
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTierError {
    input: String,
}

impl fmt::Display for ParseTierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown device tier {:?} (expected full, tablet, mobile, or low-resource)",
            self.input
        )
    }
}

impl std::error::Error for ParseTierError {}

impl FromStr for DeviceTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "full" | "desktop" => Ok(Self::Full),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            "low-resource" | "low" => Ok(Self::LowResource),
            _ => Err(ParseTierError {
                input: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(width: u32) -> Capabilities {
        Capabilities {
            viewport_width: Some(width),
            ..Capabilities::default()
        }
    }

    #[test]
    fn empty_probe_is_full() {
        assert_eq!(DeviceTier::classify(&Capabilities::default()), DeviceTier::Full);
    }

    #[test]
    fn viewport_breakpoints() {
        assert_eq!(DeviceTier::classify(&caps(375)), DeviceTier::Mobile);
        assert_eq!(DeviceTier::classify(&caps(767)), DeviceTier::Mobile);
        assert_eq!(DeviceTier::classify(&caps(768)), DeviceTier::Tablet);
        assert_eq!(DeviceTier::classify(&caps(1023)), DeviceTier::Tablet);
        assert_eq!(DeviceTier::classify(&caps(1024)), DeviceTier::Full);
    }

    #[test]
    fn low_resource_overrides_mobile() {
        let probe = Capabilities {
            battery_saver: true,
            ..caps(375)
        };
        assert_eq!(DeviceTier::classify(&probe), DeviceTier::LowResource);

        let probe = Capabilities {
            hardware_threads: Some(2),
            ..caps(1920)
        };
        assert_eq!(DeviceTier::classify(&probe), DeviceTier::LowResource);

        let probe = Capabilities {
            hardware_threads: Some(8),
            ..caps(1920)
        };
        assert_eq!(DeviceTier::classify(&probe), DeviceTier::Full);
    }

    #[test]
    fn reduced_motion_is_low_resource() {
        let probe = Capabilities {
            reduced_motion: true,
            ..Capabilities::default()
        };
        assert_eq!(DeviceTier::classify(&probe), DeviceTier::LowResource);
    }

    #[test]
    fn meets_follows_rank() {
        assert!(DeviceTier::Full.meets(DeviceTier::Tablet));
        assert!(DeviceTier::Tablet.meets(DeviceTier::Tablet));
        assert!(!DeviceTier::Mobile.meets(DeviceTier::Tablet));
        assert!(!DeviceTier::LowResource.meets(DeviceTier::Mobile));
    }

    #[test]
    fn period_scaling() {
        let base = Duration::from_millis(1000);
        assert_eq!(DeviceTier::Full.scale_period(base), Some(base));
        assert_eq!(
            DeviceTier::Tablet.scale_period(base),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            DeviceTier::Mobile.scale_period(base),
            Some(Duration::from_millis(2000))
        );
        assert_eq!(DeviceTier::LowResource.scale_period(base), None);
    }

    #[test]
    fn parse_and_display_agree() {
        for tier in DeviceTier::ALL {
            assert_eq!(tier.to_string().parse::<DeviceTier>(), Ok(tier));
        }
        assert_eq!("LOW_RESOURCE".parse(), Ok(DeviceTier::LowResource));
        assert!("laptop".parse::<DeviceTier>().is_err());
    }
}
