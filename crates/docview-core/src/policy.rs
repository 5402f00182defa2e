//! Security policy evaluation for gated viewer actions
//!
//! The host supplies a partial policy object; unset fields resolve to the
//! documented defaults, so evaluation never fails. A blocked action is not an
//! error: it aborts before any side effect and surfaces as a named violation
//! through the host callback.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Access level attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Restricted,
    Confidential,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Restricted => "restricted",
            AccessLevel::Confidential => "confidential",
        }
    }
}

/// Where the watermark overlay is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    Center,
    Diagonal,
    BottomRight,
}

/// Watermark drawn over the document surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Watermark {
    pub text: String,
    pub opacity: f64,
    pub position: WatermarkPosition,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 0.1,
            position: WatermarkPosition::Diagonal,
        }
    }
}

impl Watermark {
    /// CSS fragment positioning the overlay, or `None` when there is no text.
    pub fn css_style(&self) -> Option<String> {
        if self.text.is_empty() {
            return None;
        }
        let placement = match self.position {
            WatermarkPosition::Center => "top:50%;left:50%;transform:translate(-50%,-50%)",
            WatermarkPosition::Diagonal => {
                "top:50%;left:50%;transform:translate(-50%,-50%) rotate(-45deg)"
            }
            WatermarkPosition::BottomRight => "bottom:16px;right:16px",
        };
        Some(format!(
            "position:absolute;pointer-events:none;user-select:none;opacity:{};{}",
            self.opacity, placement
        ))
    }
}

/// User actions gated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Download,
    Print,
    Copy,
    Share,
}

impl GatedAction {
    /// Violation name reported when this action is blocked.
    pub fn violation(self) -> &'static str {
        match self {
            GatedAction::Download => "Download attempt blocked",
            GatedAction::Print => "Print attempt blocked",
            GatedAction::Copy => "Copy attempt blocked",
            GatedAction::Share => "Share attempt blocked",
        }
    }
}

/// Violation reported when the viewing session times out.
pub const SESSION_TIMEOUT_VIOLATION: &str = "Session timeout";

/// Fully-resolved security policy for one viewing session. Immutable once
/// the viewer is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPolicy {
    pub allow_download: bool,
    pub allow_print: bool,
    pub allow_copy: bool,
    pub allow_share: bool,
    pub require_auth: bool,
    pub session_timeout_minutes: f64,
    pub watermark: Watermark,
    pub access_level: AccessLevel,
    pub track_viewing: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            allow_download: true,
            allow_print: true,
            allow_copy: true,
            allow_share: true,
            require_auth: false,
            session_timeout_minutes: 30.0,
            watermark: Watermark::default(),
            access_level: AccessLevel::Public,
            track_viewing: true,
        }
    }
}

impl SecurityPolicy {
    /// Resolve a partial policy against the defaults.
    pub fn merged(overrides: &PolicyOverrides) -> Self {
        let mut policy = Self::default();
        if let Some(v) = overrides.allow_download {
            policy.allow_download = v;
        }
        if let Some(v) = overrides.allow_print {
            policy.allow_print = v;
        }
        if let Some(v) = overrides.allow_copy {
            policy.allow_copy = v;
        }
        if let Some(v) = overrides.allow_share {
            policy.allow_share = v;
        }
        if let Some(v) = overrides.require_auth {
            policy.require_auth = v;
        }
        if let Some(v) = overrides.session_timeout_minutes {
            policy.session_timeout_minutes = v;
        }
        if let Some(ref v) = overrides.watermark {
            policy.watermark = v.clone();
        }
        if let Some(v) = overrides.access_level {
            policy.access_level = v;
        }
        if let Some(v) = overrides.track_viewing {
            policy.track_viewing = v;
        }
        policy
    }

    /// Whether the merged policy permits a gated action.
    pub fn can_perform(&self, action: GatedAction) -> bool {
        match action {
            GatedAction::Download => self.allow_download,
            GatedAction::Print => self.allow_print,
            GatedAction::Copy => self.allow_copy,
            GatedAction::Share => self.allow_share,
        }
    }

    /// The configured session timeout, or `None` when timeouts are disabled
    /// (a non-positive configured value disables the timer).
    pub fn session_timeout(&self) -> Option<Duration> {
        (self.session_timeout_minutes > 0.0)
            .then(|| Duration::from_secs_f64(self.session_timeout_minutes * 60.0))
    }
}

/// Partial policy supplied by the host; unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyOverrides {
    pub allow_download: Option<bool>,
    pub allow_print: Option<bool>,
    pub allow_copy: Option<bool>,
    pub allow_share: Option<bool>,
    pub require_auth: Option<bool>,
    pub session_timeout_minutes: Option<f64>,
    pub watermark: Option<Watermark>,
    pub access_level: Option<AccessLevel>,
    pub track_viewing: Option<bool>,
}

impl PolicyOverrides {
    /// Parse the policy override object the hosting page passes as JSON.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        serde_json::from_str(json).map_err(|e| ViewerError::InvalidPolicy(e.to_string()))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn maybe_bool() -> impl Strategy<Value = Option<bool>> {
        proptest::option::of(any::<bool>())
    }

    proptest! {
        /// Property: `can_perform` reflects exactly the configured boolean
        /// for every gated action, whether explicit or default-filled
        #[test]
        fn can_perform_matches_merged_policy(
            download in maybe_bool(),
            print in maybe_bool(),
            copy in maybe_bool(),
            share in maybe_bool(),
        ) {
            let overrides = PolicyOverrides {
                allow_download: download,
                allow_print: print,
                allow_copy: copy,
                allow_share: share,
                ..PolicyOverrides::default()
            };
            let policy = SecurityPolicy::merged(&overrides);
            prop_assert_eq!(policy.can_perform(GatedAction::Download), download.unwrap_or(true));
            prop_assert_eq!(policy.can_perform(GatedAction::Print), print.unwrap_or(true));
            prop_assert_eq!(policy.can_perform(GatedAction::Copy), copy.unwrap_or(true));
            prop_assert_eq!(policy.can_perform(GatedAction::Share), share.unwrap_or(true));
        }

        /// Property: merging is stable - merging the resolved policy's own
        /// field values produces the same policy
        #[test]
        fn merge_is_stable(
            download in maybe_bool(),
            auth in maybe_bool(),
            minutes in proptest::option::of(0.0f64..240.0),
            tracking in maybe_bool(),
        ) {
            let overrides = PolicyOverrides {
                allow_download: download,
                require_auth: auth,
                session_timeout_minutes: minutes,
                track_viewing: tracking,
                ..PolicyOverrides::default()
            };
            let once = SecurityPolicy::merged(&overrides);
            let again = SecurityPolicy::merged(&PolicyOverrides {
                allow_download: Some(once.allow_download),
                allow_print: Some(once.allow_print),
                allow_copy: Some(once.allow_copy),
                allow_share: Some(once.allow_share),
                require_auth: Some(once.require_auth),
                session_timeout_minutes: Some(once.session_timeout_minutes),
                watermark: Some(once.watermark.clone()),
                access_level: Some(once.access_level),
                track_viewing: Some(once.track_viewing),
            });
            prop_assert_eq!(once, again);
        }

        /// Property: policy JSON roundtrips through serde
        #[test]
        fn policy_json_roundtrip(
            download in any::<bool>(),
            copy in any::<bool>(),
            minutes in 0.0f64..240.0,
        ) {
            let policy = SecurityPolicy {
                allow_download: download,
                allow_copy: copy,
                session_timeout_minutes: minutes,
                ..SecurityPolicy::default()
            };
            let json = serde_json::to_string(&policy).unwrap();
            let restored: SecurityPolicy = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(policy, restored);
        }
    }
}
