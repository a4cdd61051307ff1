// ─── OS Rule Evaluation ───

use serde::Deserialize;

use crate::core::platform::{PlatformDescriptor, LEGACY_MACOS_NAME};

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    #[serde(alias = "deny")]
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryRule {
    pub fn allow(os: Option<&str>) -> Self {
        Self::new(RuleAction::Allow, os)
    }

    pub fn disallow(os: Option<&str>) -> Self {
        Self::new(RuleAction::Disallow, os)
    }

    fn new(action: RuleAction, os: Option<&str>) -> Self {
        Self {
            action,
            os: os.map(|name| OsRule {
                name: Some(name.to_string()),
            }),
        }
    }

    fn matches(&self, platform: &PlatformDescriptor) -> bool {
        match self.os.as_ref().and_then(|os| os.name.as_deref()) {
            None => true, // No OS constraint → rule applies universally
            Some(name) => platform.os_family.matches_name(name),
        }
    }
}

/// Decide whether a rule list admits `platform`.
///
/// - No rules → allowed.
/// - Otherwise start disallowed and walk the rules top-to-bottom; every rule
///   that matches overwrites the state with its action.
/// - The state after the last rule is the answer. This is last-match-wins:
///   an earlier unconditional `allow` is overridden by a later matching
///   `disallow`.
pub fn applies(rules: &[LibraryRule], platform: &PlatformDescriptor) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        if rule.matches(platform) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

/// `natives-<os><arch>`, e.g. `natives-linux` or `natives-macos-arm64`.
pub fn native_classifier_key(platform: &PlatformDescriptor) -> String {
    format!("natives-{}{}", platform.os_family, platform.arch_suffix)
}

/// The `natives-osx<arch>` key older descriptors use on macOS.
pub fn legacy_classifier_key(platform: &PlatformDescriptor) -> String {
    format!("natives-{}{}", LEGACY_MACOS_NAME, platform.arch_suffix)
}
