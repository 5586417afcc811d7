//! Profile and label axes.
//!
//! An axis is the ordered, duplicate-free list of values a request accepts
//! along one dimension. `None` is the default sentinel: it matches rows whose
//! column is NULL and always ranks after the explicitly requested values.

/// Profile name that callers use to refer to the default profile.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Ordered, duplicate-free set of accepted values for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Axis {
    values: Vec<Option<String>>,
}

impl Axis {
    /// Build an axis from values in priority order, keeping the first
    /// occurrence of each.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut axis = Self::default();
        for value in values {
            axis.push(value);
        }
        axis
    }

    fn push(&mut self, value: Option<String>) {
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    /// Position of `value` on this axis, `None` if the axis does not accept it.
    pub fn rank(&self, value: Option<&str>) -> Option<usize> {
        self.values.iter().position(|v| v.as_deref() == value)
    }

    pub fn contains(&self, value: Option<&str>) -> bool {
        self.rank(value).is_some()
    }

    /// Explicit (non-default) values in priority order.
    pub fn named(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|v| v.as_deref())
    }

    /// Whether the default sentinel is on this axis.
    pub fn includes_default(&self) -> bool {
        self.values.iter().any(Option::is_none)
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }
}

/// Split a comma-delimited profile argument into the requested profile list.
///
/// Elements are trimmed and empty elements dropped. `"default"` is kept
/// verbatim here; it is only normalized when building the axis.
pub fn split_profiles(profile: &str) -> Vec<String> {
    profile
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the profile axis for a requested profile list.
///
/// `"default"` becomes the default sentinel, and the sentinel is appended as
/// the final fallback.
pub fn profile_axis(profiles: &[String]) -> Axis {
    let requested = profiles.iter().map(|p| {
        if p == DEFAULT_PROFILE_NAME {
            None
        } else {
            Some(p.clone())
        }
    });
    Axis::from_values(requested.chain(std::iter::once(None)))
}

/// Normalize a requested label. Blank labels mean "no label".
pub fn normalize_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Build the label axis: the requested label followed by the default branch.
pub fn label_axis(label: Option<&str>) -> Axis {
    Axis::from_values([normalize_label(label), None])
}
