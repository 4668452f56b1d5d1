//! Include/exclude name filtering shared by every extractor.
//!
//! Names match case-insensitively and exactly; there is no glob support.
//! A name on both lists is excluded.

/// Decide whether `name` survives the include/exclude lists.
pub fn should_include(name: &str, include: &[String], exclude: &[String]) -> bool {
    FilterPolicy::new(include, exclude).includes(name)
}

/// Pre-lowered include/exclude lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPolicy {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FilterPolicy {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().map(|s| s.to_lowercase()).collect(),
            exclude: exclude.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// A policy that keeps everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    fn in_include(&self, lowered: &str) -> bool {
        self.include.iter().any(|n| n == lowered)
    }

    fn in_exclude(&self, lowered: &str) -> bool {
        self.exclude.iter().any(|n| n == lowered)
    }

    /// Table/view rule.
    pub fn includes(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        if !self.exclude.is_empty() && self.in_exclude(&name) {
            return false;
        }
        if !self.include.is_empty() && !self.in_include(&name) {
            return false;
        }
        true
    }

    /// Foreign-key rule: either side may satisfy the include list, and
    /// either side on the exclude list drops the key.
    pub fn includes_relation(&self, owning: &str, referenced: &str) -> bool {
        let owning = owning.to_lowercase();
        let referenced = referenced.to_lowercase();
        if !self.exclude.is_empty() && (self.in_exclude(&owning) || self.in_exclude(&referenced)) {
            return false;
        }
        if !self.include.is_empty() && !self.in_include(&owning) && !self.in_include(&referenced) {
            return false;
        }
        true
    }
}
