use clustering::{ClusterFeature, FeatureKey};

/// Keyboard focus over a reading-ordered feature list.
///
/// The focus is stored by feature identity, not by position, so it follows a
/// feature across re-queries as long as the feature stays in the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusCursor {
    focused: Option<FeatureKey>,
}

impl FocusCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<FeatureKey> {
        self.focused
    }

    pub fn set(&mut self, key: FeatureKey) {
        self.focused = Some(key);
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    fn position(&self, features: &[ClusterFeature]) -> Option<usize> {
        let key = self.focused?;
        features.iter().position(|f| f.key() == key)
    }

    /// Moves to the next feature, wrapping. With nothing focused the first
    /// feature is taken.
    pub fn next(&mut self, features: &[ClusterFeature]) -> Option<FeatureKey> {
        if features.is_empty() {
            self.focused = None;
            return None;
        }
        let i = match self.position(features) {
            Some(i) => (i + 1) % features.len(),
            None => 0,
        };
        self.focused = Some(features[i].key());
        self.focused
    }

    /// Moves to the previous feature, wrapping. With nothing focused the last
    /// feature is taken.
    pub fn prev(&mut self, features: &[ClusterFeature]) -> Option<FeatureKey> {
        if features.is_empty() {
            self.focused = None;
            return None;
        }
        let i = match self.position(features) {
            Some(0) | None => features.len() - 1,
            Some(i) => i - 1,
        };
        self.focused = Some(features[i].key());
        self.focused
    }

    /// Drops the focus if its feature is gone. Returns `true` if it was dropped.
    pub fn retain(&mut self, features: &[ClusterFeature]) -> bool {
        if self.focused.is_some() && self.position(features).is_none() {
            self.focused = None;
            return true;
        }
        false
    }
}
