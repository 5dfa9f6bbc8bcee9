use serde::{Deserialize, Serialize};

/// Number of listings requested per feed page.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSize(pub u16);

impl PageSize {
    pub const MAX: u16 = 100;

    /// Clamp into `1..=MAX`, the range the feed endpoint accepts.
    pub fn clamped(size: u16) -> Self {
        Self(size.clamp(1, Self::MAX))
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_accepted_range() {
        assert_eq!(PageSize::clamped(0), PageSize(1));
        assert_eq!(PageSize::clamped(500), PageSize(PageSize::MAX));
        assert_eq!(PageSize::clamped(20), PageSize::default());
    }
}
