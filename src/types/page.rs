use serde::{Deserialize, Serialize};

/// Largest page size the service accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page-size configuration for list operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Number of records requested per page, clamped to [`MAX_PAGE_SIZE`].
    pub page_size: u32,
}

impl PageConfig {
    /// Create a page configuration, clamping oversized requests.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// The largest page the service will serve.
    pub fn max() -> Self {
        Self::new(MAX_PAGE_SIZE)
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::new(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_oversized_pages() {
        assert_eq!(PageConfig::new(10_000).page_size, MAX_PAGE_SIZE);
        assert_eq!(PageConfig::new(10).page_size, 10);
    }

    #[test]
    fn max_is_max() {
        assert_eq!(PageConfig::max().page_size, MAX_PAGE_SIZE);
    }
}
