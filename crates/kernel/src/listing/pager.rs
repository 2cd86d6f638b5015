//! Page and page-size coercion.
//!
//! Paging input is advisory: anything malformed falls back to a safe value
//! instead of failing the request.

/// Upper bound on rows per page unless configured otherwise.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Rows per page when the resource does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-indexed page number, always >= 1.
    pub page: u32,

    /// Rows per page, always within `[1, max]`.
    pub page_size: u32,

    /// Whether the requested size was outside the allowed range.
    pub clamped: bool,
}

impl PageWindow {
    /// Resolve raw `page` / `pageSize` values.
    ///
    /// `page` below 1 or unparseable becomes 1. `page_size` missing or
    /// unparseable becomes `default_size`; values outside `[1, max]` are
    /// clamped into it.
    pub fn resolve(page: Option<&str>, page_size: Option<&str>, default_size: u32, max: u32) -> Self {
        let max = max.max(1);

        let page = page
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(|p| p.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        let requested = page_size.and_then(|raw| raw.trim().parse::<i64>().ok());
        let (page_size, clamped) = match requested {
            Some(size) if size < 1 => (1, true),
            Some(size) if size > i64::from(max) => (max, true),
            Some(size) => (size as u32, false),
            None => (default_size.clamp(1, max), false),
        };

        Self {
            page,
            page_size,
            clamped,
        }
    }

    /// Rows to skip: `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Total pages for `total` rows: `ceil(total / page_size)`, 0 when empty.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
