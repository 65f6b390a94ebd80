use serde::Deserialize;

use crate::error::ApiError;

/// Common `?page=&limit=` query parameters, 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}
fn default_limit() -> u32 {
    20
}

impl PageQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page < 1 || self.limit < 1 {
            return Err(ApiError::BadRequest(
                "Page and limit must be positive integers".into(),
            ));
        }
        Ok(())
    }

    // Client-supplied values; widen before multiplying.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total_items: i64) -> i64 {
        let limit = self.limit as i64;
        total_items / limit + i64::from(total_items % limit > 0)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_page_1_limit_20() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 20);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn zero_page_or_limit_is_rejected() {
        let q = PageQuery { page: 0, limit: 20 };
        assert!(q.validate().is_err());
        let q = PageQuery { page: 1, limit: 0 };
        assert!(q.validate().is_err());
    }

    #[test]
    fn offset_does_not_overflow_on_huge_pages() {
        let q = PageQuery {
            page: 4,
            limit: 2_000_000_000,
        };
        assert_eq!(q.offset(), 6_000_000_000);
        let q = PageQuery {
            page: u32::MAX,
            limit: u32::MAX,
        };
        assert_eq!(
            q.offset(),
            (i64::from(u32::MAX) - 1) * i64::from(u32::MAX)
        );
    }

    #[test]
    fn offset_and_total_pages() {
        let q = PageQuery { page: 3, limit: 10 };
        assert_eq!(q.offset(), 20);
        assert_eq!(q.total_pages(0), 0);
        assert_eq!(q.total_pages(10), 1);
        assert_eq!(q.total_pages(11), 2);
        assert_eq!(q.total_pages(30), 3);
    }
}
