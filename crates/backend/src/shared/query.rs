//! Разбор параметров списков: страница, лимит, сортировка

pub const MAX_LIMIT: u64 = 50;

/// SQLite хранит OFFSET как знаковое 64-битное целое
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Проверенные параметры страницы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    /// `page >= 1`, `1 <= limit <= 50`; отсутствующие значения берутся по умолчанию
    pub fn parse(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Result<Self, String> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err("Page must be a positive integer".into());
        }
        let limit = limit.unwrap_or(default_limit);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("Limit must be between 1 and {}", MAX_LIMIT));
        }
        // offset = (page - 1) * limit must stay representable
        let fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| offset <= MAX_OFFSET);
        if !fits {
            return Err("Page is out of range".into());
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Сортировка вида `field` / `-field`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<'a> {
    pub field: &'a str,
    pub descending: bool,
}

impl<'a> SortSpec<'a> {
    pub fn parse(
        raw: Option<&'a str>,
        default: &'a str,
        allowed: &[&str],
    ) -> Result<Self, String> {
        let raw = raw.unwrap_or(default);
        if !allowed.contains(&raw) {
            return Err("Invalid sort field".into());
        }
        Ok(match raw.strip_prefix('-') {
            Some(field) => Self {
                field,
                descending: true,
            },
            None => Self {
                field: raw,
                descending: false,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_bounds() {
        let p = PageParams::parse(None, None, 12).unwrap();
        assert_eq!(p, PageParams { page: 1, limit: 12 });
        assert_eq!(p.offset(), 0);

        let p = PageParams::parse(Some(3), Some(10), 12).unwrap();
        assert_eq!(p.offset(), 20);

        assert!(PageParams::parse(Some(0), None, 12).is_err());
        assert!(PageParams::parse(None, Some(51), 12).is_err());
        assert!(PageParams::parse(None, Some(0), 12).is_err());
    }

    #[test]
    fn test_page_offset_overflow_rejected() {
        assert!(PageParams::parse(Some(u64::MAX), None, 12).is_err());
        assert!(PageParams::parse(Some(u64::MAX / 10), Some(50), 12).is_err());
        assert!(PageParams::parse(Some(1_844_674_407_370_955_161), None, 12).is_err());

        let last = MAX_OFFSET / 50 + 1;
        let p = PageParams::parse(Some(last), Some(50), 12).unwrap();
        assert!(p.offset() <= MAX_OFFSET);
        assert!(PageParams::parse(Some(last + 1), Some(50), 12).is_err());
    }

    #[test]
    fn test_sort_parse() {
        let allowed = ["price", "-price", "createdAt", "-createdAt"];
        let s = SortSpec::parse(None, "-createdAt", &allowed).unwrap();
        assert_eq!(s.field, "createdAt");
        assert!(s.descending);

        let s = SortSpec::parse(Some("price"), "-createdAt", &allowed).unwrap();
        assert_eq!(s.field, "price");
        assert!(!s.descending);

        assert!(SortSpec::parse(Some("views"), "-createdAt", &allowed).is_err());
    }
}
