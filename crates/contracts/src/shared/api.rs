use serde::{Deserialize, Serialize};

/// Ссылка на соседнюю страницу
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

/// Блок пагинации: `next` / `prev` присутствуют, только если страница существует
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn build(page: u64, limit: u64, total: u64) -> Self {
        let start = page.saturating_sub(1).saturating_mul(limit);
        Self {
            next: (start.saturating_add(limit) < total).then_some(PageRef {
                page: page.saturating_add(1),
                limit,
            }),
            prev: (start > 0).then_some(PageRef {
                page: page - 1,
                limit,
            }),
        }
    }
}

/// Страница результатов списка
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn pagination(&self) -> Pagination {
        Pagination::build(self.page, self.limit, self.total)
    }
}

/// Ответ со списком: `{ success, count, total, pagination, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn from_page<S: Into<T>>(page: Page<S>) -> Self {
        let pagination = page.pagination();
        let data: Vec<T> = page.items.into_iter().map(Into::into).collect();
        Self {
            success: true,
            count: data.len(),
            total: page.total,
            pagination,
            query: None,
            data,
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }
}

/// Список без пагинации: `{ success, count, data }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ItemsResponse<T> {
    pub fn new<S: Into<T>>(items: Vec<S>) -> Self {
        let data: Vec<T> = items.into_iter().map(Into::into).collect();
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Ответ с одной сущностью: `{ success, message?, data? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Тело ответа об ошибке
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_first_page() {
        let p = Pagination::build(1, 10, 25);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn test_pagination_last_page() {
        let p = Pagination::build(3, 10, 25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn test_pagination_exact_fit() {
        let p = Pagination::build(1, 10, 10);
        assert_eq!(p, Pagination::default());
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let p = Pagination::build(u64::MAX, 50, 10);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: u64::MAX - 1, limit: 50 }));
    }
}
