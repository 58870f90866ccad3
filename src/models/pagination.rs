use serde::Serialize;

/// Page-number style result with totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedEntities<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page_number: i64,
    pub objects_count: i64,
    pub page_count: i64,
}

impl<T> PaginatedEntities<T> {
    /// Builds page metadata for a `limit`/`offset` window. A non-positive
    /// limit yields a single page.
    pub fn from_page(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        let (page_number, page_count) = if limit > 0 {
            (offset / limit + 1, (total + limit - 1) / limit)
        } else {
            (1, i64::from(total > 0))
        };

        Self {
            objects_count: items.len() as i64,
            items,
            total,
            page_number,
            page_count,
        }
    }

    pub fn map<U, F>(self, f: F) -> PaginatedEntities<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedEntities {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_number: self.page_number,
            objects_count: self.objects_count,
            page_count: self.page_count,
        }
    }
}

/// Cursor style result where `next`/`previous` are literal query strings
/// such as `limit=10&offset=20`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestfulPaginatedEntities<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl<T> RestfulPaginatedEntities<T> {
    pub fn from_window(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        let next = (total > offset + limit).then(|| window_query(limit, offset + limit));

        let previous = (offset > 0).then(|| {
            let previous_offset = if offset > total {
                (total - limit).max(0)
            } else {
                (offset - limit).max(0)
            };
            window_query(limit, previous_offset)
        });

        Self {
            items,
            next,
            previous,
        }
    }

    pub fn map<U, F>(self, f: F) -> RestfulPaginatedEntities<U>
    where
        F: FnMut(T) -> U,
    {
        RestfulPaginatedEntities {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
            previous: self.previous,
        }
    }
}

fn window_query(limit: i64, offset: i64) -> String {
    format!("limit={}&offset={}", limit, offset)
}
