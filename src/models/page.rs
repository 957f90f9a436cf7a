use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Zero-based page number plus a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    number: i64,
    size: i64,
}

impl PageParams {
    pub fn new(number: i64, size: i64) -> Result<Self, PageParamsError> {
        if number < 0 {
            Err(PageParamsError::NegativePageNumber(number))
        } else if size <= 0 {
            Err(PageParamsError::NonPositivePageSize(size))
        } else {
            Ok(Self { number, size })
        }
    }

    pub const fn number(&self) -> i64 {
        self.number
    }

    pub const fn size(&self) -> i64 {
        self.size
    }

    pub const fn offset(&self) -> i64 {
        self.number * self.size
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            number: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Error, Debug)]
pub enum PageParamsError {
    #[error("Page number must not be negative, got {0}")]
    NegativePageNumber(i64),
    #[error("Page size must be positive, got {0}")]
    NonPositivePageSize(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    page_number: i64,
    page_size: i64,
    total_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: PageParams, total_elements: i64) -> Self {
        Self {
            content,
            page_number: params.number(),
            page_size: params.size(),
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub const fn page_number(&self) -> i64 {
        self.page_number
    }

    pub const fn page_size(&self) -> i64 {
        self.page_size
    }

    pub const fn total_elements(&self) -> i64 {
        self.total_elements
    }

    pub const fn total_pages(&self) -> i64 {
        if self.total_elements == 0 {
            0
        } else {
            (self.total_elements + self.page_size - 1) / self.page_size
        }
    }

    pub const fn is_first(&self) -> bool {
        self.page_number == 0
    }

    pub const fn is_last(&self) -> bool {
        self.page_number >= self.total_pages() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_reject_negative_page_number() {
        assert!(matches!(
            PageParams::new(-1, 10),
            Err(PageParamsError::NegativePageNumber(-1))
        ));
    }

    #[test]
    fn page_params_reject_non_positive_page_size() {
        assert!(matches!(
            PageParams::new(0, 0),
            Err(PageParamsError::NonPositivePageSize(0))
        ));
        assert!(matches!(
            PageParams::new(0, -5),
            Err(PageParamsError::NonPositivePageSize(-5))
        ));
    }

    #[test]
    fn offset_is_page_number_times_size() {
        let params = PageParams::new(3, 25).unwrap();
        assert_eq!(params.offset(), 75);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PageParams::new(0, 10).unwrap();
        let page = Page::new(vec![1, 2, 3], params, 21);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn total_pages_is_zero_for_no_elements() {
        let params = PageParams::new(0, 10).unwrap();
        let page = Page::new(Vec::<i32>::new(), params, 0);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_empty());
        assert!(page.is_first());
        assert!(page.is_last());
    }

    #[test]
    fn last_page_is_detected() {
        let params = PageParams::new(2, 10).unwrap();
        let page = Page::new(vec![1], params, 21);
        assert!(!page.is_first());
        assert!(page.is_last());

        let params = PageParams::new(1, 10).unwrap();
        let page = Page::new(vec![1; 10], params, 21);
        assert!(!page.is_last());
    }

    #[test]
    fn map_preserves_paging_metadata() {
        let params = PageParams::new(1, 2).unwrap();
        let page = Page::new(vec![1, 2], params, 5).map(|n| n.to_string());
        assert_eq!(page.content(), ["1", "2"]);
        assert_eq!(page.page_number(), 1);
        assert_eq!(page.page_size(), 2);
        assert_eq!(page.total_elements(), 5);
        assert_eq!(page.total_pages(), 3);
    }
}
