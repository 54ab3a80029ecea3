//! Page-number pagination over ordered post sequences.
//!
//! Page requests come straight from the `?page=` query parameter, so the
//! paginator never fails on user input:
//! - absent or non-integer values resolve to page 1
//! - integers below 1 or past the last page resolve to the last page
//!
//! An empty sequence still has one (empty) page.

use serde::Serialize;
use std::num::NonZeroUsize;

/// Posts per page used when nothing is configured.
const DEFAULT_PER_PAGE: usize = 10;

/// Resolved position of a page inside a sequence of `count` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    /// Index of the first item of this page in the full sequence.
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    /// Number of items that fall on this page.
    pub fn len(&self) -> usize {
        self.count
            .saturating_sub(self.offset())
            .min(self.per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroUsize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            per_page: NonZeroUsize::new(DEFAULT_PER_PAGE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Paginator {
    pub fn new(per_page: NonZeroUsize) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> usize {
        self.per_page.get()
    }

    /// Total number of pages; never zero.
    pub fn num_pages(&self, count: usize) -> usize {
        if count == 0 {
            1
        } else {
            count.div_ceil(self.per_page())
        }
    }

    /// Resolve a raw `?page=` value against a sequence of `count` items.
    pub fn resolve(&self, raw: Option<&str>, count: usize) -> PageWindow {
        let num_pages = self.num_pages(count);
        let number = match parse_page_number(raw) {
            PageNumber::Valid(n) if n >= 1 && (n as usize) <= num_pages => n as usize,
            PageNumber::Valid(_) | PageNumber::OutOfRange => num_pages,
            PageNumber::Invalid => 1,
        };

        PageWindow {
            number,
            num_pages,
            count,
            per_page: self.per_page(),
        }
    }

    /// Paginate a sequence that is already fully in memory.
    pub fn page_of<T: Clone>(&self, items: &[T], raw: Option<&str>) -> Page<T> {
        let window = self.resolve(raw, items.len());
        let start = window.offset();
        let slice = items[start..start + window.len()].to_vec();
        Page::new(window, slice)
    }
}

enum PageNumber {
    Valid(i64),
    /// Well-formed integer that does not fit in an `i64`.
    OutOfRange,
    Invalid,
}

fn parse_page_number(raw: Option<&str>) -> PageNumber {
    let Some(raw) = raw.map(str::trim) else {
        return PageNumber::Invalid;
    };

    match raw.parse::<i64>() {
        Ok(n) => PageNumber::Valid(n),
        Err(_) => {
            let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                PageNumber::OutOfRange
            } else {
                PageNumber::Invalid
            }
        }
    }
}

/// One page of a feed plus the metadata needed to render navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    /// Total number of items across all pages.
    pub count: usize,
    pub per_page: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    /// 1-based index of the first item on this page (0 when empty).
    pub start_index: usize,
    /// 1-based index of the last item on this page.
    pub end_index: usize,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        let start_index = if window.count == 0 {
            0
        } else {
            window.offset() + 1
        };

        Self {
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            per_page: window.per_page,
            has_next,
            has_previous,
            next_page_number: has_next.then(|| window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
            start_index,
            end_index: window.offset() + items.len(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
            has_next: self.has_next,
            has_previous: self.has_previous,
            next_page_number: self.next_page_number,
            previous_page_number: self.previous_page_number,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}
