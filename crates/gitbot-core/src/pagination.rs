use crate::models::CommentRecord;

/// Comments shown per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Longest comment body rendered before truncation, in characters
pub const MAX_BODY_CHARS: usize = 500;

/// Appended to bodies cut at [`MAX_BODY_CHARS`]
pub const TRUNCATION_MARKER: &str = "...";

/// Shown in place of an empty comment body
pub const EMPTY_BODY: &str = "*No content*";

/// One rendered comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// `author - YYYY-MM-DD`
    pub label: String,
    pub body: String,
}

/// Display payload for the visible page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    /// 1-based page number
    pub page: usize,
    pub total_pages: usize,
    pub entries: Vec<PageEntry>,
    /// 1-based index of the first comment shown
    pub first: usize,
    /// 1-based index of the last comment shown
    pub last: usize,
    pub total: usize,
    pub can_go_prev: bool,
    pub can_go_next: bool,
}

impl CommentPage {
    pub fn title(&self) -> String {
        format!("💬 Comments - Page {}/{}", self.page, self.total_pages)
    }

    pub fn footer(&self) -> String {
        format!("Showing {}-{} of {}", self.first, self.last, self.total)
    }

    /// Same page with both navigation controls turned off
    pub fn disabled(self) -> Self {
        Self {
            can_go_prev: false,
            can_go_next: false,
            ..self
        }
    }
}

/// Navigation request from a page control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Prev => "prev",
            Direction::Next => "next",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prev" => Some(Direction::Prev),
            "next" => Some(Direction::Next),
            _ => None,
        }
    }
}

/// Outcome of a navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Cursor moved; the new page must replace the old one
    Rendered(CommentPage),
    /// Already at the boundary; acknowledge without re-rendering
    Unchanged,
}

/// Cursor over a fixed, non-empty list of comments
#[derive(Debug, Clone)]
pub struct PaginationController {
    records: Vec<CommentRecord>,
    page_size: usize,
    current_page: usize,
}

impl PaginationController {
    /// Create a controller positioned on the first page.
    ///
    /// Returns `None` for an empty list or a zero page size; callers report
    /// "no comments" instead of constructing one.
    pub fn new(records: Vec<CommentRecord>, page_size: usize) -> Option<Self> {
        if records.is_empty() || page_size == 0 {
            return None;
        }
        Some(Self {
            records,
            page_size,
            current_page: 0,
        })
    }

    /// Create a controller with [`DEFAULT_PAGE_SIZE`]
    pub fn with_default_page_size(records: Vec<CommentRecord>) -> Option<Self> {
        Self::new(records, DEFAULT_PAGE_SIZE)
    }

    /// Zero-based index of the visible page
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.records.len().div_ceil(self.page_size)
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page + 1 < self.total_pages()
    }

    pub fn go_prev(&mut self) -> Navigation {
        if !self.can_go_prev() {
            return Navigation::Unchanged;
        }
        self.current_page -= 1;
        Navigation::Rendered(self.render_page())
    }

    pub fn go_next(&mut self) -> Navigation {
        if !self.can_go_next() {
            return Navigation::Unchanged;
        }
        self.current_page += 1;
        Navigation::Rendered(self.render_page())
    }

    pub fn navigate(&mut self, direction: Direction) -> Navigation {
        match direction {
            Direction::Prev => self.go_prev(),
            Direction::Next => self.go_next(),
        }
    }

    /// Render the visible page
    pub fn render_page(&self) -> CommentPage {
        let start = self.current_page * self.page_size;
        let end = (start + self.page_size).min(self.records.len());

        let entries = self.records[start..end]
            .iter()
            .map(|record| PageEntry {
                label: format!("{} - {}", record.author, record.created_at.format("%Y-%m-%d")),
                body: render_body(&record.body),
            })
            .collect();

        CommentPage {
            page: self.current_page + 1,
            total_pages: self.total_pages(),
            entries,
            first: start + 1,
            last: end,
            total: self.records.len(),
            can_go_prev: self.can_go_prev(),
            can_go_next: self.can_go_next(),
        }
    }
}

/// Truncate a body to [`MAX_BODY_CHARS`] characters, marking the cut
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}{}", &body[..cut], TRUNCATION_MARKER),
        None => body.to_string(),
    }
}

fn render_body(body: &str) -> String {
    if body.is_empty() {
        EMPTY_BODY.to_string()
    } else {
        truncate_body(body)
    }
}
