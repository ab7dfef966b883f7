//! TUI application state and event loop.
//!
//! Design: one association query, recomputed synchronously on every change.
//! The dataset is read-only for the lifetime of the app; keys only edit the
//! query (grade band, year window, program codes, top-N, formula variant) or
//! move the cursor over the matrix.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use enrollscope_core::{
    AssociationQuery, AssociationReport, Dataset, PairAssociation, YearRange, association_matrix,
};

/// Upper bound for the `+` key.
pub const MAX_TOP_N: usize = 30;

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    dataset: Dataset,
    query: AssociationQuery,
    report: AssociationReport,
    /// Every code in the dataset, in toggle order (`1` is the first).
    all_codes: Vec<String>,
    /// Years the window may span.
    span: YearRange,
    /// Selected cell `(row, col)` in the matrix.
    cursor: (usize, usize),
    running: bool,
}

impl App {
    pub fn new(dataset: Dataset, query: AssociationQuery) -> Self {
        let all_codes: Vec<String> = dataset.codes().into_iter().collect();
        let span = dataset.year_range().unwrap_or(query.years);
        let report = association_matrix(&dataset, &query);
        Self {
            dataset,
            query,
            report,
            all_codes,
            span,
            cursor: (0, 1),
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode) {
        let n = self.report.matrix.len();
        let (start, end) = (self.query.years.start(), self.query.years.end());
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Up | KeyCode::Char('k') => self.cursor.0 = self.cursor.0.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor.0 = (self.cursor.0 + 1).min(n.saturating_sub(1));
            }
            KeyCode::Left | KeyCode::Char('h') => self.cursor.1 = self.cursor.1.saturating_sub(1),
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor.1 = (self.cursor.1 + 1).min(n.saturating_sub(1));
            }
            KeyCode::Char('g') => {
                self.query.grades = self.query.grades.next();
                self.recompute();
            }
            KeyCode::Char('v') => {
                self.query.variant = self.query.variant.next();
                self.recompute();
            }
            KeyCode::Char('[') => self.set_years(start - 1, end),
            KeyCode::Char(']') => self.set_years(start + 1, end),
            KeyCode::Char('{') => self.set_years(start, end - 1),
            KeyCode::Char('}') => self.set_years(start, end + 1),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if self.query.top_n < MAX_TOP_N {
                    self.query.top_n += 1;
                    self.recompute();
                }
            }
            KeyCode::Char('-') => {
                if self.query.top_n > 1 {
                    self.query.top_n -= 1;
                    self.recompute();
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                if let Some(code) = self.all_codes.get(idx).cloned() {
                    if !self.query.codes.remove(&code) {
                        self.query.codes.insert(code);
                    }
                    self.recompute();
                }
            }
            _ => {}
        }
    }

    /// Move the year window to `start..=end`, keeping it non-empty and
    /// inside the dataset's span.
    fn set_years(&mut self, start: i32, end: i32) {
        if start > end || start < self.span.start() || end > self.span.end() {
            return;
        }
        self.query.years = YearRange::new(start, end);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.report = association_matrix(&self.dataset, &self.query);
        let last = self.report.matrix.len().saturating_sub(1);
        self.cursor = (self.cursor.0.min(last), self.cursor.1.min(last));
        log::debug!(
            "recomputed {}x{} matrix for {:?}",
            self.report.matrix.len(),
            self.report.matrix.len(),
            self.query
        );
    }

    // --- Accessors ---

    pub fn query(&self) -> &AssociationQuery {
        &self.query
    }
    pub fn report(&self) -> &AssociationReport {
        &self.report
    }
    pub fn all_codes(&self) -> &[String] {
        &self.all_codes
    }
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// The pair under the cursor, if it is off the diagonal.
    pub fn selected_pair(&self) -> Option<&PairAssociation> {
        let (row, col) = self.cursor;
        let labels = self.report.matrix.labels();
        if row == col || row >= labels.len() || col >= labels.len() {
            return None;
        }
        self.report.pair(&labels[row], &labels[col])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
