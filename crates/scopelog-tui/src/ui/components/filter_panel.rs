use ratatui::{
    Frame,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use scopelog_engine::LogEngine;
use scopelog_types::{Severity, SeveritySelector, Target};

use crate::ui::{Layout, Theme};

/// "ALL" plus one column per level
const COLUMNS: usize = Severity::ALL_LEVELS.len() + 1;
const CELL_WIDTH: usize = 5;
const HEADER_LABEL: &str = "all namespaces";

/// Cursor position and visibility of the namespace x severity grid
///
/// Row 0 is the "all namespaces" header, rows 1.. follow the engine's
/// namespace order. Column 0 is "ALL", columns 1.. follow display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterPanelState {
    visible: bool,
    row: usize,
    col: usize,
}

impl FilterPanelState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// `(row, column)` of the highlighted cell
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    pub fn move_down(&mut self, namespace_count: usize) {
        if self.row < namespace_count {
            self.row += 1;
        }
    }

    pub fn move_left(&mut self) {
        self.col = self.col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.col + 1 < COLUMNS {
            self.col += 1;
        }
    }

    /// Toggle arguments for the cell under the cursor
    pub fn selection(&self, namespaces: &[String]) -> Option<(Target, SeveritySelector)> {
        Some((row_target(self.row, namespaces)?, column_selector(self.col)?))
    }

    /// Toggle the cell under the cursor; false if the cursor is off the grid
    pub fn toggle(&self, engine: &mut LogEngine) -> bool {
        let selection = self.selection(engine.namespaces());
        match selection {
            Some((target, selector)) => {
                engine.toggle_value(target, selector);
                true
            }
            None => false,
        }
    }
}

fn row_target(row: usize, namespaces: &[String]) -> Option<Target> {
    match row {
        0 => Some(Target::AllNamespaces),
        n => namespaces.get(n - 1).map(Target::namespace),
    }
}

fn column_selector(col: usize) -> Option<SeveritySelector> {
    match col {
        0 => Some(SeveritySelector::All),
        n => Severity::ALL_LEVELS
            .get(n - 1)
            .copied()
            .map(SeveritySelector::Level),
    }
}

/// Whether a grid cell renders as checked
///
/// Header cells are checked only when every namespace has the level (or ALL);
/// namespace cells follow that namespace's mask.
pub fn is_checked(engine: &LogEngine, target: &Target, selector: SeveritySelector) -> bool {
    let total = engine.namespaces().len();
    let selection = engine.selection_counts();
    match (target, selector) {
        (Target::AllNamespaces, SeveritySelector::All) => selection.is_all_selected(total),
        (Target::AllNamespaces, SeveritySelector::Level(level)) => {
            selection.is_level_selected(level, total)
        }
        (Target::Namespace(namespace), SeveritySelector::All) => {
            engine.current_filter_state().mask(namespace).is_all()
        }
        (Target::Namespace(namespace), SeveritySelector::Level(level)) => {
            engine.is_enabled(namespace, level)
        }
    }
}

/// Floating namespace x severity grid
pub struct FilterPanel;

impl FilterPanel {
    pub fn render(frame: &mut Frame, state: &FilterPanelState, engine: &LogEngine) {
        if !state.is_visible() {
            return;
        }

        let namespaces = engine.namespaces();
        let label_width = namespaces
            .iter()
            .map(|ns| ns.width())
            .chain(std::iter::once(HEADER_LABEL.width()))
            .max()
            .unwrap_or(0);

        let width = label_width + 2 + COLUMNS * CELL_WIDTH + 4;
        let height = namespaces.len() + 2 + 4;
        let area = Layout::popup(frame.area(), width as u16, height as u16);

        frame.render_widget(Clear, area);

        let mut lines = Vec::with_capacity(namespaces.len() + 4);

        // Column titles
        let mut titles = vec![Span::raw(" ".repeat(label_width + 2))];
        titles.push(Span::styled(center("ALL", CELL_WIDTH), Theme::title()));
        for level in Severity::ALL_LEVELS {
            titles.push(Span::styled(
                center(level.as_str(), CELL_WIDTH),
                Theme::severity(level),
            ));
        }
        lines.push(Line::from(titles));

        for row in 0..=namespaces.len() {
            let Some(target) = row_target(row, namespaces) else {
                continue;
            };
            let label = match &target {
                Target::AllNamespaces => {
                    Span::styled(pad(HEADER_LABEL, label_width), Theme::text_highlight())
                }
                Target::Namespace(ns) => {
                    let color = engine
                        .colors_enabled()
                        .then(|| engine.namespace_color(ns))
                        .flatten();
                    Span::styled(pad(ns, label_width), Theme::namespace(color))
                }
            };

            let mut spans = vec![label, Span::raw("  ")];
            for col in 0..COLUMNS {
                let Some(selector) = column_selector(col) else {
                    continue;
                };
                let checked = is_checked(engine, &target, selector);
                let style: Style = if state.cursor() == (row, col) {
                    Theme::cell_cursor()
                } else if checked {
                    Theme::cell_checked()
                } else {
                    Theme::cell_unchecked()
                };
                let mark = if checked { "[x]" } else { "[ ]" };
                spans.push(Span::styled(center(mark, CELL_WIDTH), style));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "h/j/k/l move  Space toggle  Esc close",
            Theme::text_dim(),
        )));

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(" Filters ", Theme::title())),
        );

        frame.render_widget(panel, area);
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn center(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    let left = fill / 2;
    format!(
        "{}{}{}",
        " ".repeat(left),
        text,
        " ".repeat(fill - left)
    )
}
