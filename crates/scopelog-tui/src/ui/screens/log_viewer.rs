use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use scopelog_engine::{Decorated, LogEngine, RecordBuffer, SegmentStyle, SinkRecord};
use scopelog_types::{Rgb, Severity};

use crate::app::AppState;
use crate::ui::components::{StatusBar, filter_panel_hints, log_viewer_hints};
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(
        frame: &mut Frame,
        state: &mut AppState,
        engine: &LogEngine,
        records: &RecordBuffer,
    ) {
        let (header, content, status) = Layout::main(frame.area());

        Self::render_header(frame, header, engine, records);
        Self::render_logs(frame, content, state, records);
        Self::render_status_bar(frame, status, state, records);
    }

    fn render_header(frame: &mut Frame, area: Rect, engine: &LogEngine, records: &RecordBuffer) {
        let counts = records.level_counts();

        let mut spans = vec![
            Span::styled("scopelog", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("{} namespaces", engine.namespaces().len()),
                Theme::text(),
            ),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(engine.storage_key().to_string(), Theme::text_highlight()),
        ];
        for level in Severity::ALL_LEVELS {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(
                format!("{} {}", level.as_str(), counts.get(level)),
                Theme::severity(level),
            ));
        }
        if !engine.colors_enabled() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("monochrome", Theme::text_dim()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, records: &RecordBuffer) {
        let total = records.len();

        // Calculate visible area (accounting for border)
        let inner_height = area.height.saturating_sub(2) as usize;

        // Auto-scroll: if at bottom, stay at bottom
        let max_scroll = total.saturating_sub(inner_height);
        if state.ui_state.auto_scroll {
            state.ui_state.log_scroll = max_scroll;
        }
        if state.ui_state.log_scroll > max_scroll {
            state.ui_state.log_scroll = max_scroll;
        }

        let lines: Vec<Line> = records
            .range(state.ui_state.log_scroll, inner_height)
            .iter()
            .map(record_line)
            .collect();

        let title = if state.ui_state.auto_scroll {
            format!(" Output ({}) [follow] ", total)
        } else {
            format!(" Output ({}) ", total)
        };

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state =
                ScrollbarState::new(max_scroll).position(state.ui_state.log_scroll);
            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, records: &RecordBuffer) {
        let hints = if state.panel.is_visible() {
            filter_panel_hints()
        } else {
            log_viewer_hints()
        };

        let bar = StatusBar::new()
            .hints(hints)
            .right(format!("{} lines", records.len()));
        frame.render_widget(bar, area);
    }
}

/// One output row: severity badge followed by the decorated line
pub fn record_line(record: &SinkRecord) -> Line<'static> {
    let mut spans = vec![
        Span::styled(record.severity.as_str(), Theme::severity(record.severity)),
        Span::raw(" "),
    ];

    match &record.line {
        Decorated::Plain(_) => {
            spans.push(Span::styled(record.line.render_plain(), Theme::text()));
        }
        Decorated::Styled(styled) => {
            for segment in styled.segments() {
                let style = segment.style.map(segment_style).unwrap_or_else(Theme::text);
                spans.push(Span::styled(segment.text, style));
            }
        }
    }

    Line::from(spans)
}

/// Terminal style for a `%c` directive
///
/// Pure black is the console's default text colour and maps to the terminal
/// foreground so INFO lines stay readable on dark backgrounds.
fn segment_style(style: SegmentStyle) -> Style {
    let base = if style.color == Rgb::new(0, 0, 0) {
        Theme::text()
    } else {
        Style::default().fg(Color::from(style.color))
    };
    if style.bold {
        base.add_modifier(Modifier::BOLD)
    } else {
        base
    }
}
