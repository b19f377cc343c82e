use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::block::Title;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, OverlayState};
use crate::highlight::build_highlight_regex;
use crate::list::{Chrome, InputField, ShoppingList, SubmitMode};
use crate::storage::KeyValueStore;

const DELETE_MARKER: &str = " ✕";

pub fn draw_app<S: KeyValueStore>(
    frame: &mut Frame,
    list: &ShoppingList<S>,
    state: &AppState,
    list_state: &mut ListState,
) {
    let palette = state.palette;
    let chrome = list.chrome();
    let filter_height = if chrome.contains(Chrome::FILTER) { 3 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(filter_height),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let focus_style = |pane: FocusPane| {
        if state.focus == pane {
            Style::default().fg(palette.accent)
        } else {
            Style::default()
        }
    };

    let input_border = if list.submit_mode() == SubmitMode::Update {
        Style::default().fg(palette.editing)
    } else {
        focus_style(FocusPane::Input)
    };
    let input = Paragraph::new(list.input().value().to_string()).block(
        Block::default()
            .title("Item")
            .title(
                Title::from(Span::styled(
                    format!("[{}]", list.submit_mode()),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Right),
            )
            .borders(Borders::ALL)
            .border_style(input_border),
    );
    frame.render_widget(input, rows[0]);

    if chrome.contains(Chrome::FILTER) {
        let filter = Paragraph::new(state.filter_input.value().to_string()).block(
            Block::default()
                .title("Filter Items")
                .borders(Borders::ALL)
                .border_style(focus_style(FocusPane::Filter)),
        );
        frame.render_widget(filter, rows[1]);
    }

    let highlight_regex = build_highlight_regex(list.filter().as_str());
    let highlight_style = Style::default()
        .fg(palette.highlight)
        .add_modifier(Modifier::BOLD);
    let delete_style = Style::default().fg(palette.danger);

    let mut items = Vec::new();
    for idx in list.visible_indices() {
        let entry = &list.entries()[idx];
        let mut spans = Vec::new();
        if list.edit_target() == Some(idx) {
            spans.push(Span::styled(
                "✎ ",
                Style::default()
                    .fg(palette.editing)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.extend(highlight_line(
            entry.text(),
            highlight_regex.as_ref(),
            highlight_style,
            Style::default(),
        ));
        spans.push(Span::styled(DELETE_MARKER, delete_style));
        items.push(ListItem::new(Line::from(spans)));
    }
    if items.is_empty() {
        let placeholder = if list.is_empty() {
            "Your list is empty. Type an item above and press Enter."
        } else {
            "No items match the filter."
        };
        items.push(ListItem::new(Span::styled(
            placeholder,
            Style::default().fg(palette.muted),
        )));
    }

    let list_widget = List::new(items)
        .block(
            Block::default()
                .title(format!("Shopping List ({})", list.len()))
                .borders(Borders::ALL)
                .border_style(focus_style(FocusPane::List)),
        )
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list_widget, rows[2], list_state);

    let footer = Paragraph::new(vec![
        build_hint_line(state.focus, chrome, palette.danger),
        Line::from(Span::styled(
            state.status_message.clone().unwrap_or_default(),
            Style::default().fg(palette.muted),
        )),
    ]);
    frame.render_widget(footer, rows[3]);

    match state.focus {
        FocusPane::Input => place_cursor(frame, list.input(), rows[0]),
        FocusPane::Filter if chrome.contains(Chrome::FILTER) => {
            place_cursor(frame, &state.filter_input, rows[1])
        }
        _ => {}
    }

    render_overlay(frame, state);
}

fn build_hint_line(focus: FocusPane, chrome: Chrome, danger: Color) -> Line<'static> {
    let hint = match focus {
        FocusPane::Input => "Enter submit • Esc cancel edit / go to list • Tab switch",
        FocusPane::List => "j/k move • e edit • d delete • / filter • a add • q quit",
        FocusPane::Filter => "type to filter • Esc/Enter back to list",
    };
    let mut spans = vec![Span::raw(hint)];
    if chrome.contains(Chrome::CLEAR_ALL) && focus == FocusPane::List {
        spans.push(Span::raw(" • "));
        spans.push(Span::styled(
            "C Clear All",
            Style::default().fg(danger).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn place_cursor(frame: &mut Frame, field: &InputField, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let offset = u16::try_from(UnicodeWidthStr::width(field.before_cursor())).unwrap_or(u16::MAX);
    let max_x = area.x.saturating_add(area.width - 2);
    let x = area.x.saturating_add(1).saturating_add(offset).min(max_x);
    frame.set_cursor(x, area.y.saturating_add(1));
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    if let Some(re) = regex {
        let mut spans = Vec::new();
        let mut last = 0;
        for mat in re.find_iter(text) {
            if mat.start() > last {
                spans.push(Span::styled(
                    text[last..mat.start()].to_string(),
                    base_style,
                ));
            }
            spans.push(Span::styled(mat.as_str().to_string(), highlight_style));
            last = mat.end();
        }
        if last < text.len() {
            spans.push(Span::styled(text[last..].to_string(), base_style));
        }
        if spans.is_empty() {
            spans.push(Span::styled(text.to_string(), base_style));
        }
        spans
    } else {
        vec![Span::styled(text.to_string(), base_style)]
    }
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match &state.overlay {
        Some(OverlayState::ConfirmDelete(ticket)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Remove Item",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Are you sure you want to remove '{}'?", ticket.text())),
                Line::from(""),
                Line::from(Span::styled(
                    "y/Enter to remove • n/Esc to keep",
                    Style::default().fg(state.palette.muted),
                )),
            ])
            .block(
                Block::default()
                    .title("Confirm Delete")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(state.palette.danger)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
