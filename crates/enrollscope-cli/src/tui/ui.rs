//! TUI rendering: association heatmap with a pair inspector.
//!
//! ┌──────────────────────────────────────────────────────────────┐
//! │  🎓 Enrollscope   2016–2022 · High school only · plain · 12  │
//! ├──────────────────────────────────────┬───────────────────────┤
//! │        1     2     3     4           │  Crew × Chorus        │
//! │  1 Crew      1.00  0.16  0.05  …     │  V = 0.1617           │
//! │  2 Chorus    0.16  1.00  0.21  …     │  χ² = 0.94  p = 0.33  │
//! │  3 Robotics  0.05  0.21  1.00  …     │       in B   not B    │
//! │  …                                   ├───────────────────────┤
//! │                                      │  [x] 1 A  Arts (A)    │
//! ├──────────────────────────────────────┴───────────────────────┤
//! │  ←↑↓→ cell  g grades  [ ] { } years  1-9 codes  v  +/-  q    │
//! └──────────────────────────────────────────────────────────────┘

use super::app::App;
use enrollscope_core::{annotation, code_label, matrix::HEATMAP_COLOR_RANGE};
use ratatui::{prelude::*, widgets::*};

/// Row label width inside the heatmap table.
const LABEL_WIDTH: u16 = 24;
/// Width of each value column.
const CELL_WIDTH: u16 = 5;

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // main
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_main(f, rows[1], app);
    draw_keys(f, rows[2]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let q = app.query();
    let report = app.report();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🎓 Enrollscope ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(
                format!("  {}–{}", q.years.start(), q.years.end()),
                Style::default().bold().fg(Color::Yellow),
            ),
            Span::raw(format!("  {}  ", q.grades.label())),
            Span::styled(q.variant.as_str(), Style::default().fg(Color::Magenta)),
            Span::styled(
                format!(
                    "  top {}  {} enrollments  {} students ",
                    q.top_n, report.filtered_enrollments, report.universe_size
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    draw_heatmap(f, cols[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(cols[1]);

    draw_pair(f, right[0], app);
    draw_codes(f, right[1], app);
}

fn draw_heatmap(f: &mut Frame, area: Rect, app: &App) {
    let matrix = &app.report().matrix;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Program association (Cramer's V) ");

    if matrix.is_empty() {
        let p = Paragraph::new("No enrollments match this filter")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let (cur_row, cur_col) = app.cursor();
    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain((1..=matrix.len()).map(|j| Cell::from(format!("{j:>4}"))))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().bold().fg(Color::DarkGray));

    let rows: Vec<Row> = matrix
        .labels()
        .iter()
        .zip(matrix.values())
        .enumerate()
        .map(|(i, (label, values))| {
            let name = format!("{:>2} {label}", i + 1);
            let label_style = if i == cur_row {
                Style::default().bold().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let cells = std::iter::once(Cell::from(name).style(label_style)).chain(
                values.iter().enumerate().map(|(j, &v)| {
                    let mut style = Style::default().bg(heat_color(v)).fg(Color::Black);
                    if (i, j) == (cur_row, cur_col) {
                        style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
                    }
                    Cell::from(format!("{:>4}", annotation(v))).style(style)
                }),
            );
            Row::new(cells.collect::<Vec<_>>())
        })
        .collect();

    let widths = std::iter::once(Constraint::Length(LABEL_WIDTH))
        .chain((0..matrix.len()).map(|_| Constraint::Length(CELL_WIDTH)))
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(0)
        .block(block);
    f.render_widget(table, area);
}

fn draw_pair(f: &mut Frame, area: Rect, app: &App) {
    let text: Vec<Line> = match app.selected_pair() {
        Some(pair) => {
            let t = &pair.table;
            let chi = &pair.chi_squared;
            let mut lines = vec![
                Line::from(Span::styled(
                    pair.program_a.as_str(),
                    Style::default().bold().fg(Color::Cyan),
                )),
                Line::from(Span::styled(
                    format!("× {}", pair.program_b),
                    Style::default().bold().fg(Color::Cyan),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("V = ", Style::default().bold()),
                    Span::styled(
                        format!("{:.4}", pair.cramers_v),
                        Style::default().fg(heat_color(pair.cramers_v)),
                    ),
                ]),
                Line::from(format!(
                    "χ² = {:.3}  dof {}  p = {:.4}",
                    chi.statistic, chi.dof, chi.p_value
                )),
            ];
            if chi.degenerate {
                lines.push(Line::from(Span::styled(
                    "degenerate table (V = 0)",
                    Style::default().fg(Color::Red),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(format!("{:>7} {:>6} {:>6}", "", "in B", "not B")));
            lines.push(Line::from(format!(
                "{:>7} {:>6} {:>6}",
                "in A",
                t.get(0, 0),
                t.get(0, 1)
            )));
            lines.push(Line::from(format!(
                "{:>7} {:>6} {:>6}",
                "not A",
                t.get(1, 0),
                t.get(1, 1)
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Move off the diagonal to inspect a pair",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let block = Block::default().borders(Borders::ALL).title(" Pair ");
    let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(block);
    f.render_widget(p, area);
}

fn draw_codes(f: &mut Frame, area: Rect, app: &App) {
    let selected = &app.query().codes;
    let lines: Vec<Line> = app
        .all_codes()
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let on = selected.contains(code);
            let key = if i < 9 {
                format!("{}", i + 1)
            } else {
                " ".to_string()
            };
            let style = if on {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(
                format!("[{}] {key} {}", if on { "x" } else { " " }, code_label(code)),
                style,
            ))
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title(" Codes ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " ←↑↓→ cell   g: grades   [ ]: start   { }: end   1-9: codes   +/-: top-N   v: variant   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

/// Diverging blue–white–red scale over the heatmap colour range, white at
/// the midpoint. Values outside the range clamp to the ends.
pub(crate) fn heat_color(value: f64) -> Color {
    const LOW: (f64, f64, f64) = (33.0, 102.0, 172.0);
    const MID: (f64, f64, f64) = (247.0, 247.0, 247.0);
    const HIGH: (f64, f64, f64) = (178.0, 24.0, 43.0);

    let [lo, hi] = HEATMAP_COLOR_RANGE;
    let t = if value.is_finite() {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (from, to, u) = if t < 0.5 {
        (LOW, MID, t * 2.0)
    } else {
        (MID, HIGH, (t - 0.5) * 2.0)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * u).round() as u8;
    Color::Rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
