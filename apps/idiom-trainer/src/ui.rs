//! UI rendering for idiom trainer.

use crate::app::{App, View};
use idiom_core::{by_frequency_bucket, paginate_by_day, AnswerState, Bucket, QuizMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    match app.view {
        View::Home => draw_home(f, app),
        View::Study => draw_study(f, app),
        View::Quiz => draw_quiz(f, app),
        View::Missed => draw_missed(f, app),
    }

    if app.show_help {
        draw_help(f);
    }

    if let Some(msg) = &app.message {
        draw_message(f, msg);
    }
}

fn screen(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(area)
}

fn header(f: &mut Frame, area: Rect, title: &str) {
    let header = Paragraph::new(title.to_string())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn footer(f: &mut Frame, area: Rect, keys: &str) {
    let footer = Paragraph::new(keys.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn draw_home(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());
    header(f, chunks[0], "Idiom Trainer");

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[1]);

    // Stats row
    let stats = Line::from(vec![
        Span::styled(format!("{} mastered", app.summary.mastered), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("{} learning", app.summary.learning), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(format!("{} missed", app.summary.missed), Style::default().fg(Color::Red)),
        Span::raw(format!("  of {} idioms", app.dataset.len())),
    ]);
    let stats = Paragraph::new(stats)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Progress "));
    f.render_widget(stats, body[0]);

    // Bucket tabs
    let tabs: Vec<Span> = Bucket::ALL
        .iter()
        .flat_map(|bucket| {
            let style = if *bucket == app.bucket {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            vec![Span::styled(format!(" {} ", bucket.name()), style), Span::raw("  ")]
        })
        .collect();
    let tabs = Paragraph::new(Line::from(tabs))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Frequency "));
    f.render_widget(tabs, body[1]);

    // Day groups
    let in_bucket = by_frequency_bucket(app.dataset.idioms(), app.bucket);
    let items: Vec<ListItem> = (1..=app.day_total())
        .map(|day| {
            let count = paginate_by_day(&in_bucket, day, app.page_size()).len();
            let text = format!("Day {:>2}  ({} idioms)", day, count);
            let style = if day == app.day {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Day groups "));
    f.render_widget(list, body[2]);

    footer(
        f,
        chunks[2],
        "h/l:Bucket  j/k:Day  s:Study  1:Quiz idiom  2:Quiz definition  z:Default quiz  w:Missed  ?:Help  q:Quit",
    );
}

fn draw_study(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());
    let Some(study) = &app.study else { return };

    let title = format!(
        "{} | {} / {}{}",
        study.selection.describe(),
        study.current + 1,
        study.idioms.len(),
        if app.auto_reveal { " | auto" } else { "" }
    );
    header(f, chunks[0], &title);

    if let Some(idiom) = study.current_idiom() {
        let mut lines = vec![
            Line::from(Span::styled(
                idiom.word.as_str(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(pinyin) = &idiom.pinyin {
            lines.push(Line::from(Span::styled(pinyin.as_str(), Style::default().fg(Color::DarkGray))));
        }
        lines.push(Line::from(""));
        if study.revealed {
            lines.push(Line::from(Span::styled(idiom.definition.as_str(), Style::default().fg(Color::Green))));
        } else {
            lines.push(Line::from(Span::styled("[Space] show definition", Style::default().fg(Color::DarkGray))));
        }

        let card_title = if study.mastered { " Card (mastered) " } else { " Card " };
        let card = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(card_title))
            .wrap(Wrap { trim: true });
        f.render_widget(card, chunks[1]);
    }

    footer(f, chunks[2], "Space:Show/Hide  n/p:Next/Prev  m:Mastered  a:Auto reveal  q:Back");
}

fn draw_quiz(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());
    let Some(quiz) = &app.quiz else { return };
    let session = &quiz.session;

    let title = format!(
        "{} | {} | {} / {} | {} correct of {} answered",
        quiz.selection.describe(),
        session.mode().name(),
        session.position() + 1,
        session.len(),
        session.correct_count(),
        session.answered_count()
    );
    header(f, chunks[0], &title);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(5), Constraint::Min(0)])
        .split(chunks[1]);

    // Answer dots
    let dots: Vec<Span> = session
        .states()
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let color = match state {
                _ if i == session.position() => Color::Cyan,
                AnswerState::Answered { correct: true, .. } => Color::Green,
                AnswerState::Answered { correct: false, .. } => Color::Red,
                AnswerState::Unanswered => Color::DarkGray,
            };
            Span::styled("● ", Style::default().fg(color))
        })
        .collect();
    let dots = Paragraph::new(Line::from(dots))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(dots, body[0]);

    let Some(question) = session.current() else { return };

    let prompt_style = match question.mode {
        QuizMode::IdiomToDefinition => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        QuizMode::DefinitionToIdiom => Style::default(),
    };
    let prompt = Paragraph::new(Span::styled(question.prompt(), prompt_style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Question "))
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, body[1]);

    let state = session.current_state();
    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(idx, opt)| {
            let style = match state {
                AnswerState::Answered { .. } if question.is_correct(idx) => {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                }
                AnswerState::Answered { selected, .. } if selected == idx => {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                }
                AnswerState::Answered { .. } => Style::default().fg(Color::DarkGray),
                AnswerState::Unanswered => Style::default(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", idx + 1), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(opt.text().to_string(), style),
            ]))
        })
        .collect();
    let options = List::new(items).block(Block::default().borders(Borders::ALL).title(" Options "));
    f.render_widget(options, body[2]);

    footer(f, chunks[2], "1-4:Answer  n/p:Next/Prev  u:Next unanswered  r:Retry  q:Back");
}

fn draw_missed(f: &mut Frame, app: &App) {
    let chunks = screen(f.area());
    header(f, chunks[0], "Missed Idioms");

    if app.missed.is_empty() {
        let msg = Paragraph::new("No missed idioms. Keep it up!")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(msg, chunks[1]);
    } else {
        let items: Vec<ListItem> = app
            .missed
            .iter()
            .enumerate()
            .map(|(i, (idiom, progress))| {
                let style = if i == app.missed_selected {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let last = progress
                    .last_reviewed
                    .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(idiom.word.as_str(), style),
                        Span::raw("  "),
                        Span::styled(
                            format!("wrong {}x", progress.quiz_wrong_count),
                            Style::default().fg(Color::Red),
                        ),
                        Span::styled(format!("  {}", last), Style::default().fg(Color::DarkGray)),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", idiom.definition),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} missed ", app.missed.len())),
        );
        f.render_widget(list, chunks[1]);
    }

    footer(f, chunks[2], "j/k:Navigate  Enter:Study  1:Quiz idiom  2:Quiz definition  q:Back");
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help = r#"
Idiom Trainer Keybindings

Home:
  h/l, Left/Right   Change frequency bucket
  j/k, Down/Up      Change day group
  s, Enter          Study flashcards
  1                 Quiz: idiom -> definition
  2                 Quiz: definition -> idiom
  z                 Quiz in the configured mode
  w                 Missed idioms
  q                 Quit

Study:
  Space, Enter      Show / hide definition
  n/p               Next / previous card
  m                 Toggle mastered
  a                 Toggle auto reveal
  q, Esc            Back

Quiz:
  1-4               Pick an option
  n/p               Next / previous question
  u                 Jump to next unanswered
  r                 Hide answer and try again
  q, Esc            Back

Press any key to close
"#;

    let popup = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, area);
}

fn draw_message(f: &mut Frame, msg: &str) {
    let area = Rect::new(
        f.area().x + 2,
        f.area().height.saturating_sub(5),
        f.area().width.saturating_sub(4),
        3,
    );
    f.render_widget(Clear, area);

    let message = Paragraph::new(msg)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use idiom_core::{Dataset, Idiom, ProgressStore};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::with_parts(
            Config::default(),
            Dataset::bundled().unwrap(),
            ProgressStore::in_memory().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_every_view() {
        let mut app = app();
        assert!(render(&mut app).contains("Idiom Trainer"));

        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        assert!(render(&mut app).contains("Card"));

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE));
        assert!(render(&mut app).contains("Options"));

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE));
        assert!(render(&mut app).contains("Missed"));
    }

    #[test]
    fn test_study_card_shows_pinyin() {
        let idioms = vec![
            Idiom::new(1, "hua long dian jing", 14, "add the finishing touch").with_pinyin("hua4 long2 dian3 jing1"),
            Idiom::new(2, "other", 3, "something else"),
        ];
        let mut app = App::with_parts(
            Config::default(),
            Dataset::from_idioms(idioms).unwrap(),
            ProgressStore::in_memory().unwrap(),
        )
        .unwrap();
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));

        let screen = render(&mut app);
        assert!(screen.contains("hua4 long2 dian3 jing1"));
        assert!(!screen.contains("add the finishing touch"));
    }

    #[test]
    fn test_home_day_counts_with_zero_page_size() {
        let mut config = Config::default();
        config.study.page_size = 0;
        let idioms = (1..=3).map(|i| Idiom::new(i, format!("w{i}"), 1, format!("d{i}"))).collect();
        let mut app = App::with_parts(
            config,
            Dataset::from_idioms(idioms).unwrap(),
            ProgressStore::in_memory().unwrap(),
        )
        .unwrap();

        let screen = render(&mut app);
        assert!(screen.contains("Day  3  (1 idioms)"));
        assert!(!screen.contains("(0 idioms)"));
    }
}
