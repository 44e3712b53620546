//! Minimal `client --tui` status view. The reconnecting tunnel loop runs
//! in the background exactly as it does headless; this just renders a
//! status pane on top of it and exits cleanly on `q`/`Esc`/Ctrl-C.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use hookshot_client::{run_client_loop, ClientOptions};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;

pub async fn run(options: ClientOptions) -> Result<()> {
    let server_url = options.server_url.clone();
    let target = options.default_target.clone();
    tokio::spawn(run_client_loop(options));

    enable_raw_mode()?;
    std::io::stdout().execute(EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let started_at = Instant::now();
    let result = run_event_loop(&mut terminal, &server_url, &target, started_at);

    disable_raw_mode()?;
    std::io::stdout().execute(LeaveAlternateScreen)?;
    result
}

fn run_event_loop(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    server_url: &str,
    target: &str,
    started_at: Instant,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            let [header, body] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(frame.area());

            let title = Paragraph::new("hookshot client")
                .style(Style::default().fg(Color::Cyan))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(title, header);

            let elapsed = started_at.elapsed().as_secs();
            let lines = vec![
                Line::from(format!("relay server : {server_url}")),
                Line::from(format!("local target : {target}")),
                Line::from(format!("uptime       : {elapsed}s")),
                Line::from(""),
                Line::from("press q to quit"),
            ];
            let body_widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("status"));
            frame.render_widget(body_widget, body);
        })?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                let is_quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                    || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
                if is_quit {
                    return Ok(());
                }
            }
        }
    }
}
