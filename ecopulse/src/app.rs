//! App state and main loop: input handling, chat submission, and drawing the
//! monitor's latest snapshot.

use std::{io, sync::Arc, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::time::sleep;
use tracing::info;

use crate::api::DashboardApi;
use crate::chat::ChatSession;
use crate::liveness::LivenessState;
use crate::monitor::{DashboardSnapshot, Monitor, PollSettings};
use crate::ui::{
    cards::draw_cards,
    chart::draw_history_chart,
    chat::{draw_chat, ChatView},
    header::draw_header,
    status::{draw_connecting, draw_offline, draw_stalled_banner},
    system::draw_system,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Dashboard,
    Chat,
}

pub struct App<A: DashboardApi> {
    monitor: Monitor<A>,
    chat: ChatSession<A>,

    focus: Focus,
    // Lines scrolled up from the newest chat line
    chat_scroll: usize,
    chat_max_scroll: usize,

    // Quit flag
    should_quit: bool,
    frame_interval: Duration,
}

impl<A: DashboardApi> App<A> {
    pub fn new(api: Arc<A>, poll: PollSettings) -> Self {
        Self {
            monitor: Monitor::new(Arc::clone(&api), poll),
            chat: ChatSession::new(api),
            focus: Focus::Dashboard,
            chat_scroll: 0,
            chat_max_scroll: 0,
            should_quit: false,
            frame_interval: Duration::from_millis(100),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.monitor.start();

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;

        // Teardown: stop polling and drop late replies before the screen goes
        self.monitor.stop();
        self.chat.close();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("dashboard closed");

        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    self.handle_key(k);
                }
            }
            if self.should_quit {
                break;
            }

            let snap = self.monitor.snapshot();
            terminal.draw(|f| self.draw(f, &snap))?;

            sleep(self.frame_interval).await;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, k: KeyEvent) {
        if k.kind == KeyEventKind::Release {
            return;
        }
        if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if k.code == KeyCode::Tab {
            self.focus = match self.focus {
                Focus::Dashboard => Focus::Chat,
                Focus::Chat => Focus::Dashboard,
            };
            return;
        }
        match self.focus {
            Focus::Dashboard => {
                if matches!(
                    k.code,
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
                ) {
                    self.should_quit = true;
                }
            }
            Focus::Chat => match k.code {
                KeyCode::Esc => self.focus = Focus::Dashboard,
                KeyCode::Enter => {
                    if let Some(pending) = self.chat.submit() {
                        self.chat_scroll = 0;
                        tokio::spawn(pending.resolve());
                    }
                }
                KeyCode::Backspace => self.chat.backspace(),
                KeyCode::PageUp => {
                    self.chat_scroll = (self.chat_scroll + 5).min(self.chat_max_scroll);
                }
                KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(5),
                KeyCode::Char(c) => self.chat.push_char(c),
                _ => {}
            },
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn chat(&self) -> &ChatSession<A> {
        &self.chat
    }

    pub fn monitor(&self) -> &Monitor<A> {
        &self.monitor
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame<'_>, snap: &DashboardSnapshot) {
        let area = f.area();

        // Root rows: header, body
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(10)])
            .split(area);
        draw_header(f, rows[0], snap);

        // Body: dashboard (left), chat (right)
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(rows[1]);

        self.draw_dashboard(f, body[0], snap);

        let transcript = self.chat.transcript();
        let draft = self.chat.draft();
        let view = ChatView {
            transcript: &transcript,
            draft: &draft,
            awaiting: self.chat.is_awaiting_reply(),
            focused: self.focus == Focus::Chat,
            scroll: self.chat_scroll,
        };
        self.chat_max_scroll = draw_chat(f, body[1], &view);
        self.chat_scroll = self.chat_scroll.min(self.chat_max_scroll);
    }

    fn draw_dashboard(&self, f: &mut ratatui::Frame<'_>, area: Rect, snap: &DashboardSnapshot) {
        if snap.polls_completed == 0 {
            draw_connecting(f, area);
            return;
        }
        if snap.liveness == LivenessState::Offline {
            draw_offline(f, area, snap.last_error.as_deref());
            return;
        }

        let stalled = snap.liveness == LivenessState::Warning;
        let mut constraints = Vec::with_capacity(4);
        if stalled {
            constraints.push(Constraint::Length(3)); // banner
        }
        constraints.extend([
            Constraint::Length(5), // cards
            Constraint::Min(8),    // chart
            Constraint::Length(6), // system
        ]);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut i = 0;
        if stalled {
            draw_stalled_banner(f, rows[0], snap.stuck_polls);
            i = 1;
        }
        draw_cards(f, rows[i], &snap.series, snap.prediction.as_ref(), stalled);
        draw_history_chart(f, rows[i + 1], &snap.series, stalled);
        draw_system(f, rows[i + 2], snap.system.as_ref(), stalled);
    }
}
