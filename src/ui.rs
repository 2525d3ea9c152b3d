use anyhow::Result;
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use etkinlik_kayit::form::{MAX_AGE, MAX_GUEST_AGE, PHONE_LENGTH};
use etkinlik_kayit::{labels, Event, Notice, Registrar, Session, YesNo};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::runtime::Runtime;

/// Focusable rows, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Age,
    CountryCode,
    Phone,
    ClubMember,
    HasGuests,
    AddGuest,
    RemoveGuest,
    GuestName(usize),
    GuestAge(usize),
    Submit,
}

/// A key press reduced to what it means for the focused row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Char(char),
    Backspace,
    Toggle,
    Activate,
}

pub fn focus_order(session: &Session) -> Vec<Field> {
    let mut fields = vec![
        Field::FullName,
        Field::Age,
        Field::CountryCode,
        Field::Phone,
        Field::ClubMember,
        Field::HasGuests,
    ];

    if session.registrant.has_guests.is_yes() {
        fields.push(Field::AddGuest);
        fields.push(Field::RemoveGuest);
        for i in 0..session.guests.count() {
            fields.push(Field::GuestName(i));
            fields.push(Field::GuestAge(i));
        }
    }

    fields.push(Field::Submit);
    fields
}

/// Session event for an edit on the focused row, if the edit means anything there
pub fn edit_event(session: &Session, field: Field, edit: Edit) -> Option<Event> {
    let registrant = &session.registrant;

    match (field, edit) {
        // Enter submits from anywhere except the guest buttons
        (Field::AddGuest, Edit::Activate) => Some(Event::AddGuest),
        (Field::RemoveGuest, Edit::Activate) => Some(Event::RemoveGuest),
        (_, Edit::Activate) => Some(Event::Submit),
        (Field::FullName, _) => edit_text(&registrant.full_name, edit, usize::MAX).map(Event::FullName),
        (Field::CountryCode, _) => edit_text(&registrant.country_code, edit, usize::MAX).map(Event::CountryCode),
        (Field::Phone, _) => edit_text(&registrant.phone, edit, PHONE_LENGTH).map(Event::Phone),
        (Field::Age, _) => {
            let current = registrant.age.unwrap_or(0);
            let next = edit_number(current, edit, MAX_AGE)?;
            Some(Event::Age((next > 0).then_some(next)))
        }
        (Field::ClubMember, Edit::Toggle | Edit::Char(' ')) => {
            Some(Event::ClubMember(registrant.club_member.toggle()))
        }
        (Field::HasGuests, Edit::Toggle | Edit::Char(' ')) => {
            Some(Event::HasGuests(registrant.has_guests.toggle()))
        }
        (Field::GuestName(i), _) => {
            let slot = session.guests.get(i)?;
            edit_text(&slot.name, edit, usize::MAX).map(|name| Event::GuestName(i, name))
        }
        (Field::GuestAge(i), _) => {
            let slot = session.guests.get(i)?;
            edit_number(slot.age, edit, MAX_GUEST_AGE).map(|age| Event::GuestAge(i, age))
        }
        _ => None,
    }
}

fn edit_text(current: &str, edit: Edit, max_chars: usize) -> Option<String> {
    match edit {
        Edit::Char(c) if current.chars().count() < max_chars => {
            let mut next = current.to_string();
            next.push(c);
            Some(next)
        }
        Edit::Backspace => {
            let mut next = current.to_string();
            next.pop()?;
            Some(next)
        }
        _ => None,
    }
}

fn edit_number(current: u8, edit: Edit, max: u8) -> Option<u8> {
    match edit {
        Edit::Char(c) => {
            let digit = c.to_digit(10)?;
            let next = (current as u32 * 10 + digit).min(max as u32);
            Some(next as u8)
        }
        Edit::Backspace => Some(current / 10),
        _ => None,
    }
}

pub struct App {
    pub session: Session,
    pub focus: usize,
    registrar: Registrar,
    runtime: Runtime,
}

impl App {
    pub fn new(registrar: Registrar, runtime: Runtime) -> Self {
        Self {
            session: Session::new(),
            focus: 0,
            registrar,
            runtime,
        }
    }

    pub fn focused(&self) -> Field {
        let order = focus_order(&self.session);
        order[self.focus.min(order.len() - 1)]
    }

    pub fn next_field(&mut self) {
        let len = focus_order(&self.session).len();
        self.focus = if self.focus + 1 >= len { 0 } else { self.focus + 1 };
    }

    pub fn previous_field(&mut self) {
        let len = focus_order(&self.session).len();
        self.focus = if self.focus == 0 { len - 1 } else { self.focus - 1 };
    }

    /// Run one cycle. A submit blocks here until the store answers.
    pub fn apply(&mut self, event: Event) {
        let session = std::mem::take(&mut self.session);
        self.session = self.runtime.block_on(self.registrar.dispatch(session, event));

        // Guest rows may have disappeared
        let len = focus_order(&self.session).len();
        if self.focus >= len {
            self.focus = len - 1;
        }
    }

    pub fn edit(&mut self, edit: Edit) {
        if let Some(event) = edit_event(&self.session, self.focused(), edit) {
            self.apply(event);
        }
    }

    pub fn add_guest(&mut self) {
        self.apply(Event::AddGuest);
    }

    pub fn remove_guest(&mut self) {
        self.apply(Event::RemoveGuest);
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal form failed");
        return Err(err.into());
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Ok(()),
            KeyCode::Char('c') if ctrl => return Ok(()),
            _ if app.session.is_confirmed() => {}
            KeyCode::Char('a') if ctrl => app.add_guest(),
            KeyCode::Char('d') if ctrl => app.remove_guest(),
            KeyCode::Tab | KeyCode::Down => app.next_field(),
            KeyCode::BackTab | KeyCode::Up => app.previous_field(),
            KeyCode::Left | KeyCode::Right => app.edit(Edit::Toggle),
            KeyCode::Enter => app.edit(Edit::Activate),
            KeyCode::Backspace => app.edit(Edit::Backspace),
            KeyCode::Char(c) => app.edit(Edit::Char(c)),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Form or confirmation
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0]);

    match app.session.confirmation_id() {
        Some(id) => render_confirmation(f, chunks[1], id),
        None => render_form(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        labels::FORM_TITLE,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let registrant = &session.registrant;
    let focused = app.focused();
    let mut lines = Vec::new();

    match session.notice() {
        Some(Notice::Error(message)) => {
            lines.push(Line::from(Span::styled(
                format!("  {message}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
        }
        Some(Notice::Success(message)) => {
            lines.push(Line::from(Span::styled(
                format!("  {message}"),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from(""));
        }
        None => {}
    }

    for field in focus_order(session) {
        let (label, value) = match field {
            Field::FullName => (labels::FULL_NAME.to_string(), registrant.full_name.clone()),
            Field::Age => (
                labels::AGE.to_string(),
                registrant.age.map(|a| a.to_string()).unwrap_or_default(),
            ),
            Field::CountryCode => (labels::COUNTRY_CODE.to_string(), registrant.country_code.clone()),
            Field::Phone => {
                let value = if registrant.phone.is_empty() && field != focused {
                    labels::PHONE_PLACEHOLDER.to_string()
                } else {
                    registrant.phone.clone()
                };
                (labels::PHONE.to_string(), value)
            }
            Field::ClubMember => (labels::CLUB_MEMBER.to_string(), choice_text(registrant.club_member)),
            Field::HasGuests => (labels::HAS_GUESTS.to_string(), choice_text(registrant.has_guests)),
            Field::AddGuest => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("  {}", labels::GUEST_SECTION),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                (format!("[{}]", labels::ADD_GUEST), String::new())
            }
            Field::RemoveGuest => {
                let text = if session.guests.is_empty() {
                    format!("[{}] (misafir yok)", labels::REMOVE_GUEST)
                } else {
                    format!("[{}]", labels::REMOVE_GUEST)
                };
                (text, String::new())
            }
            Field::GuestName(i) => (
                labels::guest_name(i),
                session.guests.get(i).map(|g| g.name.clone()).unwrap_or_default(),
            ),
            Field::GuestAge(i) => (
                labels::guest_age(i),
                session.guests.get(i).map(|g| g.age.to_string()).unwrap_or_default(),
            ),
            Field::Submit => {
                lines.push(Line::from("  ─────────────────────────────────────"));
                (format!("[{}]", labels::SUBMIT), String::new())
            }
        };

        lines.push(field_line(&label, &value, field == focused));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", labels::PAGE_TITLE)),
    );

    f.render_widget(form, area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let marker = if focused { "→ " } else { "  " };
    let label_style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let mut spans = vec![
        Span::styled(marker.to_string(), Style::default().fg(Color::Green)),
        Span::styled(label.to_string(), label_style),
    ];
    if !value.is_empty() || focused {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            value.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED),
        ));
    }

    Line::from(spans)
}

fn choice_text(selected: YesNo) -> String {
    [YesNo::Yes, YesNo::No]
        .iter()
        .map(|choice| {
            let mark = if *choice == selected { "(•)" } else { "( )" };
            format!("{mark} {}", choice.label())
        })
        .collect::<Vec<_>>()
        .join("   ")
}

fn render_confirmation(f: &mut Frame, area: Rect, id: &str) {
    // Spread the digits out so the number reads as a display, not a field
    let spaced: String = id
        .chars()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let top_padding = area.height.saturating_sub(8) / 2;
    let mut content: Vec<Line> = (0..top_padding).map(|_| Line::from("")).collect();
    content.extend([
        Line::from(Span::styled(
            labels::CONFIRMATION_HEADING,
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled(
            spaced,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )),
        Line::from(""),
        Line::from(Span::styled(
            labels::CONFIRMATION_INSTRUCTIONS,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ]);

    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let status_spans = if app.session.is_confirmed() {
        vec![Span::raw(" "), Span::styled("Esc", Style::default().fg(Color::Red)), Span::raw(" Quit")]
    } else {
        vec![
            Span::raw(" "),
            key("Tab/↑/↓"),
            Span::raw(" Field | "),
            key("Space/←/→"),
            Span::raw(" Choice | "),
            key("Ctrl+A"),
            Span::raw(" Add guest | "),
            key("Ctrl+D"),
            Span::raw(" Remove guest | "),
            key("Enter"),
            Span::raw(" Submit | "),
            Span::styled("Esc", Style::default().fg(Color::Red)),
            Span::raw(" Quit"),
        ]
    };

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

// ============================================================================
// TESTS
// ============================================================================
