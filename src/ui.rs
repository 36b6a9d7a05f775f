use std::collections::BTreeMap;
use std::error::Error;
use std::io;
use std::path::Path;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::config::Config;
use crate::domain::{format_date_key, parse_date_key, Planner, PlannerStats, Recurrence, Task, TaskDraft};
use crate::storage::save_planner;
use crate::timer::FocusTimer;
use crate::view::{
	card_layout, carousel_window, days_in_month, CardLayout, DeleteConfirm, DeleteTarget,
	ScheduleScreen, ViewMode,
};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const EVENT_POLL_MS: u64 = 250;

pub fn run_dashboard(
	planner: &mut Planner,
	planner_path: &Path,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, planner, planner_path, config);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	planner: &mut Planner,
	planner_path: &Path,
	config: &Config,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(Local::now().date_naive(), config.focus_minutes);

	loop {
		if app.last_tick.elapsed() >= StdDuration::from_secs(1) {
			app.timer.tick();
			app.last_tick = Instant::now();
		}

		let today = Local::now().date_naive();
		let view = build_view(&app, planner, today);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(EVENT_POLL_MS))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, planner, planner_path),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, planner, planner_path),
					InputMode::Normal => {
						handle_normal_key(&mut app, key.code, planner, planner_path, &view)
					}
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(1), Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	render_tab_bar(frame, layout[0], app);

	match app.tab {
		AppTab::Schedule => render_schedule(frame, layout[1], app, view),
		AppTab::Inbox => render_inbox_panel(frame, layout[1], app, view),
		AppTab::Stats => render_stats_panel(frame, layout[1], view),
		AppTab::Focus => render_focus_panel(frame, layout[1], app, view),
	}

	render_footer(frame, layout[2], app, view);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_tab_bar(frame: &mut Frame, area: Rect, app: &App) {
	let mut spans = Vec::new();
	for (tab, label) in AppTab::ALL {
		let style = if app.tab == tab {
			Style::default().fg(FOCUSED_PANEL_BORDER_COLOR).add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(Color::DarkGray)
		};
		spans.push(Span::styled(format!(" {label} "), style));
		spans.push(Span::raw(" "));
	}
	frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_schedule(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	if view.expanded_day.is_some() {
		render_editor_panel(frame, area, app, view);
		return;
	}

	match app.screen.mode() {
		ViewMode::Carousel => render_carousel(frame, area, view),
		ViewMode::Month => render_month_panel(frame, area, app, view),
	}
}

fn render_carousel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let visible: Vec<&CardView> = view
		.cards
		.iter()
		.filter(|card| card.layout.opacity > 0.0)
		.collect();

	let constraints: Vec<Constraint> = visible
		.iter()
		.map(|card| Constraint::Fill((card.layout.scale * 100.0) as u16))
		.collect();
	let columns = Layout::default()
		.direction(Direction::Horizontal)
		.constraints(constraints)
		.split(area);

	for (card, column) in visible.iter().zip(columns.iter()) {
		let is_focused = card.layout.offset == 0;
		let body_style = if is_focused {
			Style::default()
		} else {
			Style::default().fg(Color::DarkGray)
		};

		let mut lines = Vec::new();
		lines.push(Line::from(Span::styled(
			format!(
				"{}{}",
				card.date_label,
				if card.is_today { " (today)" } else { "" }
			),
			if is_focused {
				Style::default().fg(FOCUSED_PANEL_BORDER_COLOR).add_modifier(Modifier::BOLD)
			} else {
				body_style
			},
		)));
		lines.push(Line::from(""));

		if card.task_lines.is_empty() {
			lines.push(Line::from(Span::styled("(no tasks scheduled)", body_style)));
		} else {
			for (text, starred) in &card.task_lines {
				let marker = if *starred {
					Span::styled("* ", Style::default().fg(Color::Yellow))
				} else {
					Span::styled("- ", body_style)
				};
				lines.push(Line::from(vec![marker, Span::styled(text.clone(), body_style)]));
			}
		}

		if is_focused {
			lines.push(Line::from(""));
			lines.push(Line::from(Span::styled(
				"Enter: manage day",
				Style::default().fg(Color::DarkGray),
			)));
		}

		let block = Block::default()
			.borders(Borders::ALL)
			.title(card.day_name.clone())
			.border_style(border_style(is_focused));
		frame.render_widget(Paragraph::new(lines).block(block), *column);
	}
}

fn render_month_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let month = app.screen.visible_month();
	let cursor = app.screen.month_cursor();

	let mut lines = Vec::new();
	lines.push(Line::from(format!("{} {}", month.format("%B"), month.year())));
	lines.push(Line::from("Mo Tu We Th Fr Sa Su"));

	let first_weekday = month.weekday().number_from_monday() as usize - 1;
	let month_days = days_in_month(month.year(), month.month());
	let mut day_counter = 1u32;
	for week in 0..6 {
		let mut spans = Vec::new();
		for weekday_index in 0..7 {
			let before_first = week == 0 && weekday_index < first_weekday;
			let after_last = day_counter > month_days;
			if before_first || after_last {
				spans.push(Span::raw("   "));
				continue;
			}

			let date = NaiveDate::from_ymd_opt(month.year(), month.month(), day_counter)
				.expect("calendar day must be valid");
			let mut style = Style::default();
			if date == cursor {
				style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
			} else if view.month_counts.contains_key(&date) {
				style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
			}
			if date == view.today {
				style = style.add_modifier(Modifier::UNDERLINED);
			}

			spans.push(Span::styled(format!("{day_counter:>2} "), style));
			day_counter += 1;
		}
		lines.push(Line::from(spans));
	}

	lines.push(Line::from(""));
	let cursor_count = view.month_counts.get(&cursor).copied().unwrap_or(0);
	lines.push(Line::from(format!(
		"{} | {} task(s)",
		cursor.format("%A, %d %B %Y"),
		cursor_count
	)));

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Month")
		.border_style(border_style(true));
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_editor_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.editor_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.editor_rows.is_empty() {
		state.select(Some(app.editor_index.min(view.editor_rows.len() - 1)));
	}

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(view.editor_title.clone())
				.border_style(border_style(true)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_inbox_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.inbox_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.inbox_rows.is_empty() {
		state.select(Some(app.inbox_index.min(view.inbox_rows.len() - 1)));
	}

	let open_count = view
		.inbox_rows
		.iter()
		.filter(|row| row.item_id.is_some() && !row.done)
		.count();
	let list = List::new(if view.inbox_rows.is_empty() {
		vec![ListItem::new("(inbox is empty, all caught up)")]
	} else {
		items
	})
	.block(
		Block::default()
			.borders(Borders::ALL)
			.title(format!("Inbox | {open_count} open"))
			.border_style(border_style(true)),
	)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_stats_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let stats = &view.stats;
	let mut lines = Vec::new();
	lines.push(Line::from(format!("Scheduled tasks: {}", stats.total_tasks)));
	lines.push(Line::from(format!("High priority:   {}", stats.starred_tasks)));
	lines.push(Line::from(format!(
		"Checklist done:  {}/{} ({}%)",
		stats.checklist_done,
		stats.checklist_total,
		stats.completion_rate()
	)));
	lines.push(Line::from(""));
	lines.push(Line::from("Last 30 days"));

	let mut strip = String::new();
	for (_, count) in &stats.daily_counts {
		strip.push(activity_glyph(*count));
	}
	lines.push(Line::from(strip));
	lines.push(Line::from(Span::styled(
		". none  o light  O busy  @ packed",
		Style::default().fg(Color::DarkGray),
	)));

	let panel = Paragraph::new(lines)
		.block(Block::default().borders(Borders::ALL).title("Velocity"));
	frame.render_widget(panel, area);
}

fn render_focus_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(4), Constraint::Min(6)])
		.split(area);

	let timer_style = if app.timer.is_running() {
		Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
	} else {
		Style::default().add_modifier(Modifier::BOLD)
	};
	let timer_state = if app.timer.remaining_secs() == 0 {
		"session complete, press r to reset"
	} else if app.timer.is_running() {
		"running"
	} else {
		"paused"
	};
	let timer_lines = vec![
		Line::from(Span::styled(app.timer.display(), timer_style)),
		Line::from(Span::styled(timer_state, Style::default().fg(Color::DarkGray))),
	];
	frame.render_widget(
		Paragraph::new(timer_lines).block(Block::default().borders(Borders::ALL).title("Focus")),
		layout[0],
	);

	let (title, rows, selected): (String, Vec<Line<'static>>, usize) = if app.focus_task_id.is_some() {
		(
			format!("Checklist | {}", view.focus_task_title),
			view.focus_checklist.iter().map(|row| row.line.clone()).collect(),
			app.focus_item_index,
		)
	} else {
		(
			"Today's tasks".to_string(),
			view.focus_rows.iter().map(|row| row.line.clone()).collect(),
			app.focus_task_index,
		)
	};

	let items = if rows.is_empty() {
		vec![ListItem::new("(nothing here yet)")]
	} else {
		rows.into_iter().map(ListItem::new).collect::<Vec<_>>()
	};
	let mut state = ListState::default();
	state.select(Some(selected.min(items.len().saturating_sub(1))));

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(true)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));
	frame.render_stateful_widget(list, layout[1], &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let footer_lines = match &app.mode {
		InputMode::Normal => {
			let shortcuts = match app.tab {
				AppTab::Schedule if view.expanded_day.is_some() => {
					"j/k select | space check | s star | d delete | a add task | Esc close"
				}
				AppTab::Schedule if app.screen.mode() == ViewMode::Month => {
					"h/j/k/l move | n/N month | Enter manage day | m carousel"
				}
				AppTab::Schedule => "h/l move day | H/L skip two | t today | m month | Enter manage day",
				AppTab::Inbox => "j/k select | a capture | space done | s star | g schedule | d delete",
				AppTab::Stats => "",
				AppTab::Focus => "p start/pause | r reset | j/k select | Enter pick task | space check | Esc clear",
			};
			vec![
				Line::from("Tab/Shift-Tab switch view | q quit"),
				Line::from(shortcuts),
				Line::from(app.status.clone()),
			]
		}
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines)
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 45, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
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
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') => true,
		KeyCode::Tab => {
			app.tab = app.tab.next();
			false
		}
		KeyCode::BackTab => {
			app.tab = app.tab.prev();
			false
		}
		_ => {
			match app.tab {
				AppTab::Schedule => handle_schedule_key(app, code, planner, planner_path, view),
				AppTab::Inbox => handle_inbox_key(app, code, planner, planner_path, view),
				AppTab::Stats => {}
				AppTab::Focus => handle_focus_key(app, code, planner, planner_path, view),
			}
			false
		}
	}
}

fn handle_schedule_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
	view: &ViewModel,
) {
	if let Some(day) = view.expanded_day {
		handle_editor_key(app, code, planner, planner_path, view, day);
		return;
	}

	match app.screen.mode() {
		ViewMode::Carousel => match code {
			KeyCode::Left | KeyCode::Char('h') => {
				let current = app.screen.focus().focused_index();
				if current > 0 {
					app.screen.select_day(current - 1);
				}
			}
			KeyCode::Right | KeyCode::Char('l') => {
				let current = app.screen.focus().focused_index();
				app.screen.select_day(current + 1);
			}
			KeyCode::Char('H') => {
				let current = app.screen.focus().focused_index();
				app.screen.select_day(current.saturating_sub(2));
			}
			KeyCode::Char('L') => {
				let current = app.screen.focus().focused_index();
				app.screen.select_day(current + 2);
			}
			KeyCode::Char('t') => app.screen.focus_today(),
			KeyCode::Char('m') => app.screen.set_mode(ViewMode::Month),
			KeyCode::Enter => {
				app.screen.expand_focused();
				app.editor_index = 0;
			}
			_ => {}
		},
		ViewMode::Month => match code {
			KeyCode::Left | KeyCode::Char('h') => app.screen.move_month_cursor(-1),
			KeyCode::Right | KeyCode::Char('l') => app.screen.move_month_cursor(1),
			KeyCode::Up | KeyCode::Char('k') => app.screen.move_month_cursor(-7),
			KeyCode::Down | KeyCode::Char('j') => app.screen.move_month_cursor(7),
			KeyCode::Char('n') => app.screen.page_month(1),
			KeyCode::Char('N') => app.screen.page_month(-1),
			KeyCode::Enter => {
				app.screen.expand_month_cursor();
				app.editor_index = 0;
			}
			KeyCode::Char('m') | KeyCode::Esc => app.screen.set_mode(ViewMode::Carousel),
			_ => {}
		},
	}
}

fn handle_editor_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
	view: &ViewModel,
	day: NaiveDate,
) {
	match code {
		KeyCode::Esc => {
			app.screen.close_editor();
			app.editor_index = 0;
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.editor_index = app.editor_index.saturating_sub(1);
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if !view.editor_rows.is_empty() {
				app.editor_index = (app.editor_index + 1).min(view.editor_rows.len() - 1);
			}
		}
		KeyCode::Char(' ') => {
			if let Some(EditorRowKind::Checklist { task_id, item_id }) =
				selected_editor_kind(view, app.editor_index)
			{
				planner.schedule = planner.schedule.with_checklist_toggled(day, &task_id, &item_id);
				app.status = match persist(planner_path, planner) {
					Ok(()) => "Checklist updated".to_string(),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		KeyCode::Char('s') => {
			if let Some(task_id) = selected_editor_task_id(view, app.editor_index) {
				planner.schedule = planner.schedule.with_star_toggled(day, &task_id);
				app.status = match persist(planner_path, planner) {
					Ok(()) => "Priority toggled".to_string(),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		KeyCode::Char('d') => {
			if let Some(task_id) = selected_editor_task_id(view, app.editor_index) {
				let label = planner
					.schedule
					.task(day, &task_id)
					.map(|task| task.title.clone())
					.unwrap_or_else(|| "task".to_string());
				app.confirm.request(DeleteTarget::Scheduled {
					day,
					task_id,
				});
				app.mode = InputMode::Select(build_delete_confirm_select(&label));
			}
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new(
				"Task title",
				PromptKind::AddTaskTitle { day },
			));
		}
		_ => {}
	}
}

fn handle_inbox_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
	view: &ViewModel,
) {
	match code {
		KeyCode::Up | KeyCode::Char('k') => {
			app.inbox_index = app.inbox_index.saturating_sub(1);
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if !view.inbox_rows.is_empty() {
				app.inbox_index = (app.inbox_index + 1).min(view.inbox_rows.len() - 1);
			}
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new(
				"What's on your mind?",
				PromptKind::CaptureInbox,
			));
		}
		KeyCode::Char(' ') => {
			if let Some(item_id) = selected_inbox_item_id(view, app.inbox_index) {
				*planner = planner.with_inbox_toggled(&item_id);
				app.status = match persist(planner_path, planner) {
					Ok(()) => "Inbox item toggled".to_string(),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		KeyCode::Char('s') => {
			if let Some(item_id) = selected_inbox_item_id(view, app.inbox_index) {
				*planner = planner.with_inbox_starred(&item_id);
				app.status = match persist(planner_path, planner) {
					Ok(()) => "Priority toggled".to_string(),
					Err(err) => format!("error: {err}"),
				};
			}
		}
		KeyCode::Char('d') => {
			if let Some(item_id) = selected_inbox_item_id(view, app.inbox_index) {
				let label = planner
					.inbox_item(&item_id)
					.map(|item| item.text.clone())
					.unwrap_or_else(|| "inbox item".to_string());
				app.confirm.request(DeleteTarget::Inbox { item_id });
				app.mode = InputMode::Select(build_delete_confirm_select(&label));
			}
		}
		KeyCode::Char('g') => {
			if let Some(item_id) = selected_inbox_item_id(view, app.inbox_index) {
				app.mode = InputMode::Prompt(PromptState::new(
					"Schedule for date (YYYY-MM-DD, empty = today)",
					PromptKind::ScheduleInbox { item_id },
				));
			} else {
				app.status = "Select an inbox item first".to_string();
			}
		}
		_ => {}
	}
}

fn handle_focus_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
	view: &ViewModel,
) {
	match code {
		KeyCode::Char('p') => app.timer.toggle(),
		KeyCode::Char('r') => app.timer.reset(),
		KeyCode::Esc => {
			app.focus_task_id = None;
			app.focus_item_index = 0;
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if app.focus_task_id.is_some() {
				app.focus_item_index = app.focus_item_index.saturating_sub(1);
			} else {
				app.focus_task_index = app.focus_task_index.saturating_sub(1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if app.focus_task_id.is_some() {
				if !view.focus_checklist.is_empty() {
					app.focus_item_index =
						(app.focus_item_index + 1).min(view.focus_checklist.len() - 1);
				}
			} else if !view.focus_rows.is_empty() {
				app.focus_task_index = (app.focus_task_index + 1).min(view.focus_rows.len() - 1);
			}
		}
		KeyCode::Enter => {
			if app.focus_task_id.is_none() {
				if let Some(row) = view.focus_rows.get(app.focus_task_index) {
					app.focus_task_id = Some(row.task_id.clone());
					app.focus_item_index = 0;
				}
			}
		}
		KeyCode::Char(' ') => {
			if let Some(task_id) = app.focus_task_id.clone() {
				if let Some(row) = view.focus_checklist.get(app.focus_item_index) {
					planner.schedule =
						planner.schedule.with_checklist_toggled(view.today, &task_id, &row.item_id);
					app.status = match persist(planner_path, planner) {
						Ok(()) => "Checklist updated".to_string(),
						Err(err) => format!("error: {err}"),
					};
				}
			}
		}
		_ => {}
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			let lands_on_schedule = matches!(prompt.kind, PromptKind::ScheduleInbox { .. });
			match submit_prompt(prompt.clone(), planner, planner_path) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => {
					app.mode = InputMode::Prompt(next_prompt)
				}
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
					if lands_on_schedule {
						app.tab = AppTab::Schedule;
					}
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &Path,
) -> bool {
	match code {
		KeyCode::Esc => {
			if app.confirm.pending().is_some() {
				app.confirm.cancel();
			}
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), planner, planner_path, &mut app.confirm) {
				Ok(message) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(
	prompt: PromptState,
	planner: &mut Planner,
	planner_path: &Path,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::CaptureInbox => {
			let text = required_text(&prompt.input, "inbox text")?;
			*planner = planner.with_inbox_captured(text.clone(), false);
			persist(planner_path, planner)?;
			Ok(PromptOutcome::Done(format!("captured: {text}")))
		}
		PromptKind::ScheduleInbox { item_id } => {
			let target = match optional_text(&prompt.input) {
				Some(raw) => parse_date_key(&raw)
					.ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))?,
				None => Local::now().date_naive(),
			};
			*planner = planner.with_inbox_item_scheduled(&item_id, target);
			persist(planner_path, planner)?;
			Ok(PromptOutcome::Done(format!(
				"scheduled for {}",
				format_date_key(target)
			)))
		}
		PromptKind::AddTaskTitle { day } => {
			let title = required_text(&prompt.input, "task title")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Time (optional, e.g. 2:00 PM)",
				PromptKind::AddTaskTime { day, title },
			)))
		}
		PromptKind::AddTaskTime { day, title } => {
			let time = optional_text(&prompt.input).unwrap_or_default();
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Details (optional)",
				PromptKind::AddTaskDetails { day, title, time },
			)))
		}
		PromptKind::AddTaskDetails { day, title, time } => {
			let details = optional_text(&prompt.input).unwrap_or_default();
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Checklist item (empty to finish)",
				PromptKind::AddTaskChecklist {
					day,
					title,
					time,
					details,
					rows: Vec::new(),
				},
			)))
		}
		PromptKind::AddTaskChecklist {
			day,
			title,
			time,
			details,
			mut rows,
		} => {
			if let Some(row) = optional_text(&prompt.input) {
				rows.push(row);
				let count = rows.len();
				return Ok(PromptOutcome::NextPrompt(PromptState::new(
					format!("Checklist item {} (empty to finish)", count + 1),
					PromptKind::AddTaskChecklist {
						day,
						title,
						time,
						details,
						rows,
					},
				)));
			}

			let draft = TaskDraft {
				title,
				scheduled_time: time,
				details,
				checklist: rows,
			};
			Ok(PromptOutcome::Select(build_repeat_select(day, draft)))
		}
	}
}

fn submit_select(
	select: SelectState,
	planner: &mut Planner,
	planner_path: &Path,
	confirm: &mut DeleteConfirm,
) -> Result<String, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::TaskRepeat { day, draft } => {
			let raw = selected_value.ok_or_else(|| "selected repeat is missing".to_string())?;
			let repeat = Recurrence::parse(&raw).ok_or_else(|| format!("unknown repeat: {raw}"))?;
			let occurrences = repeat.expand(day).len();
			planner.schedule = planner.schedule.with_task_added(day, &draft, repeat);
			persist(planner_path, planner)?;
			if occurrences == 1 {
				Ok(format!("added: {}", draft.title))
			} else {
				Ok(format!("added: {} ({occurrences} occurrences)", draft.title))
			}
		}
		SelectKind::DeleteConfirmChoice => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?
				.to_string();
			if action == "delete" {
				match confirm.confirm() {
					Some(DeleteTarget::Scheduled { day, task_id }) => {
						planner.schedule = planner.schedule.with_task_removed(day, &task_id);
						persist(planner_path, planner)?;
						Ok("Task deleted".to_string())
					}
					Some(DeleteTarget::Inbox { item_id }) => {
						*planner = planner.with_inbox_removed(&item_id);
						persist(planner_path, planner)?;
						Ok("Inbox item deleted".to_string())
					}
					None => Ok("Nothing pending to delete".to_string()),
				}
			} else {
				confirm.cancel();
				Ok("Delete cancelled".to_string())
			}
		}
	}
}

fn build_repeat_select(day: NaiveDate, draft: TaskDraft) -> SelectState {
	let options = vec![
		SelectOption::new("Once", Some("once".to_string()), Style::default()),
		SelectOption::new("Daily (15 occurrences)", Some("daily".to_string()), Style::default()),
		SelectOption::new("Weekly (13 occurrences)", Some("weekly".to_string()), Style::default()),
	];
	SelectState::new("Repeat", SelectKind::TaskRepeat { day, draft }, options)
}

fn build_delete_confirm_select(label: &str) -> SelectState {
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete? {label}"),
		SelectKind::DeleteConfirmChoice,
		options,
	);
	// Default to cancel.
	select.selected = 1;
	select
}

fn build_view(app: &App, planner: &Planner, today: NaiveDate) -> ViewModel {
	let window = carousel_window(today);
	let focused = app.screen.focus().focused_index();

	let cards = window
		.iter()
		.enumerate()
		.map(|(index, day)| {
			let tasks = planner.schedule.tasks_on(*day);
			CardView {
				day_name: day.format("%A").to_string(),
				date_label: day.format("%d %b").to_string(),
				is_today: *day == today,
				layout: card_layout(index, focused),
				task_lines: tasks
					.iter()
					.map(|task| {
						let text = if task.scheduled_time.is_empty() {
							task.title.clone()
						} else {
							format!("{} @ {}", task.title, task.scheduled_time)
						};
						(text, task.starred)
					})
					.collect(),
			}
		})
		.collect::<Vec<_>>();

	let mut month_counts = BTreeMap::new();
	for (day, tasks) in planner.schedule.days() {
		month_counts.insert(day, tasks.len());
	}

	let expanded_day = app.screen.expanded_day(&window);
	let (editor_title, editor_rows) = match expanded_day {
		Some(day) => {
			let tasks = planner.schedule.tasks_on(day);
			(
				format!("{} | {} task(s)", day.format("%A, %d %B %Y"), tasks.len()),
				build_editor_rows(tasks),
			)
		}
		None => (String::new(), Vec::new()),
	};

	let mut inbox_order: Vec<&crate::domain::InboxItem> = planner.inbox.iter().collect();
	inbox_order.sort_by_key(|item| (item.done, !item.starred));
	let inbox_rows = inbox_order
		.iter()
		.map(|item| {
			let checkbox = if item.done { "[x]" } else { "[ ]" };
			let marker = if item.starred { "*" } else { " " };
			let style = if item.done {
				Style::default().fg(Color::DarkGray)
			} else {
				Style::default()
			};
			InboxRow {
				line: Line::from(vec![
					Span::styled(format!("{checkbox} "), style),
					Span::styled(marker.to_string(), Style::default().fg(Color::Yellow)),
					Span::styled(format!(" {}", item.text), style),
				]),
				item_id: Some(item.id.clone()),
				done: item.done,
			}
		})
		.collect::<Vec<_>>();

	let today_tasks = planner.schedule.tasks_on(today);
	let focus_rows = today_tasks
		.iter()
		.map(|task| FocusRow {
			task_id: task.id.clone(),
			line: Line::from(format!(
				"{} {}",
				if task.starred { "*" } else { " " },
				task.title
			)),
		})
		.collect::<Vec<_>>();

	let (focus_task_title, focus_checklist) = match &app.focus_task_id {
		Some(task_id) => match planner.schedule.task(today, task_id) {
			Some(task) => (
				task.title.clone(),
				task.checklist
					.iter()
					.map(|item| FocusChecklistRow {
						item_id: item.id.clone(),
						line: Line::from(format!(
							"{} {}",
							if item.done { "[x]" } else { "[ ]" },
							item.text
						)),
					})
					.collect(),
			),
			None => (String::new(), Vec::new()),
		},
		None => (String::new(), Vec::new()),
	};

	ViewModel {
		today,
		expanded_day,
		cards,
		month_counts,
		editor_title,
		editor_rows,
		inbox_rows,
		stats: planner.stats(today),
		focus_rows,
		focus_task_title,
		focus_checklist,
	}
}

fn build_editor_rows(tasks: &[Task]) -> Vec<EditorRow> {
	if tasks.is_empty() {
		return vec![EditorRow::empty("(your day is entirely clear)")];
	}

	let mut rows = Vec::new();
	for task in tasks {
		let mut spans = vec![
			Span::styled(
				if task.starred { "* " } else { "  " },
				Style::default().fg(Color::Yellow),
			),
			Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
		];
		if !task.scheduled_time.is_empty() {
			spans.push(Span::styled(
				format!("  @ {}", task.scheduled_time),
				Style::default().fg(Color::DarkGray),
			));
		}
		rows.push(EditorRow {
			line: Line::from(spans),
			kind: EditorRowKind::Task {
				task_id: task.id.clone(),
			},
		});

		if !task.details.is_empty() {
			rows.push(EditorRow {
				line: Line::from(Span::styled(
					format!("    {}", task.details),
					Style::default().fg(Color::DarkGray),
				)),
				kind: EditorRowKind::Empty,
			});
		}

		for item in &task.checklist {
			let style = if item.done {
				Style::default().fg(Color::DarkGray)
			} else {
				Style::default()
			};
			rows.push(EditorRow {
				line: Line::from(Span::styled(
					format!("    {} {}", if item.done { "[x]" } else { "[ ]" }, item.text),
					style,
				)),
				kind: EditorRowKind::Checklist {
					task_id: task.id.clone(),
					item_id: item.id.clone(),
				},
			});
		}
	}

	rows
}

fn selected_editor_kind(view: &ViewModel, index: usize) -> Option<EditorRowKind> {
	view.editor_rows.get(index).map(|row| row.kind.clone())
}

fn selected_editor_task_id(view: &ViewModel, index: usize) -> Option<String> {
	match selected_editor_kind(view, index)? {
		EditorRowKind::Task { task_id } => Some(task_id),
		EditorRowKind::Checklist { task_id, .. } => Some(task_id),
		EditorRowKind::Empty => None,
	}
}

fn selected_inbox_item_id(view: &ViewModel, index: usize) -> Option<String> {
	view.inbox_rows.get(index).and_then(|row| row.item_id.clone())
}

fn persist(path: &Path, planner: &Planner) -> Result<(), String> {
	save_planner(path, planner).map_err(|err| err.to_string())
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn activity_glyph(count: usize) -> char {
	match count {
		0 => '.',
		1..=2 => 'o',
		3..=4 => 'O',
		_ => '@',
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	CaptureInbox,
	ScheduleInbox {
		item_id: String,
	},
	AddTaskTitle {
		day: NaiveDate,
	},
	AddTaskTime {
		day: NaiveDate,
		title: String,
	},
	AddTaskDetails {
		day: NaiveDate,
		title: String,
		time: String,
	},
	AddTaskChecklist {
		day: NaiveDate,
		title: String,
		time: String,
		details: String,
		rows: Vec<String>,
	},
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskRepeat {
		day: NaiveDate,
		draft: TaskDraft,
	},
	DeleteConfirmChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppTab {
	Schedule,
	Inbox,
	Stats,
	Focus,
}

impl AppTab {
	const ALL: [(AppTab, &'static str); 4] = [
		(AppTab::Schedule, "Schedule"),
		(AppTab::Inbox, "Inbox"),
		(AppTab::Stats, "Stats"),
		(AppTab::Focus, "Focus"),
	];

	fn next(self) -> Self {
		match self {
			AppTab::Schedule => AppTab::Inbox,
			AppTab::Inbox => AppTab::Stats,
			AppTab::Stats => AppTab::Focus,
			AppTab::Focus => AppTab::Schedule,
		}
	}

	fn prev(self) -> Self {
		match self {
			AppTab::Schedule => AppTab::Focus,
			AppTab::Inbox => AppTab::Schedule,
			AppTab::Stats => AppTab::Inbox,
			AppTab::Focus => AppTab::Stats,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

struct App {
	tab: AppTab,
	screen: ScheduleScreen,
	confirm: DeleteConfirm,
	editor_index: usize,
	inbox_index: usize,
	focus_task_id: Option<String>,
	focus_task_index: usize,
	focus_item_index: usize,
	timer: FocusTimer,
	last_tick: Instant,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(today: NaiveDate, focus_minutes: u32) -> Self {
		Self {
			tab: AppTab::Schedule,
			screen: ScheduleScreen::new(today),
			confirm: DeleteConfirm::default(),
			editor_index: 0,
			inbox_index: 0,
			focus_task_id: None,
			focus_task_index: 0,
			focus_item_index: 0,
			timer: FocusTimer::new(focus_minutes),
			last_tick: Instant::now(),
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.editor_rows.is_empty() {
			self.editor_index = 0;
		} else {
			self.editor_index = self.editor_index.min(view.editor_rows.len() - 1);
		}

		if view.inbox_rows.is_empty() {
			self.inbox_index = 0;
		} else {
			self.inbox_index = self.inbox_index.min(view.inbox_rows.len() - 1);
		}

		if view.focus_rows.is_empty() {
			self.focus_task_index = 0;
		} else {
			self.focus_task_index = self.focus_task_index.min(view.focus_rows.len() - 1);
		}

		if view.focus_checklist.is_empty() {
			self.focus_item_index = 0;
		} else {
			self.focus_item_index = self.focus_item_index.min(view.focus_checklist.len() - 1);
		}

		if let Some(task_id) = &self.focus_task_id {
			if !view.focus_rows.iter().any(|row| &row.task_id == task_id) {
				self.focus_task_id = None;
			}
		}
	}
}

struct ViewModel {
	today: NaiveDate,
	expanded_day: Option<NaiveDate>,
	cards: Vec<CardView>,
	month_counts: BTreeMap<NaiveDate, usize>,
	editor_title: String,
	editor_rows: Vec<EditorRow>,
	inbox_rows: Vec<InboxRow>,
	stats: PlannerStats,
	focus_rows: Vec<FocusRow>,
	focus_task_title: String,
	focus_checklist: Vec<FocusChecklistRow>,
}

struct CardView {
	day_name: String,
	date_label: String,
	is_today: bool,
	layout: CardLayout,
	task_lines: Vec<(String, bool)>,
}

#[derive(Clone)]
struct EditorRow {
	line: Line<'static>,
	kind: EditorRowKind,
}

impl EditorRow {
	fn empty(text: impl Into<String>) -> Self {
		Self {
			line: Line::from(text.into()),
			kind: EditorRowKind::Empty,
		}
	}
}

#[derive(Debug, Clone)]
enum EditorRowKind {
	Empty,
	Task {
		task_id: String,
	},
	Checklist {
		task_id: String,
		item_id: String,
	},
}

#[derive(Clone)]
struct InboxRow {
	line: Line<'static>,
	item_id: Option<String>,
	done: bool,
}

#[derive(Clone)]
struct FocusRow {
	task_id: String,
	line: Line<'static>,
}

#[derive(Clone)]
struct FocusChecklistRow {
	item_id: String,
	line: Line<'static>,
}
