mod config;
mod domain;
mod paths;
mod storage;
mod timer;
mod ui;
mod view;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::domain::{format_date_key, parse_date_key, Planner, Recurrence, Task, TaskDraft};
use crate::paths::{config_path, resolve_planner_path};
use crate::storage::{load_planner, save_planner};
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "kairos-dayplanner", about = "Terminal-first personal day planner")]
struct Cli {
	#[arg(long)]
	planner: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Add {
		#[arg(long)]
		date: Option<String>,
		#[arg(long)]
		title: String,
		#[arg(long)]
		time: Option<String>,
		#[arg(long)]
		details: Option<String>,
		#[arg(long = "todo")]
		todos: Vec<String>,
		#[arg(long)]
		repeat: Option<String>,
	},
	Capture {
		#[arg(long)]
		text: String,
		#[arg(long)]
		starred: bool,
	},
	Plan {
		#[arg(long)]
		item: String,
		#[arg(long)]
		date: Option<String>,
	},
	Remove {
		#[arg(long)]
		date: String,
		#[arg(long)]
		task: String,
	},
	Star {
		#[arg(long)]
		date: String,
		#[arg(long)]
		task: String,
	},
	Check {
		#[arg(long)]
		date: String,
		#[arg(long)]
		task: String,
		#[arg(long)]
		item: String,
	},
	Agenda {
		#[arg(long)]
		date: Option<String>,
	},
	Inbox,
	Stats,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let cli = Cli::parse();
	let config = Config::load(&config_path());
	let planner_path = resolve_planner_path(cli.planner, &config);
	let today = Local::now().date_naive();
	let mut planner = load_planner(&planner_path, today)?;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			save_planner(&planner_path, &planner)?;
			println!("initialized planner at {}", planner_path.display());
		}
		Command::Dashboard => {
			run_dashboard(&mut planner, &planner_path, &config)?;
		}
		Command::Add {
			date,
			title,
			time,
			details,
			todos,
			repeat,
		} => {
			if title.trim().is_empty() {
				return Err("task title must not be blank".into());
			}
			let anchor = parse_day(date.as_deref())?;
			let repeat = match repeat {
				Some(raw) => Recurrence::parse(&raw)
					.ok_or("repeat must be one of: once, daily, weekly")?,
				None => Recurrence::None,
			};

			let draft = TaskDraft {
				title,
				scheduled_time: time.unwrap_or_default(),
				details: details.unwrap_or_default(),
				checklist: todos,
			};
			let occurrences = repeat.expand(anchor).len();
			planner.schedule = planner.schedule.with_task_added(anchor, &draft, repeat);
			save_planner(&planner_path, &planner)?;

			if occurrences == 1 {
				println!("added \"{}\" on {}", draft.title, format_date_key(anchor));
			} else {
				println!(
					"added \"{}\" on {} and {} more dates",
					draft.title,
					format_date_key(anchor),
					occurrences - 1
				);
			}
		}
		Command::Capture { text, starred } => {
			if text.trim().is_empty() {
				return Err("inbox text must not be blank".into());
			}
			planner = planner.with_inbox_captured(text.clone(), starred);
			save_planner(&planner_path, &planner)?;
			println!("captured \"{text}\"");
		}
		Command::Plan { item, date } => {
			let target = parse_day(date.as_deref())?;
			if planner.inbox_item(&item).is_none() {
				println!("no inbox item with id {item}");
				return Ok(());
			}
			planner = planner.with_inbox_item_scheduled(&item, target);
			save_planner(&planner_path, &planner)?;
			println!("scheduled inbox item for {}", format_date_key(target));
		}
		Command::Remove { date, task } => {
			let day = parse_day(Some(date.as_str()))?;
			planner.schedule = planner.schedule.with_task_removed(day, &task);
			save_planner(&planner_path, &planner)?;
			println!("removed task {task} from {}", format_date_key(day));
		}
		Command::Star { date, task } => {
			let day = parse_day(Some(date.as_str()))?;
			planner.schedule = planner.schedule.with_star_toggled(day, &task);
			save_planner(&planner_path, &planner)?;
			println!("toggled priority on task {task}");
		}
		Command::Check { date, task, item } => {
			let day = parse_day(Some(date.as_str()))?;
			planner.schedule = planner.schedule.with_checklist_toggled(day, &task, &item);
			save_planner(&planner_path, &planner)?;
			println!("toggled checklist item {item}");
		}
		Command::Agenda { date } => {
			let day = parse_day(date.as_deref())?;
			print_agenda(&planner, day);
		}
		Command::Inbox => {
			print_inbox(&planner);
		}
		Command::Stats => {
			print_stats(&planner, today);
		}
	}

	Ok(())
}

fn init_tracing() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();
}

fn parse_day(raw: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	match raw {
		Some(raw) => parse_date_key(raw)
			.ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD").into()),
		None => Ok(Local::now().date_naive()),
	}
}

fn print_agenda(planner: &Planner, day: NaiveDate) {
	let tasks = planner.schedule.tasks_on(day);
	println!("agenda for {}", format_date_key(day));
	if tasks.is_empty() {
		println!("no tasks scheduled");
		return;
	}

	for task in tasks {
		println!("{}", format_task_line(task));
		if !task.details.is_empty() {
			println!("      {}", task.details);
		}
		for item in &task.checklist {
			println!("      {} {}", if item.done { "[x]" } else { "[ ]" }, item.text);
		}
	}
}

fn format_task_line(task: &Task) -> String {
	let marker = if task.starred { "*" } else { " " };
	if task.scheduled_time.is_empty() {
		format!("{} {} | {}", marker, task.id, task.title)
	} else {
		format!("{} {} | {} @ {}", marker, task.id, task.title, task.scheduled_time)
	}
}

fn print_inbox(planner: &Planner) {
	if planner.inbox.is_empty() {
		println!("inbox is empty");
		return;
	}

	for item in &planner.inbox {
		println!(
			"{}{} {} | {}",
			if item.done { "[x]" } else { "[ ]" },
			if item.starred { "*" } else { " " },
			item.id,
			item.text
		);
	}
}

fn print_stats(planner: &Planner, today: NaiveDate) {
	let stats = planner.stats(today);
	println!("scheduled tasks: {}", stats.total_tasks);
	println!("high priority:   {}", stats.starred_tasks);
	println!(
		"checklist done:  {}/{} ({}%)",
		stats.checklist_done,
		stats.checklist_total,
		stats.completion_rate()
	);

	println!("\nlast 30 days:");
	for (day, count) in stats.daily_counts.iter().rev().take(7).rev() {
		let bar = "=".repeat((*count).min(24));
		println!("{} {:>2} {}", day.format("%a %d %b"), count, bar);
	}
}
