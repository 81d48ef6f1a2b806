//! Cron-driven report jobs. Owned by the app and controlled over HTTP; job
//! failures are logged and posted to the webhook, never propagated.

use std::{
	str::FromStr,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use color_eyre::eyre;
use cron::Schedule;
use tokio::task::JoinHandle;

use loglark_domain::report;
use loglark_service::LoglarkService;

#[derive(Clone, Copy, Debug)]
enum JobKind {
	DailyTime,
	MonthlyExpense,
	DailyCalorie,
}
impl JobKind {
	/// Human label used in failure notices.
	fn label(&self) -> &'static str {
		match self {
			Self::DailyTime => "每日统计报告",
			Self::MonthlyExpense => "当月花销统计报告",
			Self::DailyCalorie => "卡路里统计报告",
		}
	}
}

struct Job {
	kind: JobKind,
	schedule: Schedule,
}

pub struct ReportScheduler {
	service: Arc<LoglarkService>,
	timezone: Tz,
	jobs: Vec<Job>,
	running: AtomicBool,
	handles: Mutex<Vec<JoinHandle<()>>>,
}
impl ReportScheduler {
	pub fn new(service: Arc<LoglarkService>) -> color_eyre::Result<Self> {
		let reports = &service.cfg.reports;
		let timezone: Tz = reports
			.timezone
			.parse()
			.map_err(|_| eyre::eyre!("Unknown report timezone: {}", reports.timezone))?;
		let jobs = vec![
			Job { kind: JobKind::DailyTime, schedule: Schedule::from_str(&reports.daily_time_cron)? },
			Job {
				kind: JobKind::MonthlyExpense,
				schedule: Schedule::from_str(&reports.monthly_expense_cron)?,
			},
			Job {
				kind: JobKind::DailyCalorie,
				schedule: Schedule::from_str(&reports.daily_calorie_cron)?,
			},
		];

		Ok(Self {
			service,
			timezone,
			jobs,
			running: AtomicBool::new(false),
			handles: Mutex::new(Vec::new()),
		})
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	pub fn start(self: &Arc<Self>) {
		if self.running.swap(true, Ordering::SeqCst) {
			tracing::info!("Scheduler is already running.");

			return;
		}

		let mut handles = lock_or_recover(&self.handles);

		for (index, job) in self.jobs.iter().enumerate() {
			let scheduler = self.clone();
			let kind = job.kind;
			let schedule = job.schedule.clone();

			handles.push(tokio::spawn(async move {
				loop {
					if !scheduler.is_running() {
						break;
					}

					let Some(delay) = next_delay(&schedule, scheduler.timezone, Utc::now()) else {
						tracing::warn!("Schedule for {:?} has no future fire time.", kind);

						break;
					};

					tokio::time::sleep(delay).await;

					if !scheduler.is_running() {
						break;
					}

					scheduler.run_job(kind).await;
				}
			}));

			tracing::info!("Scheduled job {} ({:?}).", index, kind);
		}

		tracing::info!("Scheduler started.");
	}

	pub fn stop(&self) {
		if !self.running.swap(false, Ordering::SeqCst) {
			return;
		}

		for handle in lock_or_recover(&self.handles).drain(..) {
			handle.abort();
		}

		tracing::info!("Scheduler stopped.");
	}

	async fn run_job(&self, kind: JobKind) {
		tracing::info!("Running report job {:?}.", kind);

		let result = match kind {
			JobKind::DailyTime => self.service.run_daily_time_report().await,
			JobKind::MonthlyExpense => self.service.run_monthly_expense_report().await,
			JobKind::DailyCalorie => self.service.run_daily_calorie_report().await,
		};

		if let Err(err) = result {
			tracing::error!("Report job {:?} failed: {err}", kind);

			if self.service.cfg.webhook.url.is_some() {
				let notice = report::report_failure_message(kind.label(), &err.to_string());

				if let Err(err) = self
					.service
					.providers
					.notifier
					.send_text(&self.service.cfg.webhook, &notice)
					.await
				{
					tracing::error!("Failed to deliver the failure notice: {err}");
				}
			}
		}
	}
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	match mutex.lock() {
		Ok(guard) => guard,
		Err(poisoned) => poisoned.into_inner(),
	}
}

/// How long until the schedule fires next, evaluated in the report timezone.
fn next_delay(schedule: &Schedule, tz: Tz, now: DateTime<Utc>) -> Option<Duration> {
	let next = schedule.after(&now.with_timezone(&tz)).next()?;

	(next.with_timezone(&Utc) - now).to_std().ok()
}
