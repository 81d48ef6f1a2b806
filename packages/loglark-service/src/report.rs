use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use loglark_domain::{
	report,
	stats::{
		CalorieStats, DailyTimeStats, ExerciseEntry, ExpenseEntry, FoodEntry, MonthlyExpenseStats,
		RangeExpenseStats, RangeTimeStats, TimeEntry,
	},
};

use crate::{Error, LoglarkService, Result};

/// Optional date window accepted by the manual stats endpoints. Both bounds
/// present selects the range report; both absent selects the scheduled
/// default (yesterday, or the current month).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RangeReportRequest {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
}

impl LoglarkService {
	pub async fn run_time_stats(&self, req: RangeReportRequest) -> Result<String> {
		match resolve_range(&req)? {
			Some((start, end)) => self.run_range_time_report(start, end).await,
			None => self.run_daily_time_report().await,
		}
	}

	pub async fn run_expense_stats(&self, req: RangeReportRequest) -> Result<String> {
		match resolve_range(&req)? {
			Some((start, end)) => self.run_range_expense_report(start, end).await,
			None => self.run_monthly_expense_report().await,
		}
	}
	/// Yesterday's time log, aggregated and posted to the webhook. Returns
	/// the rendered text either way.
	pub async fn run_daily_time_report(&self) -> Result<String> {
		let tz = self.report_timezone()?;
		let today = Utc::now().with_timezone(&tz).date_naive();
		let yesterday = today.pred_opt().ok_or_else(|| Error::InvalidRequest {
			message: format!("No day precedes {today}."),
		})?;

		tracing::info!("Generating daily time report for {yesterday}.");

		let filter = date_range_filter("When", tz, yesterday, yesterday)?;
		let pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.time, filter)
			.await?;
		let text = if pages.is_empty() {
			tracing::warn!("No time entries recorded on {yesterday}.");

			report::no_time_data_message(today)
		} else {
			let entries: Vec<TimeEntry> = pages.iter().map(TimeEntry::from_page).collect();

			report::render_daily_time(&DailyTimeStats::compute(yesterday, entries))
		};

		self.notify(&text).await?;

		Ok(text)
	}

	/// Current month's expenses up to today, aggregated and posted.
	pub async fn run_monthly_expense_report(&self) -> Result<String> {
		let tz = self.report_timezone()?;
		let today = Utc::now().with_timezone(&tz).date_naive();
		let month_start = today.with_day(1).ok_or_else(|| Error::InvalidRequest {
			message: format!("Cannot derive month start from {today}."),
		})?;

		tracing::info!("Generating monthly expense report for {}.", month_start.format("%Y-%m"));

		let filter = date_range_filter("Date", tz, month_start, today)?;
		let pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.expense, filter)
			.await?;
		let entries: Vec<ExpenseEntry> = pages.iter().map(ExpenseEntry::from_page).collect();
		let text = report::render_monthly_expense(&MonthlyExpenseStats::compute(month_start, entries));

		self.notify(&text).await?;

		Ok(text)
	}

	/// Today's calorie balance across the food and exercise databases.
	pub async fn run_daily_calorie_report(&self) -> Result<String> {
		let tz = self.report_timezone()?;
		let today = Utc::now().with_timezone(&tz).date_naive();

		tracing::info!("Generating calorie report for {today}.");

		let filter = date_range_filter("Date", tz, today, today)?;
		let food_pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.food, filter.clone())
			.await?;
		let exercise_pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.exercise, filter)
			.await?;
		let foods: Vec<FoodEntry> = food_pages.iter().map(FoodEntry::from_page).collect();
		let exercises: Vec<ExerciseEntry> =
			exercise_pages.iter().map(ExerciseEntry::from_page).collect();
		let text = report::render_calorie(&CalorieStats::compute(
			today,
			self.cfg.reports.bmr,
			foods,
			exercises,
		));

		self.notify(&text).await?;

		Ok(text)
	}

	/// Time log over an inclusive date window, aggregated and posted. Unlike
	/// the daily job, an empty window still renders a full report.
	pub async fn run_range_time_report(&self, start: NaiveDate, end: NaiveDate) -> Result<String> {
		let tz = self.report_timezone()?;

		tracing::info!("Generating time report for {start} to {end}.");

		let filter = date_range_filter("When", tz, start, end)?;
		let pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.time, filter)
			.await?;
		let entries: Vec<TimeEntry> = pages.iter().map(TimeEntry::from_page).collect();
		let text = report::render_range_time(&RangeTimeStats::compute(start, end, entries));

		self.notify(&text).await?;

		Ok(text)
	}

	/// Expenses over an inclusive date window, aggregated and posted.
	pub async fn run_range_expense_report(
		&self,
		start: NaiveDate,
		end: NaiveDate,
	) -> Result<String> {
		let tz = self.report_timezone()?;

		tracing::info!("Generating expense report for {start} to {end}.");

		let filter = date_range_filter("Date", tz, start, end)?;
		let pages = self
			.providers
			.store
			.query_database(&self.cfg.notion, &self.cfg.notion.databases.expense, filter)
			.await?;
		let entries: Vec<ExpenseEntry> = pages.iter().map(ExpenseEntry::from_page).collect();
		let text = report::render_range_expense(&RangeExpenseStats::compute(start, end, entries));

		self.notify(&text).await?;

		Ok(text)
	}

	fn report_timezone(&self) -> Result<Tz> {
		self.cfg.reports.timezone.parse().map_err(|_| Error::InvalidRequest {
			message: format!("Unknown report timezone: {}", self.cfg.reports.timezone),
		})
	}

	async fn notify(&self, text: &str) -> Result<()> {
		if self.cfg.webhook.url.is_none() {
			tracing::warn!("Webhook url is not configured, skipping send.");

			return Ok(());
		}

		self.providers.notifier.send_text(&self.cfg.webhook, text).await?;

		tracing::info!("Report sent to webhook.");

		Ok(())
	}
}

fn resolve_range(req: &RangeReportRequest) -> Result<Option<(NaiveDate, NaiveDate)>> {
	let (start, end) = match (&req.start_date, &req.end_date) {
		(None, None) => return Ok(None),
		(Some(start), Some(end)) =>
			(parse_report_date("start_date", start)?, parse_report_date("end_date", end)?),
		_ =>
			return Err(Error::InvalidRequest {
				message: "start_date and end_date must be provided together.".to_string(),
			}),
	};

	if start > end {
		return Err(Error::InvalidRequest {
			message: format!("start_date {start} is after end_date {end}."),
		});
	}

	Ok(Some((start, end)))
}

fn parse_report_date(field: &str, raw: &str) -> Result<NaiveDate> {
	NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::InvalidRequest {
		message: format!("{field} must be formatted as YYYY-MM-DD, got {raw:?}"),
	})
}

/// Inclusive whole-day window over a Notion date property, expressed in the
/// report timezone.
fn date_range_filter(property: &str, tz: Tz, from: NaiveDate, to: NaiveDate) -> Result<Value> {
	Ok(serde_json::json!({
		"and": [
			{ "property": property, "date": { "on_or_after": day_bound(tz, from, false)? } },
			{ "property": property, "date": { "on_or_before": day_bound(tz, to, true)? } },
		]
	}))
}

fn day_bound(tz: Tz, date: NaiveDate, end_of_day: bool) -> Result<String> {
	let (hour, minute, second) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
	let naive = date.and_hms_opt(hour, minute, second).ok_or_else(|| Error::InvalidRequest {
		message: format!("Invalid report date: {date}"),
	})?;
	// DST gaps have no earliest local time; that cannot happen at these
	// wall-clock times in the supported zones, but fail loudly if it does.
	let resolved = tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
		Error::InvalidRequest { message: format!("Unrepresentable local time on {date}") }
	})?;

	Ok(resolved.to_rfc3339())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(s: &str) -> NaiveDate {
		NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad date literal")
	}

	#[test]
	fn filter_covers_the_whole_day() {
		let filter =
			date_range_filter("When", chrono_tz::Asia::Shanghai, date("2025-10-03"), date("2025-10-03"))
				.expect("filter failed");

		assert_eq!(filter["and"][0]["date"]["on_or_after"], "2025-10-03T00:00:00+08:00");
		assert_eq!(filter["and"][1]["date"]["on_or_before"], "2025-10-03T23:59:59+08:00");
	}

	fn range_request(start: Option<&str>, end: Option<&str>) -> RangeReportRequest {
		RangeReportRequest {
			start_date: start.map(ToString::to_string),
			end_date: end.map(ToString::to_string),
		}
	}

	#[test]
	fn absent_range_selects_the_default_window() {
		assert_eq!(resolve_range(&RangeReportRequest::default()).expect("resolve failed"), None);
	}

	#[test]
	fn complete_range_resolves_to_dates() {
		let resolved = resolve_range(&range_request(Some("2024-10-01"), Some("2024-10-07")))
			.expect("resolve failed");

		assert_eq!(resolved, Some((date("2024-10-01"), date("2024-10-07"))));
	}

	#[test]
	fn slash_separated_dates_are_rejected() {
		let err = resolve_range(&range_request(Some("2024/10/01"), Some("2024-10-07")))
			.expect_err("resolve succeeded");

		assert!(matches!(err, Error::InvalidRequest { .. }));
		assert!(err.to_string().contains("start_date"));
	}

	#[test]
	fn one_sided_and_reversed_ranges_are_rejected() {
		assert!(matches!(
			resolve_range(&range_request(Some("2024-10-01"), None)),
			Err(Error::InvalidRequest { .. })
		));
		assert!(matches!(
			resolve_range(&range_request(Some("2024-10-07"), Some("2024-10-01"))),
			Err(Error::InvalidRequest { .. })
		));
	}

	#[test]
	fn filter_spans_a_month() {
		let filter =
			date_range_filter("Date", chrono_tz::Asia::Shanghai, date("2025-10-01"), date("2025-10-21"))
				.expect("filter failed");

		assert_eq!(filter["and"][0]["property"], "Date");
		assert_eq!(filter["and"][0]["date"]["on_or_after"], "2025-10-01T00:00:00+08:00");
		assert_eq!(filter["and"][1]["date"]["on_or_before"], "2025-10-21T23:59:59+08:00");
	}
}
