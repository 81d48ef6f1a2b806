//! Plain-text report rendering. Layouts are deterministic: emoji section
//! headers, an `=` divider under the title, category breakdown, top-10 tags,
//! per-day lines, then a 20-entry detail section with a "+N more" trailer.

use chrono::NaiveDate;

use crate::stats::{
	Bucket, CalorieStats, DailyTimeStats, MonthlyExpenseStats, RangeExpenseStats, RangeTimeStats,
};

const TAG_LIMIT: usize = 10;
const DETAIL_LIMIT: usize = 20;
const DAILY_EXPENSE_LIMIT: usize = 15;

pub fn render_daily_time(stats: &DailyTimeStats) -> String {
	let mut lines = Vec::new();

	lines.push(format!("📊 {} 时间统计报告", stats.date));
	lines.push("=".repeat(40));
	lines.push(format!("总条目数: {}", stats.total_entries));
	lines.push(format!("总时长: {} 小时", fmt_amount(stats.total_hours)));
	lines.push(String::new());

	push_categories(&mut lines, "📈 分类统计:", &stats.categories, |measure| {
		format!("{measure:.1}h")
	});
	lines.push(String::new());
	push_tags(&mut lines, "🏷️ 标签统计:", &stats.tags, |measure| format!("{measure:.1}h"));
	lines.push(String::new());
	lines.push("📝 详细活动:".to_string());

	for entry in stats.entries.iter().take(DETAIL_LIMIT) {
		let start = entry.start.map(|dt| dt.format("%H:%M").to_string());
		let end = entry.end.map(|dt| dt.format("%H:%M").to_string());

		lines.push(format!(
			"  {}-{} | {:.1}h | {}",
			start.unwrap_or_else(|| "未知".to_string()),
			end.unwrap_or_else(|| "未知".to_string()),
			entry.duration_hours(),
			truncate(&entry.activity, 30),
		));
	}

	push_more(&mut lines, stats.entries.len(), DETAIL_LIMIT, "条记录");

	lines.join("\n")
}

pub fn render_range_time(stats: &RangeTimeStats) -> String {
	let mut lines = Vec::new();

	lines.push(format!("📊 {} 到 {} 时间统计报告", stats.start_date, stats.end_date));
	lines.push("=".repeat(50));
	lines.push(format!("总条目数: {}", stats.total_entries));
	lines.push(format!("总时长: {} 小时", fmt_amount(stats.total_hours)));
	lines.push(format!("统计天数: {} 天", day_count(stats.start_date, stats.end_date)));
	lines.push(String::new());

	push_categories(&mut lines, "📈 分类统计:", &stats.categories, |measure| {
		format!("{measure:.1}h")
	});
	lines.push(String::new());
	push_tags(&mut lines, "🏷️ 标签统计:", &stats.tags, |measure| format!("{measure:.1}h"));
	lines.push(String::new());

	if !stats.daily.is_empty() {
		lines.push("📅 每日统计:".to_string());

		for (day, hours) in &stats.daily {
			lines.push(format!("  {day}: {hours:.1}h"));
		}

		lines.push(String::new());
	}

	lines.push(format!("📝 详细活动 (前{DETAIL_LIMIT}条):"));

	for entry in stats.entries.iter().take(DETAIL_LIMIT) {
		let date = entry.start.map(|dt| dt.format("%m-%d").to_string());
		let start = entry.start.map(|dt| dt.format("%H:%M").to_string());
		let end = entry.end.map(|dt| dt.format("%H:%M").to_string());

		lines.push(format!(
			"  {} {}-{} | {:.1}h | {}",
			date.unwrap_or_else(|| "未知".to_string()),
			start.unwrap_or_else(|| "未知".to_string()),
			end.unwrap_or_else(|| "未知".to_string()),
			entry.duration_hours(),
			truncate(&entry.activity, 30),
		));
	}

	push_more(&mut lines, stats.entries.len(), DETAIL_LIMIT, "条记录");

	lines.join("\n")
}

pub fn render_monthly_expense(stats: &MonthlyExpenseStats) -> String {
	let mut lines = Vec::new();

	lines.push(format!("💰 {} 花销统计报告", stats.month.format("%Y年%m月")));
	lines.push("=".repeat(50));
	lines.push(format!("总条目数: {}", stats.total_entries));
	lines.push(format!("总金额: {} 元", fmt_amount(stats.total_amount)));
	lines.push(String::new());

	push_categories(&mut lines, "📈 分类统计:", &stats.categories, |measure| {
		format!("{measure:.2}元")
	});
	lines.push(String::new());
	push_tags(&mut lines, "🏷️ 标签统计:", &stats.tags, |measure| format!("{measure:.2}元"));
	lines.push(String::new());

	if !stats.daily.is_empty() {
		lines.push("📅 每日统计:".to_string());

		for (day, amount) in stats.daily.iter().take(DAILY_EXPENSE_LIMIT) {
			lines.push(format!("  {day}: {amount:.2}元"));
		}

		push_more(&mut lines, stats.daily.len(), DAILY_EXPENSE_LIMIT, "天的记录");
		lines.push(String::new());
	}

	push_expense_details(&mut lines, stats.entries.iter());
	push_more(&mut lines, stats.entries.len(), DETAIL_LIMIT, "条记录");

	lines.join("\n")
}

pub fn render_range_expense(stats: &RangeExpenseStats) -> String {
	let mut lines = Vec::new();

	lines.push(format!("💰 {} 到 {} 花销统计报告", stats.start_date, stats.end_date));
	lines.push("=".repeat(50));
	lines.push(format!("总条目数: {}", stats.total_entries));
	lines.push(format!("总金额: {} 元", fmt_amount(stats.total_amount)));
	lines.push(format!("统计天数: {} 天", day_count(stats.start_date, stats.end_date)));
	lines.push(String::new());

	push_categories(&mut lines, "📈 分类统计:", &stats.categories, |measure| {
		format!("{measure:.2}元")
	});
	lines.push(String::new());
	push_tags(&mut lines, "🏷️ 标签统计:", &stats.tags, |measure| format!("{measure:.2}元"));
	lines.push(String::new());

	if !stats.daily.is_empty() {
		lines.push("📅 每日统计:".to_string());

		for (day, amount) in &stats.daily {
			lines.push(format!("  {day}: {amount:.2}元"));
		}

		lines.push(String::new());
	}

	push_expense_details(&mut lines, stats.entries.iter());
	push_more(&mut lines, stats.entries.len(), DETAIL_LIMIT, "条记录");

	lines.join("\n")
}

pub fn render_calorie(stats: &CalorieStats) -> String {
	let mut lines = Vec::new();

	lines.push(format!("🍎 {} 卡路里统计报告", stats.date));
	lines.push("=".repeat(50));
	lines.push(format!("摄入热量: {} 卡", fmt_amount(stats.total_calories_in)));
	lines.push(format!("运动消耗: {} 卡", fmt_amount(stats.total_exercise_calories)));
	lines.push(format!("基础代谢: {} 卡", fmt_amount(stats.bmr)));
	lines.push(format!("总消耗: {} 卡", fmt_amount(stats.total_calories_out)));
	lines.push(format!("热量缺口: {} 卡", fmt_amount(stats.calorie_deficit)));
	lines.push(String::new());
	lines.push("📈 营养素:".to_string());
	lines.push(format!(
		"  蛋白质: {:.1}g ({:.1}%)",
		stats.protein_grams, stats.protein_percentage
	));
	lines.push(format!("  碳水: {:.1}g ({:.1}%)", stats.carbs_grams, stats.carbs_percentage));
	lines.push(format!("  脂肪: {:.1}g ({:.1}%)", stats.fat_grams, stats.fat_percentage));
	lines.push(String::new());
	lines.push(format!("📝 饮食明细 (前{DETAIL_LIMIT}条):"));

	for food in stats.foods.iter().take(DETAIL_LIMIT) {
		lines.push(format!("  {} | {:.1}卡", truncate(&food.food, 30), food.calories));
	}

	push_more(&mut lines, stats.foods.len(), DETAIL_LIMIT, "条记录");
	lines.push(String::new());
	lines.push(format!("🏃 运动明细 (前{DETAIL_LIMIT}条):"));

	for exercise in stats.exercises.iter().take(DETAIL_LIMIT) {
		lines.push(format!(
			"  {} | {:.0}分钟 | {:.1}卡",
			truncate(&exercise.exercise_type, 30),
			exercise.duration_minutes,
			exercise.calories_burned,
		));
	}

	push_more(&mut lines, stats.exercises.len(), DETAIL_LIMIT, "条记录");

	lines.join("\n")
}

/// Sent instead of a full report when yesterday had no time entries.
pub fn no_time_data_message(today: NaiveDate) -> String {
	format!("📊 {today} 时间统计报告\n\n昨天没有记录任何时间数据。")
}

/// Sent to the webhook when a scheduled report job fails.
pub fn report_failure_message(job: &str, error: &str) -> String {
	format!("❌ 生成{job}失败\n\n错误: {error}")
}

fn push_categories(
	lines: &mut Vec<String>,
	header: &str,
	buckets: &[Bucket],
	fmt_measure: impl Fn(f64) -> String,
) {
	push_buckets(lines, header, "", buckets, usize::MAX, fmt_measure);
}

/// Tag sections print `#name` and cap at the top ten.
fn push_tags(
	lines: &mut Vec<String>,
	header: &str,
	buckets: &[Bucket],
	fmt_measure: impl Fn(f64) -> String,
) {
	push_buckets(lines, header, "#", buckets, TAG_LIMIT, fmt_measure);
}

fn push_buckets(
	lines: &mut Vec<String>,
	header: &str,
	prefix: &str,
	buckets: &[Bucket],
	limit: usize,
	fmt_measure: impl Fn(f64) -> String,
) {
	if buckets.is_empty() {
		return;
	}

	lines.push(header.to_string());

	for bucket in buckets.iter().take(limit) {
		let share = match bucket.percentage {
			Some(percentage) => format!(" ({percentage:.1}%)"),
			None => String::new(),
		};

		lines.push(format!("  {prefix}{}: {}{share}", bucket.name, fmt_measure(bucket.measure)));
	}
}

fn push_expense_details<'a>(
	lines: &mut Vec<String>,
	entries: impl Iterator<Item = &'a crate::stats::ExpenseEntry>,
) {
	lines.push(format!("📝 详细花销 (前{DETAIL_LIMIT}条):"));

	for entry in entries.take(DETAIL_LIMIT) {
		let date = entry
			.date
			.map(|day| day.format("%m-%d").to_string())
			.unwrap_or_else(|| "未知".to_string());

		lines.push(format!("  {date} | {:.2}元 | {}", entry.amount, truncate(&entry.content, 30)));
	}
}

fn push_more(lines: &mut Vec<String>, total: usize, limit: usize, unit: &str) {
	if total > limit {
		lines.push(format!("  ... 还有 {} {unit}", total - limit));
	}
}

fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
	(end - start).num_days() + 1
}

fn truncate(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	let kept: String = text.chars().take(max_chars).collect();

	format!("{kept}...")
}

/// Totals print the way the aggregator rounds them: at most two decimals,
/// whole numbers as `N.0`.
fn fmt_amount(value: f64) -> String {
	if (value * 10.0).fract().abs() < f64::EPSILON {
		format!("{value:.1}")
	} else {
		format!("{value:.2}")
	}
}

#[cfg(test)]
mod tests {
	use chrono::DateTime;

	use super::*;
	use crate::stats::{DailyTimeStats, ExerciseEntry, ExpenseEntry, FoodEntry, TimeEntry};

	fn date(s: &str) -> NaiveDate {
		NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad date literal")
	}

	fn time_entry(activity: &str, start: &str, end: &str) -> TimeEntry {
		TimeEntry {
			activity: activity.to_string(),
			start: DateTime::parse_from_rfc3339(start).ok(),
			end: DateTime::parse_from_rfc3339(end).ok(),
			category: Some("工作".to_string()),
			tags: vec!["工作".to_string()],
		}
	}

	#[test]
	fn daily_time_report_layout() {
		let stats = DailyTimeStats::compute(date("2025-10-03"), vec![time_entry(
			"写代码",
			"2025-10-03T09:00:00+08:00",
			"2025-10-03T11:00:00+08:00",
		)]);
		let report = render_daily_time(&stats);
		let lines: Vec<&str> = report.lines().collect();

		assert_eq!(lines[0], "📊 2025-10-03 时间统计报告");
		assert_eq!(lines[1], "=".repeat(40));
		assert_eq!(lines[2], "总条目数: 1");
		assert_eq!(lines[3], "总时长: 2.0 小时");
		assert!(report.contains("  工作: 2.0h (100.0%)"));
		assert!(report.contains("  #工作: 2.0h (100.0%)"));
		assert!(report.contains("  09:00-11:00 | 2.0h | 写代码"));
	}

	#[test]
	fn zero_total_report_omits_percentages() {
		let stats = DailyTimeStats::compute(date("2025-10-03"), vec![TimeEntry {
			activity: "无时长".to_string(),
			start: None,
			end: None,
			category: Some("其他".to_string()),
			tags: Vec::new(),
		}]);
		let report = render_daily_time(&stats);

		assert!(report.contains("  其他: 0.0h\n"));
		assert!(!report.contains('%'));
	}

	#[test]
	fn long_detail_lists_get_a_trailer() {
		let entries: Vec<TimeEntry> = (0..25)
			.map(|i| {
				time_entry(
					&format!("活动{i}"),
					"2025-10-03T09:00:00+08:00",
					"2025-10-03T10:00:00+08:00",
				)
			})
			.collect();
		let report = render_daily_time(&DailyTimeStats::compute(date("2025-10-03"), entries));

		assert!(report.contains("... 还有 5 条记录"));
	}

	#[test]
	fn long_activity_names_truncate() {
		let stats = DailyTimeStats::compute(date("2025-10-03"), vec![time_entry(
			&"很".repeat(40),
			"2025-10-03T09:00:00+08:00",
			"2025-10-03T10:00:00+08:00",
		)]);
		let report = render_daily_time(&stats);

		assert!(report.contains(&format!("{}...", "很".repeat(30))));
	}

	#[test]
	fn monthly_expense_report_layout() {
		let stats = MonthlyExpenseStats::compute(date("2025-10-01"), vec![ExpenseEntry {
			content: "午餐".to_string(),
			amount: 50.0,
			date: Some(date("2025-10-03")),
			category: Some("餐饮".to_string()),
			tags: vec!["餐饮".to_string()],
		}]);
		let report = render_monthly_expense(&stats);

		assert!(report.starts_with("💰 2025年10月 花销统计报告"));
		assert!(report.contains("总金额: 50.0 元"));
		assert!(report.contains("  餐饮: 50.00元 (100.0%)"));
		assert!(report.contains("  2025-10-03: 50.00元"));
		assert!(report.contains("  10-03 | 50.00元 | 午餐"));
	}

	#[test]
	fn range_reports_include_day_count() {
		let stats =
			RangeTimeStats::compute(date("2025-10-01"), date("2025-10-07"), Vec::new());

		assert!(render_range_time(&stats).contains("统计天数: 7 天"));
	}

	#[test]
	fn calorie_report_layout() {
		let stats = CalorieStats::compute(
			date("2025-10-03"),
			1_800.0,
			vec![FoodEntry {
				food: "鸡胸肉".to_string(),
				calories: 400.0,
				protein: 50.0,
				carbs: 25.0,
				fat: 10.0,
			}],
			vec![ExerciseEntry {
				exercise_type: "跑步".to_string(),
				duration_minutes: 30.0,
				calories_burned: 288.0,
				intensity: Some("中".to_string()),
			}],
		);
		let report = render_calorie(&stats);

		assert!(report.starts_with("🍎 2025-10-03 卡路里统计报告"));
		assert!(report.contains("摄入热量: 400.0 卡"));
		assert!(report.contains("总消耗: 2088.0 卡"));
		assert!(report.contains("热量缺口: 1688.0 卡"));
		assert!(report.contains("  鸡胸肉 | 400.0卡"));
		assert!(report.contains("  跑步 | 30分钟 | 288.0卡"));
	}

	#[test]
	fn helper_messages() {
		assert!(no_time_data_message(date("2025-10-04")).contains("2025-10-04"));
		assert_eq!(
			report_failure_message("每日统计报告", "boom"),
			"❌ 生成每日统计报告失败\n\n错误: boom"
		);
	}
}
