use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use serde_json::Value;

pub const UNCATEGORIZED: &str = "未分类";

/// One row of a category or tag breakdown. `percentage` is `None` for every
/// bucket when the grand total is zero; the renderer then omits the
/// parenthesized share entirely.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
	pub name: String,
	pub measure: f64,
	pub percentage: Option<f64>,
}

/// Insertion-ordered accumulator. Finishing sorts descending by measure with
/// a stable sort, so equal measures keep first-seen order.
#[derive(Debug, Default)]
struct Buckets {
	entries: Vec<(String, f64)>,
}
impl Buckets {
	fn add(&mut self, name: &str, measure: f64) {
		match self.entries.iter_mut().find(|(existing, _)| existing == name) {
			Some((_, total)) => *total += measure,
			None => self.entries.push((name.to_string(), measure)),
		}
	}

	fn finish(mut self, total: f64) -> Vec<Bucket> {
		self.entries.sort_by(|(_, a), (_, b)| b.total_cmp(a));

		self.entries
			.into_iter()
			.map(|(name, measure)| Bucket {
				name,
				measure,
				percentage: (total > 0.0).then(|| round1(measure / total * 100.0)),
			})
			.collect()
	}
}

fn round1(value: f64) -> f64 {
	(value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

// ── Notion property readers ────────────────────────────────────────────────
//
// Pages with missing or renamed properties degrade to empty values rather
// than failing the whole report.

fn title_text(properties: &Value, key: &str) -> String {
	let item = &properties[key]["title"][0];

	item["text"]["content"]
		.as_str()
		.or_else(|| item["plain_text"].as_str())
		.unwrap_or_default()
		.to_string()
}

fn select_name(properties: &Value, key: &str) -> Option<String> {
	properties[key]["select"]["name"].as_str().map(ToString::to_string)
}

fn multi_select_names(properties: &Value, key: &str) -> Vec<String> {
	properties[key]["multi_select"]
		.as_array()
		.map(|tags| {
			tags.iter().filter_map(|tag| tag["name"].as_str().map(ToString::to_string)).collect()
		})
		.unwrap_or_default()
}

fn number_value(properties: &Value, key: &str) -> f64 {
	properties[key]["number"].as_f64().unwrap_or_default()
}

fn date_value(value: &Value) -> Option<DateTime<FixedOffset>> {
	let raw = value.as_str()?;

	if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
		return Some(parsed);
	}

	// Date-only properties come back as `YYYY-MM-DD`.
	let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;

	date.and_hms_opt(0, 0, 0)?.and_local_timezone(FixedOffset::east_opt(0)?).single()
}

// ── parsed entries ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct TimeEntry {
	pub activity: String,
	pub start: Option<DateTime<FixedOffset>>,
	pub end: Option<DateTime<FixedOffset>>,
	pub category: Option<String>,
	pub tags: Vec<String>,
}
impl TimeEntry {
	pub fn from_page(page: &Value) -> Self {
		let properties = &page["properties"];
		let when = &properties["When"]["date"];

		Self {
			activity: title_text(properties, "Activity"),
			start: date_value(&when["start"]),
			end: date_value(&when["end"]),
			category: select_name(properties, "Category"),
			tags: multi_select_names(properties, "Tags"),
		}
	}

	pub fn duration_hours(&self) -> f64 {
		match (self.start, self.end) {
			(Some(start), Some(end)) => (end - start).num_seconds() as f64 / 3_600.0,
			_ => 0.0,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpenseEntry {
	pub content: String,
	pub amount: f64,
	pub date: Option<NaiveDate>,
	pub category: Option<String>,
	pub tags: Vec<String>,
}
impl ExpenseEntry {
	pub fn from_page(page: &Value) -> Self {
		let properties = &page["properties"];

		Self {
			content: title_text(properties, "Content"),
			amount: number_value(properties, "Amount"),
			date: date_value(&properties["Date"]["date"]["start"]).map(|dt| dt.date_naive()),
			category: select_name(properties, "Category"),
			tags: multi_select_names(properties, "Tags"),
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct FoodEntry {
	pub food: String,
	pub calories: f64,
	pub protein: f64,
	pub carbs: f64,
	pub fat: f64,
}
impl FoodEntry {
	pub fn from_page(page: &Value) -> Self {
		let properties = &page["properties"];

		Self {
			food: title_text(properties, "Food"),
			calories: number_value(properties, "Calories"),
			protein: number_value(properties, "Protein"),
			carbs: number_value(properties, "Carbs"),
			fat: number_value(properties, "Fat"),
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct ExerciseEntry {
	pub exercise_type: String,
	pub duration_minutes: f64,
	pub calories_burned: f64,
	pub intensity: Option<String>,
}
impl ExerciseEntry {
	pub fn from_page(page: &Value) -> Self {
		let properties = &page["properties"];

		Self {
			exercise_type: title_text(properties, "Exercise"),
			duration_minutes: number_value(properties, "Duration"),
			calories_burned: number_value(properties, "Calories Burned"),
			intensity: select_name(properties, "Intensity"),
		}
	}
}

// ── aggregates ─────────────────────────────────────────────────────────────
//
// Category buckets partition the total (every entry lands in exactly one,
// empty categories under 未分类); tag buckets fan out, each tag receiving the
// entry's full measure.

#[derive(Clone, Debug, Serialize)]
pub struct DailyTimeStats {
	pub date: NaiveDate,
	pub total_entries: usize,
	pub total_hours: f64,
	pub categories: Vec<Bucket>,
	pub tags: Vec<Bucket>,
	pub entries: Vec<TimeEntry>,
}
impl DailyTimeStats {
	pub fn compute(date: NaiveDate, entries: Vec<TimeEntry>) -> Self {
		let mut categories = Buckets::default();
		let mut tags = Buckets::default();
		let mut total_hours = 0.0;

		for entry in &entries {
			let hours = entry.duration_hours();

			categories.add(entry.category.as_deref().unwrap_or(UNCATEGORIZED), hours);

			for tag in &entry.tags {
				tags.add(tag, hours);
			}

			total_hours += hours;
		}

		Self {
			date,
			total_entries: entries.len(),
			total_hours: round2(total_hours),
			categories: categories.finish(total_hours),
			tags: tags.finish(total_hours),
			entries,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct RangeTimeStats {
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	pub total_entries: usize,
	pub total_hours: f64,
	pub categories: Vec<Bucket>,
	pub tags: Vec<Bucket>,
	pub daily: Vec<(NaiveDate, f64)>,
	pub entries: Vec<TimeEntry>,
}
impl RangeTimeStats {
	pub fn compute(start_date: NaiveDate, end_date: NaiveDate, entries: Vec<TimeEntry>) -> Self {
		let mut categories = Buckets::default();
		let mut tags = Buckets::default();
		let mut daily = BTreeMap::<NaiveDate, f64>::new();
		let mut total_hours = 0.0;

		for entry in &entries {
			let hours = entry.duration_hours();

			categories.add(entry.category.as_deref().unwrap_or(UNCATEGORIZED), hours);

			for tag in &entry.tags {
				tags.add(tag, hours);
			}
			if let Some(start) = entry.start {
				*daily.entry(start.date_naive()).or_default() += hours;
			}

			total_hours += hours;
		}

		Self {
			start_date,
			end_date,
			total_entries: entries.len(),
			total_hours: round2(total_hours),
			categories: categories.finish(total_hours),
			tags: tags.finish(total_hours),
			daily: daily.into_iter().collect(),
			entries,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct MonthlyExpenseStats {
	/// First day of the month.
	pub month: NaiveDate,
	pub total_entries: usize,
	pub total_amount: f64,
	pub categories: Vec<Bucket>,
	pub tags: Vec<Bucket>,
	pub daily: Vec<(NaiveDate, f64)>,
	pub entries: Vec<ExpenseEntry>,
}
impl MonthlyExpenseStats {
	pub fn compute(month: NaiveDate, entries: Vec<ExpenseEntry>) -> Self {
		let folded = fold_expenses(&entries);

		Self {
			month,
			total_entries: entries.len(),
			total_amount: folded.total,
			categories: folded.categories,
			tags: folded.tags,
			daily: folded.daily,
			entries,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct RangeExpenseStats {
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	pub total_entries: usize,
	pub total_amount: f64,
	pub categories: Vec<Bucket>,
	pub tags: Vec<Bucket>,
	pub daily: Vec<(NaiveDate, f64)>,
	pub entries: Vec<ExpenseEntry>,
}
impl RangeExpenseStats {
	pub fn compute(start_date: NaiveDate, end_date: NaiveDate, entries: Vec<ExpenseEntry>) -> Self {
		let folded = fold_expenses(&entries);

		Self {
			start_date,
			end_date,
			total_entries: entries.len(),
			total_amount: folded.total,
			categories: folded.categories,
			tags: folded.tags,
			daily: folded.daily,
			entries,
		}
	}
}

struct FoldedExpenses {
	total: f64,
	categories: Vec<Bucket>,
	tags: Vec<Bucket>,
	daily: Vec<(NaiveDate, f64)>,
}

fn fold_expenses(entries: &[ExpenseEntry]) -> FoldedExpenses {
	let mut categories = Buckets::default();
	let mut tags = Buckets::default();
	let mut daily = BTreeMap::<NaiveDate, f64>::new();
	let mut total = 0.0;

	for entry in entries {
		categories.add(entry.category.as_deref().unwrap_or(UNCATEGORIZED), entry.amount);

		for tag in &entry.tags {
			tags.add(tag, entry.amount);
		}
		if let Some(date) = entry.date {
			*daily.entry(date).or_default() += entry.amount;
		}

		total += entry.amount;
	}

	FoldedExpenses {
		total: round2(total),
		categories: categories.finish(total),
		tags: tags.finish(total),
		daily: daily.into_iter().collect(),
	}
}

/// Calorie balance for one day. `total_calories_out` assumes the configured
/// BMR plus everything burned; macro percentages use the 4/4/9 kcal-per-gram
/// densities against intake, 0 when nothing was eaten.
#[derive(Clone, Debug, Serialize)]
pub struct CalorieStats {
	pub date: NaiveDate,
	pub bmr: f64,
	pub total_calories_in: f64,
	pub total_exercise_calories: f64,
	pub total_calories_out: f64,
	pub calorie_deficit: f64,
	pub protein_grams: f64,
	pub carbs_grams: f64,
	pub fat_grams: f64,
	pub protein_percentage: f64,
	pub carbs_percentage: f64,
	pub fat_percentage: f64,
	pub foods: Vec<FoodEntry>,
	pub exercises: Vec<ExerciseEntry>,
}
impl CalorieStats {
	pub fn compute(
		date: NaiveDate,
		bmr: f64,
		foods: Vec<FoodEntry>,
		exercises: Vec<ExerciseEntry>,
	) -> Self {
		let total_calories_in: f64 = foods.iter().map(|food| food.calories).sum();
		let total_exercise_calories: f64 =
			exercises.iter().map(|exercise| exercise.calories_burned).sum();
		let total_calories_out = bmr + total_exercise_calories;
		let protein_grams: f64 = foods.iter().map(|food| food.protein).sum();
		let carbs_grams: f64 = foods.iter().map(|food| food.carbs).sum();
		let fat_grams: f64 = foods.iter().map(|food| food.fat).sum();
		let macro_percentage = |grams: f64, density: f64| {
			if total_calories_in > 0.0 {
				round1(grams * density / total_calories_in * 100.0)
			} else {
				0.0
			}
		};

		Self {
			date,
			bmr,
			total_calories_in: round2(total_calories_in),
			total_exercise_calories: round2(total_exercise_calories),
			total_calories_out: round2(total_calories_out),
			calorie_deficit: round2(total_calories_out - total_calories_in),
			protein_percentage: macro_percentage(protein_grams, 4.0),
			carbs_percentage: macro_percentage(carbs_grams, 4.0),
			fat_percentage: macro_percentage(fat_grams, 9.0),
			protein_grams: round2(protein_grams),
			carbs_grams: round2(carbs_grams),
			fat_grams: round2(fat_grams),
			foods,
			exercises,
		}
	}
}
