use crate::record::Intensity;

/// Values at or below this are treated as "not really given" and replaced
/// by an estimate. Every constant below exceeds it, so estimation never
/// re-triggers on an already-estimated record.
pub const ESTIMATE_TRIGGER: f64 = 10.0;

/// Flat fallback when no food keyword matches.
pub const DEFAULT_FOOD_CALORIES: f64 = 200.0;

/// Per-serving calorie estimates, matched case-insensitively as substrings
/// of the food name. First match wins.
pub const FOOD_CALORIES: &[(&str, f64)] = &[
	("米饭", 200.0),
	("面条", 300.0),
	("面包", 150.0),
	("鸡蛋", 70.0),
	("牛奶", 150.0),
	("鸡胸肉", 200.0),
	("牛肉", 250.0),
	("猪肉", 300.0),
	("鱼", 150.0),
	("虾", 100.0),
	("苹果", 95.0),
	("香蕉", 105.0),
	("橙子", 62.0),
	("草莓", 50.0),
	("西瓜", 85.0),
	("蔬菜", 50.0),
	("沙拉", 100.0),
	("汤", 150.0),
	("咖啡", 5.0),
	("茶", 2.0),
	("蛋糕", 350.0),
	("饼干", 150.0),
	("巧克力", 200.0),
	("冰淇淋", 250.0),
	("薯片", 160.0),
];

/// Burn-rate multipliers by activity name substring. Default 1.0.
pub const EXERCISE_MULTIPLIERS: &[(&str, f64)] = &[
	("跑步", 1.2),
	("游泳", 1.3),
	("骑行", 1.1),
	("步行", 0.8),
	("力量训练", 1.0),
	("举重", 1.1),
	("瑜伽", 0.7),
	("普拉提", 0.8),
	("篮球", 1.4),
	("足球", 1.5),
	("网球", 1.3),
	("羽毛球", 1.2),
	("跳绳", 1.6),
	("爬山", 1.4),
	("舞蹈", 1.0),
	("健身操", 1.1),
];

/// Keyword→tag defaults applied when the LLM returns an empty tag list.
/// May produce a tag outside the candidate set handed to the LLM; reports
/// aggregate whatever lands in Notion, so the mismatch is harmless.
pub const DEFAULT_TAG_KEYWORDS: &[(&str, &str)] = &[
	("开车", "交通"),
	("驾驶", "交通"),
	("通勤", "交通"),
	("打车", "交通"),
	("吃饭", "吃饭"),
	("用餐", "吃饭"),
	("早餐", "吃饭"),
	("午餐", "吃饭"),
	("晚餐", "吃饭"),
	("跑步", "运动"),
	("健身", "运动"),
	("锻炼", "运动"),
];

pub const FALLBACK_TAG: &str = "其他";

/// Calories per minute by intensity.
pub fn base_rate(intensity: Intensity) -> f64 {
	match intensity {
		Intensity::Low => 5.0,
		Intensity::Medium => 8.0,
		Intensity::High => 12.0,
	}
}

pub fn lookup_food_calories(food: &str) -> Option<(&'static str, f64)> {
	let lowered = food.to_lowercase();

	FOOD_CALORIES
		.iter()
		.find(|(keyword, _)| lowered.contains(&keyword.to_lowercase()))
		.map(|(keyword, calories)| (*keyword, *calories))
}

pub fn type_multiplier(exercise_type: &str) -> f64 {
	let lowered = exercise_type.to_lowercase();

	EXERCISE_MULTIPLIERS
		.iter()
		.find(|(keyword, _)| lowered.contains(&keyword.to_lowercase()))
		.map(|(_, multiplier)| *multiplier)
		.unwrap_or(1.0)
}

/// `base_rate(intensity) × duration × multiplier`, rounded to the nearest
/// whole calorie.
pub fn estimate_exercise_calories(
	intensity: Intensity,
	duration_minutes: f64,
	exercise_type: &str,
) -> f64 {
	(base_rate(intensity) * duration_minutes * type_multiplier(exercise_type)).round()
}

/// Exactly one deterministic tag for a record whose tag list came back
/// empty: first keyword hit, then the record's category, then a catch-all.
pub fn default_tag(text: &str, category: Option<&str>) -> String {
	for (keyword, tag) in DEFAULT_TAG_KEYWORDS {
		if text.contains(keyword) {
			return (*tag).to_string();
		}
	}

	match category {
		Some(category) if !category.trim().is_empty() => category.to_string(),
		_ => FALLBACK_TAG.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn apple_lookup_returns_95() {
		let (keyword, calories) = lookup_food_calories("一个苹果").expect("no match");

		assert_eq!(keyword, "苹果");
		assert_eq!(calories, 95.0);
	}

	#[test]
	fn first_table_match_wins() {
		// 米饭和鱼 matches both 米饭 (200) and 鱼 (150); table order decides.
		let (keyword, calories) = lookup_food_calories("米饭和鱼").expect("no match");

		assert_eq!(keyword, "米饭");
		assert_eq!(calories, 200.0);
	}

	#[test]
	fn unknown_food_has_no_match() {
		assert!(lookup_food_calories("分子料理").is_none());
	}

	#[test]
	fn running_30min_medium_estimates_288() {
		// 8 cal/min × 30 min × 1.2 = 288.
		assert_eq!(estimate_exercise_calories(Intensity::Medium, 30.0, "跑步"), 288.0);
	}

	#[test]
	fn unknown_exercise_uses_unit_multiplier() {
		assert_eq!(type_multiplier("太极"), 1.0);
		assert_eq!(estimate_exercise_calories(Intensity::Low, 60.0, "太极"), 300.0);
	}

	#[test]
	fn estimates_round_to_nearest_calorie() {
		// 5 × 7 × 1.3 = 45.5 → 46 (ties round away from zero).
		assert_eq!(estimate_exercise_calories(Intensity::Low, 7.0, "游泳"), 46.0);
	}

	#[test]
	fn low_calorie_table_entries_are_the_known_exceptions() {
		// Estimation runs exactly once per record, so a ≤ trigger estimate
		// (咖啡 5, 茶 2) sticks rather than looping. Everything else,
		// including the flat default, clears the trigger.
		let low: Vec<&str> = FOOD_CALORIES
			.iter()
			.filter(|(_, calories)| *calories <= ESTIMATE_TRIGGER)
			.map(|(keyword, _)| *keyword)
			.collect();

		assert_eq!(low, ["咖啡", "茶"]);
		assert!(DEFAULT_FOOD_CALORIES > ESTIMATE_TRIGGER);
	}

	#[test]
	fn default_tag_is_deterministic() {
		assert_eq!(default_tag("开车去公司", None), "交通");
		assert_eq!(default_tag("中午用餐", Some("午餐")), "吃饭");
		assert_eq!(default_tag("喝了杯咖啡", Some("饮料")), "饮料");
		assert_eq!(default_tag("喝了杯咖啡", None), FALLBACK_TAG);
		assert_eq!(default_tag("喝了杯咖啡", Some("  ")), FALLBACK_TAG);
	}

	#[test]
	fn default_tag_same_input_same_output() {
		for _ in 0..3 {
			assert_eq!(default_tag("早餐吃了鸡蛋", Some("早餐")), "吃饭");
		}
	}
}
