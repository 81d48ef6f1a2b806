use serde::Serialize;

use loglark_domain::{Intent, IntentClassification};

use crate::{
	Error, IngestExerciseResponse, IngestExpenseResponse, IngestFoodResponse, IngestRequest,
	IngestTimeResponse, LoglarkService, Result,
};

#[derive(Clone, Debug, Serialize)]
pub struct UnifiedIngestResponse {
	pub intent: Intent,
	/// Absent when the caller forced the type.
	pub classification: Option<IntentClassification>,
	pub result: UnifiedResult,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum UnifiedResult {
	Time(IngestTimeResponse),
	Expense(IngestExpenseResponse),
	Food(IngestFoodResponse),
	Exercise(IngestExerciseResponse),
}

impl LoglarkService {
	/// Classify (or honor `force_type`) and dispatch to exactly one ingest
	/// handler. One utterance, one created page; repeat input creates a
	/// duplicate by design.
	pub async fn unified_ingest(&self, req: IngestRequest) -> Result<UnifiedIngestResponse> {
		let (intent, classification) = match &req.force_type {
			Some(forced) => {
				let intent: Intent = forced
					.parse()
					.map_err(|_| Error::UnsupportedIntent { intent: forced.clone() })?;

				tracing::info!("Skipping classification, intent forced to {intent}.");

				(intent, None)
			},
			None => {
				let classification = self.classify(&req.utterance).await?;

				(classification.intent_type, Some(classification))
			},
		};
		let result = match intent {
			Intent::Time => UnifiedResult::Time(self.ingest_time(req).await?),
			Intent::Expense => UnifiedResult::Expense(self.ingest_expense(req).await?),
			Intent::Food => UnifiedResult::Food(self.ingest_food(req).await?),
			Intent::Exercise => UnifiedResult::Exercise(self.ingest_exercise(req).await?),
		};

		Ok(UnifiedIngestResponse { intent, classification, result })
	}
}
