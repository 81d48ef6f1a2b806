use std::sync::Arc;

use loglark_service::LoglarkService;

use crate::scheduler::ReportScheduler;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LoglarkService>,
	pub scheduler: Arc<ReportScheduler>,
}
impl AppState {
	pub fn new(config: loglark_config::Config) -> color_eyre::Result<Self> {
		Self::with_service(Arc::new(LoglarkService::new(config)))
	}

	/// Build state around an existing service, stubbed providers included.
	pub fn with_service(service: Arc<LoglarkService>) -> color_eyre::Result<Self> {
		let scheduler = Arc::new(ReportScheduler::new(service.clone())?);

		Ok(Self { service, scheduler })
	}
}
