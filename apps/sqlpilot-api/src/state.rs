use std::sync::Arc;

use sqlpilot_service::SqlPilot;

#[derive(Clone)]
pub struct AppState {
	pub pilot: Arc<SqlPilot>,
}
impl AppState {
	pub async fn new(config: sqlpilot_config::Config) -> color_eyre::Result<Self> {
		let pilot = SqlPilot::connect(config).await?;

		Ok(Self::from_pilot(pilot))
	}

	pub fn from_pilot(pilot: SqlPilot) -> Self {
		Self { pilot: Arc::new(pilot) }
	}
}
