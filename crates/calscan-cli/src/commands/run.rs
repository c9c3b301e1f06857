//! The daily scan.

use chrono::Utc;
use tracing::{error, info};

use calscan_providers::google::GoogleCalendarClient;
use calscan_providers::openai::ResponsesClient;

use crate::commands::auth::credential_manager;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::pipeline::{Orchestrator, RunOutcome};

/// Authenticates, then scans tomorrow and writes today's reminder.
///
/// Only configuration and authentication problems are errors; everything
/// after that is reported through the returned [`RunOutcome`]. Errors are
/// logged before they are returned so the log file records why a run
/// stopped.
pub async fn run(config: &AppConfig) -> AppResult<RunOutcome> {
    info!("==Calendar Scanner started==");

    config
        .validate()
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;
    let settings = config.pipeline_settings();
    let openai_config = config
        .openai_config()
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;
    let google_config = config
        .google_config()
        .inspect_err(|e| error!("Invalid configuration: {}", e))?;

    let mut manager = credential_manager(&google_config)
        .inspect_err(|e| error!("Error preparing Google authorization: {}", e))?;
    let session = manager
        .obtain_session()
        .await
        .map_err(|e| {
            error!("Error authenticating with Google: {}", e);
            AppError::Auth(e)
        })?;

    let calendar = GoogleCalendarClient::new(&session, &google_config)
        .map_err(AppError::config)
        .inspect_err(|e| error!("Error creating calendar client: {}", e))?;
    let generator = ResponsesClient::new(&openai_config)
        .map_err(AppError::config)
        .inspect_err(|e| error!("Error creating inference client: {}", e))?;

    let outcome = Orchestrator::new(&settings, &calendar, &generator)
        .run(Utc::now())
        .await;

    info!(outcome = %outcome, "Finished, have a nice day");
    Ok(outcome)
}
