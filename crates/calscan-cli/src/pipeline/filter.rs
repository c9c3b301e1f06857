//! Significance filtering stage.

use tracing::{error, info};

use calscan_core::{FilterResult, join_titles};
use calscan_providers::{GenerationRequest, TextGenerator};

/// Asks the model which of `titles` are worth a reminder.
///
/// Backend failures become [`FilterResult::Failed`] with a capped
/// description; they never propagate.
pub async fn filter_significant(
    generator: &dyn TextGenerator,
    model: &str,
    titles: &[String],
) -> FilterResult {
    let request = GenerationRequest::significance(model, join_titles(titles));

    match generator.generate(&request).await {
        Ok(text) => {
            info!("Extracted events: {}", text);
            FilterResult::Output(text)
        }
        Err(e) => {
            error!(
                generator = generator.name(),
                "Error extracting events: {}", e
            );
            FilterResult::failed(e)
        }
    }
}
