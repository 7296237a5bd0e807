use std::sync::Arc;
use std::time::Duration;

use crate::data::guide_repository::GuideRepository;
use crate::infrastructure::telegram::{BotApi, TelegramClient};
use crate::presentation::dispatcher::UpdateDispatcher;
use crate::presentation::dto::Update;
use tracing::{info, warn};

pub const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub async fn run_polling<R, B>(client: Arc<TelegramClient>, dispatcher: Arc<UpdateDispatcher<R, B>>)
where
    R: GuideRepository + 'static,
    B: BotApi + 'static,
{
    info!("starting long polling");
    let mut offset = 0;

    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        offset = next_offset(offset, &updates);
        for update in updates {
            let update_id = update.update_id;
            if let Err(e) = dispatcher.dispatch(update).await {
                warn!(update_id, error = %e, "replying to update failed");
            }
        }
    }
}

// Telegram confirms everything below the offset.
fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(current, i64::max)
}
