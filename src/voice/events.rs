use songbird::{Event, EventContext, EventHandler};
use tracing::error;

/// Logs every track that fails to play.
pub struct TrackErrorNotifier;

#[async_trait::async_trait]
impl EventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, handle) in *track_list {
                error!(
                    "Player error on track {}: {:?}",
                    handle.uuid(),
                    state.playing
                );
            }
        }

        None
    }
}
