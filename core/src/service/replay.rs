use futures::try_join;
use tracing::{debug, info, warn};

use super::request::ReplayRequest;
use super::QueryService;
use crate::assemble::{assemble_frames, GameEnding, ReplayData, ReplaySettings, TRACKED_ITEM_TYPES};
use crate::cache::CacheKey;
use crate::error::QueryError;
use crate::source::{FrameNumber, FrameRange};
use crate::tenant::TenantId;

impl QueryService {
    /// Serialized replay data for a clip or a whole match.
    ///
    /// Recorded matches never change, so cached replays are served without a
    /// background refresh.
    pub async fn replay_payload(
        &self,
        tenant: &TenantId,
        request: ReplayRequest,
    ) -> Result<Vec<u8>, QueryError> {
        let (match_id, range) = request.validate()?;
        let key = CacheKey::replay(tenant, &match_id, range);
        if let Some(payload) = self.cached(&key).await {
            debug!(target: "clipseek.cache", key = %key, bytes = payload.len(), "replay cache hit");
            return Ok(payload);
        }

        let data = self.assemble_replay(tenant, &match_id, range).await?;
        let payload = serde_json::to_vec(&data)?;
        self.store(&key, payload.clone()).await;
        Ok(payload)
    }

    pub async fn replay(
        &self,
        tenant: &TenantId,
        request: ReplayRequest,
    ) -> Result<ReplayData, QueryError> {
        let payload = self.replay_payload(tenant, request).await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    /// `range` is in match frames; the log is queried in log frames.
    async fn assemble_replay(
        &self,
        tenant: &TenantId,
        match_id: &str,
        range: Option<(FrameNumber, FrameNumber)>,
    ) -> Result<ReplayData, QueryError> {
        let (mut settings, players) = try_join!(
            self.runner.match_settings(tenant, Some(match_id.to_string())),
            self.runner.player_settings(tenant, Some(match_id.to_string())),
        )?;
        let Some(settings) = settings.pop() else {
            return Err(QueryError::NotFound(format!("match with id '{match_id}' not found")));
        };

        let offset = self.config.pregame_offset;
        let cap = self.config.full_replay_frame_cap;
        let (player_rows, item_rows, platform_rows) = match range {
            Some((start, end)) => {
                let log_range = Some(FrameRange {
                    start: start + offset,
                    end: end + offset,
                });
                try_join!(
                    self.runner.player_frames(tenant, match_id.to_string(), log_range, None),
                    self.runner.item_frames(
                        tenant,
                        match_id.to_string(),
                        log_range,
                        TRACKED_ITEM_TYPES.to_vec(),
                    ),
                    self.runner.platform_frames(tenant, match_id.to_string(), log_range),
                )?
            }
            None => {
                let players = self
                    .runner
                    .player_frames(tenant, match_id.to_string(), None, Some(cap))
                    .await?;
                let span = players
                    .iter()
                    .map(|r| r.frame_number)
                    .fold(None, |acc: Option<FrameRange>, f| {
                        Some(match acc {
                            Some(r) => FrameRange {
                                start: r.start.min(f),
                                end: r.end.max(f),
                            },
                            None => FrameRange { start: f, end: f },
                        })
                    });
                match span {
                    Some(span) => {
                        let (items, platforms) = try_join!(
                            self.runner.item_frames(
                                tenant,
                                match_id.to_string(),
                                Some(span),
                                TRACKED_ITEM_TYPES.to_vec(),
                            ),
                            self.runner.platform_frames(tenant, match_id.to_string(), Some(span)),
                        )?;
                        (players, items, platforms)
                    }
                    None => (players, Vec::new(), Vec::new()),
                }
            }
        };

        let frame_cap = range.is_none().then_some(cap);
        let assembled = assemble_frames(player_rows, item_rows, platform_rows, frame_cap);
        let warning = assembled.truncated.then(|| {
            format!(
                "Full replay truncated to first {} frames due to size limits",
                assembled.frames.len()
            )
        });
        if let Some(warning) = &warning {
            warn!(target: "clipseek.assemble", match_id, "{warning}");
        }
        info!(
            target: "clipseek.assemble",
            match_id,
            frames = assembled.frames.len(),
            gaps = assembled.gaps.len(),
            "replay assembled"
        );

        Ok(ReplayData {
            settings: ReplaySettings::new(settings, players),
            frames: assembled.frames,
            ending: GameEnding::default(),
            warning,
            gaps: assembled.gaps,
        })
    }
}
