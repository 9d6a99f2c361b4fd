mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use clipseek_core::api::{
    CacheStatus, Category, ComboMode, PunishRow, QueryError, QueryRequest, ReplayStub, TagUpdate,
};
use common::{harness, Dataset};
use pretty_assertions::assert_eq;

fn ledge_dashes() -> QueryRequest {
    Category::LedgeDashes.request(120, None)
}

#[tokio::test]
async fn sequence_query_produces_buffered_clip() {
    let h = harness(Dataset::ledge_dash());
    let stubs = h.service.query(&h.tenant, ledge_dashes()).await.unwrap();

    assert_eq!(stubs.len(), 1);
    let clip = &stubs[0].clip;
    assert_eq!(clip.match_id, "m1");
    // Chain spans frames 500..=513; the clip must cover it with the sequence buffer.
    assert!(clip.frame_start <= 500 && clip.frame_end >= 513);
    assert_eq!((clip.frame_start, clip.frame_end), (260, 633));
    assert_eq!(clip.stage_id, 31);
    let players: Vec<_> = clip.players.iter().map(|p| (p.player_index, p.tag.as_str())).collect();
    assert_eq!(players, vec![(0, "Mango"), (1, "Zain")]);
    assert!(!stubs[0].bugged);
    assert!(stubs[0].combo.is_none());
}

#[tokio::test]
async fn repeated_query_is_served_from_cache_and_refreshed_in_background() {
    let h = harness(Dataset::ledge_dash());

    let (first, status) = h.service.query_payload(&h.tenant, ledge_dashes()).await.unwrap();
    assert_eq!(status, CacheStatus::Miss);
    assert_eq!(h.cache.writes(), 1);
    let submits_after_miss = h.source.submits();

    // Jobs now never finish; a hit must not wait for them.
    h.source.hold.store(true, Ordering::SeqCst);
    let (second, status) = tokio::time::timeout(
        Duration::from_secs(2),
        h.service.query_payload(&h.tenant, ledge_dashes()),
    )
    .await
    .expect("cache hit must not block on the log")
    .unwrap();
    assert_eq!(status, CacheStatus::Hit);
    assert_eq!(first, second);
    assert_eq!(h.cache.writes(), 1);

    h.source.hold.store(false, Ordering::SeqCst);
    h.service.background().wait_idle().await;
    assert!(h.source.submits() > submits_after_miss);
    assert_eq!(h.cache.writes(), 2);
    assert_eq!(h.service.background().failures(), 0);
}

#[tokio::test]
async fn refresh_failures_are_isolated() {
    let h = harness(Dataset::ledge_dash());
    let (first, _) = h.service.query_payload(&h.tenant, ledge_dashes()).await.unwrap();

    h.source.fail.store(true, Ordering::SeqCst);
    let (second, status) = h.service.query_payload(&h.tenant, ledge_dashes()).await.unwrap();
    assert_eq!(status, CacheStatus::Hit);
    assert_eq!(first, second);

    h.service.background().wait_idle().await;
    assert_eq!(h.service.background().failures(), 1);
    assert_eq!(h.cache.writes(), 1);
}

#[tokio::test]
async fn failed_job_aborts_an_uncached_query() {
    let h = harness(Dataset::ledge_dash());
    h.source.fail.store(true, Ordering::SeqCst);
    let err = h.service.query(&h.tenant, ledge_dashes()).await.unwrap_err();
    match err {
        QueryError::JobFailed { reason } => assert_eq!(reason, "HIVE_CURSOR_ERROR"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(h.cache.writes(), 0);
}

#[tokio::test]
async fn unknown_match_is_not_found() {
    let h = harness(Dataset::ledge_dash());
    let err = h
        .service
        .query(&h.tenant, Category::CombosLength.request(120, Some("nope".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn invalid_template_is_rejected_before_any_job() {
    let h = harness(Dataset::ledge_dash());
    let request = QueryRequest::Sequence {
        actions: vec![],
        buffer_frames: None,
        match_id: None,
    };
    let err = h.service.query(&h.tenant, request).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(_)));
    assert_eq!(h.source.submits(), 0);
}

fn punish(start: i64, moves: u32, start_pct: f64, end_pct: f64) -> PunishRow {
    PunishRow {
        match_id: "m1".into(),
        entity_id: 0,
        start_frame: start,
        end_frame: start + 200,
        num_moves: moves,
        start_pct,
        end_pct,
        stocks: Some(4),
    }
}

#[tokio::test]
async fn combo_queries_rank_and_carry_tags() {
    let mut data = Dataset::ledge_dash();
    data.punishes = vec![
        punish(1_000, 3, 0.0, 45.0),
        punish(2_000, 9, 10.0, 45.0),
        punish(3_000, 5, 0.0, 80.0),
        punish(4_000, 4, 0.0, 20.0),
    ];
    let h = harness(data);

    let updated = h
        .service
        .set_bugged(&h.tenant, TagUpdate::new("m1", 3_000 - 60, 3_200 + 30, true))
        .await
        .unwrap();
    assert!(updated.bugged);

    let damage = h
        .service
        .query(&h.tenant, QueryRequest::Combo { combo_type: ComboMode::Damage, match_id: None })
        .await
        .unwrap();
    let summary: Vec<_> = damage
        .iter()
        .map(|s: &ReplayStub| {
            let damage = s.combo.as_ref().unwrap().damage_dealt;
            (s.clip.frame_start, s.bugged, damage)
        })
        .collect();
    assert_eq!(summary, vec![(2_940, true, 80.0), (940, false, 45.0)]);

    let length = h
        .service
        .query(&h.tenant, QueryRequest::Combo { combo_type: ComboMode::Length, match_id: None })
        .await
        .unwrap();
    let moves: Vec<_> = length.iter().map(|s| s.combo.as_ref().unwrap().num_moves).collect();
    assert_eq!(moves, vec![9, 5, 4]);
}

#[tokio::test]
async fn tag_update_requires_every_field() {
    let h = harness(Dataset::ledge_dash());
    let update = TagUpdate {
        frame_end: None,
        ..TagUpdate::new("m1", 0, 10, true)
    };
    let err = h.service.set_bugged(&h.tenant, update).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidRequest(_)));
    assert!(h.tags.tags.lock().unwrap().is_empty());
}
