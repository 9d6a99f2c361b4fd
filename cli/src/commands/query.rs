//! One-shot commands: run a request through `QueryService` and print JSON.

use clipseek_core::api::{
    AppContext, Category, CliError, QueryError, QueryRequest, QueryService, ReplayRequest,
    SequenceStep, TagUpdate, TenantId,
};
use serde::Serialize;

use super::cli::{QueryArgs, QueryKind, ReplayArgs, TagArgs};

/// Parse `ACTION[:MIN[:MAX]]`. Empty bounds are skipped, so `FALL::3` sets
/// only a maximum.
pub fn parse_step(raw: &str) -> Result<SequenceStep, QueryError> {
    let mut parts = raw.split(':');
    let action = parts.next().unwrap_or_default().trim();
    if action.is_empty() {
        return Err(QueryError::InvalidRequest(format!("step '{raw}' has no action")));
    }
    let mut bound = |name: &str| -> Result<Option<u32>, QueryError> {
        match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
            None => Ok(None),
            Some(p) => p.parse::<u32>().map(Some).map_err(|_| {
                let reason = format!("step '{raw}': {name} '{p}' is not a frame count");
                QueryError::InvalidRequest(reason)
            }),
        }
    };
    let min = bound("min")?;
    let max = bound("max")?;
    if parts.next().is_some() {
        return Err(QueryError::InvalidRequest(format!(
            "step '{raw}' has too many ':' separated parts"
        )));
    }

    let mut step = SequenceStep::new(action);
    if let Some(min) = min {
        step = step.min(min);
    }
    if let Some(max) = max {
        step = step.max(max);
    }
    Ok(step)
}

pub fn build_request(kind: QueryKind, default_buffer: u32) -> Result<QueryRequest, QueryError> {
    match kind {
        QueryKind::Sequence {
            steps,
            buffer_frames,
            match_id,
        } => Ok(QueryRequest::Sequence {
            actions: steps
                .iter()
                .map(|s| parse_step(s))
                .collect::<Result<Vec<_>, _>>()?,
            buffer_frames,
            match_id,
        }),
        QueryKind::Combo { mode, match_id } => Ok(QueryRequest::Combo {
            combo_type: mode,
            match_id,
        }),
        QueryKind::Category {
            category,
            buffer_frames,
            match_id,
        } => Ok(category.request(buffer_frames.unwrap_or(default_buffer), match_id)),
    }
}

async fn service(ctx: &AppContext) -> Result<QueryService, CliError> {
    Ok(ctx.query_service().await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(QueryError::from)?;
    println!("{text}");
    Ok(())
}

pub async fn run_query(
    args: QueryArgs,
    ctx: &AppContext,
    tenant: &TenantId,
) -> Result<i32, CliError> {
    let service = service(ctx).await?;
    let request = build_request(args.kind, service.config().buffer_frames)?;
    let (payload, status) = service.query_payload(tenant, request).await?;
    let stubs: serde_json::Value = serde_json::from_slice(&payload).map_err(QueryError::from)?;
    tracing::info!(
        target: "clipseek.cli",
        tenant = %tenant,
        cache = status.as_str(),
        "query finished"
    );
    print_json(&stubs)?;

    if !args.no_wait {
        // The process exits after this; let a scheduled refresh land in the cache.
        service.background().wait_idle().await;
    }
    Ok(0)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaySummary<'a> {
    settings: &'a clipseek_core::api::ReplaySettings,
    frames: usize,
    gaps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
}

pub async fn run_replay(
    args: ReplayArgs,
    ctx: &AppContext,
    tenant: &TenantId,
) -> Result<i32, CliError> {
    let service = service(ctx).await?;
    let range = args.frame_start.zip(args.frame_end);
    let replay = service
        .replay(tenant, ReplayRequest::new(&args.match_id, range))
        .await?;

    if args.summary {
        print_json(&ReplaySummary {
            settings: &replay.settings,
            frames: replay.frames.len(),
            gaps: replay.gaps.len(),
            warning: replay.warning.as_deref(),
        })?;
    } else {
        print_json(&replay)?;
    }
    Ok(0)
}

pub async fn run_tag(args: TagArgs, ctx: &AppContext, tenant: &TenantId) -> Result<i32, CliError> {
    let service = service(ctx).await?;
    let update = TagUpdate::new(&args.match_id, args.frame_start, args.frame_end, args.bugged);
    let response = service.set_bugged(tenant, update).await?;
    print_json(&response)?;
    Ok(0)
}

pub fn list_categories() {
    for category in Category::ALL {
        println!("{:<15} {}", category.slug(), category.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipseek_core::api::ComboMode;
    use pretty_assertions::assert_eq;

    #[test]
    fn step_syntax() {
        assert_eq!(parse_step("AIR_DODGE").unwrap(), SequenceStep::new("AIR_DODGE"));
        assert_eq!(
            parse_step("CLIFF_WAIT:7").unwrap(),
            SequenceStep::new("CLIFF_WAIT").min(7)
        );
        assert_eq!(
            parse_step("FALL:1:3").unwrap(),
            SequenceStep::new("FALL").min(1).max(3)
        );
        assert_eq!(parse_step("JUMP::5").unwrap(), SequenceStep::new("JUMP").max(5));

        assert!(parse_step(":3").is_err());
        assert!(parse_step("FALL:x").is_err());
        assert!(parse_step("FALL:1:2:3").is_err());
    }

    #[test]
    fn category_uses_default_buffer() {
        let request = build_request(
            QueryKind::Category {
                category: Category::LedgeDashes,
                buffer_frames: None,
                match_id: Some("m1".into()),
            },
            90,
        )
        .unwrap();
        assert_eq!(request, Category::LedgeDashes.request(90, Some("m1".into())));

        let request = build_request(
            QueryKind::Combo {
                mode: ComboMode::Length,
                match_id: None,
            },
            90,
        )
        .unwrap();
        assert_eq!(
            request,
            QueryRequest::Combo {
                combo_type: ComboMode::Length,
                match_id: None
            }
        );
    }
}
