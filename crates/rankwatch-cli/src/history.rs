use rankwatch_core::{classify_rank_change, AppConfig, RankChange};

/// Prints the most recent observations for one (product, keyword) pair,
/// oldest first, annotating each with the change from the previous row.
///
/// # Errors
///
/// Returns an error if the history query fails.
pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    product: &str,
    keyword: &str,
    limit: i64,
) -> anyhow::Result<()> {
    let rows = rankwatch_db::list_rank_history(pool, product, keyword, limit.max(1)).await?;
    if rows.is_empty() {
        println!("no rank history for product {product} and keyword '{keyword}'");
        return Ok(());
    }

    let mut previous: Option<Option<u32>> = None;
    for row in &rows {
        let rank = row.rank_u32();
        let change = previous
            .and_then(|prev| classify_rank_change(prev, rank, config.change_thresholds))
            .map(|c| format!("  {}", change_label(c)))
            .unwrap_or_default();
        let shown = rank.map_or_else(|| format!(">{}", row.rank_limit), |r| format!("#{r}"));

        println!(
            "{}  {shown:>6}{change}",
            row.checked_at.format("%Y-%m-%d %H:%M")
        );
        previous = Some(rank);
    }
    Ok(())
}

fn change_label(change: RankChange) -> &'static str {
    match change {
        RankChange::Enter => "ENTER",
        RankChange::Exit => "EXIT",
        RankChange::Surge => "SURGE",
        RankChange::Drop => "DROP",
    }
}
