use anyhow::Context;
use mockbq_core::domain::warehouse::ExportDump;
use mockbq_core::storage;
use sqlx::SqlitePool;
use std::io::Write;
use std::path::Path;

/// Rebuilds the warehouse table and writes every row to `out` as pretty JSON, overwriting any
/// previous dump.
pub async fn dump_to_file(pool: &SqlitePool, out: &Path) -> anyhow::Result<usize> {
    storage::warehouse::rebuild(pool)
        .await
        .context("rebuild research_extractions failed")?;
    let rows = storage::warehouse::list_all(pool)
        .await
        .context("read research_extractions failed")?;

    let dump = ExportDump::new(rows);

    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create dump directory {} failed", dir.display()))?;
    }
    let file = std::fs::File::create(out)
        .with_context(|| format!("create dump file {} failed", out.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &dump)
        .with_context(|| format!("write dump file {} failed", out.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush dump file {} failed", out.display()))?;

    Ok(dump.total)
}
