use std::io::Write;
use std::path::Path;

use crate::crawl::CrawlResult;
use crate::Result;

/// Serializes the crawl result as pretty-printed JSON
pub fn to_json_pretty(result: &CrawlResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Writes the crawl result to a file as pretty-printed JSON
pub fn write_to_file(result: &CrawlResult, path: &Path) -> Result<()> {
    let json = to_json_pretty(result)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

/// Prints the crawl result to stdout as pretty-printed JSON
pub fn write_to_stdout(result: &CrawlResult) -> Result<()> {
    let json = to_json_pretty(result)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
