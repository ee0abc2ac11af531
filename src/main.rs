use std::io;

use sheet_to_pdf::action::cli::process_args;

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let outcome = process_args(args)?;
    log::info!(
        "程式執行完成，成功 {} 個，失敗 {} 個，跳過 {} 個",
        outcome.converted,
        outcome.failed,
        outcome.skipped
    );
    Ok(())
}
