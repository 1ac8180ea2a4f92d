use crate::domain::model::DeclarationItem;
use crate::utils::error::Result;
use std::io::Write;

/// 規劃結果輸出成 CSV，欄位與 JSON 相同（camelCase），缺少的到期日為空字串
pub fn write_items<W: Write>(items: &[DeclarationItem], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for item in items {
        csv_writer.serialize(item)?;
    }
    csv_writer.flush()?;
    Ok(())
}
