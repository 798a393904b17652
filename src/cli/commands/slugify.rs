use crate::cli::{utils::output_fields, OutputFormat};
use crate::tenancy::slug::slugify;

pub fn handle(name: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let slug = slugify(&name)
        .ok_or_else(|| anyhow::anyhow!("'{}' has no letters or digits to build a slug from", name))?;
    output_fields(&output_format, &[("name", name), ("slug", slug)])
}
